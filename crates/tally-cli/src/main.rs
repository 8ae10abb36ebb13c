use clap::Parser;
use std::path::PathBuf;
use std::process::ExitCode;

mod commands;
mod config;
mod testing;

/// Exit status when a fatal error stops the run before any test executes
const EXIT_FATAL: u8 = 2;

/// Minimal test harness for tally units.
///
/// Walks the given paths, loads every `.tl` unit it can, and runs each
/// zero-argument function whose name starts with `test_`.
///
/// EXAMPLES:
///     tally                       Run all tests under the current directory
///     tally tests/ lib/test_x.tl  Run tests from several roots
///     tally --ignore fixtures     Skip directories named `fixtures`
///
/// ENVIRONMENT VARIABLES:
///     NO_COLOR          Set to disable colored output
///     TALLY_NO_COLOR    Same as NO_COLOR
///     TALLY_IGNORE      Comma separated extra directory names to skip
///     TALLY_LOG         Log filter for diagnostics on stderr (default: warn)
#[derive(Parser)]
#[command(name = "tally")]
#[command(version)]
struct Cli {
    /// Files or directories to search for tests (defaults to the current directory)
    paths: Vec<PathBuf>,

    /// Disable colored output
    #[arg(long)]
    no_color: bool,

    /// Skip directories with this name (repeatable)
    #[arg(long, value_name = "NAME")]
    ignore: Vec<String>,
}

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_env("TALLY_LOG")
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    init_logging();

    let cli_config = config::Config::from_env();

    // Command-line flags add to the environment configuration
    let mut ignore = cli_config.ignore;
    ignore.extend(cli.ignore);

    let args = commands::test::TestArgs {
        paths: cli.paths,
        no_color: cli.no_color || cli_config.no_color,
        ignore,
    };

    match commands::test::run(args) {
        Ok(status) => status.exit_code(),
        Err(e) => {
            eprintln!("error: {:#}", e);
            ExitCode::from(EXIT_FATAL)
        }
    }
}
