//! Test command - discover, run and report tally tests

use crate::testing::{
    collect, PathWalker, Reporter, ReporterOptions, RunSummary, TestRunner, TestUnit, UnitLoader,
};
use anyhow::{Context, Result};
use std::io::{self, Write};
use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Instant;

/// Arguments for the test command
#[derive(Debug, Clone, Default)]
pub struct TestArgs {
    /// Roots to search (empty means the current directory)
    pub paths: Vec<PathBuf>,
    /// Disable colored output
    pub no_color: bool,
    /// Extra directory names to skip
    pub ignore: Vec<String>,
}

/// How a completed run ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    /// No test failed (including when none ran)
    Passed,
    /// At least one test failed
    Failed,
}

impl RunStatus {
    pub fn exit_code(self) -> ExitCode {
        match self {
            RunStatus::Passed => ExitCode::SUCCESS,
            RunStatus::Failed => ExitCode::from(1),
        }
    }
}

/// Run the test command, reporting to stdout
pub fn run(args: TestArgs) -> Result<RunStatus> {
    if args.no_color {
        colored::control::set_override(false);
    }

    let stdout = io::stdout();
    let status = run_with_output(
        &args,
        stdout.lock(),
        ReporterOptions {
            no_color: args.no_color,
            width: None,
        },
    );

    if args.no_color {
        colored::control::unset_override();
    }

    status
}

/// Run the whole pipeline, writing the report to `out`
pub fn run_with_output<W: Write>(
    args: &TestArgs,
    out: W,
    options: ReporterOptions,
) -> Result<RunStatus> {
    let started = Instant::now();

    let roots = if args.paths.is_empty() {
        vec![PathBuf::from(".")]
    } else {
        args.paths.clone()
    };

    let walker = PathWalker::new().with_ignored(args.ignore.iter().cloned());
    let files = walker.walk(&roots)?;

    let loader = UnitLoader::default();
    let mut units: Vec<TestUnit> = files
        .iter()
        .filter_map(|path| {
            let namespace = loader.load(path)?;
            collect(path, namespace)
        })
        .collect();

    let total: usize = units.iter().map(TestUnit::test_count).sum();
    tracing::debug!(units = units.len(), tests = total, "collection finished");

    let mut reporter = Reporter::new(out, total, options);
    let records = TestRunner::new()
        .run(&mut units, |record| reporter.test_completed(record))
        .context("failed to write test progress")?;

    let summary = RunSummary::new(records, started.elapsed());
    reporter
        .summary(&summary)
        .context("failed to write test summary")?;

    Ok(if summary.failed() > 0 {
        RunStatus::Failed
    } else {
        RunStatus::Passed
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn run_plain(args: &TestArgs) -> (Result<RunStatus>, String) {
        let mut out = Vec::new();
        let status = run_with_output(
            args,
            &mut out,
            ReporterOptions {
                no_color: true,
                width: Some(60),
            },
        );
        (status, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_command_no_tests_found() {
        let dir = tempdir().unwrap();

        let args = TestArgs {
            paths: vec![dir.path().to_path_buf()],
            ..Default::default()
        };

        let (status, out) = run_plain(&args);
        assert_eq!(status.unwrap(), RunStatus::Passed);
        assert!(out.contains("no tests ran in"));
    }

    #[test]
    fn test_command_reports_pass_and_fail() {
        let dir = tempdir().unwrap();
        let unit = dir.path().join("test_mixed.tl");
        fs::write(
            &unit,
            "fn test_ok() {\n    return 1;\n}\n\nfn test_bad() {\n    let a = 1;\n    assert(a == 2, \"a is not 2\");\n}\n",
        )
        .unwrap();
        fs::write(dir.path().join("broken.tl"), "fn test_never( {").unwrap();
        fs::write(dir.path().join("notes.md"), "fn test_never() { }").unwrap();

        let args = TestArgs {
            paths: vec![dir.path().to_path_buf()],
            ..Default::default()
        };

        let (status, out) = run_plain(&args);
        assert_eq!(status.unwrap(), RunStatus::Failed);

        let identity = format!("{}::", unit.display());
        assert!(out.contains(&format!("{}test_ok PASSED", identity)));
        assert!(out.contains(&format!("{}test_bad FAILED", identity)));
        assert!(out.contains(&format!(
            "FAILED {}test_bad - assert(a == 2, \"a is not 2\");",
            identity
        )));
        assert!(out.contains("1 failed, 1 passed in"));
        assert!(!out.contains("test_never"));
    }

    #[test]
    fn test_command_missing_root_is_error() {
        let dir = tempdir().unwrap();
        let args = TestArgs {
            paths: vec![dir.path().join("missing")],
            ..Default::default()
        };

        let (status, out) = run_plain(&args);
        let err = status.unwrap_err();
        assert!(err.to_string().starts_with("path not found"));
        assert!(out.is_empty());
    }

    #[test]
    fn test_command_counts_stable_across_runs() {
        let dir = tempdir().unwrap();
        fs::write(
            dir.path().join("test_a.tl"),
            "fn test_one() { }\nfn test_two() { raise \"no\"; }\n",
        )
        .unwrap();
        fs::create_dir(dir.path().join("sub")).unwrap();
        fs::write(
            dir.path().join("sub/test_b.tl"),
            "var calls = 0;\nfn test_three() { calls = calls + 1; assert(calls == 1); }\n",
        )
        .unwrap();

        let args = TestArgs {
            paths: vec![dir.path().to_path_buf()],
            ..Default::default()
        };
        let footer = |out: &str| {
            out.lines()
                .last()
                .and_then(|line| line.split(" in ").next())
                .map(str::to_string)
        };

        let (first_status, first) = run_plain(&args);
        let (second_status, second) = run_plain(&args);
        assert_eq!(first_status.unwrap(), RunStatus::Failed);
        assert_eq!(second_status.unwrap(), RunStatus::Failed);
        assert!(first.contains("1 failed, 2 passed in"));
        assert_eq!(footer(&first), footer(&second));
    }

    #[test]
    fn test_command_repeated_root_runs_twice() {
        let dir = tempdir().unwrap();
        let unit = dir.path().join("test_one.tl");
        fs::write(&unit, "fn test_only() { }\n").unwrap();

        let args = TestArgs {
            paths: vec![unit.clone(), unit],
            ..Default::default()
        };

        let (status, out) = run_plain(&args);
        assert_eq!(status.unwrap(), RunStatus::Passed);
        assert_eq!(out.matches("test_only PASSED").count(), 2);
        assert!(out.contains("2 passed in"));
    }
}
