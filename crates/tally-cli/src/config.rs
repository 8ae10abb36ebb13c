//! CLI configuration via environment variables
//!
//! tally has no configuration file; the environment supplies defaults
//! that command-line flags add to.

use std::env;

/// CLI configuration loaded from environment variables
#[derive(Debug, Clone, Default)]
pub struct Config {
    /// Disable colored output (TALLY_NO_COLOR=1 or NO_COLOR=1)
    pub no_color: bool,
    /// Extra directory names to skip (TALLY_IGNORE=fixtures,vendor)
    pub ignore: Vec<String>,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self {
            no_color: env::var_os("TALLY_NO_COLOR").is_some() || env::var_os("NO_COLOR").is_some(),
            ignore: env::var("TALLY_IGNORE")
                .map(|v| parse_list(&v))
                .unwrap_or_default(),
        }
    }
}

/// Split a comma separated list, dropping blanks
fn parse_list(value: &str) -> Vec<String> {
    value
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("", vec![])]
    #[case("fixtures", vec!["fixtures"])]
    #[case("fixtures, vendor,,", vec!["fixtures", "vendor"])]
    fn test_parse_list(#[case] input: &str, #[case] expected: Vec<&str>) {
        assert_eq!(parse_list(input), expected);
    }

    #[test]
    fn test_config_from_env() {
        // All environment assertions live in one test to avoid races
        env::remove_var("TALLY_NO_COLOR");
        env::remove_var("NO_COLOR");
        env::remove_var("TALLY_IGNORE");

        let config = Config::from_env();
        assert!(!config.no_color);
        assert!(config.ignore.is_empty());

        env::set_var("NO_COLOR", "1");
        env::set_var("TALLY_IGNORE", "fixtures,build");
        let config = Config::from_env();
        assert!(config.no_color);
        assert_eq!(config.ignore, vec!["fixtures", "build"]);
        env::remove_var("NO_COLOR");
        env::remove_var("TALLY_IGNORE");

        env::set_var("TALLY_NO_COLOR", "1");
        assert!(Config::from_env().no_color);
        env::remove_var("TALLY_NO_COLOR");
    }
}
