//! Integration tests for CLI argument handling
//!
//! Tests flag parsing and startup validation from the command line. Every
//! invocation here exits before the terminal UI starts.

use std::process::Command;

/// Helper to run the CLI with given args and capture output
fn run_cli(args: &[&str]) -> std::process::Output {
    Command::new(env!("CARGO_BIN_EXE_lingolah"))
        .args(args)
        .output()
        .expect("Failed to execute lingolah")
}

#[test]
fn test_help_flag_exits_successfully() {
    let output = run_cli(&["--help"]);
    assert!(
        output.status.success(),
        "Expected --help to exit successfully"
    );
    let stdout = String::from_utf8_lossy(&output.stdout);
    assert!(stdout.contains("lingolah"), "Help should mention lingolah");
    assert!(stdout.contains("--region"), "Help should mention --region flag");
    assert!(
        stdout.contains("--per-term"),
        "Help should mention --per-term flag"
    );
}

#[test]
fn test_zero_timeout_prints_error_and_exits() {
    let output = run_cli(&["--timeout", "0"]);
    assert!(!output.status.success(), "Expected zero timeout to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Invalid timeout"),
        "Should print error message about the timeout: {}",
        stderr
    );
}

#[test]
fn test_invalid_region_prints_error_and_exits() {
    let output = run_cli(&["--region", "M Y"]);
    assert!(!output.status.success(), "Expected invalid region to fail");
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        stderr.contains("Invalid region"),
        "Should print error message about the region: {}",
        stderr
    );
}

#[test]
fn test_missing_glossary_file_exits() {
    let output = run_cli(&["--glossary", "/nonexistent/lingo.json"]);
    assert!(!output.status.success());
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(stderr.contains("glossary"), "Unexpected stderr: {}", stderr);
}

#[test]
fn test_unknown_flag_is_rejected() {
    let output = run_cli(&["--plan"]);
    assert!(!output.status.success());
}

#[test]
fn test_flags_are_accepted_with_help() {
    // With --help, it should succeed regardless of other flags
    let output = run_cli(&["--no-stream", "--per-term", "--region", "sbh", "--help"]);
    assert!(output.status.success());
}

#[cfg(test)]
mod unit_tests {
    //! Unit tests for CLI parsing that don't require running the binary

    use std::time::Duration;

    use clap::Parser;
    use lingolah::cache::FetchPolicy;
    use lingolah::cli::{parse_region_arg, Cli, CliError, StartupConfig};

    #[test]
    fn test_startup_config_default() {
        let config = StartupConfig::default();
        assert!(config.streaming);
        assert_eq!(config.policy, FetchPolicy::SessionExclusive);
        assert_eq!(config.timeout, Duration::from_secs(60));
        assert_eq!(config.glossary.len(), 6);
    }

    #[test]
    fn test_cli_timeout_flag() {
        let cli = Cli::parse_from(["lingolah", "--timeout", "5"]);
        let config = StartupConfig::from_cli(&cli).unwrap();
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_cli_non_numeric_timeout_is_a_parse_error() {
        let result = Cli::try_parse_from(["lingolah", "--timeout", "soon"]);
        assert!(result.is_err());
    }

    #[test]
    fn test_parse_region_arg_returns_upper_case() {
        assert_eq!(parse_region_arg("sg").unwrap(), "SG");
    }

    #[test]
    fn test_parse_region_arg_empty_returns_error() {
        assert!(matches!(
            parse_region_arg(""),
            Err(CliError::InvalidRegion(_))
        ));
    }
}
