use std::path::PathBuf;

use super::*;
use crate::logging::{LogFormat, LogLevel};

fn expect_cli_ok<I, T>(args: I) -> Cli
where
    I: IntoIterator<Item = T>,
    T: Into<String>,
{
    match Cli::parse_from(args.into_iter()) {
        Ok(cli) => cli,
        Err(err) => panic!("expected CLI parse to succeed, found error: {err}"),
    }
}

#[test]
fn registry_resolves_canonical_and_alias_commands() {
    let registry = registry();
    assert!(registry.resolve("check").is_some());
    assert!(registry.resolve("lsp").is_some());
    assert!(
        registry.resolve("serve").is_some(),
        "serve must resolve as an lsp alias"
    );
    assert!(registry.resolve("nonexistent").is_none());
}

#[test]
fn check_collects_inputs_and_flags() {
    let cli = expect_cli_ok([
        "check",
        "a.ql",
        "b.ql",
        "--error-format",
        "json",
        "--log-level",
        "debug",
        "--log-format",
        "text",
    ]);
    let Command::Check { inputs } = cli.command else {
        panic!("expected check command");
    };
    assert_eq!(inputs, vec![PathBuf::from("a.ql"), PathBuf::from("b.ql")]);
    assert_eq!(cli.error_format, Some(ErrorFormat::Json));
    assert_eq!(cli.log_options.level, LogLevel::Debug);
    assert_eq!(cli.log_options.format, LogFormat::Text);
}

#[test]
fn check_requires_at_least_one_input() {
    let err = Cli::parse_from(["check"].into_iter()).expect_err("missing input must fail");
    assert!(err.to_string().contains("check requires <file> argument"));
}

#[test]
fn check_rejects_unknown_flags() {
    let err = Cli::parse_from(["check", "a.ql", "--frobnicate"].into_iter())
        .expect_err("unknown flag must fail");
    assert!(err.to_string().contains("unsupported option '--frobnicate'"));
}

#[test]
fn check_rejects_invalid_error_format() {
    let err = Cli::parse_from(["check", "a.ql", "--error-format", "yaml"].into_iter())
        .expect_err("invalid format must fail");
    assert!(err.to_string().contains("invalid --error-format 'yaml'"));
}

#[test]
fn flag_values_must_be_present() {
    let err = Cli::parse_from(["check", "a.ql", "--log-level"].into_iter())
        .expect_err("dangling flag must fail");
    assert!(err.to_string().contains("expected value after --log-level"));
}

#[test]
fn help_flag_on_check_surfaces_command_topic() {
    let cli = expect_cli_ok(["check", "--help"]);
    assert!(matches!(cli.command, Command::Help { topic: Some(ref t) } if t == "check"));
    let cli = expect_cli_ok(["check", "a.ql", "-h"]);
    assert!(matches!(cli.command, Command::Help { topic: Some(ref t) } if t == "check"));
}

#[test]
fn lsp_parses_with_and_without_alias() {
    assert!(matches!(expect_cli_ok(["lsp"]).command, Command::Lsp));
    assert!(matches!(expect_cli_ok(["serve"]).command, Command::Lsp));
    let cli = expect_cli_ok(["lsp", "--log-level", "trace"]);
    assert!(matches!(cli.command, Command::Lsp));
    assert_eq!(cli.log_options.level, LogLevel::Trace);
}

#[test]
fn lsp_rejects_error_format_flag() {
    let err = Cli::parse_from(["lsp", "--error-format", "json"].into_iter())
        .expect_err("lsp must reject --error-format");
    assert!(err.to_string().contains("lsp does not accept --error-format"));
}

#[test]
fn version_and_help_entrypoints() {
    assert!(matches!(expect_cli_ok(["version"]).command, Command::Version));
    assert!(matches!(
        expect_cli_ok(["--version"]).command,
        Command::Version
    ));
    assert!(matches!(
        expect_cli_ok(["help"]).command,
        Command::Help { topic: None }
    ));
    let cli = expect_cli_ok(["help", "LSP"]);
    assert!(
        matches!(cli.command, Command::Help { topic: Some(ref t) } if t == "lsp"),
        "help topics are lowercased"
    );
}

#[test]
fn missing_and_unknown_commands_error_with_usage() {
    let err = Cli::parse_from(std::iter::empty::<String>()).expect_err("missing command");
    assert!(err.to_string().contains("missing command"));
    assert!(err.to_string().contains("USAGE:"), "usage text attached");
    let err = Cli::parse_from(["explode"].into_iter()).expect_err("unknown command");
    assert!(err.to_string().contains("unknown command 'explode'"));
}

#[test]
fn cli_error_display_round_trips_message() {
    let err = CliError::new("oops");
    assert_eq!(err.to_string(), "oops");
}

#[test]
fn help_topics_render_for_every_command() {
    for topic in ["check", "lsp", "serve", "version"] {
        let rendered =
            Cli::help_for(topic).unwrap_or_else(|err| panic!("help for {topic}: {err}"));
        assert!(rendered.contains("USAGE:"), "{topic} help should show usage");
    }
    assert!(Cli::help_for("fmt").is_err());
    assert!(Cli::usage().contains("COMMANDS:"));
}
