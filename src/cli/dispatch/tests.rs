use std::fs;

use tempfile::tempdir;

use super::commands::dispatch_command;
use super::reporting::{print_report_diagnostics_to, report_error_to};
use crate::cli::{CliError, Command};
use crate::diagnostics::{ColorMode, Diagnostic, DiagnosticCode, ErrorFormat, FormatOptions, Span};
use crate::driver::{CheckReport, Driver};
use crate::error::Error;
use crate::frontend::parser::ParseError;
use crate::guards::GuardConfig;

fn test_format_options() -> FormatOptions {
    FormatOptions {
        format: ErrorFormat::Human,
        color: ColorMode::Never,
        is_terminal: false,
    }
}

fn sample_report() -> CheckReport {
    let mut report = CheckReport::default();
    let file_id = report
        .files
        .add_file("sample.ql", "fn f(x | x > 0) { return x; }\n");
    report.diagnostics.push(
        Diagnostic::error(
            "overload group `f/1` is incomplete: guards do not cover all possible inputs",
            Some(Span::in_file(file_id, 0, 2)),
        )
        .with_code(DiagnosticCode::new("E1001", Some("guards".into()))),
    );
    report
}

#[test]
fn report_diagnostics_render_into_buffer() {
    let report = sample_report();
    let mut buffer = Vec::new();
    print_report_diagnostics_to(&report, test_format_options(), &mut buffer).unwrap();
    let text = String::from_utf8(buffer).unwrap();
    assert!(text.contains("error[E1001]"), "header: {text}");
    assert!(text.contains("sample.ql:1:1"), "location: {text}");
}

#[test]
fn empty_report_writes_nothing() {
    let report = CheckReport::default();
    let mut buffer = Vec::new();
    print_report_diagnostics_to(&report, test_format_options(), &mut buffer).unwrap();
    assert!(buffer.is_empty());
}

#[test]
fn parse_errors_render_their_diagnostics() {
    let parse_err = ParseError::new(
        "expected `;`, found `}`",
        vec![Diagnostic::error(
            "expected `;`, found `}`",
            Some(Span::new(19, 20)),
        )],
    )
    .with_file("broken.ql", "fn f(x) { return x }\n");
    let err = Error::from(parse_err);
    let mut buffer = Vec::new();
    report_error_to(&err, &mut buffer).unwrap();
    let text = String::from_utf8(buffer).unwrap();
    assert!(
        text.starts_with("error: expected `;`, found `}`"),
        "summary line first: {text}"
    );
    assert!(text.contains("broken.ql"), "rendered location: {text}");
}

#[test]
fn cli_errors_render_plainly() {
    let err = Error::from(CliError::new("bad flag"));
    let mut buffer = Vec::new();
    report_error_to(&err, &mut buffer).unwrap();
    let text = String::from_utf8(buffer).unwrap();
    assert!(text.starts_with("bad flag"));
}

#[test]
fn dispatch_resolves_version_and_help() {
    let driver = Driver::with_config(GuardConfig::default());
    assert!(dispatch_command(&driver, Command::Version, test_format_options()).is_ok());
    assert!(
        dispatch_command(
            &driver,
            Command::Help { topic: None },
            test_format_options()
        )
        .is_ok()
    );
    assert!(
        dispatch_command(
            &driver,
            Command::Help {
                topic: Some("check".into())
            },
            test_format_options()
        )
        .is_ok()
    );
    let unknown = dispatch_command(
        &driver,
        Command::Help {
            topic: Some("fmt".into()),
        },
        test_format_options(),
    );
    assert!(matches!(unknown, Err(Error::Cli(_))));
}

#[test]
fn dispatch_check_maps_guard_errors_to_cli_failure() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("gap.ql");
    fs::write(&path, "fn f(x | x > 0) { return x; }\n").unwrap();
    let driver = Driver::with_config(GuardConfig::default());
    let result = dispatch_command(
        &driver,
        Command::Check { inputs: vec![path] },
        test_format_options(),
    );
    assert!(matches!(result, Err(Error::Cli(_))));
}

#[test]
fn dispatch_check_passes_clean_files() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("clean.ql");
    fs::write(
        &path,
        "fn abs(x | x < 0) { return 0 - x; }\nfn abs(x) { return x; }\n",
    )
    .unwrap();
    let driver = Driver::with_config(GuardConfig::default());
    let result = dispatch_command(
        &driver,
        Command::Check { inputs: vec![path] },
        test_format_options(),
    );
    assert!(result.is_ok());
}
