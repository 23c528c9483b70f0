use assert_cmd::cargo::cargo_bin_cmd;
use predicates::prelude::*;
use std::io::Write;
use tempfile::NamedTempFile;

const INCOMPLETE_GROUP: &str = "fn half(x | x > 0) -> int {\n    return x / 2;\n}\n";

const UNREACHABLE_GROUP: &str = "fn sign(x | x > 0) -> int {\n    return 1;\n}\n\nfn sign(x | x > 5) -> int {\n    return 2;\n}\n\nfn sign(x) -> int {\n    return 0;\n}\n";

const COMPLETE_GROUP: &str = "fn abs(x | x < 0) -> int {\n    return 0 - x;\n}\n\nfn abs(x) -> int {\n    return x;\n}\n";

fn temp_source(contents: &str) -> Result<NamedTempFile, Box<dyn std::error::Error>> {
    let mut file = NamedTempFile::new()?;
    file.write_all(contents.as_bytes())?;
    file.flush()?;
    Ok(file)
}

#[test]
fn check_reports_incomplete_guard_group() -> Result<(), Box<dyn std::error::Error>> {
    let file = temp_source(INCOMPLETE_GROUP)?;

    cargo_bin_cmd!("quill")
        .env("NO_COLOR", "1")
        .args(["check", file.path().to_str().unwrap()])
        .assert()
        .failure()
        .stdout(predicate::str::contains("check completed with diagnostics:"))
        .stderr(predicate::str::contains("error[E1001]"))
        .stderr(predicate::str::contains("overload group `half/1` is incomplete"))
        .stderr(predicate::str::contains("diagnostics reported; see above"));

    Ok(())
}

#[test]
fn check_succeeds_when_only_warnings_remain() -> Result<(), Box<dyn std::error::Error>> {
    let file = temp_source(UNREACHABLE_GROUP)?;

    cargo_bin_cmd!("quill")
        .env("NO_COLOR", "1")
        .args(["check", file.path().to_str().unwrap()])
        .assert()
        .success()
        .stdout(predicate::str::contains("check completed with diagnostics:"))
        .stdout(predicate::str::contains("warning[W1002]"))
        .stdout(predicate::str::contains("overload `sign/1` #2 is unreachable"))
        .stdout(predicate::str::contains("already covered by overload #1"));

    Ok(())
}

#[test]
fn check_reports_parse_errors_and_fails() -> Result<(), Box<dyn std::error::Error>> {
    let file = temp_source("fn broken(x) {\n    return x\n}\n")?;

    cargo_bin_cmd!("quill")
        .env("NO_COLOR", "1")
        .args(["check", file.path().to_str().unwrap()])
        .assert()
        .failure()
        .stderr(predicate::str::contains("expected `;`"));

    Ok(())
}

#[test]
fn json_error_format_routes_diagnostics_to_stdout() -> Result<(), Box<dyn std::error::Error>> {
    let file = temp_source(INCOMPLETE_GROUP)?;

    cargo_bin_cmd!("quill")
        .env("NO_COLOR", "1")
        .args([
            "check",
            file.path().to_str().unwrap(),
            "--error-format",
            "json",
        ])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"version\":\"1.0.0\""))
        .stdout(predicate::str::contains("\"severity\":\"error\""))
        .stdout(predicate::str::contains("E1001"));

    Ok(())
}

#[test]
fn error_format_env_variable_is_honoured() -> Result<(), Box<dyn std::error::Error>> {
    let file = temp_source(INCOMPLETE_GROUP)?;

    cargo_bin_cmd!("quill")
        .env("NO_COLOR", "1")
        .env("QUILL_ERROR_FORMAT", "json")
        .args(["check", file.path().to_str().unwrap()])
        .assert()
        .failure()
        .stdout(predicate::str::contains("\"version\":\"1.0.0\""));

    Ok(())
}

#[test]
fn human_error_format_renders_caret_snippets() -> Result<(), Box<dyn std::error::Error>> {
    let file = temp_source(INCOMPLETE_GROUP)?;

    cargo_bin_cmd!("quill")
        .env("NO_COLOR", "1")
        .args([
            "check",
            file.path().to_str().unwrap(),
            "--error-format",
            "human",
        ])
        .assert()
        .failure()
        .stderr(predicate::str::contains("-->"))
        .stderr(predicate::str::contains("^^^"));

    Ok(())
}

#[test]
fn json_logs_carry_pipeline_stages_on_stderr() -> Result<(), Box<dyn std::error::Error>> {
    let file = temp_source(COMPLETE_GROUP)?;

    cargo_bin_cmd!("quill")
        .env("NO_COLOR", "1")
        .env_remove("RUST_LOG")
        .args([
            "check",
            file.path().to_str().unwrap(),
            "--log-format",
            "json",
        ])
        .assert()
        .success()
        .stdout(predicate::str::contains("check passed for"))
        .stderr(predicate::str::contains("\"stage\":\"driver.check.start\""))
        .stderr(predicate::str::contains("\"stage\":\"driver.check.complete\""));

    Ok(())
}

#[test]
fn lsp_command_rejects_error_format_flag() -> Result<(), Box<dyn std::error::Error>> {
    cargo_bin_cmd!("quill")
        .args(["lsp", "--error-format", "json"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("lsp does not accept --error-format"));

    Ok(())
}
