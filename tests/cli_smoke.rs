use assert_cmd::Command;
use predicates::str::contains;
use tempfile::tempdir;

mod common;

fn quill_cmd() -> Command {
    let mut cmd = Command::cargo_bin("quill").expect("quill binary");
    cmd.env("NO_COLOR", "1");
    cmd
}

#[test]
fn smoke_help_and_version_commands() {
    quill_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("USAGE:"));

    quill_cmd()
        .arg("--version")
        .assert()
        .success()
        .stdout(contains("quill "));
}

#[test]
fn smoke_help_topic_for_check() {
    quill_cmd()
        .args(["help", "check"])
        .assert()
        .success()
        .stdout(contains("USAGE:"))
        .stdout(contains("check"));
}

#[test]
fn smoke_check_complete_overload_group() {
    let tempdir = tempdir().expect("tempdir");
    let source = tempdir.path().join("smoke_abs.ql");
    common::write_source(
        &source,
        "fn abs(x | x < 0) -> int {\n    return 0 - x;\n}\n\nfn abs(x) -> int {\n    return x;\n}\n",
    );

    quill_cmd()
        .args(["check", source.to_str().expect("utf8 path")])
        .assert()
        .success()
        .stdout(contains("check passed for"));
}

#[test]
fn smoke_missing_command_prints_usage() {
    quill_cmd()
        .assert()
        .failure()
        .stderr(contains("missing command"))
        .stderr(contains("USAGE:"));
}

#[test]
fn smoke_unknown_command_is_rejected() {
    quill_cmd()
        .arg("frobnicate")
        .assert()
        .failure()
        .stderr(contains("unknown command 'frobnicate'"));
}
