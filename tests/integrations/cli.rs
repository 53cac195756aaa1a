use assert_cmd::Command;
use predicates::prelude::*;

#[test]
fn test_help_lists_agent_options() {
    Command::cargo_bin("miniapm")
        .unwrap()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("--interval-ms"))
        .stdout(predicate::str::contains("--app-name"));
}

#[test]
fn test_zero_interval_exits_with_error() {
    Command::cargo_bin("miniapm")
        .unwrap()
        .args(["--interval-ms", "0"])
        .assert()
        .failure()
        .code(1);
}
