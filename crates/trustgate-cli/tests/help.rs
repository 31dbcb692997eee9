use assert_cmd::Command;
use predicates::prelude::*;

/// Helper to get a Command for the trustgate binary.
#[allow(deprecated)]
fn trustgate_cmd() -> Command {
    Command::cargo_bin("trustgate").unwrap()
}

#[test]
fn help_works() {
    trustgate_cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(predicate::str::contains("evaluate"))
        .stdout(predicate::str::contains("simulate"))
        .stdout(predicate::str::contains("compile"))
        .stdout(predicate::str::contains("explain"));
}

#[test]
fn explain_known_reason() {
    trustgate_cmd()
        .args(["explain", "policy_not_found"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Remediation"));
}

#[test]
fn explain_unknown_lists_alternatives() {
    trustgate_cmd()
        .args(["explain", "nonsense"])
        .assert()
        .code(1)
        .stderr(predicate::str::contains("Reasons:"))
        .stderr(predicate::str::contains("greaterThanOrEqual"));
}

#[test]
fn explain_operator_shows_evaluated_example() {
    trustgate_cmd()
        .args(["explain", "lessThan"])
        .assert()
        .success()
        .stdout(predicate::str::contains("Trust order: UNKNOWN < BASIC"))
        .stdout(predicate::str::contains("outcome:   allow (matched)"));
}
