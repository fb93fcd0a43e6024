//! Command-line interface integration tests for the `cdt` binary.
//!
//! These verify argument validation, successful runs and error reporting.

use assert_cmd::prelude::*;
use predicates::prelude::*;
use std::process::Command;

fn small_run() -> Result<Command, Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("cdt")?;
    cmd.args(["-n", "36", "-t", "3", "--passes", "10", "--seed", "7"]);
    Ok(cmd)
}

#[test]
fn exit_success() -> Result<(), Box<dyn std::error::Error>> {
    small_run()?.assert().success();
    Ok(())
}

#[test]
fn cdt_cli_reports_summary() -> Result<(), Box<dyn std::error::Error>> {
    small_run()?
        .assert()
        .success()
        .stdout(predicate::str::contains("10 passes"))
        .stdout(predicate::str::contains("N3_31 = "));
    Ok(())
}

#[test]
fn cdt_cli_logs_seed() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = small_run()?;
    cmd.env("RUST_LOG", "info");

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Seed: 7"))
        .stderr(predicate::str::contains("Warm-up complete"));

    Ok(())
}

#[test]
fn cdt_cli_same_seed_same_output() -> Result<(), Box<dyn std::error::Error>> {
    let first = small_run()?.output()?;
    let second = small_run()?.output()?;

    assert!(first.status.success());
    assert_eq!(first.stdout, second.stdout);

    Ok(())
}

#[test]
fn cdt_cli_reference_moves() -> Result<(), Box<dyn std::error::Error>> {
    small_run()?
        .args(["--reference-moves", "--attempts-per-pass", "5", "--skip-warm-up"])
        .assert()
        .success()
        .stdout(predicate::str::contains("50 attempted"));
    Ok(())
}

#[test]
fn cdt_cli_selects_action_form() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = small_run()?;
    cmd.args(["--action", "alpha-minus-one"]).env("RUST_LOG", "info");

    cmd.assert()
        .success()
        .stderr(predicate::str::contains("Action: alpha = -1"));
    Ok(())
}

#[test]
fn cdt_cli_no_args() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("cdt")?;

    cmd.assert().failure().stderr(predicate::str::contains(
        "error: the following required arguments were not provided:",
    ));

    Ok(())
}

#[test]
fn cdt_cli_too_few_timeslices() -> Result<(), Box<dyn std::error::Error>> {
    let mut cmd = Command::cargo_bin("cdt")?;
    cmd.args(["-n", "36", "-t", "2"]);

    cmd.assert().failure().stderr(predicate::str::contains(
        "error: invalid value '2' for '--timeslices <TIMESLICES>'",
    ));

    Ok(())
}

#[test]
fn cdt_cli_invalid_precision() -> Result<(), Box<dyn std::error::Error>> {
    small_run()?
        .args(["--precision", "0"])
        .assert()
        .failure()
        .stderr(predicate::str::contains("Unsupported precision: 0 bits"));
    Ok(())
}

#[test]
fn cdt_cli_invalid_alpha() -> Result<(), Box<dyn std::error::Error>> {
    small_run()?
        .arg("--alpha=-0.5")
        .assert()
        .failure()
        .stderr(predicate::str::contains("Invalid parameters"));
    Ok(())
}
