/// Black-box tests for the remindr CLI.
///
/// Every test runs in its own scratch directory with UTC as the default
/// timezone, and pins `--from` wherever output depends on the clock.

use predicates::prelude::*;

mod helpers;
use helpers::{assertions, CliTestHarness, TestFixtures};

#[test]
fn test_cli_help_and_version() {
    let harness = CliTestHarness::new();

    harness
        .run_success(&["--help"])
        .stdout(predicate::str::contains("schedule expressions"))
        .stdout(predicate::str::contains("compile"))
        .stdout(predicate::str::contains("next"));

    harness
        .run_success(&["--version"])
        .stdout(predicate::str::contains("remindr"));

    harness
        .run_failure(&["invalid-command"])
        .stderr(predicate::str::contains("error"));
}

#[test]
fn test_compile_daily_reminder() {
    let harness = CliTestHarness::new();
    let mut args = TestFixtures::kolkata_anchor_args();
    args.extend(["--every-days", "1"]);

    harness
        .run_success(&args)
        .stdout(assertions::compiled_successfully())
        .stdout(predicate::str::contains("rate(1 day)"))
        .stdout(predicate::str::contains("every day"));
}

#[test]
fn test_compile_weekly_reminder_with_task() {
    let harness = CliTestHarness::new();
    let mut args = TestFixtures::kolkata_anchor_args();
    args.extend(["--on", "mon,wed", "--task", "water the plants"]);

    harness
        .run_success(&args)
        .stdout(predicate::str::contains("cron(30 5 ? * 2,4 *)"))
        .stdout(predicate::str::contains(
            "I will remind you to water the plants on Monday, Wednesday",
        ));
}

#[test]
fn test_compile_monthly_and_yearly() {
    let harness = CliTestHarness::new();

    let mut monthly = TestFixtures::kolkata_anchor_args();
    monthly.extend(["--monthly", "--days", "1,15"]);
    harness
        .run_success(&monthly)
        .stdout(predicate::str::contains("cron(30 5 1,15 * ? *)"))
        .stdout(predicate::str::contains("every 1st, 15th of the month"));

    let mut yearly = TestFixtures::kolkata_anchor_args();
    yearly.push("--yearly");
    harness
        .run_success(&yearly)
        .stdout(predicate::str::contains("cron(30 5 14 10 ? *)"))
        .stdout(predicate::str::contains("every year on 14 October"));
}

#[test]
fn test_compile_json_output() {
    let harness = CliTestHarness::new();
    let output = harness
        .command()
        .args([
            "compile", "--date", "01-01-2025", "--time", "09:00", "--task", "file taxes", "--json",
        ])
        .output()
        .expect("Failed to run remindr");
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    assert_eq!(json["expression"], "at(2025-01-01T09:00:00)");
    assert_eq!(json["summary"], "I will remind you to file taxes on 01-01-2025 at 09:00 AM");
    assert_eq!(json["spec"]["timezone"], "UTC");
    assert_eq!(json["spec"]["pattern"]["type"], "one_time");
    assert!(json["next"].is_array());
}

#[test]
fn test_compile_errors() {
    let harness = CliTestHarness::new();

    // 02:30 does not exist in New York on 10 March 2024
    harness
        .run_failure(&[
            "compile", "--date", "10-03-2024", "--time", "02:30 AM", "--timezone",
            "America/New_York", "--on", "sun",
        ])
        .stderr(assertions::has_error())
        .stderr(predicate::str::contains("daylight-saving"));

    harness
        .run_failure(&["compile", "--every-days", "2", "--yearly"])
        .stderr(predicate::str::contains("cannot be used with"));

    harness
        .run_failure(&["compile", "--timezone", "Mars/Olympus"])
        .stderr(predicate::str::contains("Invalid timezone"));

    harness
        .run_failure(&["compile", "--every-days", "0"])
        .stderr(predicate::str::contains("Invalid recurrence spec"));
}

#[test]
fn test_next_shows_occurrence_table() {
    let harness = CliTestHarness::new();

    harness
        .run_success(&[
            "next", "rate(1 day)", "--from", "2024-10-14T05:30:00Z", "--count", "2",
            "--timezone", "Asia/Kolkata",
        ])
        .stdout(assertions::has_occurrence_table_headers())
        .stdout(predicate::str::contains("2024-10-15 05:30"))
        .stdout(predicate::str::contains("2024-10-16 11:00 IST"))
        .stdout(predicate::str::contains("2024-10-17").not());
}

#[test]
fn test_next_json_output() {
    let harness = CliTestHarness::new();
    let output = harness
        .command()
        .args(["next", "cron(30 5 ? * 2,4 *)", "--from", "2024-10-14T05:30:00Z", "--json"])
        .output()
        .expect("Failed to run remindr");
    assert!(output.status.success());

    let json: serde_json::Value = serde_json::from_slice(&output.stdout).expect("stdout is JSON");
    let fire_times: Vec<&str> = json
        .as_array()
        .expect("an array of occurrences")
        .iter()
        .map(|o| o["fire_at"].as_str().unwrap())
        .collect();
    assert_eq!(
        fire_times,
        vec!["2024-10-16T05:30:00Z", "2024-10-21T05:30:00Z", "2024-10-23T05:30:00Z"]
    );
}

#[test]
fn test_next_expired_and_malformed() {
    let harness = CliTestHarness::new();

    harness
        .run_success(&["next", "at(2025-01-01T09:00:00)", "--from", "2025-06-01T00:00:00Z"])
        .stdout(predicate::str::contains("No upcoming occurrences."));

    harness
        .run_failure(&["next", "cron(0 9 * * * *)"])
        .stderr(predicate::str::contains("Malformed schedule expression"));

    harness
        .run_failure(&["next", "cron(0 9 30 2 ? *)"])
        .stderr(predicate::str::contains("Schedule can never fire"));
}

#[test]
fn test_extract_from_file_and_stdin() {
    let harness = CliTestHarness::new();
    let payload = harness.write_file("payload.json", TestFixtures::extractor_payload());

    harness
        .run_success(&["extract", payload.to_str().unwrap(), "--timezone", "Asia/Kolkata"])
        .stdout(predicate::str::contains("cron(30 5 ? * 2,4 *)"))
        .stdout(predicate::str::contains("I will remind you to water the plants"));

    harness
        .command()
        .args(["extract", "-"])
        .write_stdin(TestFixtures::extractor_payload())
        .assert()
        .success()
        .stdout(predicate::str::contains("cron(0 11 ? * 2,4 *)"));
}

#[test]
fn test_extract_rejects_contradictions() {
    let harness = CliTestHarness::new();
    let payload = harness.write_file(
        "payload.json",
        r#"{"task": "x", "start_date": "14-10-2024", "repeat_frequency": {"daily": 1, "monthly": 2}}"#,
    );

    harness
        .run_failure(&["extract", payload.to_str().unwrap()])
        .stderr(predicate::str::contains("Invalid recurrence spec"));

    harness
        .run_failure(&["extract", "missing.json"])
        .stderr(predicate::str::contains("Failed to read"));
}

#[test]
fn test_list_continues_past_bad_lines() {
    let harness = CliTestHarness::new();
    let file = harness.write_file(
        "schedules.txt",
        "# stored expressions\nrate(2 hours)\ncron(0 9 * *)\n\ncron(0 8 ? * MON-FRI *)\n",
    );

    harness
        .run_success(&["list", file.to_str().unwrap(), "--from", "2024-06-01T12:00:00Z", "-n", "1"])
        .stdout(predicate::str::contains("rate(2 hours)"))
        .stdout(predicate::str::contains("2024-06-01 14:00"))
        .stdout(predicate::str::contains("Malformed schedule expression"))
        .stdout(predicate::str::contains("2024-06-03 08:00"))
        .stderr(predicate::str::contains("1 of 3 expressions"));
}

#[test]
fn test_config_file_and_verbose_logging() {
    let harness = CliTestHarness::new();
    std::fs::write(harness.dir().join("config.toml"), "occurrence_count = 5\n")
        .expect("Failed to write config");

    harness
        .run_success(&["next", "rate(1 day)", "--from", "2024-10-14T05:30:00Z", "-v"])
        .stdout(predicate::str::contains("2024-10-19 05:30"))
        .stderr(predicate::str::contains("DEBUG"));
}
