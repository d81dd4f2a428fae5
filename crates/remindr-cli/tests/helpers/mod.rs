use assert_cmd::Command;
use std::path::{Path, PathBuf};
use tempfile::TempDir;

/// Runs the CLI inside a scratch directory so no stray `config.toml` is
/// picked up, with UTC as the default timezone.
pub struct CliTestHarness {
    temp_dir: TempDir,
}

impl CliTestHarness {
    pub fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("Failed to create temp directory");
        Self { temp_dir }
    }

    /// Get a Command instance configured for testing
    pub fn command(&self) -> Command {
        let mut cmd = Command::cargo_bin("remindr").expect("Failed to find remindr binary");
        cmd.current_dir(self.temp_dir.path())
            .env("REMINDR_DEFAULT_TIMEZONE", "UTC")
            .env_remove("REMINDR_OCCURRENCE_COUNT")
            .env_remove("RUST_LOG");
        cmd
    }

    pub fn dir(&self) -> &Path {
        self.temp_dir.path()
    }

    /// Writes `contents` to a file in the scratch directory.
    pub fn write_file(&self, name: &str, contents: &str) -> PathBuf {
        let path = self.temp_dir.path().join(name);
        std::fs::write(&path, contents).expect("Failed to write test file");
        path
    }

    /// Helper to run a command and assert success
    pub fn run_success(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().success()
    }

    /// Helper to run a command and assert failure
    pub fn run_failure(&self, args: &[&str]) -> assert_cmd::assert::Assert {
        self.command().args(args).assert().failure()
    }
}

/// Common test fixtures
pub struct TestFixtures;

impl TestFixtures {
    /// 14-10-2024 11:00 AM in Kolkata
    pub fn kolkata_anchor_args() -> Vec<&'static str> {
        vec![
            "compile",
            "--date",
            "14-10-2024",
            "--time",
            "11:00 AM",
            "--timezone",
            "Asia/Kolkata",
        ]
    }

    pub fn extractor_payload() -> &'static str {
        r#"{
            "task": "water the plants",
            "start_date_phrase": "next monday",
            "start_date": "14-10-2024",
            "time": "11:00 AM",
            "repeat_frequency": {"weekly": 1, "selected_days_of_week": [2, 4]},
            "tags": ["garden"]
        }"#
    }
}

/// Utility functions for test assertions
pub mod assertions {
    use predicates::prelude::*;

    pub fn compiled_successfully() -> impl Predicate<str> {
        predicate::str::contains("✓")
    }

    pub fn has_occurrence_table_headers() -> impl Predicate<str> {
        predicate::str::contains("UTC")
            .and(predicate::str::contains("Local"))
            .and(predicate::str::contains("When"))
    }

    pub fn has_error() -> impl Predicate<str> {
        predicate::str::contains("Error")
    }
}
