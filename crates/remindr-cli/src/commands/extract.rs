use anyhow::{Context, Result};
use remindr_core::ExtractedReminder;
use std::io::Read;
use tracing::debug;

use crate::cli::ExtractCommand;
use crate::commands::compile::{compile_spec, print_compiled};
use crate::config::Config;
use crate::timezone::resolve_timezone;

pub fn extract_reminder(command: ExtractCommand, config: &Config) -> Result<()> {
    let payload = read_payload(&command.file)?;
    let reminder = ExtractedReminder::from_json(&payload)?;
    debug!(task = %reminder.task, tags = ?reminder.tags, "extractor payload accepted");

    let (timezone, _) = resolve_timezone(command.timezone.as_deref(), &config.default_timezone)?;
    let spec = reminder
        .into_spec(&timezone)
        .with_context(|| format!("Cannot schedule '{}'", reminder.task))?;
    let compiled = compile_spec(spec, Some(&reminder.task), config)?;
    print_compiled(&compiled, command.json)
}

fn read_payload(file: &str) -> Result<String> {
    if file == "-" {
        let mut payload = String::new();
        std::io::stdin()
            .read_to_string(&mut payload)
            .context("Failed to read payload from stdin")?;
        Ok(payload)
    } else {
        std::fs::read_to_string(file).with_context(|| format!("Failed to read '{}'", file))
    }
}
