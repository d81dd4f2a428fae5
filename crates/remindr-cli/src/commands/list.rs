use anyhow::{Context, Result};
use chrono::Utc;
use owo_colors::OwoColorize;
use remindr_core::parser::parse;
use remindr_core::recurrence::OccurrenceSimulator;
use tracing::debug;

use crate::cli::ListCommand;
use crate::config::Config;
use crate::parser::parse_instant;
use crate::timezone::resolve_timezone;
use crate::views::table::{display_schedules, ViewSchedule};

pub fn list_schedules(command: ListCommand, config: &Config) -> Result<()> {
    let contents = std::fs::read_to_string(&command.file)
        .with_context(|| format!("Failed to read '{}'", command.file.display()))?;
    let (_, tz) = resolve_timezone(command.timezone.as_deref(), &config.default_timezone)?;
    let from = command
        .from
        .as_deref()
        .map(parse_instant)
        .transpose()?
        .unwrap_or_else(Utc::now);
    let count = command.count.unwrap_or(config.occurrence_count);
    let simulator = OccurrenceSimulator::new(config.simulator_config());

    let schedules: Vec<ViewSchedule> = stored_expressions(&contents)
        .map(|(line, expression)| {
            let result = parse(expression)
                .and_then(|parsed| simulator.next_occurrences(&parsed, from, count))
                .map_err(|e| e.to_string());
            if let Err(message) = &result {
                debug!(line, expression, %message, "skipping expression");
            }
            ViewSchedule {
                line,
                expression: expression.to_string(),
                result,
            }
        })
        .collect();

    display_schedules(&schedules, tz);

    let failed = schedules.iter().filter(|s| s.result.is_err()).count();
    if failed > 0 {
        eprintln!(
            "{} {} of {} expressions could not be previewed",
            "Warning:".yellow().bold(),
            failed,
            schedules.len()
        );
    }
    Ok(())
}

/// Non-blank, non-comment lines with their 1-based line numbers.
fn stored_expressions(contents: &str) -> impl Iterator<Item = (usize, &str)> {
    contents
        .lines()
        .enumerate()
        .map(|(i, line)| (i + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_stored_expressions_skips_comments_and_blanks() {
        let contents = "# reminders\nrate(1 day)\n\n  cron(0 9 * * ? *)  \n";
        let lines: Vec<(usize, &str)> = stored_expressions(contents).collect();
        assert_eq!(lines, vec![(2, "rate(1 day)"), (4, "cron(0 9 * * ? *)")]);
    }
}
