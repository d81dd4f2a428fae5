use anyhow::{Context, Result};
use chrono::Utc;
use remindr_core::parser::parse;
use remindr_core::recurrence::OccurrenceSimulator;
use tracing::debug;

use crate::cli::NextCommand;
use crate::config::Config;
use crate::parser::parse_instant;
use crate::timezone::resolve_timezone;
use crate::views::table::display_occurrences;

pub fn next_occurrences(command: NextCommand, config: &Config) -> Result<()> {
    let expression = parse(&command.expression)
        .with_context(|| format!("Cannot read '{}'", command.expression))?;
    let (_, tz) = resolve_timezone(command.timezone.as_deref(), &config.default_timezone)?;
    let now = Utc::now();
    let from = command.from.as_deref().map(parse_instant).transpose()?.unwrap_or(now);
    let count = command.count.unwrap_or(config.occurrence_count);

    debug!(%expression, %from, count, "simulating");
    let simulator = OccurrenceSimulator::new(config.simulator_config());
    let occurrences = simulator.next_occurrences(&expression, from, count)?;

    if command.json {
        println!("{}", serde_json::to_string_pretty(&occurrences)?);
    } else {
        display_occurrences(&occurrences, tz, now);
    }
    Ok(())
}
