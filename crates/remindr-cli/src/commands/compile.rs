use anyhow::{Context, Result};
use chrono::{Duration, Utc};
use owo_colors::{OwoColorize, Style};
use remindr_core::extract::parse_time;
use remindr_core::models::{Pattern, RecurrenceSpec};
use remindr_core::recurrence::{Occurrence, OccurrenceSimulator};
use remindr_core::{describe, reminder_summary, Expression, ExpressionCompiler};
use serde::Serialize;
use tracing::debug;

use crate::cli::CompileCommand;
use crate::config::Config;
use crate::parser::{parse_start_date, parse_weekdays};
use crate::timezone::{format_local, resolve_timezone};

/// What `compile` and `extract` report.
#[derive(Debug, Serialize)]
pub struct CompiledReminder {
    pub expression: Expression,
    pub summary: String,
    pub spec: RecurrenceSpec,
    pub next: Vec<Occurrence>,
}

pub fn compile_reminder(command: CompileCommand, config: &Config) -> Result<()> {
    let (timezone, tz) = resolve_timezone(command.timezone.as_deref(), &config.default_timezone)?;
    let date = parse_start_date(&command.date, tz)?;
    let time = parse_time(command.time.as_deref().unwrap_or(&config.default_time))?;
    let pattern = pattern_from_command(&command)?;

    let spec = RecurrenceSpec::new(date, time, timezone, pattern);
    let compiled = compile_spec(spec, command.task.as_deref(), config)?;
    print_compiled(&compiled, command.json)
}

fn pattern_from_command(command: &CompileCommand) -> Result<Pattern> {
    let pattern = if let Some(hours) = command.every_hours {
        Pattern::IntervalHours(hours)
    } else if let Some(days) = command.every_days {
        Pattern::IntervalDays(days)
    } else if let Some(weeks) = command.every_weeks {
        Pattern::IntervalWeeks(weeks)
    } else if !command.on.is_empty() {
        Pattern::WeeklyOnDays(parse_weekdays(&command.on)?)
    } else if command.monthly {
        Pattern::MonthlyOnDays(command.days.iter().copied().collect())
    } else if command.yearly {
        Pattern::Yearly
    } else {
        Pattern::OneTime
    };
    Ok(pattern)
}

/// Compiles `spec` and previews its first occurrences from the anchor.
pub fn compile_spec(spec: RecurrenceSpec, task: Option<&str>, config: &Config) -> Result<CompiledReminder> {
    debug!(?spec, "compiling reminder");
    let compiler = ExpressionCompiler::new(config.compiler_config());
    let expression = compiler.compile(&spec).with_context(|| {
        format!(
            "Cannot schedule {} at {} ({})",
            spec.anchor_date.format("%d-%m-%Y"),
            spec.anchor_time.format("%I:%M %p"),
            spec.timezone
        )
    })?;
    debug!(%expression, "compiled");

    let summary = match task {
        Some(task) => reminder_summary(task, &spec),
        None => describe(&spec.pattern, spec.anchor_local()),
    };

    let anchor = spec.anchor_utc()?;
    // A cron anchor is itself a fire time; a rate starts counting from it.
    let from = match &expression {
        Expression::Cron(_) => (anchor - Duration::seconds(1)).max(Utc::now()),
        Expression::Rate(_) => anchor.max(Utc::now()),
        Expression::At(_) => Utc::now(),
    };
    let simulator = OccurrenceSimulator::new(config.simulator_config());
    let next = simulator.next_occurrences(&expression, from, config.occurrence_count)?;

    Ok(CompiledReminder {
        expression,
        summary,
        spec,
        next,
    })
}

pub fn print_compiled(compiled: &CompiledReminder, json: bool) -> Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(compiled)?);
        return Ok(());
    }

    let success_style = Style::new().green().bold();
    let info_style = Style::new().blue();
    let subtle_style = Style::new().bright_black();

    println!(
        "{} {}",
        "✓".style(success_style),
        compiled.expression.to_string().bright_white().bold()
    );
    println!("  {} {}", "→".style(info_style), compiled.summary);

    let tz = remindr_core::timezone::parse_timezone(&compiled.spec.timezone)?;
    if compiled.next.is_empty() {
        println!("  {} {}", "→".style(info_style), "No upcoming occurrences".style(subtle_style));
    }
    for occurrence in &compiled.next {
        println!(
            "  {} {}",
            "•".style(subtle_style),
            format_local(occurrence.fire_at, tz).cyan()
        );
    }

    Ok(())
}
