use chrono::{DateTime, Utc};
use chrono_humanize::Humanize;
use chrono_tz::Tz;
use comfy_table::{Attribute, Cell, Color, Row, Table};
use remindr_core::recurrence::Occurrence;

use crate::timezone::format_local;

/// One row of `list` output: a stored expression and what it resolved to.
#[derive(Debug, Clone)]
pub struct ViewSchedule {
    pub line: usize,
    pub expression: String,
    pub result: Result<Vec<Occurrence>, String>,
}

fn relative(instant: DateTime<Utc>, now: DateTime<Utc>) -> String {
    (instant - now).humanize()
}

pub fn display_occurrences(occurrences: &[Occurrence], tz: Tz, now: DateTime<Utc>) {
    if occurrences.is_empty() {
        println!("No upcoming occurrences.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["#", "UTC", "Local", "When"]);

    for occurrence in occurrences {
        let mut row = Row::new();
        row.add_cell(Cell::new(occurrence.sequence));
        row.add_cell(Cell::new(occurrence.fire_at.format("%Y-%m-%d %H:%M").to_string()));
        row.add_cell(Cell::new(format_local(occurrence.fire_at, tz)).fg(Color::Cyan));
        row.add_cell(Cell::new(relative(occurrence.fire_at, now)).fg(Color::DarkGrey));
        table.add_row(row);
    }

    println!("{table}");
}

pub fn display_schedules(schedules: &[ViewSchedule], tz: Tz) {
    if schedules.is_empty() {
        println!("No schedule expressions found.");
        return;
    }

    let mut table = Table::new();
    table.set_header(vec!["Line", "Expression", "Next"]);

    for schedule in schedules {
        let mut row = Row::new();
        row.add_cell(Cell::new(schedule.line));

        let next_cell = match &schedule.result {
            Ok(occurrences) if occurrences.is_empty() => {
                Cell::new("Expired").fg(Color::DarkGrey)
            }
            Ok(occurrences) => {
                let times: Vec<String> = occurrences
                    .iter()
                    .map(|o| format_local(o.fire_at, tz))
                    .collect();
                Cell::new(times.join("\n"))
            }
            Err(message) => Cell::new(message).fg(Color::Red),
        };

        let mut expression_cell = Cell::new(&schedule.expression);
        if schedule.result.is_err() {
            expression_cell = expression_cell
                .add_attribute(Attribute::CrossedOut)
                .fg(Color::DarkGrey);
        }
        row.add_cell(expression_cell);
        row.add_cell(next_cell);
        table.add_row(row);
    }

    println!("{table}");
}
