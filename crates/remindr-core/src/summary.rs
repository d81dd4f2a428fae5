use chrono::{Datelike, NaiveDateTime, Weekday};

use crate::models::{Pattern, RecurrenceSpec};

/// `1st`, `2nd`, `3rd`, `11th`, `22nd`...
pub fn ordinal(n: u32) -> String {
    let suffix = match (n % 10, n % 100) {
        (_, 11..=13) => "th",
        (1, _) => "st",
        (2, _) => "nd",
        (3, _) => "rd",
        _ => "th",
    };
    format!("{}{}", n, suffix)
}

pub fn weekday_name(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "Monday",
        Weekday::Tue => "Tuesday",
        Weekday::Wed => "Wednesday",
        Weekday::Thu => "Thursday",
        Weekday::Fri => "Friday",
        Weekday::Sat => "Saturday",
        Weekday::Sun => "Sunday",
    }
}

fn every(n: u32, unit: &str) -> String {
    if n == 1 {
        format!("every {}", unit)
    } else {
        format!("every {} {}s", n, unit)
    }
}

/// Describes when a pattern fires, relative to its local anchor.
pub fn describe(pattern: &Pattern, anchor: NaiveDateTime) -> String {
    match pattern {
        Pattern::OneTime => format!(
            "on {} at {}",
            anchor.format("%d-%m-%Y"),
            anchor.format("%I:%M %p")
        ),
        Pattern::IntervalHours(n) => every(*n, "hour"),
        Pattern::IntervalDays(n) => every(*n, "day"),
        Pattern::IntervalWeeks(n) => every(*n, "week"),
        Pattern::WeeklyOnDays(days) => {
            let names: Vec<&str> = days.iter().map(weekday_name).collect();
            format!("on {}", names.join(", "))
        }
        Pattern::MonthlyOnDays(days) if days.is_empty() => {
            format!("every {} of the month", ordinal(anchor.day()))
        }
        Pattern::MonthlyOnDays(days) => {
            let days: Vec<String> = days.iter().map(|d| ordinal(*d)).collect();
            format!("every {} of the month", days.join(", "))
        }
        Pattern::Yearly => format!("every year on {}", anchor.format("%-d %B")),
    }
}

/// The confirmation sentence shown after a reminder is scheduled.
pub fn reminder_summary(task: &str, spec: &RecurrenceSpec) -> String {
    format!(
        "I will remind you to {} {}",
        task.trim(),
        describe(&spec.pattern, spec.anchor_local())
    )
}
