//! Validation of the payload returned by the text-to-reminder extractor.
//!
//! The extractor speaks the legacy dictionary shape, where every repeat
//! option is an optional integer or list and zero counts as "not set". This
//! is the only place that shape is accepted; it is converted into a tagged
//! [`Pattern`] and contradictory combinations are rejected rather than
//! resolved by field order.

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use crate::error::{CoreError, Result};
use crate::models::{Pattern, RecurrenceSpec, WeekdaySet};

/// Wall-clock time used when the payload carries none.
pub const DEFAULT_TIME: &str = "11:00 AM";

/// Legacy repeat options. Weekdays are AWS numbers (1 = Sunday).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RepeatFrequency {
    pub daily: Option<u32>,
    pub weekly: Option<u32>,
    pub monthly: Option<u32>,
    pub yearly: Option<u32>,
    pub hourly: Option<u32>,
    pub selected_days_of_week: Option<Vec<u8>>,
    pub selected_days_of_month: Option<Vec<u32>>,
}

/// Treats `None` and `0` alike.
fn set(value: Option<u32>) -> Option<u32> {
    value.filter(|n| *n > 0)
}

fn non_empty<T>(values: &Option<Vec<T>>) -> Option<&[T]> {
    values.as_deref().filter(|v| !v.is_empty())
}

impl RepeatFrequency {
    /// Names of the option groups that carry a value.
    fn populated_groups(&self) -> Vec<&'static str> {
        let mut groups = Vec::new();
        if set(self.hourly).is_some() {
            groups.push("hourly");
        }
        if set(self.daily).is_some() {
            groups.push("daily");
        }
        if set(self.weekly).is_some() || non_empty(&self.selected_days_of_week).is_some() {
            groups.push("weekly");
        }
        if set(self.monthly).is_some() || non_empty(&self.selected_days_of_month).is_some() {
            groups.push("monthly");
        }
        if set(self.yearly).is_some() {
            groups.push("yearly");
        }
        groups
    }
}

impl TryFrom<&RepeatFrequency> for Pattern {
    type Error = CoreError;

    fn try_from(frequency: &RepeatFrequency) -> Result<Self> {
        let groups = frequency.populated_groups();
        if groups.len() > 1 {
            return Err(CoreError::InvalidSpec(format!(
                "repeat frequency sets more than one option: {}",
                groups.join(", ")
            )));
        }

        let pattern = match groups.first().copied() {
            None => Pattern::OneTime,
            Some("hourly") => Pattern::IntervalHours(set(frequency.hourly).unwrap_or(1)),
            Some("daily") => Pattern::IntervalDays(set(frequency.daily).unwrap_or(1)),
            Some("weekly") => match (set(frequency.weekly), non_empty(&frequency.selected_days_of_week)) {
                (Some(n), Some(_)) if n > 1 => {
                    return Err(CoreError::InvalidSpec(format!(
                        "weekdays cannot be combined with a {}-week interval",
                        n
                    )))
                }
                (_, Some(days)) => Pattern::WeeklyOnDays(WeekdaySet::from_aws_numbers(days)?),
                (weeks, None) => Pattern::IntervalWeeks(weeks.unwrap_or(1)),
            },
            Some("monthly") => match set(frequency.monthly) {
                Some(n) if n > 1 => {
                    return Err(CoreError::InvalidSpec(format!(
                        "a {}-month interval cannot be scheduled",
                        n
                    )))
                }
                _ => Pattern::MonthlyOnDays(
                    non_empty(&frequency.selected_days_of_month)
                        .map(|days| days.iter().copied().collect())
                        .unwrap_or_else(BTreeSet::new),
                ),
            },
            Some(_) => match set(frequency.yearly) {
                Some(n) if n > 1 => {
                    return Err(CoreError::InvalidSpec(format!(
                        "a {}-year interval cannot be scheduled",
                        n
                    )))
                }
                _ => Pattern::Yearly,
            },
        };
        pattern.validate()?;
        Ok(pattern)
    }
}

impl TryFrom<RepeatFrequency> for Pattern {
    type Error = CoreError;

    fn try_from(frequency: RepeatFrequency) -> Result<Self> {
        Pattern::try_from(&frequency)
    }
}

/// A reminder as produced by the extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtractedReminder {
    pub task: String,
    /// `dd-mm-yyyy`
    pub start_date: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub start_date_phrase: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_date: Option<String>,
    /// `hh:mm AM/PM` or `HH:MM`
    #[serde(default)]
    pub time: Option<String>,
    #[serde(default)]
    pub repeat_frequency: RepeatFrequency,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl ExtractedReminder {
    pub fn from_json(payload: &str) -> Result<Self> {
        serde_json::from_str(payload)
            .map_err(|e| CoreError::InvalidSpec(format!("invalid extractor payload: {}", e)))
    }

    pub fn pattern(&self) -> Result<Pattern> {
        Pattern::try_from(&self.repeat_frequency)
    }

    /// Builds a validated spec anchored in `timezone`.
    pub fn into_spec(&self, timezone: &str) -> Result<RecurrenceSpec> {
        let date = parse_date(&self.start_date)?;
        let time = parse_time(self.time.as_deref().unwrap_or(DEFAULT_TIME))?;
        let spec = RecurrenceSpec::new(date, time, timezone, self.pattern()?);
        spec.validate()?;
        Ok(spec)
    }
}

/// Parses `dd-mm-yyyy`.
pub fn parse_date(text: &str) -> Result<NaiveDate> {
    NaiveDate::parse_from_str(text.trim(), "%d-%m-%Y").map_err(|_| {
        CoreError::InvalidSpec(format!("invalid date '{}', expected dd-mm-yyyy", text))
    })
}

/// Parses `11:00 AM` style times, falling back to 24-hour `HH:MM`.
pub fn parse_time(text: &str) -> Result<NaiveTime> {
    let text = text.trim();
    NaiveTime::parse_from_str(&text.to_uppercase(), "%I:%M %p")
        .or_else(|_| NaiveTime::parse_from_str(text, "%H:%M"))
        .map_err(|_| {
            CoreError::InvalidSpec(format!(
                "invalid time '{}', expected hh:mm AM/PM or HH:MM",
                text
            ))
        })
}
