use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, Timelike, Utc, Weekday};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

use crate::error::{CoreError, Result};
use crate::timezone::{parse_timezone, to_utc};

/// Weekdays in ISO order, indexed by `num_days_from_monday`.
pub const WEEKDAYS: [Weekday; 7] = [
    Weekday::Mon,
    Weekday::Tue,
    Weekday::Wed,
    Weekday::Thu,
    Weekday::Fri,
    Weekday::Sat,
    Weekday::Sun,
];

/// AWS numeric weekday token (1 = Sunday .. 7 = Saturday).
pub fn aws_number(day: Weekday) -> u8 {
    day.number_from_sunday() as u8
}

/// Maps an AWS numeric weekday token (1 = Sunday) to a weekday.
pub fn weekday_from_aws(number: u8) -> Option<Weekday> {
    match number {
        1..=7 => Some(WEEKDAYS[((number + 5) % 7) as usize]),
        _ => None,
    }
}

/// A set of weekdays, stored Monday-first.
///
/// The serialized form is a list of AWS numbers (1 = Sunday .. 7 = Saturday),
/// which is how the text extractor and the legacy payloads encode weekdays.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Vec<u8>", into = "Vec<u8>")]
pub struct WeekdaySet(u8);

impl WeekdaySet {
    pub const fn empty() -> Self {
        Self(0)
    }

    /// Builds a set from AWS numbers, rejecting anything outside 1..=7.
    pub fn from_aws_numbers(numbers: &[u8]) -> Result<Self> {
        numbers
            .iter()
            .map(|&n| {
                weekday_from_aws(n).ok_or_else(|| {
                    CoreError::InvalidSpec(format!(
                        "weekday {} is out of range, expected 1 (Sunday) to 7 (Saturday)",
                        n
                    ))
                })
            })
            .collect()
    }

    pub fn insert(&mut self, day: Weekday) {
        self.0 |= 1 << day.num_days_from_monday();
    }

    #[inline]
    pub fn contains(self, day: Weekday) -> bool {
        self.0 & (1 << day.num_days_from_monday()) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    /// Iterates Monday-first.
    pub fn iter(self) -> impl Iterator<Item = Weekday> {
        WEEKDAYS.into_iter().filter(move |day| self.contains(*day))
    }

    /// AWS numbers in ascending order (Sunday first).
    pub fn to_aws_numbers(self) -> Vec<u8> {
        let mut numbers: Vec<u8> = self.iter().map(aws_number).collect();
        numbers.sort_unstable();
        numbers
    }

    /// Moves every day forward (positive) or backward (negative) by `days`.
    pub fn rotate(self, days: i64) -> Self {
        let shift = days.rem_euclid(7) as u32;
        self.iter()
            .map(|day| WEEKDAYS[((day.num_days_from_monday() + shift) % 7) as usize])
            .collect()
    }
}

impl FromIterator<Weekday> for WeekdaySet {
    fn from_iter<I: IntoIterator<Item = Weekday>>(iter: I) -> Self {
        let mut set = Self::empty();
        for day in iter {
            set.insert(day);
        }
        set
    }
}

impl TryFrom<Vec<u8>> for WeekdaySet {
    type Error = CoreError;

    fn try_from(numbers: Vec<u8>) -> Result<Self> {
        Self::from_aws_numbers(&numbers)
    }
}

impl From<WeekdaySet> for Vec<u8> {
    fn from(set: WeekdaySet) -> Self {
        set.to_aws_numbers()
    }
}

/// How a reminder repeats. Exactly one variant applies to a spec.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum Pattern {
    OneTime,
    IntervalHours(u32),
    IntervalDays(u32),
    IntervalWeeks(u32),
    WeeklyOnDays(WeekdaySet),
    /// Days 1-31. Empty means the anchor's day-of-month.
    MonthlyOnDays(BTreeSet<u32>),
    Yearly,
}

impl Pattern {
    pub fn is_recurring(&self) -> bool {
        !matches!(self, Pattern::OneTime)
    }

    pub fn validate(&self) -> Result<()> {
        match self {
            Pattern::IntervalHours(0) | Pattern::IntervalDays(0) | Pattern::IntervalWeeks(0) => Err(
                CoreError::InvalidSpec("repeat interval must be at least 1".to_string()),
            ),
            Pattern::WeeklyOnDays(days) if days.is_empty() => Err(CoreError::InvalidSpec(
                "weekly pattern needs at least one weekday".to_string(),
            )),
            Pattern::MonthlyOnDays(days) => match days.iter().find(|d| !(1..=31).contains(*d)) {
                Some(day) => Err(CoreError::InvalidSpec(format!(
                    "day-of-month {} is out of range 1-31",
                    day
                ))),
                None => Ok(()),
            },
            _ => Ok(()),
        }
    }
}

impl fmt::Display for Pattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Pattern::OneTime => write!(f, "one-time"),
            Pattern::IntervalHours(n) => write!(f, "every {} hour(s)", n),
            Pattern::IntervalDays(n) => write!(f, "every {} day(s)", n),
            Pattern::IntervalWeeks(n) => write!(f, "every {} week(s)", n),
            Pattern::WeeklyOnDays(days) => {
                let names: Vec<String> = days.iter().map(|d| d.to_string()).collect();
                write!(f, "weekly on {}", names.join(","))
            }
            Pattern::MonthlyOnDays(days) => {
                let days: Vec<String> = days.iter().map(u32::to_string).collect();
                write!(f, "monthly on [{}]", days.join(","))
            }
            Pattern::Yearly => write!(f, "yearly"),
        }
    }
}

/// The compiler's input: an anchor in a local timezone plus a pattern.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecurrenceSpec {
    pub anchor_date: NaiveDate,
    /// Local wall-clock time; whole minutes only.
    pub anchor_time: NaiveTime,
    /// IANA timezone name the anchor is observed in
    pub timezone: String,
    pub pattern: Pattern,
}

impl RecurrenceSpec {
    pub fn new(
        anchor_date: NaiveDate,
        anchor_time: NaiveTime,
        timezone: impl Into<String>,
        pattern: Pattern,
    ) -> Self {
        Self {
            anchor_date,
            anchor_time,
            timezone: timezone.into(),
            pattern,
        }
    }

    pub fn anchor_local(&self) -> NaiveDateTime {
        self.anchor_date.and_time(self.anchor_time)
    }

    /// The anchor as a UTC instant.
    pub fn anchor_utc(&self) -> Result<DateTime<Utc>> {
        to_utc(self.anchor_local(), parse_timezone(&self.timezone)?)
    }

    pub fn validate(&self) -> Result<()> {
        parse_timezone(&self.timezone)?;
        if self.anchor_time.second() != 0 || self.anchor_time.nanosecond() != 0 {
            return Err(CoreError::InvalidSpec(format!(
                "anchor time {} must be a whole minute",
                self.anchor_time
            )));
        }
        self.pattern.validate()
    }
}
