//! Typed form of the AWS schedule-expression dialect.
//!
//! Three shapes are supported, mirroring what the external scheduler accepts:
//!
//! - `at(YYYY-MM-DDTHH:MM:SS)`: a single UTC instant
//! - `rate(<n> <unit>)`: a fixed period
//! - `cron(<min> <hour> <day-of-month> <month> <day-of-week> <year>)`: the
//!   six-field AWS cron, where exactly one of the day fields is `?`
//!
//! `Display` always writes the canonical form: lists are sorted and expanded,
//! weekdays are written as AWS numbers (1 = Sunday).

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde_with::{DeserializeFromStr, SerializeDisplay};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::error::{CoreError, Result};
use crate::models::WeekdaySet;
use crate::timezone::days_in_month;

/// A set of small field values (0..64), used for minutes, hours,
/// days-of-month and months.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct ValueSet(u64);

impl ValueSet {
    pub const fn empty() -> Self {
        Self(0)
    }

    pub fn single(value: u32) -> Self {
        let mut set = Self::empty();
        set.insert(value);
        set
    }

    pub fn range(from: u32, to: u32) -> Self {
        (from..=to).collect()
    }

    pub fn insert(&mut self, value: u32) {
        debug_assert!(value < 64);
        self.0 |= 1 << value;
    }

    #[inline]
    pub fn contains(self, value: u32) -> bool {
        value < 64 && self.0 & (1 << value) != 0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub fn len(self) -> usize {
        self.0.count_ones() as usize
    }

    pub fn iter(self) -> impl Iterator<Item = u32> {
        (0..64).filter(move |v| self.contains(*v))
    }

    pub fn max(self) -> Option<u32> {
        (self.0 != 0).then(|| 63 - self.0.leading_zeros())
    }

    /// Smallest member that is `>= value`.
    #[inline]
    pub fn first_at_or_after(self, value: u32) -> Option<u32> {
        if value >= 64 {
            return None;
        }
        let masked = self.0 & (u64::MAX << value);
        (masked != 0).then(|| masked.trailing_zeros())
    }
}

impl FromIterator<u32> for ValueSet {
    fn from_iter<I: IntoIterator<Item = u32>>(iter: I) -> Self {
        let mut set = Self::empty();
        for value in iter {
            set.insert(value);
        }
        set
    }
}

impl fmt::Display for ValueSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let values: Vec<String> = self.iter().map(|v| v.to_string()).collect();
        f.write_str(&values.join(","))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RateUnit {
    Minute,
    Hour,
    Day,
    Week,
}

impl RateUnit {
    pub fn seconds(self) -> i64 {
        match self {
            RateUnit::Minute => 60,
            RateUnit::Hour => 3_600,
            RateUnit::Day => 86_400,
            RateUnit::Week => 604_800,
        }
    }

    pub fn singular(self) -> &'static str {
        match self {
            RateUnit::Minute => "minute",
            RateUnit::Hour => "hour",
            RateUnit::Day => "day",
            RateUnit::Week => "week",
        }
    }

    pub fn plural(self) -> &'static str {
        match self {
            RateUnit::Minute => "minutes",
            RateUnit::Hour => "hours",
            RateUnit::Day => "days",
            RateUnit::Week => "weeks",
        }
    }

    /// Accepts the singular or plural unit token.
    pub fn from_token(token: &str) -> Option<Self> {
        match token {
            "minute" | "minutes" => Some(RateUnit::Minute),
            "hour" | "hours" => Some(RateUnit::Hour),
            "day" | "days" => Some(RateUnit::Day),
            "week" | "weeks" => Some(RateUnit::Week),
            _ => None,
        }
    }
}

/// A fixed period: `quantity` units, quantity >= 1.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Rate {
    quantity: u32,
    unit: RateUnit,
}

impl Rate {
    pub fn new(quantity: u32, unit: RateUnit) -> Result<Self> {
        if quantity == 0 {
            return Err(CoreError::InvalidSpec(
                "rate quantity must be at least 1".to_string(),
            ));
        }
        Ok(Self { quantity, unit })
    }

    pub fn quantity(&self) -> u32 {
        self.quantity
    }

    pub fn unit(&self) -> RateUnit {
        self.unit
    }

    /// Length of one period in seconds.
    pub fn period_seconds(&self) -> i64 {
        i64::from(self.quantity) * self.unit.seconds()
    }
}

impl fmt::Display for Rate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let unit = if self.quantity == 1 {
            self.unit.singular()
        } else {
            self.unit.plural()
        };
        write!(f, "{} {}", self.quantity, unit)
    }
}

/// The day-of-month field when it is the meaningful one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DayOfMonth {
    /// `*`
    Every,
    /// Listed days, plus `L` for the last day of the month.
    Days { days: ValueSet, last: bool },
}

/// The day-of-week field when it is the meaningful one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DayOfWeek {
    /// `*`
    Every,
    Days(WeekdaySet),
}

/// Which of the two mutually exclusive day fields is concrete; the other
/// one is `?`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DaySelector {
    DayOfMonth(DayOfMonth),
    DayOfWeek(DayOfWeek),
}

impl DaySelector {
    pub fn month_days(days: ValueSet) -> Self {
        DaySelector::DayOfMonth(DayOfMonth::Days { days, last: false })
    }

    pub fn weekdays(days: WeekdaySet) -> Self {
        DaySelector::DayOfWeek(DayOfWeek::Days(days))
    }

    #[inline]
    pub fn matches(&self, date: NaiveDate) -> bool {
        match self {
            DaySelector::DayOfMonth(DayOfMonth::Every) | DaySelector::DayOfWeek(DayOfWeek::Every) => {
                true
            }
            DaySelector::DayOfMonth(DayOfMonth::Days { days, last }) => {
                days.contains(date.day())
                    || (*last && date.day() == days_in_month(date.year(), date.month()))
            }
            DaySelector::DayOfWeek(DayOfWeek::Days(days)) => days.contains(date.weekday()),
        }
    }
}

/// A six-field AWS cron expression. Times are UTC.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct CronExpression {
    minutes: ValueSet,
    hours: ValueSet,
    days: DaySelector,
    /// `None` is `*`
    months: Option<ValueSet>,
    /// `None` is `*`
    years: Option<BTreeSet<i32>>,
}

impl CronExpression {
    pub const MIN_YEAR: i32 = 1970;
    pub const MAX_YEAR: i32 = 2199;

    pub fn new(
        minutes: ValueSet,
        hours: ValueSet,
        days: DaySelector,
        months: Option<ValueSet>,
        years: Option<BTreeSet<i32>>,
    ) -> Result<Self> {
        let invalid = |what: &str| CoreError::MalformedExpression(format!("cron {} field", what));
        if minutes.is_empty() || minutes.max().is_some_and(|m| m > 59) {
            return Err(invalid("minute"));
        }
        if hours.is_empty() || hours.max().is_some_and(|h| h > 23) {
            return Err(invalid("hour"));
        }
        match days {
            DaySelector::DayOfMonth(DayOfMonth::Days { days, last }) => {
                if (days.is_empty() && !last) || days.contains(0) || days.max().is_some_and(|d| d > 31) {
                    return Err(invalid("day-of-month"));
                }
            }
            DaySelector::DayOfWeek(DayOfWeek::Days(days)) if days.is_empty() => {
                return Err(invalid("day-of-week"));
            }
            _ => {}
        }
        if let Some(months) = months {
            if months.is_empty() || months.contains(0) || months.max().is_some_and(|m| m > 12) {
                return Err(invalid("month"));
            }
        }
        if let Some(years) = &years {
            if years.is_empty()
                || years
                    .iter()
                    .any(|y| !(Self::MIN_YEAR..=Self::MAX_YEAR).contains(y))
            {
                return Err(invalid("year"));
            }
        }
        Ok(Self {
            minutes,
            hours,
            days,
            months,
            years,
        })
    }

    /// Fires at `hour:minute` UTC on the selected days of every month and year.
    pub fn at_time(minute: u32, hour: u32, days: DaySelector) -> Result<Self> {
        Self::new(ValueSet::single(minute), ValueSet::single(hour), days, None, None)
    }

    pub fn with_months(mut self, months: ValueSet) -> Result<Self> {
        self.months = Some(months);
        Self::new(self.minutes, self.hours, self.days, self.months, self.years)
    }

    pub fn minutes(&self) -> ValueSet {
        self.minutes
    }

    pub fn hours(&self) -> ValueSet {
        self.hours
    }

    pub fn days(&self) -> &DaySelector {
        &self.days
    }

    pub fn months(&self) -> Option<ValueSet> {
        self.months
    }

    pub fn years(&self) -> Option<&BTreeSet<i32>> {
        self.years.as_ref()
    }

    #[inline]
    pub fn matches_year(&self, year: i32) -> bool {
        self.years.as_ref().map_or(true, |years| years.contains(&year))
    }

    #[inline]
    pub fn matches_month(&self, month: u32) -> bool {
        self.months.map_or(true, |months| months.contains(month))
    }
}

impl fmt::Display for CronExpression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (day_of_month, day_of_week) = match &self.days {
            DaySelector::DayOfMonth(DayOfMonth::Every) => ("*".to_string(), "?".to_string()),
            DaySelector::DayOfMonth(DayOfMonth::Days { days, last }) => {
                let mut items: Vec<String> = days.iter().map(|d| d.to_string()).collect();
                if *last {
                    items.push("L".to_string());
                }
                (items.join(","), "?".to_string())
            }
            DaySelector::DayOfWeek(DayOfWeek::Every) => ("?".to_string(), "*".to_string()),
            DaySelector::DayOfWeek(DayOfWeek::Days(days)) => {
                let items: Vec<String> = days.to_aws_numbers().iter().map(|d| d.to_string()).collect();
                ("?".to_string(), items.join(","))
            }
        };
        let months = self.months.map_or_else(|| "*".to_string(), |m| m.to_string());
        let years = self.years.as_ref().map_or_else(
            || "*".to_string(),
            |years| {
                years
                    .iter()
                    .map(|y| y.to_string())
                    .collect::<Vec<_>>()
                    .join(",")
            },
        );
        write!(
            f,
            "{} {} {} {} {} {}",
            self.minutes, self.hours, day_of_month, months, day_of_week, years
        )
    }
}

/// A schedule expression in canonical, zone-free form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, SerializeDisplay, DeserializeFromStr)]
pub enum Expression {
    /// Fires exactly once at a UTC instant.
    At(DateTime<Utc>),
    Rate(Rate),
    Cron(CronExpression),
}

impl Expression {
    pub fn kind(&self) -> &'static str {
        match self {
            Expression::At(_) => "at",
            Expression::Rate(_) => "rate",
            Expression::Cron(_) => "cron",
        }
    }

    pub fn is_recurring(&self) -> bool {
        !matches!(self, Expression::At(_))
    }
}

impl fmt::Display for Expression {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Expression::At(instant) => write!(f, "at({})", instant.format("%Y-%m-%dT%H:%M:%S")),
            Expression::Rate(rate) => write!(f, "rate({})", rate),
            Expression::Cron(cron) => write!(f, "cron({})", cron),
        }
    }
}

impl FromStr for Expression {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self> {
        crate::parser::parse(s)
    }
}
