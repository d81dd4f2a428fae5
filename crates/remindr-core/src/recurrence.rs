use chrono::{DateTime, Datelike, Duration, NaiveDate, NaiveTime, Timelike, Utc, Weekday};
use chrono_tz::Tz;
use rrule::{RRuleSet, Tz as RRuleTz};
use serde::Serialize;

use crate::error::{CoreError, Result};
use crate::expression::{CronExpression, DayOfMonth, DayOfWeek, DaySelector, Expression, Rate, ValueSet};
use crate::parser::parse;
use crate::timezone::{add_months, days_in_month, is_leap_year};

/// One future fire time of a schedule
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub struct Occurrence {
    /// 1-based position within the generated sequence
    pub sequence: usize,
    /// The UTC instant the reminder fires
    pub fire_at: DateTime<Utc>,
}

impl Occurrence {
    /// The fire time as seen in `tz`, for display.
    pub fn local(&self, tz: Tz) -> DateTime<Tz> {
        self.fire_at.with_timezone(&tz)
    }
}

/// Configuration for occurrence simulation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SimulatorConfig {
    /// How far a single cron search may look ahead before the schedule is
    /// reported as unsatisfiable
    pub lookahead_years: u32,
}

impl Default for SimulatorConfig {
    fn default() -> Self {
        Self { lookahead_years: 10 }
    }
}

/// OccurrenceSimulator: computes upcoming fire times of an `Expression`.
///
/// Stateless: every call starts from the anchor it is given, so repeated
/// calls with the same arguments yield the same sequence.
#[derive(Debug, Clone, Default)]
pub struct OccurrenceSimulator {
    config: SimulatorConfig,
}

impl OccurrenceSimulator {
    pub fn new(config: SimulatorConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(SimulatorConfig::default())
    }

    pub fn config(&self) -> &SimulatorConfig {
        &self.config
    }

    /// Lazily walks the fire times strictly after `anchor_now`.
    pub fn occurrences<'a>(&self, expression: &'a Expression, anchor_now: DateTime<Utc>) -> Occurrences<'a> {
        Occurrences {
            expression,
            anchor: anchor_now,
            cursor: anchor_now,
            produced: 0,
            lookahead_years: self.config.lookahead_years,
            finished: false,
        }
    }

    /// Collects up to `count` fire times strictly after `anchor_now`.
    ///
    /// # Returns
    /// - Fewer than `count` items when the schedule ends (a one-time
    ///   expression, or a cron whose year list is exhausted)
    /// - `UnsatisfiableSchedule` when a cron expression can never fire
    pub fn next_occurrences(
        &self,
        expression: &Expression,
        anchor_now: DateTime<Utc>,
        count: usize,
    ) -> Result<Vec<Occurrence>> {
        self.occurrences(expression, anchor_now).take(count).collect()
    }

    /// Parses a stored expression and previews its next `count` fire times.
    pub fn preview(&self, text: &str, anchor_now: DateTime<Utc>, count: usize) -> Result<Vec<Occurrence>> {
        let expression = parse(text)?;
        self.next_occurrences(&expression, anchor_now, count)
    }
}

/// Simulates with the default configuration.
pub fn next_occurrences(
    expression: &Expression,
    anchor_now: DateTime<Utc>,
    count: usize,
) -> Result<Vec<Occurrence>> {
    OccurrenceSimulator::with_defaults().next_occurrences(expression, anchor_now, count)
}

/// Parses and simulates with the default configuration.
pub fn preview(text: &str, anchor_now: DateTime<Utc>, count: usize) -> Result<Vec<Occurrence>> {
    OccurrenceSimulator::with_defaults().preview(text, anchor_now, count)
}

/// Iterator over the fire times of one expression. Stops after the first
/// error.
#[derive(Debug, Clone)]
pub struct Occurrences<'a> {
    expression: &'a Expression,
    anchor: DateTime<Utc>,
    cursor: DateTime<Utc>,
    produced: usize,
    lookahead_years: u32,
    finished: bool,
}

impl Occurrences<'_> {
    fn advance(&self) -> Result<Option<DateTime<Utc>>> {
        match self.expression {
            Expression::At(instant) => Ok((self.produced == 0 && *instant > self.anchor).then_some(*instant)),
            Expression::Rate(rate) => rate_step(rate, self.anchor, self.produced + 1).map(Some),
            Expression::Cron(cron) => {
                if self.produced == 0 {
                    ensure_satisfiable(cron)?;
                }
                next_cron_match(cron, self.cursor, self.lookahead_years)
            }
        }
    }
}

impl Iterator for Occurrences<'_> {
    type Item = Result<Occurrence>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        match self.advance() {
            Ok(Some(fire_at)) => {
                self.cursor = fire_at;
                self.produced += 1;
                Some(Ok(Occurrence {
                    sequence: self.produced,
                    fire_at,
                }))
            }
            Ok(None) => {
                self.finished = true;
                None
            }
            Err(e) => {
                self.finished = true;
                Some(Err(e))
            }
        }
    }
}

/// `anchor + n * period`.
fn rate_step(rate: &Rate, anchor: DateTime<Utc>, n: usize) -> Result<DateTime<Utc>> {
    i64::try_from(n)
        .ok()
        .and_then(|steps| rate.period_seconds().checked_mul(steps))
        .and_then(Duration::try_seconds)
        .and_then(|step| anchor.checked_add_signed(step))
        .ok_or_else(|| {
            CoreError::UnsatisfiableSchedule(format!(
                "rate({}) step {} after {} is past the supported calendar range",
                rate,
                n,
                anchor.format("%Y-%m-%dT%H:%M:%S")
            ))
        })
}

/// Rejects day-of-month/month/year combinations that no calendar date
/// satisfies, such as the 30th of February.
fn ensure_satisfiable(cron: &CronExpression) -> Result<()> {
    let DaySelector::DayOfMonth(DayOfMonth::Days { days, last: false }) = cron.days() else {
        return Ok(());
    };
    let months = cron.months().unwrap_or_else(|| ValueSet::range(1, 12));
    let fits = |leap: bool| {
        let year = if leap { 2024 } else { 2023 };
        months
            .iter()
            .any(|month| days.first_at_or_after(1).is_some_and(|d| d <= days_in_month(year, month)))
    };

    let satisfiable = match cron.years() {
        None => fits(true),
        Some(years) => years.iter().any(|year| fits(is_leap_year(*year))),
    };
    if satisfiable {
        Ok(())
    } else {
        Err(CoreError::UnsatisfiableSchedule(format!(
            "cron({}) names no date that exists in the calendar",
            cron
        )))
    }
}

/// First matching minute strictly after `after`.
///
/// Each year the expression allows is searched as one bounded window of the
/// equivalent RFC 5545 rule, up to the lookahead horizon. Returns `None` once
/// a bounded year list is exhausted.
fn next_cron_match(
    cron: &CronExpression,
    after: DateTime<Utc>,
    lookahead_years: u32,
) -> Result<Option<DateTime<Utc>>> {
    let start = next_whole_minute(after)?;
    let horizon_date = add_months(
        start.date_naive(),
        i32::try_from(lookahead_years).unwrap_or(i32::MAX / 12).saturating_mul(12),
    );
    let horizon = horizon_date
        .succ_opt()
        .unwrap_or(horizon_date)
        .and_time(NaiveTime::MIN)
        .and_utc();
    let last_year = cron.years().and_then(|years| years.last().copied());

    for year in start.year()..=horizon.year() {
        if last_year.is_some_and(|last| year > last) {
            return Ok(None);
        }
        if !cron.matches_year(year) {
            continue;
        }
        let (Some(year_start), Some(next_year)) = (start_of_year(year), start_of_year(year + 1)) else {
            break;
        };
        let window_start = start.max(year_start);
        let window_end = horizon.min(next_year);
        if window_start >= window_end {
            continue;
        }
        if let Some(fire_at) = first_fire_between(cron, window_start, window_end)? {
            return Ok(Some(fire_at));
        }
    }

    Err(CoreError::UnsatisfiableSchedule(format!(
        "cron({}) does not fire within {} years after {}",
        cron,
        lookahead_years,
        after.format("%Y-%m-%dT%H:%M:%S")
    )))
}

fn start_of_year(year: i32) -> Option<DateTime<Utc>> {
    NaiveDate::from_ymd_opt(year, 1, 1).map(|date| date.and_time(NaiveTime::MIN).and_utc())
}

/// Earliest fire in `[from, until)`. `from` must be a whole minute.
fn first_fire_between(
    cron: &CronExpression,
    from: DateTime<Utc>,
    until: DateTime<Utc>,
) -> Result<Option<DateTime<Utc>>> {
    let rule = to_rrule(cron, from);
    let rrule_set = rule.parse::<RRuleSet>().map_err(|e| {
        CoreError::MalformedExpression(format!("cron({}) has no RRULE equivalent: {}", cron, e))
    })?;

    let (dates, _) = rrule_set
        .after((from - Duration::seconds(1)).with_timezone(&RRuleTz::UTC))
        .before(until.with_timezone(&RRuleTz::UTC))
        .all(2);

    // DTSTART may be reported even when it does not match the rule.
    Ok(dates
        .into_iter()
        .map(|dt| dt.with_timezone(&Utc))
        .find(|dt| *dt >= from && *dt < until && fires_at(cron, *dt)))
}

/// The RFC 5545 rule matching `cron` on every day from `dtstart`. The year
/// field has no RRULE counterpart and is applied by the caller.
fn to_rrule(cron: &CronExpression, dtstart: DateTime<Utc>) -> String {
    let join = |values: Vec<String>| values.join(",");
    let numbers = |set: ValueSet| join(set.iter().map(|v| v.to_string()).collect());

    let mut rule = format!(
        "FREQ=DAILY;BYHOUR={};BYMINUTE={}",
        numbers(cron.hours()),
        numbers(cron.minutes())
    );
    if let Some(months) = cron.months() {
        rule.push_str(&format!(";BYMONTH={}", numbers(months)));
    }
    match cron.days() {
        DaySelector::DayOfMonth(DayOfMonth::Days { days, last }) => {
            let mut by_month_day: Vec<String> = days.iter().map(|d| d.to_string()).collect();
            if *last {
                by_month_day.push("-1".to_string());
            }
            rule.push_str(&format!(";BYMONTHDAY={}", join(by_month_day)));
        }
        DaySelector::DayOfWeek(DayOfWeek::Days(days)) => {
            let by_day = days.iter().map(|day| rrule_weekday(day).to_string()).collect();
            rule.push_str(&format!(";BYDAY={}", join(by_day)));
        }
        DaySelector::DayOfMonth(DayOfMonth::Every) | DaySelector::DayOfWeek(DayOfWeek::Every) => {}
    }

    format!("DTSTART:{}\nRRULE:{}", dtstart.format("%Y%m%dT%H%M%SZ"), rule)
}

fn rrule_weekday(day: Weekday) -> &'static str {
    match day {
        Weekday::Mon => "MO",
        Weekday::Tue => "TU",
        Weekday::Wed => "WE",
        Weekday::Thu => "TH",
        Weekday::Fri => "FR",
        Weekday::Sat => "SA",
        Weekday::Sun => "SU",
    }
}

fn fires_at(cron: &CronExpression, instant: DateTime<Utc>) -> bool {
    let date = instant.date_naive();
    instant.second() == 0
        && cron.minutes().contains(instant.minute())
        && cron.hours().contains(instant.hour())
        && cron.matches_year(date.year())
        && cron.matches_month(date.month())
        && cron.days().matches(date)
}

/// The first `:00` second strictly after `instant`.
fn next_whole_minute(instant: DateTime<Utc>) -> Result<DateTime<Utc>> {
    let seconds = instant.timestamp();
    DateTime::from_timestamp(seconds - seconds.rem_euclid(60) + 60, 0).ok_or_else(|| {
        CoreError::UnsatisfiableSchedule(format!("{} is past the supported calendar range", instant))
    })
}
