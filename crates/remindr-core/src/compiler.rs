use chrono::{DateTime, Datelike, NaiveDate, Timelike, Utc};
use std::collections::BTreeSet;

use crate::error::{CoreError, Result};
use crate::expression::{CronExpression, DayOfMonth, DaySelector, Expression, Rate, RateUnit, ValueSet};
use crate::models::{Pattern, RecurrenceSpec};
use crate::timezone::{parse_timezone, to_utc};

/// Configuration for expression compilation
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompilerConfig {
    /// Emit `rate(n weeks)` instead of converting weeks to days. The AWS
    /// scheduler has no week unit, so this is off by default.
    pub native_week_unit: bool,
}

/// ExpressionCompiler: turns a `RecurrenceSpec` into a canonical, zone-free
/// `Expression`.
///
/// Every time-of-day field is taken from the UTC-converted anchor. When that
/// conversion crosses midnight, the day fields move with it so the schedule
/// still fires on the intended local day.
#[derive(Debug, Clone, Default)]
pub struct ExpressionCompiler {
    config: CompilerConfig,
}

impl ExpressionCompiler {
    pub fn new(config: CompilerConfig) -> Self {
        Self { config }
    }

    pub fn with_defaults() -> Self {
        Self::new(CompilerConfig::default())
    }

    pub fn config(&self) -> &CompilerConfig {
        &self.config
    }

    /// Compiles a spec.
    ///
    /// # Errors
    /// - `InvalidTimezone` for an unknown zone name
    /// - `InvalidLocalTime` when the anchor falls in a DST gap
    /// - `InvalidSpec` for zero intervals, empty weekday sets, out-of-range
    ///   month days, or day fields the dialect cannot express in UTC
    pub fn compile(&self, spec: &RecurrenceSpec) -> Result<Expression> {
        spec.validate()?;
        let timezone = parse_timezone(&spec.timezone)?;
        let local = spec.anchor_local();
        let anchor = to_utc(local, timezone)?;
        let day_shift = (anchor.date_naive() - local.date()).num_days();

        match &spec.pattern {
            Pattern::OneTime => Ok(Expression::At(anchor)),
            Pattern::IntervalHours(hours) => self.rate(*hours, RateUnit::Hour),
            Pattern::IntervalDays(days) => self.rate(*days, RateUnit::Day),
            Pattern::IntervalWeeks(weeks) => self.rate(*weeks, RateUnit::Week),
            Pattern::WeeklyOnDays(days) => cron_at(anchor, DaySelector::weekdays(days.rotate(day_shift))),
            Pattern::MonthlyOnDays(days) if days.is_empty() => {
                let anchor_day = BTreeSet::from([local.day()]);
                cron_at(anchor, DaySelector::DayOfMonth(shift_month_days(&anchor_day, day_shift)?))
            }
            Pattern::MonthlyOnDays(days) => {
                cron_at(anchor, DaySelector::DayOfMonth(shift_month_days(days, day_shift)?))
            }
            Pattern::Yearly => {
                let days = shift_yearly_day(local.date(), anchor.date_naive()).ok_or_else(|| {
                    CoreError::InvalidSpec(format!(
                        "a yearly reminder on {} at {} in {} lands on a different UTC day in leap years",
                        local.date(),
                        spec.anchor_time,
                        spec.timezone
                    ))
                })?;
                CronExpression::at_time(anchor.minute(), anchor.hour(), DaySelector::DayOfMonth(days))?
                    .with_months(ValueSet::single(anchor.month()))
                    .map(Expression::Cron)
            }
        }
    }

    /// Normalizes an interval to the largest unit that divides it exactly.
    fn rate(&self, quantity: u32, unit: RateUnit) -> Result<Expression> {
        let (mut quantity, mut unit) = (quantity, unit);
        if unit == RateUnit::Week && !self.config.native_week_unit {
            quantity = quantity.checked_mul(7).ok_or_else(|| {
                CoreError::InvalidSpec(format!("{} weeks is too long an interval", quantity))
            })?;
            unit = RateUnit::Day;
        }
        if unit == RateUnit::Hour && quantity % 24 == 0 {
            quantity /= 24;
            unit = RateUnit::Day;
        }
        if unit == RateUnit::Day && self.config.native_week_unit && quantity % 7 == 0 {
            quantity /= 7;
            unit = RateUnit::Week;
        }
        Rate::new(quantity, unit).map(Expression::Rate)
    }
}

/// Compiles with the default configuration.
pub fn compile(spec: &RecurrenceSpec) -> Result<Expression> {
    ExpressionCompiler::with_defaults().compile(spec)
}

fn cron_at(anchor: DateTime<Utc>, days: DaySelector) -> Result<Expression> {
    CronExpression::at_time(anchor.minute(), anchor.hour(), days).map(Expression::Cron)
}

/// The UTC day-of-month for a yearly anchor whose local date `local` is
/// `utc` in UTC, when that is the same day in every year.
///
/// Mar 1 moved back is the last day of February. Feb 29, and Feb 28 moved
/// forward, depend on the year.
fn shift_yearly_day(local: NaiveDate, utc: NaiveDate) -> Option<DayOfMonth> {
    match (local.month(), local.day(), (utc - local).num_days()) {
        (_, _, 0) => Some(DayOfMonth::Days {
            days: ValueSet::single(local.day()),
            last: false,
        }),
        (3, 1, -1) => Some(DayOfMonth::Days {
            days: ValueSet::empty(),
            last: true,
        }),
        (2, 29, _) | (2, 28, 1) => None,
        _ => Some(DayOfMonth::Days {
            days: ValueSet::single(utc.day()),
            last: false,
        }),
    }
}

/// Moves local month days to their UTC counterparts.
///
/// Only shifts that land on the same day in every month are accepted: the
/// 1st moved back becomes `L`, days 2-28 move back, days 1-27 move forward.
fn shift_month_days(days: &BTreeSet<u32>, shift: i64) -> Result<DayOfMonth> {
    let mut shifted = ValueSet::empty();
    let mut last = false;
    for &day in days {
        match shift {
            0 => shifted.insert(day),
            -1 if day == 1 => last = true,
            -1 if (2..=28).contains(&day) => shifted.insert(day - 1),
            1 if (1..=27).contains(&day) => shifted.insert(day + 1),
            _ => {
                return Err(CoreError::InvalidSpec(format!(
                    "day {} of the month falls on a different UTC day in some months; \
                     pick an earlier day or a time that stays on the same UTC date",
                    day
                )))
            }
        }
    }
    Ok(DayOfMonth::Days { days: shifted, last })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::WeekdaySet;
    use chrono::{NaiveTime, TimeZone};
    use rstest::rstest;

    fn spec(date: (i32, u32, u32), time: (u32, u32), timezone: &str, pattern: Pattern) -> RecurrenceSpec {
        RecurrenceSpec::new(
            NaiveDate::from_ymd_opt(date.0, date.1, date.2).unwrap(),
            NaiveTime::from_hms_opt(time.0, time.1, 0).unwrap(),
            timezone,
            pattern,
        )
    }

    fn kolkata(pattern: Pattern) -> RecurrenceSpec {
        spec((2024, 10, 14), (11, 0), "Asia/Kolkata", pattern)
    }

    fn days(values: &[u32]) -> BTreeSet<u32> {
        values.iter().copied().collect()
    }

    #[test]
    fn test_one_time_compiles_to_utc_at() {
        let expr = compile(&kolkata(Pattern::OneTime)).unwrap();
        assert_eq!(
            expr,
            Expression::At(Utc.with_ymd_and_hms(2024, 10, 14, 5, 30, 0).unwrap())
        );
        assert_eq!(expr.to_string(), "at(2024-10-14T05:30:00)");
    }

    #[rstest]
    #[case(Pattern::IntervalDays(1), "rate(1 day)")]
    #[case(Pattern::IntervalDays(2), "rate(2 days)")]
    #[case(Pattern::IntervalDays(14), "rate(14 days)")]
    #[case(Pattern::IntervalHours(3), "rate(3 hours)")]
    #[case(Pattern::IntervalHours(48), "rate(2 days)")]
    #[case(Pattern::IntervalHours(36), "rate(36 hours)")]
    #[case(Pattern::IntervalWeeks(1), "rate(7 days)")]
    #[case(Pattern::IntervalWeeks(2), "rate(14 days)")]
    fn test_interval_rates(#[case] pattern: Pattern, #[case] expected: &str) {
        assert_eq!(compile(&kolkata(pattern)).unwrap().to_string(), expected);
    }

    #[rstest]
    #[case(Pattern::IntervalWeeks(2), "rate(2 weeks)")]
    #[case(Pattern::IntervalDays(14), "rate(2 weeks)")]
    #[case(Pattern::IntervalHours(168), "rate(1 week)")]
    #[case(Pattern::IntervalDays(10), "rate(10 days)")]
    fn test_interval_rates_with_native_weeks(#[case] pattern: Pattern, #[case] expected: &str) {
        let compiler = ExpressionCompiler::new(CompilerConfig { native_week_unit: true });
        assert_eq!(compiler.compile(&kolkata(pattern)).unwrap().to_string(), expected);
    }

    #[test]
    fn test_interval_overflow_is_invalid() {
        let result = compile(&kolkata(Pattern::IntervalWeeks(u32::MAX)));
        assert!(matches!(result, Err(CoreError::InvalidSpec(_))));
    }

    #[test]
    fn test_weekly_uses_utc_time() {
        let pattern = Pattern::WeeklyOnDays(WeekdaySet::from_aws_numbers(&[2, 4]).unwrap());
        let expr = compile(&kolkata(pattern)).unwrap();
        assert_eq!(expr.to_string(), "cron(30 5 ? * 2,4 *)");
    }

    #[test]
    fn test_weekly_rotates_days_when_utc_is_previous_day() {
        // 02:00 IST Monday is 20:30 UTC Sunday
        let pattern = Pattern::WeeklyOnDays(WeekdaySet::from_aws_numbers(&[2, 4]).unwrap());
        let expr = compile(&spec((2024, 10, 14), (2, 0), "Asia/Kolkata", pattern)).unwrap();
        assert_eq!(expr.to_string(), "cron(30 20 ? * 1,3 *)");
    }

    #[test]
    fn test_weekly_rotates_days_when_utc_is_next_day() {
        // 22:00 EDT Saturday is 02:00 UTC Sunday
        let pattern = Pattern::WeeklyOnDays(WeekdaySet::from_aws_numbers(&[7]).unwrap());
        let expr = compile(&spec((2024, 10, 12), (22, 0), "America/New_York", pattern)).unwrap();
        assert_eq!(expr.to_string(), "cron(0 2 ? * 1 *)");
    }

    #[test]
    fn test_monthly_defaults_to_anchor_day() {
        let expr = compile(&kolkata(Pattern::MonthlyOnDays(BTreeSet::new()))).unwrap();
        assert_eq!(expr.to_string(), "cron(30 5 14 * ? *)");
    }

    #[test]
    fn test_monthly_default_uses_utc_day() {
        let expr = compile(&spec(
            (2024, 10, 14),
            (2, 0),
            "Asia/Kolkata",
            Pattern::MonthlyOnDays(BTreeSet::new()),
        ))
        .unwrap();
        assert_eq!(expr.to_string(), "cron(30 20 13 * ? *)");
    }

    #[test]
    fn test_monthly_default_on_the_first_becomes_last_day() {
        // 02:00 IST on Nov 1 is 20:30 UTC on Oct 31
        let default = compile(&spec((2024, 11, 1), (2, 0), "Asia/Kolkata", Pattern::MonthlyOnDays(BTreeSet::new())));
        let explicit = compile(&spec((2024, 11, 1), (2, 0), "Asia/Kolkata", Pattern::MonthlyOnDays(days(&[1]))));
        assert_eq!(default.unwrap().to_string(), "cron(30 20 L * ? *)");
        assert_eq!(explicit.unwrap().to_string(), "cron(30 20 L * ? *)");
    }

    #[test]
    fn test_monthly_default_inexpressible_shift_is_rejected() {
        let result = compile(&spec((2024, 11, 30), (2, 0), "Asia/Kolkata", Pattern::MonthlyOnDays(BTreeSet::new())));
        assert!(matches!(result, Err(CoreError::InvalidSpec(_))));
    }

    #[test]
    fn test_monthly_listed_days() {
        let expr = compile(&kolkata(Pattern::MonthlyOnDays(days(&[15, 1])))).unwrap();
        assert_eq!(expr.to_string(), "cron(30 5 1,15 * ? *)");
    }

    #[test]
    fn test_monthly_first_shifted_back_becomes_last_day() {
        let expr = compile(&spec(
            (2024, 11, 1),
            (2, 0),
            "Asia/Kolkata",
            Pattern::MonthlyOnDays(days(&[1, 15])),
        ))
        .unwrap();
        assert_eq!(expr.to_string(), "cron(30 20 14,L * ? *)");
    }

    #[rstest]
    #[case((2, 0), "Asia/Kolkata", 29)]
    #[case((2, 0), "Asia/Kolkata", 31)]
    #[case((22, 0), "America/New_York", 28)]
    #[case((22, 0), "America/New_York", 31)]
    fn test_monthly_inexpressible_shift_is_rejected(
        #[case] time: (u32, u32),
        #[case] timezone: &str,
        #[case] day: u32,
    ) {
        let result = compile(&spec((2024, 10, 14), time, timezone, Pattern::MonthlyOnDays(days(&[day]))));
        assert!(matches!(result, Err(CoreError::InvalidSpec(_))));
    }

    #[test]
    fn test_yearly() {
        let expr = compile(&kolkata(Pattern::Yearly)).unwrap();
        assert_eq!(expr.to_string(), "cron(30 5 14 10 ? *)");
    }

    #[rstest]
    // 01:00 IST on Mar 1 is 19:30 UTC on Feb 28 or Feb 29
    #[case((2023, 3, 1))]
    #[case((2024, 3, 1))]
    fn test_yearly_march_first_shifted_back_is_last_of_february(#[case] date: (i32, u32, u32)) {
        let expr = compile(&spec(date, (1, 0), "Asia/Kolkata", Pattern::Yearly)).unwrap();
        assert_eq!(expr.to_string(), "cron(30 19 L 2 ? *)");
    }

    #[rstest]
    // 22:00 EST on Feb 28 is 03:00 UTC on Mar 1 or Feb 29
    #[case((2023, 2, 28), (22, 0), "America/New_York")]
    #[case((2024, 2, 28), (22, 0), "America/New_York")]
    #[case((2024, 2, 29), (22, 0), "America/New_York")]
    #[case((2024, 2, 29), (1, 0), "Asia/Kolkata")]
    fn test_yearly_leap_dependent_shift_is_rejected(
        #[case] date: (i32, u32, u32),
        #[case] time: (u32, u32),
        #[case] timezone: &str,
    ) {
        let result = compile(&spec(date, time, timezone, Pattern::Yearly));
        assert!(matches!(result, Err(CoreError::InvalidSpec(_))));
    }

    #[rstest]
    #[case((2024, 1, 1), (1, 0), "Asia/Kolkata", "cron(30 19 31 12 ? *)")]
    #[case((2023, 2, 27), (22, 0), "America/New_York", "cron(0 3 28 2 ? *)")]
    #[case((2024, 3, 2), (1, 0), "Asia/Kolkata", "cron(30 19 1 3 ? *)")]
    #[case((2024, 2, 29), (11, 0), "Asia/Kolkata", "cron(30 5 29 2 ? *)")]
    fn test_yearly_fixed_shifts(
        #[case] date: (i32, u32, u32),
        #[case] time: (u32, u32),
        #[case] timezone: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(compile(&spec(date, time, timezone, Pattern::Yearly)).unwrap().to_string(), expected);
    }

    #[test]
    fn test_dst_gap_is_invalid_local_time() {
        let pattern = Pattern::WeeklyOnDays(WeekdaySet::from_aws_numbers(&[1]).unwrap());
        let result = compile(&spec((2024, 3, 10), (2, 30), "America/New_York", pattern));
        assert!(matches!(result, Err(CoreError::InvalidLocalTime(_))));
    }

    #[test]
    fn test_dst_shifts_utc_hour_by_one() {
        let pattern = Pattern::WeeklyOnDays(WeekdaySet::from_aws_numbers(&[2]).unwrap());
        let winter = compile(&spec((2024, 1, 15), (9, 0), "America/New_York", pattern.clone())).unwrap();
        let summer = compile(&spec((2024, 7, 15), (9, 0), "America/New_York", pattern)).unwrap();
        assert_eq!(winter.to_string(), "cron(0 14 ? * 2 *)");
        assert_eq!(summer.to_string(), "cron(0 13 ? * 2 *)");
    }

    #[test]
    fn test_invalid_spec_rejected_before_compiling() {
        assert!(matches!(
            compile(&kolkata(Pattern::IntervalDays(0))),
            Err(CoreError::InvalidSpec(_))
        ));
        assert!(matches!(
            compile(&spec((2024, 10, 14), (11, 0), "Not/AZone", Pattern::OneTime)),
            Err(CoreError::InvalidTimezone(_))
        ));
    }
}
