use crate::error::{CoreError, Result};
use chrono::{DateTime, LocalResult, Months, NaiveDate, NaiveDateTime, TimeZone, Utc};
use chrono_tz::Tz;
use std::str::FromStr;

/// Parse and validate an IANA timezone name
pub fn parse_timezone(timezone: &str) -> Result<Tz> {
    Tz::from_str(timezone).map_err(|_| {
        CoreError::InvalidTimezone(format!(
            "'{}'. Use IANA timezone names like 'Asia/Kolkata'",
            timezone
        ))
    })
}

/// Validate IANA timezone name
pub fn validate_timezone(timezone: &str) -> Result<()> {
    parse_timezone(timezone).map(|_| ())
}

/// Interprets a wall-clock value as observed in `tz` and returns the UTC instant.
///
/// # Behavior
/// - Unique local times convert directly
/// - Times inside a spring-forward gap fail with `InvalidLocalTime`
/// - Times repeated by a fall-back transition resolve to the earlier instant
pub fn to_utc(local: NaiveDateTime, tz: Tz) -> Result<DateTime<Utc>> {
    match tz.from_local_datetime(&local) {
        LocalResult::Single(dt) => Ok(dt.with_timezone(&Utc)),
        LocalResult::Ambiguous(earliest, _) => Ok(earliest.with_timezone(&Utc)),
        LocalResult::None => Err(CoreError::InvalidLocalTime(format!(
            "{} ({})",
            local.format("%Y-%m-%d %H:%M"),
            tz.name()
        ))),
    }
}

/// Converts a UTC instant to the wall-clock value observed in `tz`.
pub fn from_utc(instant: DateTime<Utc>, tz: Tz) -> NaiveDateTime {
    instant.with_timezone(&tz).naive_local()
}

pub fn is_leap_year(year: i32) -> bool {
    (year % 4 == 0 && year % 100 != 0) || year % 400 == 0
}

pub fn days_in_month(year: i32, month: u32) -> u32 {
    match month {
        1 | 3 | 5 | 7 | 8 | 10 | 12 => 31,
        4 | 6 | 9 | 11 => 30,
        2 if is_leap_year(year) => 29,
        2 => 28,
        _ => 0,
    }
}

/// Steps `date` by `months` calendar months, clamping the day to the end of
/// the target month (Jan 31 + 1 month is Feb 28 or 29).
///
/// Saturates at the calendar bounds chrono can represent.
pub fn add_months(date: NaiveDate, months: i32) -> NaiveDate {
    let step = Months::new(months.unsigned_abs());
    let stepped = if months >= 0 {
        date.checked_add_months(step)
    } else {
        date.checked_sub_months(step)
    };
    stepped.unwrap_or(if months >= 0 { NaiveDate::MAX } else { NaiveDate::MIN })
}

/// Format datetime with timezone-aware display
pub fn format_with_timezone(datetime: DateTime<Utc>, tz: Tz, format: &str) -> String {
    datetime.with_timezone(&tz).format(format).to_string()
}

/// Get timezone abbreviation (e.g., "EST", "EDT")
pub fn get_timezone_abbreviation(tz: Tz, at_time: DateTime<Utc>) -> String {
    format_with_timezone(at_time, tz, "%Z")
}
