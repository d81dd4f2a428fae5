use anyhow::{anyhow, Result};
use chrono::{DateTime, NaiveDate, Utc, Weekday};
use chrono_english::{parse_date_string, Dialect};
use chrono_tz::Tz;
use remindr_core::extract::parse_date;
use remindr_core::models::{weekday_from_aws, WeekdaySet};

/// Resolves a start date given as `dd-mm-yyyy`, `yyyy-mm-dd`, or an English
/// phrase relative to today in `tz`.
pub fn parse_start_date(input: &str, tz: Tz) -> Result<NaiveDate> {
    parse_start_date_from(input, Utc::now(), tz)
}

pub fn parse_start_date_from(input: &str, now: DateTime<Utc>, tz: Tz) -> Result<NaiveDate> {
    if let Ok(date) = parse_date(input) {
        return Ok(date);
    }
    if let Ok(date) = NaiveDate::parse_from_str(input.trim(), "%Y-%m-%d") {
        return Ok(date);
    }
    let local_now = now.with_timezone(&tz).fixed_offset();
    parse_date_string(input, local_now, Dialect::Uk)
        .map(|dt| dt.date_naive())
        .map_err(|e| anyhow!("Failed to parse date '{}': {}", input, e))
}

/// Parses an RFC 3339 instant or an English phrase relative to now.
pub fn parse_instant(input: &str) -> Result<DateTime<Utc>> {
    if let Ok(instant) = DateTime::parse_from_rfc3339(input.trim()) {
        return Ok(instant.with_timezone(&Utc));
    }
    parse_date_string(input, Utc::now(), Dialect::Uk)
        .map_err(|e| anyhow!("Failed to parse instant '{}': {}", input, e))
}

/// Accepts `mon`, `monday`, `MON` and AWS numbers (1 = Sunday).
pub fn parse_weekdays(tokens: &[String]) -> Result<WeekdaySet> {
    tokens
        .iter()
        .map(|token| parse_weekday(token.trim()))
        .collect()
}

fn parse_weekday(token: &str) -> Result<Weekday> {
    if let Ok(number) = token.parse::<u8>() {
        return weekday_from_aws(number)
            .ok_or_else(|| anyhow!("Weekday number {} is out of range (1 = Sunday .. 7 = Saturday)", number));
    }
    token
        .parse::<Weekday>()
        .map_err(|_| anyhow!("Unknown weekday '{}'. Use mon,tue,wed,thu,fri,sat,sun", token))
}
