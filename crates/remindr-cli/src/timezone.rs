use chrono::{DateTime, Utc};
use chrono_tz::Tz;
use remindr_core::error::CoreError;
use remindr_core::timezone::{format_with_timezone, get_timezone_abbreviation, parse_timezone, validate_timezone};

/// Detect system timezone
pub fn detect_system_timezone() -> String {
    if let Ok(tz) = std::env::var("TZ") {
        if !tz.is_empty() && validate_timezone(&tz).is_ok() {
            return tz;
        }
    }

    if let Ok(tz) = iana_time_zone::get_timezone() {
        if validate_timezone(&tz).is_ok() {
            return tz;
        }
    }

    "UTC".to_string()
}

/// Get common timezones for suggestions
pub fn get_common_timezones() -> Vec<&'static str> {
    vec![
        "UTC",
        "America/New_York",
        "America/Chicago",
        "America/Denver",
        "America/Los_Angeles",
        "America/Sao_Paulo",
        "Europe/London",
        "Europe/Paris",
        "Europe/Berlin",
        "Asia/Kolkata",
        "Asia/Dubai",
        "Asia/Singapore",
        "Asia/Tokyo",
        "Australia/Sydney",
        "Pacific/Auckland",
    ]
}

/// Suggest similar timezone for invalid input
pub fn suggest_timezone(invalid: &str) -> Vec<&'static str> {
    let invalid_lower = invalid.to_lowercase();

    let mut matches: Vec<_> = get_common_timezones()
        .into_iter()
        .filter(|tz| {
            let tz_lower = tz.to_lowercase();
            tz_lower.contains(&invalid_lower)
                || invalid_lower.contains(&tz_lower)
                || tz.split('/').any(|part| part.to_lowercase().contains(&invalid_lower))
        })
        .collect();

    matches.truncate(5);
    matches
}

/// Convert user-friendly timezone input to an IANA name
pub fn normalize_timezone_input(input: &str) -> Result<String, CoreError> {
    let input = input.trim();
    if validate_timezone(input).is_ok() {
        return Ok(input.to_string());
    }

    let normalized = match input.to_lowercase().as_str() {
        "est" | "eastern" => "America/New_York",
        "cst" | "central" => "America/Chicago",
        "mst" | "mountain" => "America/Denver",
        "pst" | "pacific" => "America/Los_Angeles",
        "gmt" | "utc" => "UTC",
        "bst" | "london" => "Europe/London",
        "cet" | "paris" => "Europe/Paris",
        "ist" | "india" => "Asia/Kolkata",
        "jst" | "tokyo" => "Asia/Tokyo",
        _ => {
            let suggestions = suggest_timezone(input);
            return Err(CoreError::InvalidTimezone(if suggestions.is_empty() {
                format!(
                    "'{}'. Use standard IANA names like 'America/New_York'",
                    input
                )
            } else {
                format!("'{}'. Did you mean: {}?", input, suggestions.join(", "))
            }));
        }
    };

    validate_timezone(normalized)?;
    Ok(normalized.to_string())
}

/// Resolves `--timezone`, falling back to the configured default.
pub fn resolve_timezone(input: Option<&str>, default: &str) -> Result<(String, Tz), CoreError> {
    let name = normalize_timezone_input(input.unwrap_or(default))?;
    let tz = parse_timezone(&name)?;
    Ok((name, tz))
}

/// `2024-10-14 11:00 IST`
pub fn format_local(instant: DateTime<Utc>, tz: Tz) -> String {
    format!(
        "{} {}",
        format_with_timezone(instant, tz, "%Y-%m-%d %H:%M"),
        get_timezone_abbreviation(tz, instant)
    )
}
