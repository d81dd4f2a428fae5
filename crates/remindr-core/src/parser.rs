use chrono::{NaiveDateTime, Weekday};
use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;
use std::collections::BTreeSet;

use crate::error::{CoreError, Result};
use crate::expression::{CronExpression, DayOfMonth, DayOfWeek, DaySelector, Expression, Rate, RateUnit, ValueSet};
use crate::models::{weekday_from_aws, WeekdaySet};

#[derive(Parser)]
#[grammar = "expression.pest"]
struct ExpressionGrammar;

const MONTH_NAMES: &[&str] = &[
    "JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC",
];
const WEEKDAY_NAMES: &[&str] = &["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

/// Bounds and optional names for one cron field. `names[0]` stands for `min`.
struct FieldSpec {
    name: &'static str,
    min: u32,
    max: u32,
    names: &'static [&'static str],
}

const MINUTE: FieldSpec = FieldSpec { name: "minute", min: 0, max: 59, names: &[] };
const HOUR: FieldSpec = FieldSpec { name: "hour", min: 0, max: 23, names: &[] };
const DAY_OF_MONTH: FieldSpec = FieldSpec { name: "day-of-month", min: 1, max: 31, names: &[] };
const MONTH: FieldSpec = FieldSpec { name: "month", min: 1, max: 12, names: MONTH_NAMES };
const DAY_OF_WEEK: FieldSpec = FieldSpec { name: "day-of-week", min: 1, max: 7, names: WEEKDAY_NAMES };
const YEAR: FieldSpec = FieldSpec {
    name: "year",
    min: CronExpression::MIN_YEAR as u32,
    max: CronExpression::MAX_YEAR as u32,
    names: &[],
};

fn malformed(message: impl Into<String>) -> CoreError {
    CoreError::MalformedExpression(message.into())
}

/// Parses a schedule expression in the AWS dialect.
///
/// # Behavior
/// - `at(YYYY-MM-DDTHH:MM:SS)` is read as UTC
/// - `rate(n unit)` needs an integer `n >= 1` and a singular or plural unit
/// - `cron(...)` needs exactly six fields, concrete minute and hour fields,
///   and exactly one of day-of-month / day-of-week set to `?`
/// - Weekday tokens `1`..`7` (1 = Sunday) and `SUN`..`SAT` are both accepted
pub fn parse(text: &str) -> Result<Expression> {
    let mut pairs = ExpressionGrammar::parse(Rule::expression, text).map_err(|e| {
        malformed(format!(
            "'{}' is not an at(...), rate(...) or cron(...) expression: {}",
            text.trim(),
            e.variant.message()
        ))
    })?;
    let body = pairs
        .next()
        .and_then(|expression| expression.into_inner().next())
        .ok_or_else(|| malformed("empty expression"))?;

    match body.as_rule() {
        Rule::at => parse_at(body),
        Rule::rate => parse_rate(body),
        Rule::cron => parse_cron(body).map(Expression::Cron),
        rule => Err(malformed(format!("unexpected {:?} in '{}'", rule, text.trim()))),
    }
}

fn parse_at(pair: Pair<'_, Rule>) -> Result<Expression> {
    let text = pair.as_str();
    let datetime = pair.into_inner().next().map_or("", |datetime| datetime.as_str());
    NaiveDateTime::parse_from_str(datetime, "%Y-%m-%dT%H:%M:%S")
        .map(|instant| Expression::At(instant.and_utc()))
        .map_err(|e| malformed(format!("{}: {}", text, e)))
}

fn parse_rate(pair: Pair<'_, Rule>) -> Result<Expression> {
    let text = pair.as_str();
    let mut inner = pair.into_inner();
    let (Some(quantity), Some(unit)) = (inner.next(), inner.next()) else {
        return Err(malformed(format!("{} must be 'rate(<value> <unit>)'", text)));
    };
    let quantity: u32 = quantity
        .as_str()
        .parse()
        .map_err(|_| malformed(format!("rate value '{}' is out of range", quantity.as_str())))?;
    let unit = RateUnit::from_token(unit.as_str())
        .ok_or_else(|| malformed(format!("unknown rate unit '{}'", unit.as_str())))?;
    Rate::new(quantity, unit)
        .map(Expression::Rate)
        .map_err(|_| malformed("rate value must be at least 1"))
}

fn parse_cron(pair: Pair<'_, Rule>) -> Result<CronExpression> {
    let text = pair.as_str();
    let fields: Vec<Pair<'_, Rule>> = pair.into_inner().collect();
    let [minute, hour, day_of_month, month, day_of_week, year] = fields.as_slice() else {
        return Err(malformed(format!("{} has {} fields, expected 6", text, fields.len())));
    };

    let minutes = concrete_field(&MINUTE, minute)?;
    let hours = concrete_field(&HOUR, hour)?;

    let days = match (is_question(day_of_month), is_question(day_of_week)) {
        (true, true) => {
            return Err(malformed(
                "day-of-month and day-of-week cannot both be '?'",
            ))
        }
        (false, false) => {
            return Err(malformed(
                "one of day-of-month and day-of-week must be '?'",
            ))
        }
        (false, true) => DaySelector::DayOfMonth(parse_day_of_month(day_of_month)?),
        (true, false) => DaySelector::DayOfWeek(parse_day_of_week(day_of_week)?),
    };

    let months = optional_field(&MONTH, month)?.map(|values| values.into_iter().collect());
    let years = optional_field(&YEAR, year)?
        .map(|values| values.into_iter().map(|y| y as i32).collect());

    CronExpression::new(minutes, hours, days, months, years)
}

fn is_question(field: &Pair<'_, Rule>) -> bool {
    field.as_str() == "?"
}

fn is_every(field: &Pair<'_, Rule>) -> bool {
    field.as_str() == "*"
}

/// The comma-separated items of a field; none for `?`.
fn items<'i>(field: &Pair<'i, Rule>) -> impl Iterator<Item = Pair<'i, Rule>> {
    field
        .clone()
        .into_inner()
        .filter(|inner| inner.as_rule() == Rule::list)
        .flat_map(|list| list.into_inner())
}

/// A field that must list concrete values: no `*` and no `?`.
fn concrete_field(spec: &FieldSpec, field: &Pair<'_, Rule>) -> Result<ValueSet> {
    if is_every(field) || is_question(field) {
        return Err(malformed(format!(
            "{} field must be concrete, got '{}'",
            spec.name,
            field.as_str()
        )));
    }
    Ok(parse_items(spec, field)?.into_iter().collect())
}

/// `*` yields `None`; `?` is rejected.
fn optional_field(spec: &FieldSpec, field: &Pair<'_, Rule>) -> Result<Option<BTreeSet<u32>>> {
    if is_every(field) {
        Ok(None)
    } else if is_question(field) {
        Err(malformed(format!("'?' is not allowed in the {} field", spec.name)))
    } else {
        parse_items(spec, field).map(Some)
    }
}

fn parse_day_of_month(field: &Pair<'_, Rule>) -> Result<DayOfMonth> {
    if is_every(field) {
        return Ok(DayOfMonth::Every);
    }
    let mut last = false;
    let mut days = BTreeSet::new();
    for item in items(field) {
        if item.as_str().eq_ignore_ascii_case("L") {
            last = true;
        } else {
            parse_item(&DAY_OF_MONTH, item, &mut days)?;
        }
    }
    Ok(DayOfMonth::Days {
        days: days.into_iter().collect(),
        last,
    })
}

fn parse_day_of_week(field: &Pair<'_, Rule>) -> Result<DayOfWeek> {
    if is_every(field) {
        return Ok(DayOfWeek::Every);
    }
    let days = parse_items(&DAY_OF_WEEK, field)?
        .into_iter()
        .map(|n| aws_weekday(n as u8))
        .collect::<Result<WeekdaySet>>()?;
    Ok(DayOfWeek::Days(days))
}

fn aws_weekday(number: u8) -> Result<Weekday> {
    weekday_from_aws(number).ok_or_else(|| malformed(format!("weekday {} is out of range", number)))
}

fn parse_items(spec: &FieldSpec, field: &Pair<'_, Rule>) -> Result<BTreeSet<u32>> {
    let mut values = BTreeSet::new();
    for item in items(field) {
        parse_item(spec, item, &mut values)?;
    }
    if values.is_empty() {
        return Err(malformed(format!("{} field is empty", spec.name)));
    }
    Ok(values)
}

/// One comma-separated item: `v`, `a-b`, `a/step`, `a-b/step` or `*/step`.
fn parse_item(spec: &FieldSpec, item: Pair<'_, Rule>, values: &mut BTreeSet<u32>) -> Result<()> {
    let text = item.as_str();
    let mut inner = item.into_inner();
    let Some(range) = inner.next() else {
        return Err(malformed(format!("empty item in {} field", spec.name)));
    };
    let step = match inner.next() {
        Some(step) => Some(
            step.as_str()
                .parse::<u32>()
                .ok()
                .filter(|s| *s > 0)
                .ok_or_else(|| malformed(format!("invalid step in '{}' of {} field", text, spec.name)))?,
        ),
        None => None,
    };

    let (low, high) = match range.as_rule() {
        Rule::star if step.is_some() => (spec.min, spec.max),
        Rule::star => {
            return Err(malformed(format!("'*' cannot be combined with other {} values", spec.name)))
        }
        Rule::span => {
            let mut bounds = range.into_inner();
            let low = match bounds.next() {
                Some(low) => parse_value(spec, low.as_str())?,
                None => return Err(malformed(format!("empty item in {} field", spec.name))),
            };
            match bounds.next() {
                Some(high) => (low, parse_value(spec, high.as_str())?),
                None => (low, if step.is_some() { spec.max } else { low }),
            }
        }
        _ => {
            return Err(malformed(format!(
                "'{}' is not allowed in the {} field",
                text, spec.name
            )))
        }
    };

    if low > high {
        return Err(malformed(format!(
            "range {}-{} in {} field runs backwards",
            low, high, spec.name
        )));
    }
    values.extend((low..=high).step_by(step.unwrap_or(1) as usize));
    Ok(())
}

fn parse_value(spec: &FieldSpec, token: &str) -> Result<u32> {
    let value = match token.parse::<u32>() {
        Ok(value) if token.bytes().all(|b| b.is_ascii_digit()) => value,
        _ => spec
            .names
            .iter()
            .position(|name| name.eq_ignore_ascii_case(token))
            .map(|index| spec.min + index as u32)
            .ok_or_else(|| malformed(format!("unknown {} token '{}'", spec.name, token)))?,
    };
    if !(spec.min..=spec.max).contains(&value) {
        return Err(malformed(format!(
            "{} value {} is outside {}-{}",
            spec.name, value, spec.min, spec.max
        )));
    }
    Ok(value)
}
