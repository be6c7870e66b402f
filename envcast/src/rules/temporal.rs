use std::sync::LazyLock;

use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta};
use regex::{Captures, Regex};

use super::TypeRule;
use crate::error::ConversionError;
use crate::options::ParseOptions;
use crate::value::Value;

const AWARE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f%:z",
    "%Y-%m-%d %H:%M:%S%.f%:z",
    "%Y-%m-%dT%H:%M%:z",
    "%Y-%m-%dT%H:%M:%S%.f%z",
];

const NAIVE_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

const TIME_FORMATS: &[&str] = &["%H:%M:%S%.f", "%H:%M"];

/// Descending units, each optional: `1w 2d 3h 4m 5s 6ms 7us`.
static COMPACT_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"(?i)^\s*",
        r"(?:(-?\d+)\s*w\s*)?",
        r"(?:(-?\d+)\s*d\s*)?",
        r"(?:(-?\d+)\s*h\s*)?",
        r"(?:(-?\d+)\s*m\s*)?",
        r"(?:(-?\d+)\s*s\s*)?",
        r"(?:(-?\d+)\s*ms\s*)?",
        r"(?:(-?\d+)\s*[µu]s\s*)?$",
    ))
    .expect("compact duration pattern is valid")
});

/// `P[n]W` or `P[n]DT[n]H[n]M[n]S`, optionally signed, fractional seconds.
static ISO_DURATION: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(concat!(
        r"^\s*([+-])?P",
        r"(?:(\d+)W)?",
        r"(?:(\d+)D)?",
        r"(?:T(?:(\d+)H)?(?:(\d+)M)?(?:(\d+(?:\.\d+)?)S)?)?\s*$",
    ))
    .expect("ISO duration pattern is valid")
});

/// ISO 8601 date and time, with or without an offset.
///
/// Values with an offset become [`Value::DateTime`], the others
/// [`Value::NaiveDateTime`].
#[derive(Debug, Clone, Copy, Default)]
pub struct DateTimeRule;

impl TypeRule for DateTimeRule {
    fn name(&self) -> &str {
        "datetime"
    }

    fn convert(&self, value: Value, _options: &ParseOptions) -> Result<Value, ConversionError> {
        match value {
            dt @ (Value::DateTime(_) | Value::NaiveDateTime(_)) => Ok(dt),
            Value::Str(raw) => parse_datetime(raw.trim())
                .ok_or_else(|| ConversionError::new("Not a valid datetime.")),
            _ => Err(ConversionError::new("Not a valid datetime.")),
        }
    }
}

fn parse_datetime(raw: &str) -> Option<Value> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(Value::DateTime(dt));
    }
    for format in AWARE_FORMATS {
        if let Ok(dt) = DateTime::parse_from_str(raw, format) {
            return Some(Value::DateTime(dt));
        }
    }
    NAIVE_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(raw, format).ok())
        .map(Value::NaiveDateTime)
}

/// `YYYY-MM-DD`
#[derive(Debug, Clone, Copy, Default)]
pub struct DateRule;

impl TypeRule for DateRule {
    fn name(&self) -> &str {
        "date"
    }

    fn convert(&self, value: Value, _options: &ParseOptions) -> Result<Value, ConversionError> {
        match value {
            Value::Date(d) => Ok(Value::Date(d)),
            Value::Str(raw) => NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d")
                .map(Value::Date)
                .map_err(|_| ConversionError::new("Not a valid date.")),
            _ => Err(ConversionError::new("Not a valid date.")),
        }
    }
}

/// `HH:MM[:SS[.ffffff]]`
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeRule;

impl TypeRule for TimeRule {
    fn name(&self) -> &str {
        "time"
    }

    fn convert(&self, value: Value, _options: &ParseOptions) -> Result<Value, ConversionError> {
        match value {
            Value::Time(t) => Ok(Value::Time(t)),
            Value::Str(raw) => TIME_FORMATS
                .iter()
                .find_map(|format| NaiveTime::parse_from_str(raw.trim(), format).ok())
                .map(Value::Time)
                .ok_or_else(|| ConversionError::new("Not a valid time.")),
            _ => Err(ConversionError::new("Not a valid time.")),
        }
    }
}

/// Duration from compact units (`1h30m`), an ISO 8601 subset (`PT1H30M`) or
/// a number of seconds.
#[derive(Debug, Clone, Copy, Default)]
pub struct TimeDeltaRule;

impl TypeRule for TimeDeltaRule {
    fn name(&self) -> &str {
        "timedelta"
    }

    fn convert(&self, value: Value, _options: &ParseOptions) -> Result<Value, ConversionError> {
        let duration = match value {
            Value::Duration(d) => Some(d),
            Value::Int(secs) => TimeDelta::try_seconds(secs),
            Value::Float(secs) => from_seconds(secs),
            Value::Str(raw) => parse_duration(&raw),
            _ => None,
        };
        duration
            .map(Value::Duration)
            .ok_or_else(|| ConversionError::new("Not a valid period of time."))
    }
}

fn parse_duration(raw: &str) -> Option<TimeDelta> {
    if let Some(caps) = COMPACT_DURATION.captures(raw) {
        if (1..caps.len()).any(|i| caps.get(i).is_some()) {
            return compact_duration(&caps);
        }
    }
    if let Some(caps) = ISO_DURATION.captures(raw) {
        if (2..caps.len()).any(|i| caps.get(i).is_some()) {
            return iso_duration(&caps);
        }
    }
    raw.trim().parse::<f64>().ok().and_then(from_seconds)
}

fn compact_duration(caps: &Captures<'_>) -> Option<TimeDelta> {
    let units: [fn(i64) -> Option<TimeDelta>; 7] = [
        TimeDelta::try_weeks,
        TimeDelta::try_days,
        TimeDelta::try_hours,
        TimeDelta::try_minutes,
        TimeDelta::try_seconds,
        TimeDelta::try_milliseconds,
        |us| Some(TimeDelta::microseconds(us)),
    ];
    let mut total = TimeDelta::zero();
    for (index, unit) in units.iter().enumerate() {
        if let Some(amount) = caps.get(index + 1) {
            let amount = amount.as_str().parse::<i64>().ok()?;
            total = total.checked_add(&unit(amount)?)?;
        }
    }
    Some(total)
}

fn iso_duration(caps: &Captures<'_>) -> Option<TimeDelta> {
    let units: [fn(i64) -> Option<TimeDelta>; 4] = [
        TimeDelta::try_weeks,
        TimeDelta::try_days,
        TimeDelta::try_hours,
        TimeDelta::try_minutes,
    ];
    let mut total = TimeDelta::zero();
    for (index, unit) in units.iter().enumerate() {
        if let Some(amount) = caps.get(index + 2) {
            let amount = amount.as_str().parse::<i64>().ok()?;
            total = total.checked_add(&unit(amount)?)?;
        }
    }
    if let Some(seconds) = caps.get(6) {
        let seconds = from_seconds(seconds.as_str().parse::<f64>().ok()?)?;
        total = total.checked_add(&seconds)?;
    }
    match caps.get(1).map(|sign| sign.as_str()) {
        Some("-") => Some(-total),
        _ => Some(total),
    }
}

fn from_seconds(secs: f64) -> Option<TimeDelta> {
    let micros = (secs * 1_000_000.0).round();
    if !micros.is_finite() || micros.abs() >= i64::MAX as f64 {
        return None;
    }
    Some(TimeDelta::microseconds(micros as i64))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn duration(raw: &str) -> Result<Value, ConversionError> {
        TimeDeltaRule.convert(Value::Str(raw.to_string()), &ParseOptions::default())
    }

    fn seconds(secs: i64) -> Value {
        Value::Duration(TimeDelta::seconds(secs))
    }

    #[test]
    fn test_datetime_aware_and_naive() {
        let rule = DateTimeRule;
        let opts = ParseOptions::default();
        let aware = rule
            .convert(Value::Str("2024-05-01T12:30:00+02:00".into()), &opts)
            .unwrap();
        assert!(matches!(aware, Value::DateTime(dt) if dt.offset().local_minus_utc() == 7200));

        let utc = rule.convert(Value::Str("2024-05-01T12:30:00Z".into()), &opts).unwrap();
        assert!(matches!(utc, Value::DateTime(_)));

        let naive = rule
            .convert(Value::Str("2024-05-01 12:30:00".into()), &opts)
            .unwrap();
        assert!(matches!(naive, Value::NaiveDateTime(_)));

        let err = rule.convert(Value::Str("2024-05-01".into()), &opts).unwrap_err();
        assert_eq!(err.messages, vec!["Not a valid datetime."]);
    }

    #[test]
    fn test_date_and_time() {
        let opts = ParseOptions::default();
        assert_eq!(
            DateRule.convert(Value::Str("2024-02-29".into()), &opts).unwrap(),
            Value::Date(NaiveDate::from_ymd_opt(2024, 2, 29).unwrap())
        );
        assert!(DateRule.convert(Value::Str("2023-02-29".into()), &opts).is_err());
        assert_eq!(
            TimeRule.convert(Value::Str("09:45".into()), &opts).unwrap(),
            Value::Time(NaiveTime::from_hms_opt(9, 45, 0).unwrap())
        );
        assert_eq!(
            TimeRule
                .convert(Value::Str("25:00".into()), &opts)
                .unwrap_err()
                .messages,
            vec!["Not a valid time."]
        );
    }

    #[test]
    fn test_duration_seconds() {
        assert_eq!(duration("42").unwrap(), seconds(42));
        assert_eq!(
            duration("1.5").unwrap(),
            Value::Duration(TimeDelta::milliseconds(1500))
        );
    }

    #[test]
    fn test_duration_compact_units() {
        let expected = TimeDelta::weeks(1)
            + TimeDelta::days(2)
            + TimeDelta::hours(3)
            + TimeDelta::minutes(4)
            + TimeDelta::seconds(5)
            + TimeDelta::milliseconds(6)
            + TimeDelta::microseconds(7);
        assert_eq!(
            duration("1w 2d 3h 4m 5s 6ms 7us").unwrap(),
            Value::Duration(expected)
        );
        assert_eq!(duration("1W2D").unwrap(), Value::Duration(TimeDelta::days(9)));
        assert_eq!(duration("10ms").unwrap(), Value::Duration(TimeDelta::milliseconds(10)));
        assert_eq!(duration("5µs").unwrap(), Value::Duration(TimeDelta::microseconds(5)));
        assert_eq!(duration("-5m").unwrap(), Value::Duration(TimeDelta::minutes(-5)));
    }

    #[test]
    fn test_duration_units_must_descend() {
        assert_eq!(
            duration("5s 1h").unwrap_err().messages,
            vec!["Not a valid period of time."]
        );
    }

    #[test]
    fn test_duration_iso_subset() {
        assert_eq!(
            duration("PT1H30M").unwrap(),
            Value::Duration(TimeDelta::minutes(90))
        );
        assert_eq!(duration("P2W").unwrap(), Value::Duration(TimeDelta::weeks(2)));
        assert_eq!(
            duration("-P1DT0.5S").unwrap(),
            Value::Duration(-(TimeDelta::days(1) + TimeDelta::milliseconds(500)))
        );
        assert!(duration("PT").is_err());
    }

    #[test]
    fn test_duration_invalid() {
        for raw in ["", "abc", "1x", "nan"] {
            assert!(duration(raw).is_err(), "{raw}");
        }
    }
}
