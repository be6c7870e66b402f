use std::num::IntErrorKind;
use std::path::PathBuf;
use std::str::FromStr;

use rust_decimal::Decimal;
use uuid::Uuid;

use super::TypeRule;
use crate::error::ConversionError;
use crate::options::ParseOptions;
use crate::value::Value;

const SPECIAL_NUMBER: &str = "Special numeric values (nan or infinity) are not permitted.";

const TRUTHY: &[&str] = &[
    "t", "T", "true", "True", "TRUE", "on", "On", "ON", "y", "Y", "yes", "Yes", "YES", "1",
];
const FALSY: &[&str] = &[
    "f", "F", "false", "False", "FALSE", "off", "Off", "OFF", "n", "N", "no", "No", "NO", "0",
];

/// Standard level names and their numeric values.
const LOG_LEVELS: &[(&str, i64)] = &[
    ("CRITICAL", 50),
    ("FATAL", 50),
    ("ERROR", 40),
    ("WARNING", 30),
    ("WARN", 30),
    ("INFO", 20),
    ("DEBUG", 10),
    ("NOTSET", 0),
];

/// Returns the value untouched.
#[derive(Debug, Clone, Copy, Default)]
pub struct RawRule;

impl TypeRule for RawRule {
    fn name(&self) -> &str {
        "raw"
    }

    fn convert(&self, value: Value, _options: &ParseOptions) -> Result<Value, ConversionError> {
        Ok(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct StrRule;

impl TypeRule for StrRule {
    fn name(&self) -> &str {
        "str"
    }

    fn convert(&self, value: Value, _options: &ParseOptions) -> Result<Value, ConversionError> {
        match value {
            Value::Str(s) | Value::Enum(s) => Ok(Value::Str(s)),
            _ => Err(ConversionError::new("Not a valid string.")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct IntRule;

impl TypeRule for IntRule {
    fn name(&self) -> &str {
        "int"
    }

    fn convert(&self, value: Value, _options: &ParseOptions) -> Result<Value, ConversionError> {
        match value {
            Value::Int(i) => Ok(Value::Int(i)),
            Value::Float(f) if f.is_finite() => Ok(Value::Int(f.trunc() as i64)),
            Value::Str(s) => parse_int(&s).map(Value::Int),
            _ => Err(ConversionError::new("Not a valid integer.")),
        }
    }
}

fn parse_int(raw: &str) -> Result<i64, ConversionError> {
    raw.trim().parse::<i64>().map_err(|e| match e.kind() {
        IntErrorKind::PosOverflow | IntErrorKind::NegOverflow => {
            ConversionError::new("Number out of range.")
        }
        _ => ConversionError::new("Not a valid integer."),
    })
}

#[derive(Debug, Clone, Copy, Default)]
pub struct FloatRule;

impl TypeRule for FloatRule {
    fn name(&self) -> &str {
        "float"
    }

    fn convert(&self, value: Value, _options: &ParseOptions) -> Result<Value, ConversionError> {
        let number = match value {
            Value::Float(f) => f,
            Value::Int(i) => i as f64,
            Value::Str(s) => s
                .trim()
                .parse::<f64>()
                .map_err(|_| ConversionError::new("Not a valid number."))?,
            _ => return Err(ConversionError::new("Not a valid number.")),
        };
        if !number.is_finite() {
            return Err(ConversionError::new(SPECIAL_NUMBER));
        }
        Ok(Value::Float(number))
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct BoolRule;

impl TypeRule for BoolRule {
    fn name(&self) -> &str {
        "bool"
    }

    fn convert(&self, value: Value, _options: &ParseOptions) -> Result<Value, ConversionError> {
        match value {
            Value::Bool(b) => Ok(Value::Bool(b)),
            Value::Int(1) => Ok(Value::Bool(true)),
            Value::Int(0) => Ok(Value::Bool(false)),
            Value::Str(s) if TRUTHY.contains(&s.as_str()) => Ok(Value::Bool(true)),
            Value::Str(s) if FALSY.contains(&s.as_str()) => Ok(Value::Bool(false)),
            _ => Err(ConversionError::new("Not a valid boolean.")),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DecimalRule;

impl TypeRule for DecimalRule {
    fn name(&self) -> &str {
        "decimal"
    }

    fn convert(&self, value: Value, _options: &ParseOptions) -> Result<Value, ConversionError> {
        let invalid = || ConversionError::new("Not a valid decimal.");
        match value {
            Value::Decimal(d) => Ok(Value::Decimal(d)),
            Value::Int(i) => Ok(Value::Decimal(Decimal::from(i))),
            Value::Float(f) if !f.is_finite() => Err(ConversionError::new(SPECIAL_NUMBER)),
            Value::Float(f) => Decimal::try_from(f).map(Value::Decimal).map_err(|_| invalid()),
            Value::Str(s) => {
                let raw = s.trim();
                if is_special_number(raw) {
                    return Err(ConversionError::new(SPECIAL_NUMBER));
                }
                Decimal::from_str(raw)
                    .or_else(|_| Decimal::from_scientific(raw))
                    .map(Value::Decimal)
                    .map_err(|_| invalid())
            }
            _ => Err(invalid()),
        }
    }
}

fn is_special_number(raw: &str) -> bool {
    let unsigned = raw.trim_start_matches(['+', '-']).to_ascii_lowercase();
    matches!(unsigned.as_str(), "nan" | "snan" | "inf" | "infinity")
}

#[derive(Debug, Clone, Copy, Default)]
pub struct PathRule;

impl TypeRule for PathRule {
    fn name(&self) -> &str {
        "path"
    }

    fn convert(&self, value: Value, _options: &ParseOptions) -> Result<Value, ConversionError> {
        match value {
            Value::Path(p) => Ok(Value::Path(p)),
            Value::Str(s) => Ok(Value::Path(PathBuf::from(s))),
            _ => Err(ConversionError::new("Not a valid path.")),
        }
    }
}

/// Integer level, or a standard level name in any case.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogLevelRule;

impl TypeRule for LogLevelRule {
    fn name(&self) -> &str {
        "log_level"
    }

    fn convert(&self, value: Value, _options: &ParseOptions) -> Result<Value, ConversionError> {
        let invalid = || ConversionError::new("Not a valid log level.");
        match value {
            Value::Int(i) => Ok(Value::Int(i)),
            Value::Str(s) => {
                if let Ok(level) = s.trim().parse::<i64>() {
                    return Ok(Value::Int(level));
                }
                let name = s.to_uppercase();
                LOG_LEVELS
                    .iter()
                    .find(|(level, _)| *level == name)
                    .map(|(_, level)| Value::Int(*level))
                    .ok_or_else(invalid)
            }
            _ => Err(invalid()),
        }
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct UuidRule;

impl TypeRule for UuidRule {
    fn name(&self) -> &str {
        "uuid"
    }

    fn convert(&self, value: Value, _options: &ParseOptions) -> Result<Value, ConversionError> {
        match value {
            Value::Uuid(u) => Ok(Value::Uuid(u)),
            Value::Str(s) => Uuid::parse_str(s.trim())
                .map(Value::Uuid)
                .map_err(|_| ConversionError::new("Not a valid UUID.")),
            _ => Err(ConversionError::new("Not a valid UUID.")),
        }
    }
}
