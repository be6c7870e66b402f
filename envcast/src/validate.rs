//! Ready-made validators for [`Var::validate`](crate::Var::validate).
//!
//! A validator is any `Fn(&Value) -> Result<(), ConversionError>`; these
//! helpers cover the common checks.
//!
//! ```rust
//! use envcast::{validate, Env};
//!
//! # fn main() -> Result<(), envcast::EnvError> {
//! let source = std::collections::HashMap::from([("TTL".to_string(), "30".to_string())]);
//! let mut env = Env::builder().source(source).build();
//! let ttl = env
//!     .var::<u32>("TTL")
//!     .validate(validate::range(Some(1.0), Some(3600.0)))
//!     .get()?;
//! assert_eq!(ttl, Some(30));
//! # Ok(())
//! # }
//! ```

use std::sync::Arc;

use regex::Regex;

use crate::error::ConversionError;
use crate::options::Validator;
use crate::value::Value;

/// Message of a validator that rejects without saying why.
pub const INVALID_VALUE: &str = "Invalid value.";

/// Reject values for which `check` returns false.
pub fn predicate<F>(check: F) -> Validator
where
    F: Fn(&Value) -> bool + Send + Sync + 'static,
{
    Arc::new(move |value| {
        if check(value) {
            Ok(())
        } else {
            Err(ConversionError::new(INVALID_VALUE))
        }
    })
}

/// Accept only the listed values.
pub fn one_of<I, V>(choices: I) -> Validator
where
    I: IntoIterator<Item = V>,
    V: Into<Value>,
{
    let choices: Vec<Value> = choices.into_iter().map(Into::into).collect();
    let listing = choices
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");
    Arc::new(move |value| {
        if choices.contains(value) {
            Ok(())
        } else {
            Err(ConversionError::new(format!("Must be one of: {listing}.")))
        }
    })
}

/// Inclusive numeric bounds for integers, floats and decimals.
pub fn range(min: Option<f64>, max: Option<f64>) -> Validator {
    let message = match (min, max) {
        (Some(min), Some(max)) => format!(
            "Must be greater than or equal to {min} and less than or equal to {max}."
        ),
        (Some(min), None) => format!("Must be greater than or equal to {min}."),
        (None, Some(max)) => format!("Must be less than or equal to {max}."),
        (None, None) => String::new(),
    };
    Arc::new(move |value| {
        let number = match value {
            Value::Int(i) => *i as f64,
            Value::Float(f) => *f,
            Value::Decimal(d) => d.to_string().parse().unwrap_or(f64::NAN),
            _ => return Err(ConversionError::new(INVALID_VALUE)),
        };
        let too_small = min.is_some_and(|min| number < min);
        let too_large = max.is_some_and(|max| number > max);
        if too_small || too_large || number.is_nan() {
            Err(ConversionError::new(message.clone()))
        } else {
            Ok(())
        }
    })
}

/// Bounds on the length of a string, list or mapping.
pub fn length(min: Option<usize>, max: Option<usize>) -> Validator {
    Arc::new(move |value| {
        let len = match value {
            Value::Str(s) => s.chars().count(),
            Value::List(items) => items.len(),
            Value::Dict(pairs) => pairs.len(),
            Value::Json(serde_json::Value::Array(items)) => items.len(),
            Value::Json(serde_json::Value::Object(map)) => map.len(),
            Value::Json(serde_json::Value::String(s)) => s.chars().count(),
            _ => return Err(ConversionError::new(INVALID_VALUE)),
        };
        match (min, max) {
            (Some(min), Some(max)) if len < min || len > max => Err(ConversionError::new(format!(
                "Length must be between {min} and {max}."
            ))),
            (Some(min), None) if len < min => Err(ConversionError::new(format!(
                "Shorter than minimum length {min}."
            ))),
            (None, Some(max)) if len > max => Err(ConversionError::new(format!(
                "Longer than maximum length {max}."
            ))),
            _ => Ok(()),
        }
    })
}

/// Require strings to match `pattern`, anchored at the start.
pub fn regexp(pattern: &str) -> Result<Validator, regex::Error> {
    let regex = Regex::new(&format!("^(?:{pattern})"))?;
    Ok(Arc::new(move |value| match value.as_str() {
        Some(s) if regex.is_match(s) => Ok(()),
        _ => Err(ConversionError::new("String does not match expected pattern.")),
    }))
}
