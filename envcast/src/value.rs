//! Dynamic typed values produced by type rules, and their Rust counterparts

use std::collections::{BTreeMap, HashMap};
use std::hash::Hash;
use std::path::PathBuf;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeDelta, Utc};
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use serde::{Serialize, Serializer};
use url::Url;
use uuid::Uuid;

use crate::error::ConversionError;

/// A value read from the environment, raw or converted.
///
/// Raw values are always [`Value::Str`]; every other variant is produced by a
/// type rule or supplied by the caller as an already typed default.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    Decimal(Decimal),
    List(Vec<Value>),
    /// Key/value pairs in input order
    Dict(Vec<(Value, Value)>),
    Json(serde_json::Value),
    DateTime(DateTime<FixedOffset>),
    NaiveDateTime(NaiveDateTime),
    Date(NaiveDate),
    Time(NaiveTime),
    Duration(TimeDelta),
    Path(PathBuf),
    Uuid(Uuid),
    Url(Url),
    /// Member name of an enumeration
    Enum(String),
}

impl Value {
    /// Short description of the variant, used in mismatch errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "a boolean",
            Value::Int(_) => "an integer",
            Value::Float(_) => "a float",
            Value::Str(_) => "a string",
            Value::Decimal(_) => "a decimal",
            Value::List(_) => "a list",
            Value::Dict(_) => "a mapping",
            Value::Json(_) => "a JSON document",
            Value::DateTime(_) | Value::NaiveDateTime(_) => "a datetime",
            Value::Date(_) => "a date",
            Value::Time(_) => "a time",
            Value::Duration(_) => "a duration",
            Value::Path(_) => "a path",
            Value::Uuid(_) => "a UUID",
            Value::Url(_) => "a URL",
            Value::Enum(_) => "an enum member",
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::Str(s) | Value::Enum(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// JSON-safe representation used by [`Env::dump`](crate::Env::dump).
    ///
    /// Numbers stay numbers; structured values become their string form.
    /// Decimals are rendered as strings to keep their precision.
    pub fn to_plain(&self) -> serde_json::Value {
        use serde_json::Value as Json;

        match self {
            Value::Null => Json::Null,
            Value::Bool(b) => Json::Bool(*b),
            Value::Int(i) => Json::from(*i),
            Value::Float(f) => serde_json::Number::from_f64(*f)
                .map(Json::Number)
                .unwrap_or(Json::Null),
            Value::Str(s) | Value::Enum(s) => Json::String(s.clone()),
            Value::Decimal(d) => Json::String(d.to_string()),
            Value::List(items) => Json::Array(items.iter().map(Value::to_plain).collect()),
            Value::Dict(pairs) => Json::Object(
                pairs
                    .iter()
                    .map(|(k, v)| (k.plain_key(), v.to_plain()))
                    .collect(),
            ),
            Value::Json(json) => json.clone(),
            Value::DateTime(dt) => Json::String(dt.to_rfc3339()),
            Value::NaiveDateTime(dt) => Json::String(dt.format("%Y-%m-%dT%H:%M:%S%.f").to_string()),
            Value::Date(d) => Json::String(d.format("%Y-%m-%d").to_string()),
            Value::Time(t) => Json::String(t.format("%H:%M:%S%.f").to_string()),
            Value::Duration(d) => duration_seconds(d),
            Value::Path(p) => Json::String(p.to_string_lossy().into_owned()),
            Value::Uuid(u) => Json::String(u.hyphenated().to_string()),
            Value::Url(u) => Json::String(u.as_str().to_string()),
        }
    }

    /// Structural conversion of a JSON document into values.
    pub fn from_json(json: serde_json::Value) -> Value {
        use serde_json::Value as Json;

        match json {
            Json::Null => Value::Null,
            Json::Bool(b) => Value::Bool(b),
            Json::Number(n) => n
                .as_i64()
                .map(Value::Int)
                .unwrap_or_else(|| Value::Float(n.as_f64().unwrap_or(f64::NAN))),
            Json::String(s) => Value::Str(s),
            Json::Array(items) => Value::List(items.into_iter().map(Value::from_json).collect()),
            Json::Object(map) => Value::Dict(
                map.into_iter()
                    .map(|(k, v)| (Value::Str(k), Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    fn plain_key(&self) -> String {
        match self.to_plain() {
            serde_json::Value::String(s) => s,
            other => other.to_string(),
        }
    }
}

/// Whole seconds as an integer, fractional seconds as a float.
fn duration_seconds(d: &TimeDelta) -> serde_json::Value {
    let micros = d.num_microseconds();
    match micros {
        Some(us) if us % 1_000_000 == 0 => serde_json::Value::from(us / 1_000_000),
        Some(us) => serde_json::Number::from_f64(us as f64 / 1_000_000.0)
            .map(serde_json::Value::Number)
            .unwrap_or(serde_json::Value::Null),
        None => serde_json::Value::from(d.num_seconds()),
    }
}

impl Serialize for Value {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_plain().serialize(serializer)
    }
}

impl std::fmt::Display for Value {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.to_plain() {
            serde_json::Value::String(s) => f.write_str(&s),
            other => write!(f, "{other}"),
        }
    }
}

/// Names the rule that produces a Rust type, with its subcasts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Kind {
    pub tag: &'static str,
    /// Element type of a list, value type of a dict
    pub items: Option<&'static str>,
    /// Key type of a dict
    pub keys: Option<&'static str>,
}

impl Kind {
    pub const fn new(tag: &'static str) -> Self {
        Self {
            tag,
            items: None,
            keys: None,
        }
    }

    pub const fn list(items: &'static str) -> Self {
        Self {
            tag: "list",
            items: Some(items),
            keys: None,
        }
    }

    pub const fn dict(keys: &'static str, items: &'static str) -> Self {
        Self {
            tag: "dict",
            items: Some(items),
            keys: Some(keys),
        }
    }
}

/// Rust types that can be read through [`Env::var`](crate::Env::var).
///
/// `kind` names the rule used to convert raw strings; `from_value` and
/// `into_value` move between the rule's output and the Rust type.
pub trait EnvValue: Sized {
    fn kind() -> Kind;

    fn from_value(value: Value) -> Result<Self, ConversionError>;

    fn into_value(self) -> Value;
}

pub(crate) fn mismatch(expected: &str, value: &Value) -> ConversionError {
    ConversionError::new(format!("Expected {expected}, got {}.", value.kind_name()))
}

const OUT_OF_RANGE: &str = "Number out of range.";

impl EnvValue for Value {
    fn kind() -> Kind {
        Kind::new("raw")
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        Ok(value)
    }

    fn into_value(self) -> Value {
        self
    }
}

impl EnvValue for String {
    fn kind() -> Kind {
        Kind::new("str")
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Str(s) | Value::Enum(s) => Ok(s),
            other => Err(mismatch("a string", &other)),
        }
    }

    fn into_value(self) -> Value {
        Value::Str(self)
    }
}

impl EnvValue for bool {
    fn kind() -> Kind {
        Kind::new("bool")
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Bool(b) => Ok(b),
            other => Err(mismatch("a boolean", &other)),
        }
    }

    fn into_value(self) -> Value {
        Value::Bool(self)
    }
}

macro_rules! impl_env_value_int {
    ($($ty:ty),*) => {
        $(
            impl EnvValue for $ty {
                fn kind() -> Kind {
                    Kind::new("int")
                }

                fn from_value(value: Value) -> Result<Self, ConversionError> {
                    match value {
                        Value::Int(i) => {
                            <$ty>::try_from(i).map_err(|_| ConversionError::new(OUT_OF_RANGE))
                        }
                        other => Err(mismatch("an integer", &other)),
                    }
                }

                #[allow(clippy::unnecessary_cast)]
                fn into_value(self) -> Value {
                    Value::Int(self as i64)
                }
            }
        )*
    };
}

impl_env_value_int!(i8, i16, i32, i64, u8, u16, u32);

macro_rules! impl_env_value_wide_int {
    ($($ty:ty),*) => {
        $(
            impl EnvValue for $ty {
                fn kind() -> Kind {
                    Kind::new("int")
                }

                fn from_value(value: Value) -> Result<Self, ConversionError> {
                    match value {
                        Value::Int(i) => {
                            <$ty>::try_from(i).map_err(|_| ConversionError::new(OUT_OF_RANGE))
                        }
                        other => Err(mismatch("an integer", &other)),
                    }
                }

                fn into_value(self) -> Value {
                    i64::try_from(self)
                        .map(Value::Int)
                        .unwrap_or_else(|_| Value::Str(self.to_string()))
                }
            }
        )*
    };
}

impl_env_value_wide_int!(u64, usize, isize);

impl EnvValue for f64 {
    fn kind() -> Kind {
        Kind::new("float")
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::Float(f) => Ok(f),
            Value::Int(i) => Ok(i as f64),
            other => Err(mismatch("a number", &other)),
        }
    }

    fn into_value(self) -> Value {
        Value::Float(self)
    }
}

impl EnvValue for f32 {
    fn kind() -> Kind {
        Kind::new("float")
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        f64::from_value(value).map(|f| f as f32)
    }

    fn into_value(self) -> Value {
        Value::Float(f64::from(self))
    }
}

macro_rules! impl_env_value_simple {
    ($ty:ty, $tag:literal, $variant:ident, $expected:literal) => {
        impl EnvValue for $ty {
            fn kind() -> Kind {
                Kind::new($tag)
            }

            fn from_value(value: Value) -> Result<Self, ConversionError> {
                match value {
                    Value::$variant(v) => Ok(v),
                    other => Err(mismatch($expected, &other)),
                }
            }

            fn into_value(self) -> Value {
                Value::$variant(self)
            }
        }
    };
}

impl_env_value_simple!(Decimal, "decimal", Decimal, "a decimal");
impl_env_value_simple!(serde_json::Value, "json", Json, "a JSON document");
impl_env_value_simple!(NaiveDate, "date", Date, "a date");
impl_env_value_simple!(NaiveTime, "time", Time, "a time");
impl_env_value_simple!(TimeDelta, "timedelta", Duration, "a duration");
impl_env_value_simple!(PathBuf, "path", Path, "a path");
impl_env_value_simple!(Uuid, "uuid", Uuid, "a UUID");
impl_env_value_simple!(Url, "url", Url, "a URL");

impl EnvValue for DateTime<FixedOffset> {
    fn kind() -> Kind {
        Kind::new("datetime")
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::DateTime(dt) => Ok(dt),
            Value::NaiveDateTime(_) => Err(ConversionError::new("Not a timezone-aware datetime.")),
            other => Err(mismatch("a datetime", &other)),
        }
    }

    fn into_value(self) -> Value {
        Value::DateTime(self)
    }
}

impl EnvValue for DateTime<Utc> {
    fn kind() -> Kind {
        Kind::new("datetime")
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        DateTime::<FixedOffset>::from_value(value).map(|dt| dt.with_timezone(&Utc))
    }

    fn into_value(self) -> Value {
        Value::DateTime(self.fixed_offset())
    }
}

impl EnvValue for NaiveDateTime {
    fn kind() -> Kind {
        Kind::new("datetime")
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::NaiveDateTime(dt) => Ok(dt),
            Value::DateTime(dt) => Ok(dt.naive_local()),
            other => Err(mismatch("a datetime", &other)),
        }
    }

    fn into_value(self) -> Value {
        Value::NaiveDateTime(self)
    }
}

impl EnvValue for std::time::Duration {
    fn kind() -> Kind {
        Kind::new("timedelta")
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        TimeDelta::from_value(value)?
            .to_std()
            .map_err(|_| ConversionError::new("Duration must not be negative."))
    }

    fn into_value(self) -> Value {
        TimeDelta::from_std(self)
            .map(Value::Duration)
            .unwrap_or(Value::Duration(TimeDelta::MAX))
    }
}

impl<T: EnvValue> EnvValue for Vec<T> {
    fn kind() -> Kind {
        Kind::list(T::kind().tag)
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        match value {
            Value::List(items) => items.into_iter().map(T::from_value).collect(),
            Value::Json(json @ serde_json::Value::Array(_)) => {
                Self::from_value(Value::from_json(json))
            }
            other => Err(mismatch("a list", &other)),
        }
    }

    fn into_value(self) -> Value {
        Value::List(self.into_iter().map(EnvValue::into_value).collect())
    }
}

fn dict_pairs(value: Value) -> Result<Vec<(Value, Value)>, ConversionError> {
    match value {
        Value::Dict(pairs) => Ok(pairs),
        Value::Json(json @ serde_json::Value::Object(_)) => dict_pairs(Value::from_json(json)),
        other => Err(mismatch("a mapping", &other)),
    }
}

impl<K, V> EnvValue for HashMap<K, V>
where
    K: EnvValue + Eq + Hash,
    V: EnvValue,
{
    fn kind() -> Kind {
        Kind::dict(K::kind().tag, V::kind().tag)
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        dict_pairs(value)?
            .into_iter()
            .map(|(k, v)| Ok((K::from_value(k)?, V::from_value(v)?)))
            .collect()
    }

    fn into_value(self) -> Value {
        Value::Dict(
            self.into_iter()
                .map(|(k, v)| (k.into_value(), v.into_value()))
                .collect(),
        )
    }
}

impl<K, V> EnvValue for BTreeMap<K, V>
where
    K: EnvValue + Ord,
    V: EnvValue,
{
    fn kind() -> Kind {
        Kind::dict(K::kind().tag, V::kind().tag)
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        dict_pairs(value)?
            .into_iter()
            .map(|(k, v)| Ok((K::from_value(k)?, V::from_value(v)?)))
            .collect()
    }

    fn into_value(self) -> Value {
        Value::Dict(
            self.into_iter()
                .map(|(k, v)| (k.into_value(), v.into_value()))
                .collect(),
        )
    }
}

/// A JSON document deserialized into `T` with serde.
///
/// ```rust
/// use envcast::{Env, Json};
/// use serde::Deserialize;
///
/// #[derive(Debug, Deserialize, serde::Serialize)]
/// struct Database {
///     host: String,
///     port: u16,
/// }
///
/// # fn main() -> Result<(), envcast::EnvError> {
/// let source = std::collections::HashMap::from([(
///     "DATABASE".to_string(),
///     r#"{"host":"localhost","port":5432}"#.to_string(),
/// )]);
/// let mut env = Env::builder().source(source).build();
/// let Json(db) = env.var::<Json<Database>>("DATABASE").get()?.unwrap();
/// assert_eq!(db.port, 5432);
/// # Ok(())
/// # }
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct Json<T>(pub T);

impl<T: DeserializeOwned + Serialize> EnvValue for Json<T> {
    fn kind() -> Kind {
        Kind::new("json")
    }

    fn from_value(value: Value) -> Result<Self, ConversionError> {
        let json = match value {
            Value::Json(json) => json,
            other => other.to_plain(),
        };
        serde_json::from_value(json)
            .map(Json)
            .map_err(|e| ConversionError::new(format!("Not valid JSON: {e}.")))
    }

    fn into_value(self) -> Value {
        serde_json::to_value(&self.0)
            .map(Value::Json)
            .unwrap_or(Value::Null)
    }
}

macro_rules! impl_from_for_value {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(value: $ty) -> Self {
                    EnvValue::into_value(value)
                }
            }
        )*
    };
}

impl_from_for_value!(
    String, bool, i32, i64, u16, u32, u64, f64, Decimal, serde_json::Value, NaiveDate,
    NaiveTime, NaiveDateTime, TimeDelta, PathBuf, Uuid, Url
);

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::Str(value.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(items: Vec<T>) -> Self {
        Value::List(items.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(value: Option<T>) -> Self {
        value.map(Into::into).unwrap_or(Value::Null)
    }
}
