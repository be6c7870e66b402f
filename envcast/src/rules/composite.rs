use super::{element_options, Subcast, TypeRule};
use crate::error::ConversionError;
use crate::options::ParseOptions;
use crate::value::Value;

const NOT_A_LIST: &str = "Not a valid list.";
const NOT_A_MAPPING: &str = "Not a valid mapping type.";
const NOT_JSON: &str = "Not valid JSON.";

/// Delimited list, each element converted by the optional subcast.
///
/// An empty string is an empty list; an already split sequence is not split
/// again.
#[derive(Debug, Clone, Copy, Default)]
pub struct ListRule;

impl TypeRule for ListRule {
    fn name(&self) -> &str {
        "list"
    }

    fn preprocess(&self, value: Value, options: &ParseOptions) -> Result<Value, ConversionError> {
        match value {
            Value::Str(s) if s.is_empty() => Ok(Value::List(Vec::new())),
            Value::Str(s) => Ok(Value::List(
                s.split(options.delimiter())
                    .map(|item| Value::Str(item.to_string()))
                    .collect(),
            )),
            Value::Json(json @ serde_json::Value::Array(_)) => Ok(Value::from_json(json)),
            other => Ok(other),
        }
    }

    fn convert(&self, value: Value, options: &ParseOptions) -> Result<Value, ConversionError> {
        let Value::List(items) = value else {
            return Err(ConversionError::new(NOT_A_LIST));
        };
        let Some(subcast) = &options.subcast else {
            return Ok(Value::List(items));
        };

        let element_options = element_options(options);
        let mut converted = Vec::with_capacity(items.len());
        let mut messages = Vec::new();
        for (index, item) in items.into_iter().enumerate() {
            match subcast.apply(item, &element_options) {
                Ok(item) => converted.push(item),
                Err(e) => messages.extend(e.within(format!("Item {index}")).messages),
            }
        }
        if messages.is_empty() {
            Ok(Value::List(converted))
        } else {
            Err(ConversionError::many(messages))
        }
    }
}

/// Delimited `key=value` pairs, keys and values converted by the optional
/// subcasts. An explicit mapping passes through unchanged.
#[derive(Debug, Clone, Copy, Default)]
pub struct DictRule;

impl TypeRule for DictRule {
    fn name(&self) -> &str {
        "dict"
    }

    fn preprocess(&self, value: Value, options: &ParseOptions) -> Result<Value, ConversionError> {
        let raw = match value {
            Value::Str(raw) => raw,
            Value::Json(json @ serde_json::Value::Object(_)) => return Ok(Value::from_json(json)),
            other => return Ok(other),
        };
        if raw.is_empty() {
            return Ok(Value::Dict(Vec::new()));
        }

        let element_options = element_options(options);
        let mut pairs = Vec::new();
        for item in raw.split(options.delimiter()) {
            let (key, val) = item
                .split_once(options.key_delimiter())
                .ok_or_else(|| ConversionError::new(NOT_A_MAPPING))?;
            let key = cast(&options.subcast_keys, key.trim(), &element_options)?;
            let val = cast(&options.subcast_values, val.trim(), &element_options)?;
            pairs.push((key, val));
        }
        Ok(Value::Dict(pairs))
    }

    fn convert(&self, value: Value, _options: &ParseOptions) -> Result<Value, ConversionError> {
        match value {
            Value::Dict(pairs) => Ok(Value::Dict(pairs)),
            _ => Err(ConversionError::new(NOT_A_MAPPING)),
        }
    }
}

fn cast(
    subcast: &Option<Subcast>,
    raw: &str,
    options: &ParseOptions,
) -> Result<Value, ConversionError> {
    let value = Value::Str(raw.to_string());
    match subcast {
        Some(subcast) => subcast.apply(value, options),
        None => Ok(value),
    }
}

/// JSON document. Already structured values are accepted as is.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonRule;

impl TypeRule for JsonRule {
    fn name(&self) -> &str {
        "json"
    }

    fn preprocess(&self, value: Value, _options: &ParseOptions) -> Result<Value, ConversionError> {
        match value {
            Value::Str(raw) => serde_json::from_str(&raw)
                .map(Value::Json)
                .map_err(|_| ConversionError::new(NOT_JSON)),
            Value::Json(json) => Ok(Value::Json(json)),
            structured @ (Value::List(_) | Value::Dict(_)) => {
                Ok(Value::Json(structured.to_plain()))
            }
            _ => Err(ConversionError::new(NOT_JSON)),
        }
    }

    fn convert(&self, value: Value, _options: &ParseOptions) -> Result<Value, ConversionError> {
        match value {
            Value::Json(json) => Ok(Value::Json(json)),
            _ => Err(ConversionError::new(NOT_JSON)),
        }
    }
}
