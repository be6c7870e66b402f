use super::TypeRule;
use crate::error::ConversionError;
use crate::options::ParseOptions;
use crate::value::Value;

/// Member name of the enumeration described by [`ParseOptions::enum_spec`].
///
/// Names match exactly unless `ignore_case` is set. The canonical member
/// name is kept.
#[derive(Debug, Clone, Copy, Default)]
pub struct EnumRule;

impl TypeRule for EnumRule {
    fn name(&self) -> &str {
        "enum"
    }

    fn convert(&self, value: Value, options: &ParseOptions) -> Result<Value, ConversionError> {
        let Some(spec) = &options.enum_spec else {
            return Err(ConversionError::new("No enum members to match against."));
        };
        let invalid = || ConversionError::new(format!("Not a valid '{}' enum.", spec.type_name));

        let raw = match value {
            Value::Str(raw) | Value::Enum(raw) => raw,
            _ => return Err(invalid()),
        };
        let found = if options.ignore_case {
            spec.members.iter().find(|m| m.to_lowercase() == raw.to_lowercase())
        } else {
            spec.members.iter().find(|m| **m == raw)
        };
        found.map(|m| Value::Enum(m.clone())).ok_or_else(invalid)
    }
}
