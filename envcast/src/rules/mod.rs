//! Type rules: how a raw string becomes a typed [`Value`].
//!
//! A [`Registry`] maps tags (`"int"`, `"list"`, `"url"`, ...) to rules. Every
//! reader starts with the built-in rules and may register its own; a name
//! that is already taken is rejected, never replaced.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{ConversionError, EnvError};
use crate::options::ParseOptions;
use crate::value::{EnvValue, Value};

mod composite;
mod enums;
mod scalar;
mod temporal;
mod uri;

pub use composite::{DictRule, JsonRule, ListRule};
pub use enums::EnumRule;
pub use scalar::{
    BoolRule, DecimalRule, FloatRule, IntRule, LogLevelRule, PathRule, RawRule, StrRule, UuidRule,
};
pub use temporal::{DateRule, DateTimeRule, TimeDeltaRule, TimeRule};
pub use uri::UrlRule;

/// Conversion of one raw value into a typed value.
///
/// The reader drives a rule through `preprocess`, `convert`, the caller's
/// validators, then `finalize`. Every step reports problems as a
/// [`ConversionError`].
pub trait TypeRule: Send + Sync {
    /// Tag the rule is registered under.
    fn name(&self) -> &str;

    /// Structural preparation, e.g. splitting a list or decoding JSON.
    fn preprocess(&self, value: Value, _options: &ParseOptions) -> Result<Value, ConversionError> {
        Ok(value)
    }

    fn convert(&self, value: Value, options: &ParseOptions) -> Result<Value, ConversionError>;

    /// Runs after validation, so validators see the converted value before
    /// any re-parsing into a richer form.
    fn finalize(&self, value: Value) -> Result<Value, ConversionError> {
        Ok(value)
    }

    /// Plain representation for [`Env::dump`](crate::Env::dump).
    fn serialize(&self, value: &Value) -> serde_json::Value {
        value.to_plain()
    }
}

/// Run every conversion step of `rule`, without validators.
pub fn apply(
    rule: &dyn TypeRule,
    value: Value,
    options: &ParseOptions,
) -> Result<Value, ConversionError> {
    let value = rule.preprocess(value, options)?;
    let value = rule.convert(value, options)?;
    rule.finalize(value)
}

/// Function signature of a custom parser.
///
/// Receives the raw string and the call's options (see [`ParseOptions::arg`]).
pub type ParserFn =
    Arc<dyn Fn(&str, &ParseOptions) -> Result<Value, ConversionError> + Send + Sync>;

/// Function signature of an ad-hoc subcast.
pub type SubcastFn = Arc<dyn Fn(Value) -> Result<Value, ConversionError> + Send + Sync>;

/// Element-level (or key/value-level) type of a composite.
#[derive(Clone)]
pub enum Subcast {
    /// A rule looked up by tag in the reader's registry
    Tag(String),
    Rule(Arc<dyn TypeRule>),
    /// Any unary function; its errors become conversion failures
    Func(SubcastFn),
}

impl Subcast {
    pub fn tag(tag: impl Into<String>) -> Self {
        Subcast::Tag(tag.into())
    }

    /// The rule producing `T`, e.g. `Subcast::of::<i64>()` for `"int"`.
    pub fn of<T: EnvValue>() -> Self {
        Subcast::Tag(T::kind().tag.to_string())
    }

    pub fn rule(rule: impl TypeRule + 'static) -> Self {
        Subcast::Rule(Arc::new(rule))
    }

    pub fn func<F>(func: F) -> Self
    where
        F: Fn(Value) -> Result<Value, ConversionError> + Send + Sync + 'static,
    {
        Subcast::Func(Arc::new(func))
    }

    /// Convert one element. Tags must have been resolved by the registry.
    pub(crate) fn apply(
        &self,
        value: Value,
        options: &ParseOptions,
    ) -> Result<Value, ConversionError> {
        match self {
            Subcast::Rule(rule) => apply(rule.as_ref(), value, options),
            Subcast::Func(func) => func(value),
            Subcast::Tag(tag) => Err(ConversionError::new(format!("Unresolved subcast '{tag}'."))),
        }
    }
}

impl fmt::Debug for Subcast {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subcast::Tag(tag) => f.debug_tuple("Tag").field(tag).finish(),
            Subcast::Rule(rule) => f.debug_tuple("Rule").field(&rule.name()).finish(),
            Subcast::Func(_) => f.write_str("Func(..)"),
        }
    }
}

/// Rule wrapping a custom parser function.
pub(crate) struct FnRule {
    name: String,
    func: ParserFn,
}

impl FnRule {
    pub(crate) fn new(name: impl Into<String>, func: ParserFn) -> Self {
        Self {
            name: name.into(),
            func,
        }
    }
}

impl TypeRule for FnRule {
    fn name(&self) -> &str {
        &self.name
    }

    fn convert(&self, value: Value, options: &ParseOptions) -> Result<Value, ConversionError> {
        match value {
            Value::Str(raw) => (self.func)(&raw, options),
            typed => Ok(typed),
        }
    }
}

/// Rule wrapping an ad-hoc subcast function.
struct SubcastRule {
    func: SubcastFn,
}

impl TypeRule for SubcastRule {
    fn name(&self) -> &str {
        "subcast"
    }

    fn convert(&self, value: Value, _options: &ParseOptions) -> Result<Value, ConversionError> {
        (self.func)(value)
    }
}

/// Options handed to element rules: the call's options without subcasts, so
/// a composite element never recurses into the composite's own subcast.
pub(crate) fn element_options(options: &ParseOptions) -> ParseOptions {
    ParseOptions {
        subcast: None,
        subcast_keys: None,
        subcast_values: None,
        validators: Vec::new(),
        default: None,
        ..options.clone()
    }
}

/// Tag to rule table.
#[derive(Clone)]
pub struct Registry {
    rules: BTreeMap<String, Arc<dyn TypeRule>>,
}

impl Registry {
    /// An empty registry, without built-in rules.
    pub fn empty() -> Self {
        Self {
            rules: BTreeMap::new(),
        }
    }

    /// A registry holding every built-in rule.
    pub fn with_builtins() -> Self {
        let builtins: Vec<Arc<dyn TypeRule>> = vec![
            Arc::new(RawRule),
            Arc::new(StrRule),
            Arc::new(IntRule),
            Arc::new(FloatRule),
            Arc::new(BoolRule),
            Arc::new(DecimalRule),
            Arc::new(ListRule),
            Arc::new(DictRule),
            Arc::new(JsonRule),
            Arc::new(DateTimeRule),
            Arc::new(DateRule),
            Arc::new(TimeRule),
            Arc::new(TimeDeltaRule),
            Arc::new(PathRule),
            Arc::new(LogLevelRule),
            Arc::new(UuidRule),
            Arc::new(UrlRule),
            Arc::new(EnumRule),
        ];
        let rules = builtins
            .into_iter()
            .map(|rule| (rule.name().to_string(), rule))
            .collect();
        Self { rules }
    }

    /// Add `rule` under `name`. Existing names are never overwritten.
    pub fn register(
        &mut self,
        name: impl Into<String>,
        rule: Arc<dyn TypeRule>,
    ) -> Result<(), EnvError> {
        let name = name.into();
        if self.rules.contains_key(&name) {
            return Err(EnvError::ParserConflict { name });
        }
        self.rules.insert(name, rule);
        Ok(())
    }

    pub fn lookup(&self, name: &str) -> Result<Arc<dyn TypeRule>, EnvError> {
        self.rules
            .get(name)
            .cloned()
            .ok_or_else(|| EnvError::UnknownAccessor {
                name: name.to_string(),
            })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.rules.contains_key(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.rules.keys().map(String::as_str)
    }

    /// Turn tags and functions into rules.
    pub fn resolve_subcast(&self, subcast: Subcast) -> Result<Subcast, EnvError> {
        match subcast {
            Subcast::Tag(tag) => self.lookup(&tag).map(Subcast::Rule),
            Subcast::Func(func) => Ok(Subcast::Rule(Arc::new(SubcastRule { func }))),
            rule @ Subcast::Rule(_) => Ok(rule),
        }
    }

    pub(crate) fn resolve_options(&self, options: &mut ParseOptions) -> Result<(), EnvError> {
        for slot in [
            &mut options.subcast,
            &mut options.subcast_keys,
            &mut options.subcast_values,
        ] {
            if let Some(subcast) = slot.take() {
                *slot = Some(self.resolve_subcast(subcast)?);
            }
        }
        Ok(())
    }
}

impl Default for Registry {
    fn default() -> Self {
        Self::with_builtins()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.rules.keys()).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builtins_are_registered() {
        let registry = Registry::with_builtins();
        for tag in [
            "raw", "str", "int", "float", "bool", "decimal", "list", "dict", "json", "datetime",
            "date", "time", "timedelta", "path", "log_level", "uuid", "url", "enum",
        ] {
            assert!(registry.contains(tag), "missing built-in rule {tag}");
        }
    }

    #[test]
    fn test_register_conflict_keeps_builtin() {
        let mut registry = Registry::with_builtins();
        let func: ParserFn = Arc::new(|raw, _| Ok(Value::Str(format!("https://{raw}"))));
        let err = registry
            .register("int", Arc::new(FnRule::new("int", func)))
            .unwrap_err();
        assert!(matches!(err, EnvError::ParserConflict { name } if name == "int"));

        let rule = registry.lookup("int").unwrap();
        let value = apply(rule.as_ref(), Value::Str("42".into()), &ParseOptions::default());
        assert_eq!(value.unwrap(), Value::Int(42));
    }

    #[test]
    fn test_lookup_unknown() {
        let registry = Registry::with_builtins();
        assert!(matches!(
            registry.lookup("https_url"),
            Err(EnvError::UnknownAccessor { .. })
        ));
    }

    #[test]
    fn test_subcast_func_wraps_as_rule() {
        let registry = Registry::with_builtins();
        let subcast = Subcast::func(|v| match v {
            Value::Str(s) => Ok(Value::Str(s.to_uppercase())),
            other => Ok(other),
        });
        let resolved = registry.resolve_subcast(subcast).unwrap();
        assert!(matches!(resolved, Subcast::Rule(_)));
        let value = resolved
            .apply(Value::Str("abc".into()), &ParseOptions::default())
            .unwrap();
        assert_eq!(value, Value::Str("ABC".into()));
    }

    #[test]
    fn test_subcast_of_type() {
        let registry = Registry::with_builtins();
        let resolved = registry.resolve_subcast(Subcast::of::<f64>()).unwrap();
        let value = resolved
            .apply(Value::Str("1.5".into()), &ParseOptions::default())
            .unwrap();
        assert_eq!(value, Value::Float(1.5));
    }

    #[test]
    fn test_fn_rule_passes_typed_values_through() {
        let func: ParserFn = Arc::new(|raw, _| Ok(Value::Str(format!("https://{raw}"))));
        let rule = FnRule::new("https_url", func);
        let opts = ParseOptions::default();
        assert_eq!(
            rule.convert(Value::Str("test.test/".into()), &opts).unwrap(),
            Value::Str("https://test.test/".into())
        );
        assert_eq!(rule.convert(Value::Int(1), &opts).unwrap(), Value::Int(1));
    }
}
