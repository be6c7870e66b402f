//! The reader: one parsing session over an environment source

use std::collections::BTreeMap;
use std::fmt;
use std::ops::{Deref, DerefMut};
use std::path::PathBuf;
use std::str::FromStr;
use std::sync::Arc;

use chrono::{DateTime, FixedOffset, NaiveDate, NaiveTime, TimeDelta};
use rust_decimal::Decimal;
use tracing::debug;
use url::Url;
use uuid::Uuid;

use crate::error::{ConversionError, EnvError, ErrorMap};
use crate::options::{EnumSpec, ParseOptions, INVALID, VALIDATOR_FAILED};
use crate::resolve::Resolver;
use crate::rules::{FnRule, ParserFn, Registry, Subcast, TypeRule};
use crate::source::{EnvSource, ProcessEnv};
use crate::value::{EnvValue, Value};
use crate::var::Var;

/// Method names of [`Env`] that custom parsers may not take.
const RESERVED_NAMES: &[&str] = &[
    "new",
    "builder",
    "var",
    "parse",
    "enumeration",
    "deserialize",
    "prefixed",
    "with_prefix",
    "seal",
    "dump",
    "errors",
    "add_parser",
    "add_rule",
    "is_eager",
    "is_sealed",
    "expand_vars",
];

/// Typed environment variable reader.
///
/// An eager reader (the default) fails at the accessor call. A deferred
/// reader records every failure and reports them together from
/// [`seal`](Env::seal).
///
/// ```rust
/// use envcast::Env;
///
/// # fn main() -> Result<(), envcast::EnvError> {
/// let source = std::collections::HashMap::from([
///     ("PORT".to_string(), "3000".to_string()),
///     ("HOSTS".to_string(), "a.com,b.com".to_string()),
/// ]);
/// let mut env = Env::builder().source(source).build();
///
/// let port = env.var::<u16>("PORT").get()?;
/// let hosts = env.list::<String>("HOSTS").get()?;
/// let debug = env.bool("DEBUG").default(false).get()?;
///
/// assert_eq!(port, Some(3000));
/// assert_eq!(hosts, Some(vec!["a.com".to_string(), "b.com".to_string()]));
/// assert_eq!(debug, Some(false));
/// # Ok(())
/// # }
/// ```
pub struct Env {
    source: Box<dyn EnvSource>,
    eager: bool,
    expand_vars: bool,
    sealed: bool,
    prefix: Vec<String>,
    fields: BTreeMap<String, Arc<dyn TypeRule>>,
    values: BTreeMap<String, Value>,
    errors: ErrorMap,
    registry: Registry,
}

impl Env {
    /// Eager reader over the process environment, without expansion.
    pub fn new() -> Self {
        Self::builder().build()
    }

    pub fn builder() -> EnvBuilder {
        EnvBuilder::default()
    }

    pub fn is_eager(&self) -> bool {
        self.eager
    }

    pub fn expand_vars(&self) -> bool {
        self.expand_vars
    }

    pub fn is_sealed(&self) -> bool {
        self.sealed
    }

    /// Failures recorded so far by a deferred reader.
    pub fn errors(&self) -> &ErrorMap {
        &self.errors
    }

    /// Unwrap the value read for a derived field.
    #[doc(hidden)]
    pub fn __field<T>(&self, value: Option<T>, name: &str) -> Result<T, EnvError> {
        match value {
            Some(value) => Ok(value),
            None if !self.errors.is_empty() => Err(EnvError::Validation {
                errors: self.errors.clone(),
            }),
            None => Err(EnvError::missing(self.key(name))),
        }
    }

    /// Read `name` with the rule producing `T`.
    ///
    /// Lists and mappings get their element subcasts from `T`, so
    /// `var::<Vec<u16>>` splits and converts each item.
    pub fn var<T: EnvValue + 'static>(&mut self, name: &str) -> Var<'_, T> {
        self.parse(T::kind().tag, name)
    }

    /// Read `name` with the rule registered under `tag`.
    ///
    /// This is how custom parsers are called:
    /// `env.parse::<String>("https_url", "WEBSITE")`. Element subcasts still
    /// come from `T`.
    pub fn parse<T: EnvValue + 'static>(&mut self, tag: &str, name: &str) -> Var<'_, T> {
        let kind = T::kind();
        let mut var = Var::new(self, name, tag);
        let options = var.options_mut();
        if kind.tag == "dict" {
            options.subcast_keys = kind.keys.map(Subcast::tag);
            options.subcast_values = kind.items.map(Subcast::tag);
        } else {
            options.subcast = kind.items.map(Subcast::tag);
        }
        var
    }

    /// Raw string (or default), untouched.
    pub fn raw(&mut self, name: &str) -> Var<'_, Value> {
        Var::new(self, name, "raw")
    }

    pub fn str(&mut self, name: &str) -> Var<'_, String> {
        Var::new(self, name, "str")
    }

    pub fn int(&mut self, name: &str) -> Var<'_, i64> {
        Var::new(self, name, "int")
    }

    pub fn float(&mut self, name: &str) -> Var<'_, f64> {
        Var::new(self, name, "float")
    }

    pub fn bool(&mut self, name: &str) -> Var<'_, bool> {
        Var::new(self, name, "bool")
    }

    pub fn decimal(&mut self, name: &str) -> Var<'_, Decimal> {
        Var::new(self, name, "decimal")
    }

    /// Delimited list whose items are converted to `T`.
    ///
    /// Use `list::<Value>` for the items as written.
    pub fn list<T: EnvValue + 'static>(&mut self, name: &str) -> Var<'_, Vec<T>> {
        self.var::<Vec<T>>(name)
    }

    /// Delimited `key=value` pairs, e.g. `dict::<HashMap<String, i64>>`.
    pub fn dict<M: EnvValue + 'static>(&mut self, name: &str) -> Var<'_, M> {
        self.var::<M>(name)
    }

    pub fn json(&mut self, name: &str) -> Var<'_, serde_json::Value> {
        Var::new(self, name, "json")
    }

    /// Date and time with an offset. Use `var::<NaiveDateTime>` for values
    /// written without one.
    pub fn datetime(&mut self, name: &str) -> Var<'_, DateTime<FixedOffset>> {
        Var::new(self, name, "datetime")
    }

    pub fn date(&mut self, name: &str) -> Var<'_, NaiveDate> {
        Var::new(self, name, "date")
    }

    pub fn time(&mut self, name: &str) -> Var<'_, NaiveTime> {
        Var::new(self, name, "time")
    }

    pub fn timedelta(&mut self, name: &str) -> Var<'_, TimeDelta> {
        Var::new(self, name, "timedelta")
    }

    pub fn path(&mut self, name: &str) -> Var<'_, PathBuf> {
        Var::new(self, name, "path")
    }

    /// Numeric log level; names like `warning` map to their standard value.
    pub fn log_level(&mut self, name: &str) -> Var<'_, i64> {
        Var::new(self, name, "log_level")
    }

    pub fn uuid(&mut self, name: &str) -> Var<'_, Uuid> {
        Var::new(self, name, "uuid")
    }

    pub fn url(&mut self, name: &str) -> Var<'_, Url> {
        Var::new(self, name, "url")
    }

    /// Member of the enum `T`, matched by name.
    ///
    /// `T` is typically a fieldless enum deriving strum's `EnumString`,
    /// `VariantNames` and `AsRefStr`.
    pub fn enumeration<T>(&mut self, name: &str) -> Var<'_, T>
    where
        T: FromStr + strum::VariantNames + AsRef<str> + 'static,
    {
        let type_name = short_type_name::<T>();
        let spec = EnumSpec::new(type_name, T::VARIANTS.iter().copied());
        let invalid = format!("Not a valid '{type_name}' enum.");
        let mut var = Var::with_conversion(
            self,
            name,
            "enum",
            move |value| match value {
                Value::Enum(s) | Value::Str(s) => {
                    T::from_str(&s).map_err(|_| ConversionError::new(invalid.clone()))
                }
                other => Err(crate::value::mismatch("an enum member", &other)),
            },
            Some(enum_member::<T> as fn(T) -> Value),
        );
        var.options_mut().enum_spec = Some(spec);
        var
    }

    /// Read `name` as a string and parse it with `deserializer`.
    ///
    /// Unlike [`Var::deserialize_with`], `T` can be any type.
    ///
    /// ```rust
    /// use envcast::Env;
    ///
    /// # fn main() -> Result<(), envcast::EnvError> {
    /// #[derive(Debug, PartialEq, serde::Deserialize)]
    /// struct Limits {
    ///     cpu: u32,
    /// }
    ///
    /// let source = std::collections::HashMap::from([
    ///     ("LIMITS".to_string(), r#"{"cpu": 2}"#.to_string()),
    /// ]);
    /// let mut env = Env::builder().source(source).build();
    /// let limits = env
    ///     .deserialize("LIMITS", |raw: &str| serde_json::from_str::<Limits>(raw))
    ///     .get()?;
    /// assert_eq!(limits, Some(Limits { cpu: 2 }));
    /// # Ok(())
    /// # }
    /// ```
    pub fn deserialize<'e, T, F, E>(&'e mut self, name: &str, deserializer: F) -> Var<'e, T>
    where
        T: 'e,
        F: Fn(&str) -> Result<T, E> + 'e,
        E: fmt::Display,
    {
        Var::with_conversion(
            self,
            name,
            "str",
            move |value| match value {
                Value::Str(raw) => {
                    deserializer(&raw).map_err(|e| ConversionError::new(e.to_string()))
                }
                other => Err(crate::value::mismatch("a string", &other)),
            },
            None,
        )
    }

    /// Push `prefix` for as long as the returned guard lives.
    ///
    /// Nested scopes concatenate. The previous prefix is restored when the
    /// guard drops, on every exit path.
    pub fn prefixed(&mut self, prefix: impl Into<String>) -> Prefixed<'_> {
        let depth = self.prefix.len();
        self.prefix.push(prefix.into());
        Prefixed { env: self, depth }
    }

    /// Run `scope` with `prefix` pushed.
    pub fn with_prefix<R>(
        &mut self,
        prefix: impl Into<String>,
        scope: impl FnOnce(&mut Env) -> R,
    ) -> R {
        let mut guard = self.prefixed(prefix);
        scope(&mut guard)
    }

    /// Stop accepting reads and report every recorded failure at once.
    ///
    /// The reader is sealed whether or not this returns an error. Calling it
    /// again with nothing new recorded succeeds.
    pub fn seal(&mut self) -> Result<(), EnvError> {
        self.sealed = true;
        if self.errors.is_empty() {
            debug!("env sealed");
            return Ok(());
        }
        let errors = std::mem::take(&mut self.errors);
        debug!(failed = errors.len(), "env sealed with errors");
        Err(EnvError::Validation { errors })
    }

    /// Every successfully parsed value as plain JSON data, keyed by the
    /// variable name that was read.
    pub fn dump(&self) -> serde_json::Map<String, serde_json::Value> {
        self.values
            .iter()
            .map(|(key, value)| {
                let plain = match self.fields.get(key) {
                    Some(rule) => rule.serialize(value),
                    None => value.to_plain(),
                };
                (key.clone(), plain)
            })
            .collect()
    }

    /// Register a parser function under `name`.
    ///
    /// The function receives the raw string and the call's options, and is
    /// then available through [`parse`](Env::parse) and as a subcast.
    pub fn add_parser<F>(&mut self, name: &str, parser: F) -> Result<(), EnvError>
    where
        F: Fn(&str, &ParseOptions) -> Result<Value, ConversionError> + Send + Sync + 'static,
    {
        let parser: ParserFn = Arc::new(parser);
        self.add_rule(name, FnRule::new(name, parser))
    }

    /// Register a full [`TypeRule`] under `name`.
    pub fn add_rule(&mut self, name: &str, rule: impl TypeRule + 'static) -> Result<(), EnvError> {
        if RESERVED_NAMES.contains(&name) {
            return Err(EnvError::ParserConflict {
                name: name.to_string(),
            });
        }
        self.registry.register(name, Arc::new(rule))?;
        debug!(name, "registered custom parser");
        Ok(())
    }

    fn key(&self, name: &str) -> String {
        let mut key = self.prefix.concat();
        key.push_str(name);
        key
    }

    /// Resolve, convert and record one variable.
    ///
    /// `Ok(None)` means a deferred reader recorded a failure.
    pub(crate) fn read(
        &mut self,
        name: &str,
        tag: &str,
        mut options: ParseOptions,
    ) -> Result<Option<Value>, EnvError> {
        if self.sealed {
            return Err(EnvError::Sealed);
        }
        let rule = self.registry.lookup(tag)?;
        self.registry.resolve_options(&mut options)?;
        let key = self.key(name);

        match self.evaluate(&key, rule.as_ref(), &options) {
            Ok(value) => {
                debug!(key = %key, tag, "parsed environment variable");
                self.fields.insert(key.clone(), rule);
                self.values.insert(key, value.clone());
                Ok(Some(value))
            }
            Err(error) => self.fail(key, tag, error).map(|()| None),
        }
    }

    /// Record a value the caller could not accept, e.g. out of range for the
    /// requested Rust type.
    pub(crate) fn reject(
        &mut self,
        name: &str,
        tag: &str,
        error: ConversionError,
    ) -> Result<(), EnvError> {
        let key = self.key(name);
        let error = EnvError::invalid(key.clone(), error.messages);
        self.fail(key, tag, error)
    }

    fn fail(&mut self, key: String, tag: &str, error: EnvError) -> Result<(), EnvError> {
        self.values.remove(&key);
        self.fields.remove(&key);
        if self.eager || !is_deferrable(&error) {
            debug!(key = %key, tag, "environment variable rejected");
            return Err(error);
        }
        let messages = error.messages();
        debug!(key = %key, tag, messages = messages.len(), "recorded deferred failure");
        self.errors.entry(key).or_default().extend(messages);
        Ok(())
    }

    fn evaluate(
        &self,
        key: &str,
        rule: &dyn TypeRule,
        options: &ParseOptions,
    ) -> Result<Value, EnvError> {
        let resolver = Resolver::new(self.source.as_ref(), self.expand_vars)
            .with_file_fallback(options.from_file);
        let resolved = resolver.resolve(key)?;

        let (raw, source_key) = match resolved.value {
            Some(ref value) => (value.clone(), resolved.source_key().to_string()),
            None => {
                let default = if options.required {
                    None
                } else {
                    options.default.as_ref()
                };
                match default {
                    None => return Err(EnvError::missing(resolved.source_key())),
                    Some(Value::Null) if options.allow_none == Some(false) => {
                        let message = "Field may not be null.".to_string();
                        return Err(EnvError::invalid(key, vec![message]));
                    }
                    Some(Value::Str(text)) => match resolver.expand_default(key, text)? {
                        Some(expanded) => match expanded.value {
                            Some(ref value) => (value.clone(), expanded.source_key().to_string()),
                            None => return Err(EnvError::missing(expanded.source_key())),
                        },
                        None => return Ok(Value::Str(text.clone())),
                    },
                    Some(default) => return Ok(default.clone()),
                }
            }
        };

        convert(rule, Value::Str(raw), options)
            .map_err(|e| EnvError::invalid(source_key, e.messages))
    }
}

/// Run a rule and the caller's validators on a raw value.
fn convert(
    rule: &dyn TypeRule,
    raw: Value,
    options: &ParseOptions,
) -> Result<Value, ConversionError> {
    let value = rule
        .preprocess(raw, options)
        .and_then(|value| rule.convert(value, options))
        .map_err(|e| overridden(e, options.message_override(INVALID)))?;

    let mut messages = Vec::new();
    for validator in &options.validators {
        if let Err(e) = validator(&value) {
            messages.extend(overridden(e, options.message_override(VALIDATOR_FAILED)).messages);
        }
    }
    if !messages.is_empty() {
        return Err(ConversionError::many(messages));
    }

    rule.finalize(value)
        .map_err(|e| overridden(e, options.message_override(INVALID)))
}

fn overridden(error: ConversionError, message: Option<&str>) -> ConversionError {
    match message {
        Some(message) => ConversionError::new(message),
        None => error,
    }
}

/// Data failures a deferred reader records instead of raising.
fn is_deferrable(error: &EnvError) -> bool {
    matches!(
        error,
        EnvError::NotSet { .. }
            | EnvError::Invalid { .. }
            | EnvError::ExpansionCycle { .. }
            | EnvError::ExpansionLimit { .. }
            | EnvError::FileRead { .. }
    )
}

fn enum_member<T: AsRef<str>>(member: T) -> Value {
    Value::Enum(member.as_ref().to_string())
}

fn short_type_name<T>() -> &'static str {
    let full = std::any::type_name::<T>();
    let path = full.split('<').next().unwrap_or(full);
    path.rsplit("::").next().unwrap_or(path)
}

impl Default for Env {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Env(eager={}, expand_vars={})",
            self.eager, self.expand_vars
        )
    }
}

impl fmt::Debug for Env {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Env")
            .field("eager", &self.eager)
            .field("expand_vars", &self.expand_vars)
            .field("sealed", &self.sealed)
            .field("prefix", &self.prefix.concat())
            .field("parsed", &self.values.keys().collect::<Vec<_>>())
            .field("errors", &self.errors)
            .field("source", &self.source)
            .finish()
    }
}

/// Builder for [`Env`].
#[derive(Debug)]
#[must_use = "builders do nothing until .build() is called"]
pub struct EnvBuilder {
    eager: bool,
    expand_vars: bool,
    source: Option<Box<dyn EnvSource>>,
}

impl Default for EnvBuilder {
    fn default() -> Self {
        Self {
            eager: true,
            expand_vars: false,
            source: None,
        }
    }
}

impl EnvBuilder {
    /// Fail at the accessor call (true, the default) or defer failures to
    /// [`Env::seal`] (false).
    pub fn eager(mut self, eager: bool) -> Self {
        self.eager = eager;
        self
    }

    /// Follow `${VAR}` references and `{{VAR}}` proxies in values.
    pub fn expand_vars(mut self, expand_vars: bool) -> Self {
        self.expand_vars = expand_vars;
        self
    }

    /// Read from `source` instead of the process environment.
    pub fn source(mut self, source: impl EnvSource + 'static) -> Self {
        self.source = Some(Box::new(source));
        self
    }

    pub fn build(self) -> Env {
        Env {
            source: self.source.unwrap_or_else(|| Box::new(ProcessEnv)),
            eager: self.eager,
            expand_vars: self.expand_vars,
            sealed: false,
            prefix: Vec::new(),
            fields: BTreeMap::new(),
            values: BTreeMap::new(),
            errors: ErrorMap::new(),
            registry: Registry::with_builtins(),
        }
    }
}

/// Prefix scope returned by [`Env::prefixed`]. Derefs to the reader.
pub struct Prefixed<'e> {
    env: &'e mut Env,
    depth: usize,
}

impl Deref for Prefixed<'_> {
    type Target = Env;

    fn deref(&self) -> &Env {
        self.env
    }
}

impl DerefMut for Prefixed<'_> {
    fn deref_mut(&mut self) -> &mut Env {
        self.env
    }
}

impl Drop for Prefixed<'_> {
    fn drop(&mut self) {
        self.env.prefix.truncate(self.depth);
    }
}
