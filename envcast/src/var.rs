use std::fmt;

use crate::env::Env;
use crate::error::{ConversionError, EnvError};
use crate::options::{Validator, INVALID};
use crate::rules::Subcast;
use crate::value::{EnvValue, Value};

type Extract<'e, T> = Box<dyn Fn(Value) -> Result<T, ConversionError> + 'e>;

/// One pending read, configured with builder methods and run by
/// [`get`](Var::get).
///
/// ```rust
/// use envcast::Env;
///
/// # fn main() -> Result<(), envcast::EnvError> {
/// let source = std::collections::HashMap::from([
///     ("LIMITS".to_string(), "cpu:2;mem:512".to_string()),
/// ]);
/// let mut env = Env::builder().source(source).build();
/// let limits = env
///     .dict::<std::collections::BTreeMap<String, u32>>("LIMITS")
///     .delimiter(";")
///     .key_delimiter(":")
///     .get()?
///     .unwrap_or_default();
/// assert_eq!(limits["mem"], 512);
/// # Ok(())
/// # }
/// ```
#[must_use = "a variable is only read when .get() is called"]
pub struct Var<'e, T> {
    env: &'e mut Env,
    name: String,
    tag: String,
    options: crate::options::ParseOptions,
    extract: Extract<'e, T>,
    inject: Option<fn(T) -> Value>,
    fallback: Option<T>,
}

impl<'e, T: EnvValue + 'e> Var<'e, T> {
    pub(crate) fn new(env: &'e mut Env, name: &str, tag: &str) -> Self {
        let inject = T::into_value as fn(T) -> Value;
        Self::with_conversion(env, name, tag, T::from_value, Some(inject))
    }
}

impl<'e, T: 'e> Var<'e, T> {
    pub(crate) fn with_conversion<F>(
        env: &'e mut Env,
        name: &str,
        tag: &str,
        extract: F,
        inject: Option<fn(T) -> Value>,
    ) -> Self
    where
        F: Fn(Value) -> Result<T, ConversionError> + 'e,
    {
        Self {
            env,
            name: name.to_string(),
            tag: tag.to_string(),
            options: Default::default(),
            extract: Box::new(extract),
            inject,
            fallback: None,
        }
    }

    pub(crate) fn options_mut(&mut self) -> &mut crate::options::ParseOptions {
        &mut self.options
    }

    /// Value to use when the variable is absent. It is not converted.
    ///
    /// For reads set up with [`Env::deserialize`] the default cannot be
    /// represented as a [`Value`] and is dumped as `null`.
    pub fn default(mut self, value: T) -> Self {
        match self.inject {
            Some(inject) => self.options.default = Some(inject(value)),
            None => {
                self.options.default = Some(Value::Null);
                self.fallback = Some(value);
            }
        }
        self
    }

    /// Make an absent variable read as `None` instead of failing.
    pub fn default_none(mut self) -> Self {
        self.options.default = Some(Value::Null);
        self.fallback = None;
        self
    }

    /// Untyped default. A string holding `${VAR}` references is expanded and
    /// converted when the reader expands variables.
    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.options.default = Some(value.into());
        self
    }

    /// Element type of a list.
    pub fn subcast(mut self, subcast: Subcast) -> Self {
        self.options.subcast = Some(subcast);
        self
    }

    /// Key type of a mapping.
    pub fn subcast_keys(mut self, subcast: Subcast) -> Self {
        self.options.subcast_keys = Some(subcast);
        self
    }

    /// Value type of a mapping.
    pub fn subcast_values(mut self, subcast: Subcast) -> Self {
        self.options.subcast_values = Some(subcast);
        self
    }

    pub fn delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.options.delimiter = Some(delimiter.into());
        self
    }

    pub fn key_delimiter(mut self, delimiter: impl Into<String>) -> Self {
        self.options.key_delimiter = Some(delimiter.into());
        self
    }

    pub fn ignore_case(mut self, ignore_case: bool) -> Self {
        self.options.ignore_case = ignore_case;
        self
    }

    /// Accepted URL schemes.
    pub fn schemes<I, S>(mut self, schemes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.options.schemes = Some(schemes.into_iter().map(Into::into).collect());
        self
    }

    pub fn require_tld(mut self, require_tld: bool) -> Self {
        self.options.require_tld = Some(require_tld);
        self
    }

    /// Add a validator. Every validator runs and all their messages are kept.
    pub fn validate(mut self, validator: Validator) -> Self {
        self.options.validators.push(validator);
        self
    }

    /// Fail when absent even if a default was given.
    pub fn required(mut self) -> Self {
        self.options.required = true;
        self
    }

    pub fn allow_none(mut self, allow_none: bool) -> Self {
        self.options.allow_none = Some(allow_none);
        self
    }

    /// Replace the messages of a failure kind (`"invalid"` or
    /// `"validator_failed"`).
    pub fn error_message(mut self, kind: &str, message: impl Into<String>) -> Self {
        self.options
            .error_messages
            .insert(kind.to_string(), message.into());
        self
    }

    /// Fall back to the file named by `{NAME}_FILE`.
    pub fn from_file(mut self) -> Self {
        self.options.from_file = true;
        self
    }

    /// Extra argument for a custom parser.
    pub fn arg(mut self, name: &str, value: impl Into<Value>) -> Self {
        self.options.args.insert(name.to_string(), value.into());
        self
    }

    /// Parse the raw string with `deserializer` instead of a type rule.
    ///
    /// Any `Fn(&str) -> Result<T, E>` with a displayable error works, e.g.
    /// `|raw: &str| serde_json::from_str(raw)`.
    pub fn deserialize_with<F, E>(mut self, deserializer: F) -> Self
    where
        F: Fn(&str) -> Result<T, E> + 'e,
        E: fmt::Display,
    {
        self.tag = "str".to_string();
        self.options.subcast = None;
        self.options.subcast_keys = None;
        self.options.subcast_values = None;
        // typed defaults never went through a string, they keep the plain conversion
        let typed: Extract<'e, T> = std::mem::replace(
            &mut self.extract,
            Box::new(|value| Err(crate::value::mismatch("a string", &value))),
        );
        self.extract = Box::new(move |value| match value {
            Value::Str(raw) => deserializer(&raw).map_err(|e| ConversionError::new(e.to_string())),
            other => typed(other),
        });
        self
    }

    /// Read the variable.
    ///
    /// Returns `Ok(None)` when the default is `None`, or when a deferred
    /// reader recorded a failure for it.
    pub fn get(self) -> Result<Option<T>, EnvError> {
        let Var {
            env,
            name,
            tag,
            options,
            extract,
            fallback,
            ..
        } = self;
        let invalid = options.message_override(INVALID).map(str::to_string);
        let Some(value) = env.read(&name, &tag, options)? else {
            return Ok(None);
        };
        if value.is_null() {
            return Ok(fallback);
        }
        match extract(value) {
            Ok(value) => Ok(Some(value)),
            Err(e) => {
                let e = invalid.map(ConversionError::new).unwrap_or(e);
                env.reject(&name, &tag, e).map(|()| None)
            }
        }
    }
}

impl<T> fmt::Debug for Var<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Var")
            .field("name", &self.name)
            .field("tag", &self.tag)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}
