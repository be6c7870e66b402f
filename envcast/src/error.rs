//! Error types for typed environment variable parsing

use std::collections::BTreeMap;

/// Per-key messages collected while reading in deferred mode.
pub type ErrorMap = BTreeMap<String, Vec<String>>;

/// Message recorded against a key whose variable is absent.
pub const NOT_SET_MESSAGE: &str = "Environment variable not set.";

/// Errors surfaced by [`Env`](crate::Env) to its caller.
///
/// Data problems (`NotSet`, `Invalid`, `ExpansionCycle`, `ExpansionLimit`,
/// `FileRead`) are raised at the call site by an eager reader and aggregated
/// into `Validation` by a deferred one. `Sealed`, `ParserConflict` and `UnknownAccessor` are
/// programming errors and always raised immediately.
#[derive(Debug, thiserror::Error)]
pub enum EnvError {
    /// The variable (or the variable it references) is absent and no usable
    /// default was supplied.
    #[error("Environment variable \"{name}\" not set")]
    NotSet {
        /// Key that was looked up last, i.e. the true missing variable
        name: String,
    },

    /// The raw value could not be converted or was rejected by a validator.
    #[error("Environment variable \"{name}\" invalid: {}", first_message(.messages))]
    Invalid {
        /// Key the raw value came from
        name: String,
        /// Every message produced by conversion and validation
        messages: Vec<String>,
    },

    /// Aggregate of every failure recorded by a deferred reader.
    #[error("Environment variables invalid: {errors:?}")]
    Validation {
        /// Messages per offending key
        errors: ErrorMap,
    },

    /// An accessor was called after [`Env::seal`](crate::Env::seal).
    #[error("Env has already been sealed. New values cannot be parsed.")]
    Sealed,

    /// A custom parser name collides with an existing accessor.
    #[error("Env already has a method with name '{name}'. Use a different name.")]
    ParserConflict {
        /// Rejected parser name
        name: String,
    },

    /// No built-in or registered rule carries the requested tag.
    #[error("Env has no accessor named '{name}'")]
    UnknownAccessor {
        /// Requested tag
        name: String,
    },

    /// Variable references loop back onto a key already being resolved.
    #[error("Environment variable expansion cycle: {}", .chain.join(" -> "))]
    ExpansionCycle {
        /// Keys visited, ending with the repeated one
        chain: Vec<String>,
    },

    /// Resolving a key needed too many nested references, too many lookups
    /// in total, or produced an oversized value.
    #[error("Environment variable \"{name}\" expansion exceeds {limit}")]
    ExpansionLimit {
        /// Key whose resolution was abandoned
        name: String,
        /// Bound that was hit, e.g. "64 nested references"
        limit: String,
    },

    /// Failed to read the file named by a `{KEY}_FILE` variable.
    #[error("Failed to read file '{path}' for environment variable '{name}': {source}")]
    FileRead {
        /// Name of the `{KEY}_FILE` variable (e.g. "API_KEY_FILE")
        name: String,
        /// Path that failed to be read
        path: String,
        /// Underlying I/O error
        source: std::io::Error,
    },
}

fn first_message(messages: &[String]) -> &str {
    messages.first().map(String::as_str).unwrap_or("Invalid value.")
}

impl EnvError {
    /// Create a missing environment variable error
    pub fn missing(name: impl Into<String>) -> Self {
        Self::NotSet { name: name.into() }
    }

    /// Create an invalid-value error from conversion messages
    pub fn invalid(name: impl Into<String>, messages: Vec<String>) -> Self {
        Self::Invalid {
            name: name.into(),
            messages,
        }
    }

    /// Messages carried by this error, as they would be recorded in deferred mode.
    pub fn messages(&self) -> Vec<String> {
        match self {
            Self::NotSet { .. } => vec![NOT_SET_MESSAGE.to_string()],
            Self::Invalid { messages, .. } => messages.clone(),
            Self::Validation { errors } => errors.values().flatten().cloned().collect(),
            other => vec![other.to_string()],
        }
    }

    /// Per-key messages of an aggregate validation error.
    pub fn error_messages(&self) -> Option<&ErrorMap> {
        match self {
            Self::Validation { errors } => Some(errors),
            _ => None,
        }
    }
}

/// Failure raised by a type rule, subcast or validator.
///
/// Carries one or more human-readable messages. Never escapes the reader
/// directly; it becomes [`EnvError::Invalid`] or a deferred error entry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}", first_message(.messages))]
pub struct ConversionError {
    /// Human-readable messages, in the order they were produced
    pub messages: Vec<String>,
}

impl ConversionError {
    /// Single-message failure
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            messages: vec![message.into()],
        }
    }

    /// Failure with several messages
    pub fn many(messages: Vec<String>) -> Self {
        Self { messages }
    }

    /// Prefix every message, used when reporting an element of a composite.
    pub(crate) fn within(self, context: impl std::fmt::Display) -> Self {
        Self {
            messages: self
                .messages
                .into_iter()
                .map(|m| format!("{context}: {m}"))
                .collect(),
        }
    }
}

impl From<String> for ConversionError {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}

impl From<&str> for ConversionError {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}
