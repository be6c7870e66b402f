//! Per-call options shared by every accessor

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

use crate::error::ConversionError;
use crate::rules::Subcast;
use crate::value::Value;

/// A check run on a converted value. Returning an error rejects the value.
pub type Validator = Arc<dyn Fn(&Value) -> Result<(), ConversionError> + Send + Sync>;

/// Message override keys accepted by [`ParseOptions::error_messages`].
pub const INVALID: &str = "invalid";
pub const VALIDATOR_FAILED: &str = "validator_failed";

/// Enumeration description used by the `enum` rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumSpec {
    /// Short type name shown in error messages
    pub type_name: String,
    /// Member names, matched exactly or case-insensitively
    pub members: Vec<String>,
}

impl EnumSpec {
    pub fn new<I, S>(type_name: impl Into<String>, members: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            type_name: type_name.into(),
            members: members.into_iter().map(Into::into).collect(),
        }
    }
}

/// Everything an accessor call can carry besides the variable name.
#[derive(Clone, Default)]
pub struct ParseOptions {
    /// `None` means "not provided": the variable is required.
    pub default: Option<Value>,
    /// Ignore any default and require the variable.
    pub required: bool,
    /// Whether a null default is acceptable; `None` allows it.
    pub allow_none: Option<bool>,
    /// Element type of a list.
    pub subcast: Option<Subcast>,
    pub subcast_keys: Option<Subcast>,
    pub subcast_values: Option<Subcast>,
    /// Item delimiter of lists and dicts, `,` when unset.
    pub delimiter: Option<String>,
    /// Key/value delimiter of dicts, `=` when unset.
    pub key_delimiter: Option<String>,
    pub ignore_case: bool,
    /// Accepted URL schemes, `http`/`https`/`ftp`/`ftps` when unset.
    pub schemes: Option<Vec<String>>,
    /// Require a dotted host in URLs, true when unset.
    pub require_tld: Option<bool>,
    pub enum_spec: Option<EnumSpec>,
    pub validators: Vec<Validator>,
    /// Replacement messages keyed by [`INVALID`] or [`VALIDATOR_FAILED`].
    pub error_messages: BTreeMap<String, String>,
    /// Consult `{KEY}_FILE` when `KEY` is absent.
    pub from_file: bool,
    /// Extra arguments forwarded to custom parsers.
    pub args: BTreeMap<String, Value>,
}

impl ParseOptions {
    pub fn delimiter(&self) -> &str {
        self.delimiter.as_deref().unwrap_or(",")
    }

    pub fn key_delimiter(&self) -> &str {
        self.key_delimiter.as_deref().unwrap_or("=")
    }

    pub fn require_tld(&self) -> bool {
        self.require_tld.unwrap_or(true)
    }

    /// Extra argument passed with [`Var::arg`](crate::Var::arg).
    pub fn arg(&self, name: &str) -> Option<&Value> {
        self.args.get(name)
    }

    pub(crate) fn message_override(&self, kind: &str) -> Option<&str> {
        self.error_messages.get(kind).map(String::as_str)
    }
}

impl fmt::Debug for ParseOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParseOptions")
            .field("default", &self.default)
            .field("required", &self.required)
            .field("allow_none", &self.allow_none)
            .field("subcast", &self.subcast)
            .field("subcast_keys", &self.subcast_keys)
            .field("subcast_values", &self.subcast_values)
            .field("delimiter", &self.delimiter)
            .field("key_delimiter", &self.key_delimiter)
            .field("ignore_case", &self.ignore_case)
            .field("schemes", &self.schemes)
            .field("require_tld", &self.require_tld)
            .field("enum_spec", &self.enum_spec)
            .field("validators", &self.validators.len())
            .field("error_messages", &self.error_messages)
            .field("from_file", &self.from_file)
            .field("args", &self.args)
            .finish()
    }
}
