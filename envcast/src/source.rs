//! Key/value sources the reader looks variables up in

use std::collections::{BTreeMap, HashMap};
use std::env;
use std::fmt;
use std::fs;

use crate::error::EnvError;

/// A flat, case-sensitive string-to-string mapping.
///
/// The process environment is the usual source; a dotenv loader run before
/// the reader is created simply populates it.
pub trait EnvSource: Send + Sync + fmt::Debug {
    /// Look up `key`. `Ok(None)` means the variable is absent.
    fn get(&self, key: &str) -> Result<Option<String>, EnvError>;
}

/// The process environment (`std::env::var`).
///
/// Variables whose value is not valid unicode are treated as absent.
#[derive(Debug, Clone, Copy, Default)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn get(&self, key: &str) -> Result<Option<String>, EnvError> {
        Ok(env::var(key).ok())
    }
}

impl EnvSource for HashMap<String, String> {
    fn get(&self, key: &str) -> Result<Option<String>, EnvError> {
        Ok(HashMap::get(self, key).cloned())
    }
}

impl EnvSource for BTreeMap<String, String> {
    fn get(&self, key: &str) -> Result<Option<String>, EnvError> {
        Ok(BTreeMap::get(self, key).cloned())
    }
}

impl<S: EnvSource + ?Sized> EnvSource for Box<S> {
    fn get(&self, key: &str) -> Result<Option<String>, EnvError> {
        (**self).get(key)
    }
}

/// Wraps a source so every key falls back to the file named by `{KEY}_FILE`.
///
/// Useful for Kubernetes and Docker secrets mounted as files.
///
/// **Loading priority:**
/// 1. Direct variable (`API_KEY`) - for local development
/// 2. File path from variable (`API_KEY_FILE`) - for production
#[derive(Debug, Clone, Default)]
pub struct FileAwareSource<S> {
    inner: S,
}

impl<S: EnvSource> FileAwareSource<S> {
    pub fn new(inner: S) -> Self {
        Self { inner }
    }
}

impl<S: EnvSource> EnvSource for FileAwareSource<S> {
    fn get(&self, key: &str) -> Result<Option<String>, EnvError> {
        get_with_file_fallback(&self.inner, key)
    }
}

/// Get a value, falling back to the content of the file named by `{key}_FILE`.
///
/// The file content is trimmed. An unreadable file is an error rather than
/// an absent value.
pub(crate) fn get_with_file_fallback(
    source: &dyn EnvSource,
    key: &str,
) -> Result<Option<String>, EnvError> {
    if let Some(value) = source.get(key)? {
        return Ok(Some(value));
    }

    let file_var_name = format!("{}_FILE", key);
    match source.get(&file_var_name)? {
        Some(file_path) => read_secret_file(file_var_name, file_path).map(Some),
        None => Ok(None),
    }
}

fn read_secret_file(file_var_name: String, file_path: String) -> Result<String, EnvError> {
    fs::read_to_string(&file_path)
        .map(|s| s.trim().to_string())
        .map_err(|e| EnvError::FileRead {
            name: file_var_name,
            path: file_path,
            source: e,
        })
}
