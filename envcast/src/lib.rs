//! Typed environment variable parsing with deferred validation
//!
//! `envcast` reads environment variables, converts their raw string values into
//! typed values (integers, booleans, lists, mappings, dates, durations, URLs,
//! enums, ...), validates them, and reports every problem with a clear message.
//!
//! # Features
//!
//! - **Typed accessors**: `env.int("PORT")`, `env.list::<String>("HOSTS")`, or
//!   `env.var::<T>(...)` for any [`EnvValue`] type
//! - **Deferred validation**: collect every failure and report them at once with
//!   [`Env::seal`]
//! - **Prefixes**: scoped name prefixes that nest and always restore
//! - **Variable expansion**: `${VAR}`, `${VAR:-default}` and `{{VAR}}` references
//! - **File-based secrets**: fall back to `{VAR}_FILE` (Kubernetes/Docker secrets)
//! - **Custom parsers**: register your own rules with [`Env::add_parser`]
//! - **Declarative**: `#[derive(FromEnv)]` for configuration structs
//!
//! # Example
//!
//! ```rust
//! use envcast::Env;
//!
//! # fn main() -> anyhow::Result<()> {
//! #     std::env::set_var("GITHUB_USER", "sloria");
//! #     std::env::set_var("MAX_CONNECTIONS", "100");
//! #     std::env::set_var("SHIP_DATE", "1984-06-25");
//! #     std::env::set_var("TTL", "42");
//! #     std::env::set_var("ENABLE_LOGIN", "true");
//! #     std::env::set_var("GITHUB_REPOS", "webargs,konch,ped");
//! let mut env = Env::new();
//!
//! let gh_user = env.str("GITHUB_USER").get()?;
//! let max_connections = env.int("MAX_CONNECTIONS").get()?;
//! let ship_date = env.date("SHIP_DATE").get()?;
//! let ttl = env.timedelta("TTL").get()?;
//! let enable_login = env.bool("ENABLE_LOGIN").get()?;
//! let enable_feature_x = env.bool("ENABLE_FEATURE_X").default(false).get()?;
//! let gh_repos = env.list::<String>("GITHUB_REPOS").get()?;
//!
//! assert_eq!(gh_user.as_deref(), Some("sloria"));
//! assert_eq!(max_connections, Some(100));
//! assert_eq!(enable_feature_x, Some(false));
//! assert_eq!(gh_repos.map(|r| r.len()), Some(3));
//! #     let _ = (ship_date, ttl, enable_login);
//! #     Ok(())
//! # }
//! ```
//!
//! # Eager and deferred readers
//!
//! An eager reader (the default) returns the error at the accessor call. A
//! deferred reader records it and keeps going; [`Env::seal`] then returns a
//! single [`EnvError::Validation`] naming every offending variable.
//!
//! ```rust
//! use envcast::Env;
//!
//! let source = std::collections::HashMap::from([
//!     ("TTL".to_string(), "-12".to_string()),
//!     ("NODE_ENV".to_string(), "invalid".to_string()),
//! ]);
//! let mut env = Env::builder().eager(false).source(source).build();
//!
//! let _ = env.var::<u32>("TTL").get();
//! let _ = env
//!     .str("NODE_ENV")
//!     .validate(envcast::validate::one_of(["production", "development"]))
//!     .get();
//!
//! let err = env.seal().unwrap_err();
//! let errors = err.error_messages().unwrap();
//! assert_eq!(errors["TTL"], vec!["Number out of range."]);
//! assert_eq!(errors["NODE_ENV"], vec!["Must be one of: production, development."]);
//! ```
//!
//! # Variable expansion
//!
//! With `expand_vars` enabled, values may reference other variables. A
//! reference spanning the whole value proxies to the other variable; references
//! embedded in text are substituted. `\$` keeps a literal `$`.
//!
//! ```text
//! CONNECTION_URL=https://${USER:-sloria}:${PASSWORD}@${HOST:-localhost}/
//! PASSWORD=secret
//! SMTP_LOGIN={{MAILGUN_LOGIN}}
//! MAILGUN_LOGIN=sloria
//! ```
//!
//! Errors name the variable that is really missing: if `MAILGUN_LOGIN` is
//! unset, reading `SMTP_LOGIN` reports `MAILGUN_LOGIN`.
//!
//! # File-based secrets
//!
//! `.from_file()` on an accessor (or `#[env(from_file)]` on a derived field)
//! falls back to the file named by `{VAR}_FILE` when `VAR` is not set. Wrap
//! the source in [`FileAwareSource`] to apply it to every variable.
//!
//! **Loading priority:**
//! 1. Direct env var (`API_KEY`) - for local development
//! 2. File path from env var (`API_KEY_FILE`) - for production
//!
//! # Derive
//!
//! ```rust
//! use envcast::FromEnv;
//!
//! #[derive(Debug, FromEnv)]
//! #[env(prefix = "APP_")]
//! struct Config {
//!     #[env(from_file)]
//!     api_key: String,
//!
//!     #[env(default = 8080)]
//!     port: u16,
//!
//!     // Comma separated
//!     #[env(default)]
//!     hosts: Vec<String>,
//!
//!     log_level: Option<String>,
//! }
//!
//! # fn main() -> anyhow::Result<()> {
//! #     std::env::set_var("APP_API_KEY", "test-key");
//! #     std::env::set_var("APP_HOSTS", "a.com,b.com");
//! let config = Config::from_env()?;
//! assert_eq!(config.api_key, "test-key");
//! assert_eq!(config.port, 8080);
//! assert_eq!(config.hosts, vec!["a.com", "b.com"]);
//! #     Ok(())
//! # }
//! ```
//!
//! # Attributes
//!
//! ## Struct level
//!
//! - `#[env(prefix = "APP_")]`: prefix every variable name
//! - `#[env(expand_vars)]`: follow `${VAR}` references
//!
//! ## Field level
//!
//! - `#[env(name = "CUSTOM_NAME")]`: custom variable name (the prefix still
//!   applies)
//! - `#[env(default)]`: `Default::default()` when unset
//! - `#[env(default = value)]`: explicit default when unset
//! - `#[env(from_file)]`: also read `{VAR}_FILE`
//! - `#[env(kind = "log_level")]`: parse with a specific rule
//! - `#[env(delimiter = ";")]`: list/mapping item delimiter
//! - `#[env(deserializer = "path::to::fn")]`: parse with a custom function
//!
//! `Option<T>` fields are `None` when unset and cannot take a default.

mod env;
mod error;
mod options;
mod resolve;
pub mod rules;
mod source;
pub mod validate;
mod value;
mod var;

pub use env::{Env, EnvBuilder, Prefixed};
pub use envcast_derive::FromEnv;
pub use error::{ConversionError, EnvError, ErrorMap, NOT_SET_MESSAGE};
pub use options::{EnumSpec, ParseOptions, Validator, INVALID, VALIDATOR_FAILED};
pub use rules::{Subcast, TypeRule};
pub use source::{EnvSource, FileAwareSource, ProcessEnv};
pub use value::{EnvValue, Json, Kind, Value};
pub use var::Var;

// Re-export for macro-generated code
#[doc(hidden)]
pub use anyhow;
