use url::{Host, Url};

use super::TypeRule;
use crate::error::ConversionError;
use crate::options::ParseOptions;
use crate::value::Value;

const DEFAULT_SCHEMES: &[&str] = &["http", "https", "ftp", "ftps"];
const NOT_A_URL: &str = "Not a valid URL.";

/// Absolute URL with an accepted scheme and, unless disabled, a dotted host.
///
/// `convert` only checks the shape and keeps the string, so validators see
/// the value as written; `finalize` parses it into [`Value::Url`].
#[derive(Debug, Clone, Copy, Default)]
pub struct UrlRule;

impl TypeRule for UrlRule {
    fn name(&self) -> &str {
        "url"
    }

    fn convert(&self, value: Value, options: &ParseOptions) -> Result<Value, ConversionError> {
        match value {
            Value::Url(url) => Ok(Value::Url(url)),
            Value::Str(raw) => {
                let url = Url::parse(raw.trim()).map_err(|_| ConversionError::new(NOT_A_URL))?;
                check_shape(&url, options)?;
                Ok(Value::Str(raw))
            }
            _ => Err(ConversionError::new(NOT_A_URL)),
        }
    }

    fn finalize(&self, value: Value) -> Result<Value, ConversionError> {
        match value {
            Value::Str(raw) => Url::parse(raw.trim())
                .map(Value::Url)
                .map_err(|_| ConversionError::new(NOT_A_URL)),
            other => Ok(other),
        }
    }
}

fn check_shape(url: &Url, options: &ParseOptions) -> Result<(), ConversionError> {
    let scheme_allowed = match &options.schemes {
        Some(schemes) => schemes.iter().any(|s| s.eq_ignore_ascii_case(url.scheme())),
        None => DEFAULT_SCHEMES.contains(&url.scheme()),
    };
    if !scheme_allowed {
        return Err(ConversionError::new(NOT_A_URL));
    }

    let host_ok = match url.host() {
        None => false,
        Some(Host::Ipv4(_)) | Some(Host::Ipv6(_)) => true,
        Some(Host::Domain(domain)) => {
            !options.require_tld() || domain.eq_ignore_ascii_case("localhost") || has_tld(domain)
        }
    };
    if host_ok {
        Ok(())
    } else {
        Err(ConversionError::new(NOT_A_URL))
    }
}

fn has_tld(domain: &str) -> bool {
    let domain = domain.strip_suffix('.').unwrap_or(domain);
    match domain.rsplit_once('.') {
        Some((name, tld)) => !name.is_empty() && tld.len() >= 2,
        None => false,
    }
}
