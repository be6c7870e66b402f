//! Custom parser example

use envcast::{ConversionError, Env, ParseOptions, Subcast, Value};

fn main() -> anyhow::Result<()> {
    std::env::set_var("WEBSITE", "https://example.com");
    std::env::set_var("FEATURE_CODES", "ab,cd,ef");
    std::env::set_var("VERSION", "1.4.2");

    let mut env = Env::new();

    // A parser only sees the raw string and the call's options
    env.add_parser("https_url", |raw: &str, _: &ParseOptions| {
        if raw.starts_with("https://") {
            Ok(Value::Str(raw.to_string()))
        } else {
            Err(ConversionError::new("Not a https URL."))
        }
    })?;

    env.add_parser("upper", |raw: &str, _: &ParseOptions| {
        Ok(Value::Str(raw.to_uppercase()))
    })?;

    // Options reach the parser through `arg`
    env.add_parser("semver", |raw: &str, options: &ParseOptions| {
        let parts: Vec<i64> = raw
            .split('.')
            .map(|part| part.parse::<i64>())
            .collect::<Result<_, _>>()
            .map_err(|_| ConversionError::new("Not a valid version."))?;
        let min_major = options.arg("min_major").and_then(Value::as_int).unwrap_or(0);
        match parts.first() {
            Some(major) if *major >= min_major => {
                Ok(Value::List(parts.into_iter().map(Value::Int).collect()))
            }
            _ => Err(ConversionError::new(format!(
                "Major version must be at least {min_major}."
            ))),
        }
    })?;

    let website = env.parse::<String>("https_url", "WEBSITE").get()?;
    let codes = env
        .list::<String>("FEATURE_CODES")
        .subcast(Subcast::tag("upper"))
        .get()?;
    let version = env
        .parse::<Vec<i64>>("semver", "VERSION")
        .arg("min_major", 1)
        .get()?;

    println!("Website: {website:?}");
    println!("Feature codes: {codes:?}");
    println!("Version: {version:?}");

    // Accessor names are reserved
    if let Err(err) = env.add_parser("seal", |raw: &str, _: &ParseOptions| {
        Ok(Value::Str(raw.to_string()))
    }) {
        println!("Expected error: {err}");
    }

    Ok(())
}
