//! Validation example

use envcast::{validate, Env, Value};

fn main() -> anyhow::Result<()> {
    std::env::set_var("NODE_ENV", "development");
    std::env::set_var("TTL", "30");
    std::env::set_var("USERNAME_X", "sloria");

    let mut env = Env::new();

    let node_env = env
        .str("NODE_ENV")
        .validate(validate::one_of(["production", "development"]))
        .get()?;

    let ttl = env
        .var::<u32>("TTL")
        .validate(validate::range(Some(1.0), Some(3600.0)))
        .get()?;

    // Several validators, all of them run
    let username = env
        .str("USERNAME_X")
        .validate(validate::length(Some(3), Some(16)))
        .validate(validate::predicate(|value| {
            value.as_str().is_some_and(|s| s.chars().all(char::is_alphanumeric))
        }))
        .get()?;

    println!("NODE_ENV={node_env:?} TTL={ttl:?} USERNAME_X={username:?}");

    // A failing validator in an eager reader
    std::env::set_var("TTL", "0");
    let err = env
        .var::<u32>("TTL")
        .validate(validate::range(Some(1.0), None))
        .get()
        .unwrap_err();
    println!("Expected error: {err}");

    // Custom validators are plain closures
    let even = std::sync::Arc::new(|value: &Value| match value {
        Value::Int(i) if i % 2 == 0 => Ok(()),
        _ => Err(envcast::ConversionError::new("Must be even.")),
    });
    std::env::set_var("WORKERS", "3");
    if let Err(err) = env.int("WORKERS").validate(even).get() {
        println!("Expected error: {err}");
    }

    Ok(())
}
