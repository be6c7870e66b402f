//! Secrets mounted as files, read through `{VAR}_FILE`

use std::collections::HashMap;
use std::io::Write;

use envcast::{Env, EnvError, FileAwareSource};
use tempfile::NamedTempFile;

fn main() -> anyhow::Result<()> {
    let mut api_key_file = NamedTempFile::new()?;
    writeln!(api_key_file, "super_secret_api_key_12345")?;
    let mut password_file = NamedTempFile::new()?;
    writeln!(password_file, "from_file")?;

    let path = |file: &NamedTempFile| file.path().display().to_string();
    let variables = HashMap::from([
        ("API_KEY_FILE".to_string(), path(&api_key_file)),
        // the direct variable wins over its _FILE companion
        ("DATABASE_PASSWORD".to_string(), "from_env".to_string()),
        ("DATABASE_PASSWORD_FILE".to_string(), path(&password_file)),
        ("TLS_KEY_FILE".to_string(), "/run/secrets/missing-tls-key".to_string()),
        ("WORKERS_FILE".to_string(), path(&api_key_file)),
    ]);

    // Per-variable fallback, collecting every failure before reporting
    let mut env = Env::builder().eager(false).source(variables.clone()).build();
    let api_key = env.str("API_KEY").from_file().get()?;
    let password = env.str("DATABASE_PASSWORD").from_file().get()?;
    let tls_key = env.str("TLS_KEY").from_file().get()?;
    let workers = env.var::<u16>("WORKERS").from_file().get()?;

    println!("Read with .from_file():");
    println!("  API_KEY: {api_key:?}");
    println!("  DATABASE_PASSWORD: {password:?}");
    println!("  TLS_KEY: {tls_key:?}");
    println!("  WORKERS: {workers:?}");

    match env.seal() {
        Err(EnvError::Validation { errors }) => {
            println!("Rejected secrets:");
            for (key, messages) in errors {
                println!("  {key}: {}", messages.join(" "));
            }
        }
        other => other?,
    }

    // The same fallback for every variable of a reader
    let mut env = Env::builder()
        .source(FileAwareSource::new(variables))
        .build();
    let api_key = env.str("API_KEY").get()?;
    println!("Read through FileAwareSource:");
    println!("  API_KEY: {api_key:?}");

    Ok(())
}
