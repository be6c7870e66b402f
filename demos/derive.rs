//! Derive example

use envcast::FromEnv;

#[derive(Debug, FromEnv)]
#[env(prefix = "APP_")]
struct Config {
    // Required field: loaded from APP_DATABASE_URL
    pub database_url: url::Url,

    // With default value
    #[env(default = "127.0.0.1:8080")]
    pub server_addr: String,

    // Numeric type
    #[env(default = 10)]
    pub max_connections: u32,

    // Comma separated, empty when unset
    #[env(default)]
    pub allowed_hosts: Vec<String>,

    // Parsed as a log level name or number
    #[env(kind = "log_level", default = 20)]
    pub log_level: i64,

    // Custom variable name (the prefix still applies)
    #[env(name = "CACHE_TTL")]
    pub cache_expiry: Option<std::time::Duration>,

    // JSON via a custom deserializer
    #[env(deserializer = "serde_json::from_str")]
    pub labels: Option<std::collections::HashMap<String, String>>,
}

fn main() -> anyhow::Result<()> {
    std::env::set_var("APP_DATABASE_URL", "postgres://db.example.com/mydb");
    std::env::set_var("APP_ALLOWED_HOSTS", "example.com,api.example.com");
    std::env::set_var("APP_LOG_LEVEL", "warning");
    std::env::set_var("APP_CACHE_TTL", "5m");
    std::env::set_var("APP_LABELS", r#"{"team": "core"}"#);

    let config = Config::from_env()?;

    println!("Configuration loaded:");
    println!("  Database URL: {}", config.database_url);
    println!("  Server Address: {}", config.server_addr);
    println!("  Max Connections: {}", config.max_connections);
    println!("  Allowed Hosts: {:?}", config.allowed_hosts);
    println!("  Log Level: {}", config.log_level);
    println!("  Cache Expiry: {:?}", config.cache_expiry);
    println!("  Labels: {:?}", config.labels);

    Ok(())
}
