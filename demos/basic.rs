//! Basic usage example

use envcast::Env;

fn main() -> anyhow::Result<()> {
    // Set environment variables for demonstration
    std::env::set_var("GITHUB_USER", "sloria");
    std::env::set_var("MAX_CONNECTIONS", "100");
    std::env::set_var("SHIP_DATE", "1984-06-25");
    std::env::set_var("TTL", "42");
    std::env::set_var("ENABLE_LOGIN", "true");
    std::env::set_var("GITHUB_REPOS", "webargs,konch,ped");
    std::env::set_var("COORDINATES", "23.3,50.0");
    std::env::set_var("LOG_LEVEL", "DEBUG");

    let mut env = Env::new();

    // Required variables fail when unset
    let gh_user = env.str("GITHUB_USER").get()?;
    let max_connections = env.int("MAX_CONNECTIONS").get()?;
    let ship_date = env.date("SHIP_DATE").get()?;
    let ttl = env.timedelta("TTL").get()?;
    let log_level = env.log_level("LOG_LEVEL").get()?;

    // Defaults are used as given
    let enable_login = env.bool("ENABLE_LOGIN").default(false).get()?;
    let enable_feature_x = env.bool("ENABLE_FEATURE_X").default(false).get()?;

    // Lists, with a per-item type
    let gh_repos = env.list::<String>("GITHUB_REPOS").get()?;
    let coords = env.list::<f64>("COORDINATES").get()?;

    println!("Values read:");
    println!("  GitHub user: {gh_user:?}");
    println!("  Max connections: {max_connections:?}");
    println!("  Ship date: {ship_date:?}");
    println!("  TTL: {ttl:?}");
    println!("  Log level: {log_level:?}");
    println!("  Login enabled: {enable_login:?}");
    println!("  Feature X enabled: {enable_feature_x:?}");
    println!("  Repositories: {gh_repos:?}");
    println!("  Coordinates: {coords:?}");

    // Everything parsed so far, as plain data
    println!("{}", serde_json::to_string_pretty(&env.dump())?);

    Ok(())
}
