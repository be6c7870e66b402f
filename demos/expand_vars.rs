//! Variable expansion example

use envcast::Env;

fn main() -> anyhow::Result<()> {
    std::env::set_var(
        "CONNECTION_URL",
        "https://${USER_NAME:-sloria}:${PASSWORD}@${HOST:-localhost}/",
    );
    std::env::set_var("PASSWORD", "secret");
    std::env::set_var("YEAR", "${CURRENT_YEAR:-2020}");
    std::env::set_var("SMTP_LOGIN", "{{MAILGUN_LOGIN}}");
    std::env::set_var("MAILGUN_LOGIN", "sloria");
    std::env::set_var("PRICE", r"\$10");

    let mut env = Env::builder().expand_vars(true).build();

    let connection_url = env.url("CONNECTION_URL").get()?;
    let year = env.int("YEAR").get()?;
    let smtp_login = env.str("SMTP_LOGIN").get()?;
    let price = env.str("PRICE").get()?;

    println!("Expanded values:");
    println!("  Connection URL: {connection_url:?}");
    println!("  Year: {year:?}");
    println!("  SMTP login: {smtp_login:?}");
    println!("  Price: {price:?}");

    // Errors name the variable that is really missing
    std::env::remove_var("MAILGUN_LOGIN");
    if let Err(err) = env.str("SMTP_LOGIN").get() {
        println!("Expected error: {err}");
    }

    Ok(())
}
