//! Deferred validation example
//!
//! A deferred reader keeps going after a failure and reports everything at
//! once when sealed.

use envcast::{validate, Env};

fn main() -> anyhow::Result<()> {
    std::env::set_var("TTL", "-12");
    std::env::set_var("NODE_ENV", "invalid");
    std::env::set_var("EMAIL", "^_^");
    std::env::remove_var("DATABASE_URL");

    let mut env = Env::builder().eager(false).build();

    let ttl = env.var::<u32>("TTL").get()?;
    let node_env = env
        .str("NODE_ENV")
        .validate(validate::one_of(["production", "development"]))
        .get()?;
    let email = env
        .str("EMAIL")
        .validate(validate::regexp(r"[^@\s]+@[^@\s]+")?)
        .error_message(envcast::VALIDATOR_FAILED, "Not a valid email address.")
        .get()?;
    let database_url = env.url("DATABASE_URL").get()?;

    // Failed reads come back as None until the reader is sealed
    println!("ttl={ttl:?} node_env={node_env:?} email={email:?} database_url={database_url:?}");

    match env.seal() {
        Ok(()) => println!("All variables valid"),
        Err(err) => {
            println!("Invalid environment:");
            if let Some(errors) = err.error_messages() {
                for (name, messages) in errors {
                    println!("  {name}: {}", messages.join(" "));
                }
            }
        }
    }

    Ok(())
}
