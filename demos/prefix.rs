//! Prefix example

use envcast::Env;

fn main() -> anyhow::Result<()> {
    std::env::set_var("MYAPP_HOST", "lolcathost");
    std::env::set_var("MYAPP_PORT", "3000");
    std::env::set_var("MYAPP_DB_NAME", "app");
    std::env::set_var("PORT", "80");

    let mut env = Env::new();

    {
        // Prefix applies while the guard lives
        let mut app = env.prefixed("MYAPP_");
        let host = app.str("HOST").default("localhost".to_string()).get()?;
        let port = app.int("PORT").default(5000).get()?;
        println!("MYAPP_HOST={host:?} MYAPP_PORT={port:?}");

        // Scopes nest
        let mut db = app.prefixed("DB_");
        let name = db.str("NAME").get()?;
        println!("MYAPP_DB_NAME={name:?}");
    }

    // ...and the previous prefix is back afterwards
    let port = env.int("PORT").get()?;
    println!("PORT={port:?}");

    // The closure form restores the prefix on errors too
    let result = env.with_prefix("MYAPP_", |env| env.int("HOST").get());
    println!("Expected error: {}", result.unwrap_err());

    println!("{}", serde_json::to_string_pretty(&env.dump())?);

    Ok(())
}
