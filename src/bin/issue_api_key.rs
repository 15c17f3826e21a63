//! Issue an operator API key: `issue_api_key <operator name>`.
//! The clear key is printed once; only its prefix and Argon2 hash are stored.

use anyhow::{bail, Context};

use smlekha::config::Config;
use smlekha::middleware::{generate_api_key, MySqlApiKeyStore};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let operator_name = std::env::args().skip(1).collect::<Vec<_>>().join(" ");
    let operator_name = operator_name.trim();
    if operator_name.is_empty() {
        bail!("usage: issue_api_key <operator name>");
    }

    let config = Config::from_env().context("Failed to load configuration")?;
    let pool = config
        .database
        .create_pool()
        .await
        .context("Failed to create database pool")?;

    let api_key = generate_api_key();
    let record = MySqlApiKeyStore::new(pool)
        .create(operator_name, &api_key)
        .await
        .context("Failed to store API key")?;

    println!("operator: {}", record.operator_name);
    println!("key id:   {}", record.id);
    println!("api key:  {}", api_key);

    Ok(())
}
