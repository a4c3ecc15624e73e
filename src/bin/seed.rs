//! Drop the users table and reload the demo accounts.

use std::process::ExitCode;

use user_accounts::{config::AppConfig, db, seed, telemetry};

#[tokio::main]
async fn main() -> anyhow::Result<ExitCode> {
    dotenvy::dotenv().ok();
    telemetry::init("user_accounts=info");

    let config = AppConfig::from_env()?;
    println!("{}", "=".repeat(60));
    println!("Resetting user database at {}", config.database_url);
    println!("{}", "=".repeat(60));

    let pool = db::connect(&config.database_url).await?;

    if !seed::reset_and_seed(&pool).await {
        println!("\nDatabase initialisation failed!");
        return Ok(ExitCode::FAILURE);
    }
    if !seed::verify(&pool).await {
        println!("\nDatabase verification failed!");
        return Ok(ExitCode::FAILURE);
    }

    println!("\nDatabase is ready. Start the service with `cargo run --bin user-accounts`.");
    pool.close().await;
    Ok(ExitCode::SUCCESS)
}
