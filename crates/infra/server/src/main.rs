//! Hookbridge Server binary.

use std::str::FromStr;

use hookbridge_server::{load_config, HookbridgeServer};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let path = std::env::args().nth(1).unwrap_or_else(|| "hookbridge.toml".to_string());

    // Load configuration
    let config = load_config(&path)?;

    // Initialize tracing
    let level = tracing::Level::from_str(&config.server.log_level).unwrap_or(tracing::Level::INFO);
    tracing_subscriber::fmt().with_max_level(level).init();
    tracing::info!(path = %path, "Loaded configuration");

    // Create and run server
    let server = HookbridgeServer::from_config(config);
    server.run().await?;

    Ok(())
}
