//! Mercantile pricelist bot - entry point.

use anyhow::Result;
use clap::Parser;
use tracing::info;

/// Mercantile pricelist bot
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Configuration file path (can also be set via MERC_CONFIG env var)
    #[arg(short, long)]
    config: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    merc_bot::logging::init_logging();

    info!("Starting merc-bot v{}", env!("CARGO_PKG_VERSION"));

    // Config path: CLI arg > MERC_CONFIG env var > default.
    let config_path = args
        .config
        .or_else(|| std::env::var("MERC_CONFIG").ok())
        .unwrap_or_else(|| "config/default.toml".to_string());

    info!(config_path = %config_path, "Loading configuration");
    let config = merc_bot::AppConfig::load(&config_path)?;
    info!(
        pricer_url = %config.pricer_url,
        feed_url = %config.feed.url,
        "Configuration loaded"
    );

    let app = merc_bot::Application::new(config)?;
    app.run().await?;

    Ok(())
}
