mod bootstrap;
mod config;
mod error;
mod execution;
mod ledger;
mod notifications;
mod payments;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::config::Config;

// Initialize logging and tracing
fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,pool_payments=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    info!("🚀 Starting payments processor");

    let config = Config::load()?;
    info!("Loaded configuration for coin {}", config.coin);

    let scheduler = bootstrap::initialize_scheduler(&config).await?;
    let handle = scheduler.start();

    tokio::signal::ctrl_c().await?;
    info!("Shutting down payments processor");
    handle.abort();

    Ok(())
}
