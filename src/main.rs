mod error;
mod api;
mod ledger;
mod storage;
mod sync;
mod server;
mod bootstrap;
mod config;

#[cfg(test)]
mod testing;

use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use tracing::{error, info};

use crate::config::Config;

// Initialize logging and tracing
fn init_tracing() {
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG")
                .unwrap_or_else(|_| "info,tower_http=debug,storage_sync=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for shutdown signal: {}", e);
        std::future::pending::<()>().await;
    }
    info!("🛑 Shutdown signal received");
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenv::dotenv().ok();

    // Initialize tracing
    init_tracing();

    info!("🚀 Starting storage node content sync");

    // Load configuration
    let config = Config::from_env()?;

    let node = bootstrap::initialize_node(&config)?;

    // Reconciliation runs until the process exits
    let sync_handle = node.scheduler.start();
    info!("✅ Sync scheduler started");

    let app = server::create_app(node.state);
    server::run_server(app, &config.bind_address, shutdown_signal()).await?;

    sync_handle.abort();
    info!("👋 Storage node stopped");

    Ok(())
}
