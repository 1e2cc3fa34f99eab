//! Harvest Daemon - game backend server
//!
//! Opens the ledger, seeds the product and achievement catalogs, and serves
//! the game API over HTTP.

mod config;
mod routes;
mod server;

use anyhow::{Context, Result};
use config::Config;
use harvest_core::seed::seed_reference_data;
use harvest_core::{GameService, LedgerDb};
use std::path::Path;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    info!("Harvest Daemon v{} starting", env!("CARGO_PKG_VERSION"));

    let config = Config::load()?;

    if let Some(parent) = Path::new(&config.db_path).parent() {
        std::fs::create_dir_all(parent)
            .with_context(|| format!("failed to create {}", parent.display()))?;
    }
    let ledger = LedgerDb::open_at(&config.db_path)?;
    seed_reference_data(&ledger)?;
    info!("Ledger ready at {}", config.db_path);

    let service = GameService::new(ledger);
    let state = server::AppState::new(service, config.ranking_limit);

    server::run(state, &config.bind_addr).await
}
