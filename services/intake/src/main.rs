//! Site-visit intake service.
//!
//! Accepts site-visit records from the intake form, issues customer IDs,
//! stores the records and mirrors them to a spreadsheet.

use std::sync::Arc;

use anyhow::Result;
use sitevisit_intake::{
    api,
    config::{self, StoreBackend},
    db::Database,
    export,
    state::AppState,
    store::{MemoryVisitStore, PgVisitStore, VisitStore},
};
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[tokio::main]
async fn main() -> Result<()> {
    let config = config::Config::from_env()?;

    // Prefer RUST_LOG, fall back to SITEVISIT_LOG_LEVEL
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_level.clone().into()))
        .with(tracing_subscriber::fmt::layer().json())
        .init();

    info!("Starting site-visit intake service");
    info!(listen_addr = %config.listen_addr, store = ?config.store, "Configuration loaded");

    let store: Arc<dyn VisitStore> = match config.store {
        StoreBackend::Memory => {
            warn!("Using in-memory record store; records are lost on restart");
            Arc::new(MemoryVisitStore::new())
        }
        StoreBackend::Postgres => {
            let db = match Database::connect(&config.database).await {
                Ok(db) => {
                    info!("Database connection established");
                    db
                }
                Err(e) => {
                    error!(error = %e, "Failed to connect to database");
                    return Err(e.into());
                }
            };

            if config.dev_mode {
                info!("Running database migrations (dev mode)");
                if let Err(e) = db.run_migrations(&config.database.migrations_dir).await {
                    error!(error = %e, "Failed to run migrations");
                    return Err(e.into());
                }
            }

            Arc::new(PgVisitStore::new(db))
        }
    };

    let exporter = export::from_config(&config.sheets)?;

    let state = AppState::new(store, exporter, config.issue_retries);
    let app = api::create_router(state);

    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    info!(addr = %config.listen_addr, "Listening for connections");

    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                error!(error = %e, "Failed to listen for shutdown signal");
            }
            info!("Received shutdown signal");
        })
        .await?;

    info!("Intake service shutdown complete");
    Ok(())
}
