//! # Adsync Main Entry Point
//!
//! This is the main entry point for the Adsync service: load configuration,
//! initialize telemetry and the database, spawn the queue worker, and serve
//! the HTTP surface.

use std::sync::Arc;

use adsync::config::ConfigLoader;
use adsync::crypto::CryptoKey;
use adsync::meta::{InsightsClient, InsightsSource};
use adsync::migration::{Migrator, MigratorTrait};
use adsync::server::{AppState, run_server};
use adsync::worker::Worker;
use adsync::{db, telemetry};
use tokio_util::sync::CancellationToken;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Load configuration from layered env files and variables
    let config_loader = ConfigLoader::new();
    let config = config_loader.load()?;

    telemetry::init_tracing(&config)?;

    tracing::info!(profile = %config.profile, "Loaded configuration");
    if let Ok(redacted_json) = config.redacted_json() {
        tracing::debug!(config = %redacted_json, "Effective configuration");
    }

    let database = db::init_pool(&config).await?;
    Migrator::up(&database, None).await?;

    let crypto_key = CryptoKey::new(
        config
            .crypto_key
            .clone()
            .ok_or("crypto key missing after validation")?,
    )?;

    let insights: Arc<dyn InsightsSource> = Arc::new(InsightsClient::new(&config.meta));
    let config = Arc::new(config);

    let shutdown = CancellationToken::new();

    if config.worker.enabled {
        let worker = Worker::new(
            database.clone(),
            Arc::clone(&insights),
            crypto_key.clone(),
            &config,
        );
        tokio::spawn(worker.run(shutdown.clone()));
    } else {
        tracing::warn!("Worker loop disabled; jobs will queue without being processed");
    }

    // Ctrl-c stops the worker loop; the server exits with the process
    tokio::spawn({
        let shutdown = shutdown.clone();
        async move {
            let _ = tokio::signal::ctrl_c().await;
            shutdown.cancel();
        }
    });

    let state = AppState {
        config,
        db: database,
        crypto_key,
        insights,
    };

    run_server(state).await
}
