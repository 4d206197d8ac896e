//! Water Levels API Server
//!
//! Run with: cargo run --bin waterlevels-api
//!
//! # Configuration
//!
//! Reads `config.toml` from the default locations (see `config::Config`), or
//! the file named by `WATERLEVELS_CONFIG`. Environment variables override it:
//! - `WATERLEVELS_DATA`: CSV file to load
//! - `WATERLEVELS_INTERPRETER`: rules or generative
//! - `WATERLEVELS_GENERATOR_URL`: Text-generation endpoint
//! - `WATERLEVELS_API_HOST`: Host to bind to (default: 0.0.0.0)
//! - `WATERLEVELS_API_PORT`: Port to listen on (default: 8082)
//! - `RUST_LOG`: Log filter (default: the configured level)

use anyhow::Context;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use waterlevels::api::{serve, AppState};
use waterlevels::config::Config;
use waterlevels::engine::Engine;
use waterlevels::interpret;
use waterlevels::logging;
use waterlevels::query::QueryExecutor;
use waterlevels::storage::CsvLoader;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let explicit = std::env::var("WATERLEVELS_CONFIG").ok().map(PathBuf::from);
    let config_file = Config::locate(explicit.as_deref());
    let config = Config::resolve(config_file.as_deref())?;

    logging::init(&config.logging);

    match &config_file {
        Some(path) => tracing::info!("Loaded config from {:?}", path),
        None => tracing::info!("Using default config with environment overrides"),
    }

    tracing::info!("Starting water levels API server v{}", env!("CARGO_PKG_VERSION"));

    // Load the measurement table
    let csv_path = Path::new(&config.store.csv_path);
    tracing::info!("Data file: {:?}", csv_path);
    let (store, report) = CsvLoader::new()
        .with_timestamp_column(&config.store.timestamp_column)
        .load(csv_path)
        .with_context(|| format!("failed to load {}", csv_path.display()))?;

    if report.rows_skipped > 0 {
        tracing::warn!("Skipped {} malformed rows", report.rows_skipped);
    }

    // Build the pipeline
    let source = interpret::from_config(&config.interpreter)?;
    let engine = Arc::new(Engine::new(source, QueryExecutor::new(Arc::new(store))));

    let state = AppState::new(engine, config.api.clone());

    // Run server
    tracing::info!("Starting server on {}", config.api.addr());
    serve(state, &config.api).await?;

    tracing::info!("Water levels API server stopped");

    Ok(())
}
