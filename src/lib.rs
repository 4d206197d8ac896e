//! # Water Levels
//!
//! Answers free-text questions about per-road water level readings.
//!
//! ## Features
//!
//! - **Rule-based interpretation**: Road, timestamp and action extraction from plain questions
//! - **Pluggable intent sources**: Swap in a text-generation endpoint that emits the same wire shape
//! - **Deterministic answers**: Fixed tie-break, missing-data and range policies
//! - **Surfaces**: Interactive REPL and an HTTP ask service
//!
//! ## Modules
//!
//! - [`storage`]: Immutable measurement table and CSV loader
//! - [`interpret`]: Question to intent conversion
//! - [`query`]: Intent model, executor and response formatter
//! - [`engine`]: The full question answering pipeline
//! - [`api`]: REST API server with Axum
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::path::Path;
//! use std::sync::Arc;
//! use waterlevels::engine::Engine;
//! use waterlevels::storage::CsvLoader;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let (store, report) = CsvLoader::new().load(Path::new("water_levels.csv"))?;
//!     println!("Loaded {} rows", report.rows_loaded);
//!
//!     let engine = Engine::with_rules(Arc::new(store));
//!     let exchange = engine.ask("What is the highest water level on road 101?").await;
//!     println!("Result: {}", exchange.text);
//!
//!     Ok(())
//! }
//! ```

pub mod api;
pub mod config;
pub mod engine;
pub mod interpret;
pub mod logging;
pub mod query;
pub mod storage;
