//! Query Engine
//!
//! Executes structured intents against the measurement store:
//!
//! - **AST**: `Intent`, `Action`, `TimeTarget` and the JSON wire shape
//! - **Executor**: Lookup, extreme, average and range policies
//! - **Format**: Deterministic display text for answers and errors
//!
//! # Example
//!
//! ```rust,ignore
//! use waterlevels::query::{format, Action, Intent, QueryExecutor, TimeTarget};
//!
//! let executor = QueryExecutor::new(store);
//! let intent = Intent::new(Action::Max, EntityId::parse("Road_101").unwrap(), TimeTarget::Unconstrained)?;
//! println!("{}", format::render(&executor.execute(&intent)));
//! ```

mod ast;
mod error;
mod executor;
pub mod format;

pub use ast::{Action, Intent, IntentPayload, TimeTarget};
pub use error::{QueryError, QueryResult};
pub use executor::{Answer, Extreme, QueryExecutor, RangeSummary};
