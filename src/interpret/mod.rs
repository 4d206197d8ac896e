//! Question Interpretation
//!
//! Turns free-text questions into structured intents:
//!
//! - **Entity**: Road identifier extraction
//! - **Temporal**: Timestamp literals and range detection
//! - **Classifier**: Keyword-based action selection
//! - **Builder**: Combines the three into an `Intent`
//! - **Generative**: Text-generation endpoint as an alternative source
//!
//! # Example
//!
//! ```rust
//! use waterlevels::interpret::QueryBuilder;
//! use waterlevels::query::Action;
//!
//! let intent = QueryBuilder::new()
//!     .build("What is the highest water level on road 101?")
//!     .unwrap();
//! assert_eq!(intent.action, Action::Max);
//! assert_eq!(intent.entity_id.as_str(), "Road_101");
//! ```

mod builder;
mod classifier;
mod entity;
mod generative;
mod temporal;

pub use builder::QueryBuilder;
pub use classifier::classify;
pub use entity::extract_entity;
pub use generative::{
    build_prompt, decode_generated, repair_braces, GenerativeInterpreter, GeneratorConfig,
    GeneratorError,
};
pub use temporal::{extract_time_target, has_range_cue, timestamp_literals};

use async_trait::async_trait;
use std::sync::Arc;

use crate::config::{InterpreterConfig, InterpreterMode};
use crate::query::{Intent, QueryResult};

/// Anything that can turn a question into an intent
#[async_trait]
pub trait IntentSource: Send + Sync {
    /// Short name used in logs
    fn name(&self) -> &str;

    /// Interpret a question
    async fn interpret(&self, text: &str) -> QueryResult<Intent>;
}

/// Keyword and pattern rules, no I/O
#[derive(Debug, Clone, Default)]
pub struct RuleBasedInterpreter {
    builder: QueryBuilder,
}

impl RuleBasedInterpreter {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl IntentSource for RuleBasedInterpreter {
    fn name(&self) -> &str {
        "rules"
    }

    async fn interpret(&self, text: &str) -> QueryResult<Intent> {
        self.builder.build(text)
    }
}

/// Build the intent source selected by configuration
pub fn from_config(config: &InterpreterConfig) -> Result<Arc<dyn IntentSource>, GeneratorError> {
    let source: Arc<dyn IntentSource> = match config.mode {
        InterpreterMode::Rules => Arc::new(RuleBasedInterpreter::new()),
        InterpreterMode::Generative => {
            Arc::new(GenerativeInterpreter::new(GeneratorConfig::from(config))?)
        }
    };

    tracing::info!(source = source.name(), "Intent source ready");
    Ok(source)
}
