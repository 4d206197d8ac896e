//! Question Engine
//!
//! Wires an intent source, the executor and the formatter into one call.
//! `ask` never fails: every interpretation or execution error ends up in the
//! returned `Exchange` as an error outcome with its display text.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info};

use crate::interpret::{IntentSource, RuleBasedInterpreter};
use crate::query::{format, Answer, Intent, IntentPayload, QueryExecutor, QueryResult};
use crate::storage::MeasurementStore;

/// One question and everything produced while answering it
#[derive(Debug, Clone)]
pub struct Exchange {
    /// Interpreted intent, if interpretation succeeded
    pub intent: Option<Intent>,
    /// Execution outcome; interpretation errors land here too
    pub outcome: QueryResult<Answer>,
    /// Rendered text for display
    pub text: String,
}

impl Exchange {
    fn new(intent: Option<Intent>, outcome: QueryResult<Answer>) -> Self {
        let text = format::render(&outcome);
        Self {
            intent,
            outcome,
            text,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.outcome.is_ok()
    }
}

/// Question answering pipeline
pub struct Engine {
    source: Arc<dyn IntentSource>,
    executor: QueryExecutor,
}

impl Engine {
    pub fn new(source: Arc<dyn IntentSource>, executor: QueryExecutor) -> Self {
        Self { source, executor }
    }

    /// Engine using the rule-based interpreter over `store`
    pub fn with_rules(store: Arc<MeasurementStore>) -> Self {
        Self::new(
            Arc::new(RuleBasedInterpreter::new()),
            QueryExecutor::new(store),
        )
    }

    pub fn store(&self) -> &Arc<MeasurementStore> {
        self.executor.store()
    }

    /// Name of the configured intent source
    pub fn source_name(&self) -> &str {
        self.source.name()
    }

    /// Interpret, execute and render a question
    ///
    /// The text is handed over untrimmed.
    pub async fn ask(&self, text: &str) -> Exchange {
        let started = Instant::now();

        let exchange = match self.source.interpret(text).await {
            Ok(intent) => {
                debug!(action = %intent.action, road = %intent.entity_id, "Interpreted question");
                let outcome = self.executor.execute(&intent);
                Exchange::new(Some(intent), outcome)
            }
            Err(e) => Exchange::new(None, Err(e)),
        };

        info!(
            source = self.source.name(),
            ok = exchange.is_ok(),
            elapsed_us = started.elapsed().as_micros() as u64,
            "Answered question"
        );

        exchange
    }

    /// Execute an already structured payload, skipping interpretation
    pub fn execute(&self, payload: IntentPayload) -> Exchange {
        match Intent::try_from(payload) {
            Ok(intent) => {
                let outcome = self.executor.execute(&intent);
                Exchange::new(Some(intent), outcome)
            }
            Err(e) => Exchange::new(None, Err(e)),
        }
    }

    /// Decode a JSON payload and execute it
    ///
    /// Bodies that do not match the wire shape answer with `malformed_intent`.
    pub fn execute_json(&self, json: &str) -> Exchange {
        match IntentPayload::from_json(json) {
            Ok(payload) => self.execute(payload),
            Err(e) => Exchange::new(None, Err(e)),
        }
    }
}
