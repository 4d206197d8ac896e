//! Generative intent source
//!
//! Asks a text-generation endpoint to translate the question into the JSON
//! wire shape. The generated text is repaired and parsed, and the road named
//! in the question always overrides the road the model produced. Transport
//! failures fall back to the rule-based source.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, warn};

use crate::config::InterpreterConfig;
use crate::interpret::entity::extract_entity;
use crate::interpret::{IntentSource, RuleBasedInterpreter};
use crate::query::{Intent, IntentPayload, QueryResult};

/// Errors from the text-generation endpoint
#[derive(Error, Debug)]
pub enum GeneratorError {
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("Generator request failed: {0}")]
    Request(String),

    #[error("Generator did not answer within {0:?}")]
    Timeout(Duration),

    #[error("Generator unavailable at {0}")]
    Unavailable(String),

    #[error("Generator returned status {0}")]
    Status(u16),

    #[error("Failed to decode generator reply: {0}")]
    Decode(String),
}

/// Connection settings for the generation endpoint
#[derive(Debug, Clone)]
pub struct GeneratorConfig {
    pub endpoint: String,
    pub timeout: Duration,
    pub max_new_tokens: u32,
}

impl From<&InterpreterConfig> for GeneratorConfig {
    fn from(config: &InterpreterConfig) -> Self {
        Self {
            endpoint: config.endpoint.clone(),
            timeout: config.request_timeout(),
            max_new_tokens: config.max_new_tokens,
        }
    }
}

#[derive(Debug, Serialize)]
struct GenerationRequest<'a> {
    inputs: &'a str,
    parameters: GenerationParameters,
}

#[derive(Debug, Serialize)]
struct GenerationParameters {
    max_new_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct Generated {
    generated_text: String,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum GenerationReply {
    Single(Generated),
    Batch(Vec<Generated>),
}

impl GenerationReply {
    fn into_text(self) -> Result<String, GeneratorError> {
        match self {
            Self::Single(generated) => Ok(generated.generated_text),
            Self::Batch(batch) => batch
                .into_iter()
                .next()
                .map(|generated| generated.generated_text)
                .ok_or_else(|| GeneratorError::Decode("empty generation batch".to_string())),
        }
    }
}

/// Intent source backed by a text-generation endpoint
pub struct GenerativeInterpreter {
    client: Client,
    config: GeneratorConfig,
    fallback: RuleBasedInterpreter,
}

impl GenerativeInterpreter {
    pub fn new(config: GeneratorConfig) -> Result<Self, GeneratorError> {
        let client = Client::builder()
            .user_agent("waterlevels/0.1")
            .timeout(config.timeout)
            .build()
            .map_err(|e| GeneratorError::Client(e.to_string()))?;

        Ok(Self {
            client,
            config,
            fallback: RuleBasedInterpreter::new(),
        })
    }

    /// Raw generated text for a question
    async fn generate(&self, text: &str) -> Result<String, GeneratorError> {
        let prompt = build_prompt(text);
        let request = GenerationRequest {
            inputs: &prompt,
            parameters: GenerationParameters {
                max_new_tokens: self.config.max_new_tokens,
            },
        };

        let response = self
            .client
            .post(&self.config.endpoint)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.transport_error(e))?;

        if !response.status().is_success() {
            return Err(GeneratorError::Status(response.status().as_u16()));
        }

        let reply: GenerationReply = response
            .json()
            .await
            .map_err(|e| GeneratorError::Decode(e.to_string()))?;

        reply.into_text()
    }

    fn transport_error(&self, err: reqwest::Error) -> GeneratorError {
        if err.is_timeout() {
            GeneratorError::Timeout(self.config.timeout)
        } else if err.is_connect() {
            GeneratorError::Unavailable(self.config.endpoint.clone())
        } else {
            GeneratorError::Request(err.to_string())
        }
    }
}

#[async_trait]
impl IntentSource for GenerativeInterpreter {
    fn name(&self) -> &str {
        "generative"
    }

    async fn interpret(&self, text: &str) -> QueryResult<Intent> {
        match self.generate(text).await {
            Ok(generated) => {
                debug!(generated = %generated, "Generator reply");
                decode_generated(text, &generated)
            }
            Err(e) => {
                warn!("Falling back to rule-based interpretation: {}", e);
                self.fallback.interpret(text).await
            }
        }
    }
}

/// Few-shot prompt asking for the wire shape of `question`
pub fn build_prompt(question: &str) -> String {
    format!(
        "You are an assistant that converts questions about water levels into a structured JSON format. \
         The output must be a complete JSON object enclosed in curly braces {{}}. \
         The JSON object must include the keys 'action' and 'road_id', plus 'timestamp' for a single \
         point in time or 'start_timestamp' and 'end_timestamp' for a range. \
         'action' is one of max, min, average, latest, point, range_values, range_max. \
         The road_id always starts with 'Road_' followed by the exact road number from the question.\n\
         Examples:\n\
         - Question: What is the highest water level on road 101?\n  \
         Output: {{\"action\": \"max\", \"road_id\": \"Road_101\"}}\n\
         - Question: What was the water level on road 102 at 2024-10-15 08:00:00?\n  \
         Output: {{\"action\": \"point\", \"road_id\": \"Road_102\", \"timestamp\": \"2024-10-15 08:00:00\"}}\n\
         - Question: Show me all water levels on road 106 from 2024-10-01 00:00:00 to 2024-10-05 23:59:59\n  \
         Output: {{\"action\": \"range_values\", \"road_id\": \"Road_106\", \
         \"start_timestamp\": \"2024-10-01 00:00:00\", \"end_timestamp\": \"2024-10-05 23:59:59\"}}\n\
         \nQuestion: {}\nOutput (just JSON): ",
        question
    )
}

/// Wrap generated text in outer braces where the model dropped them
pub fn repair_braces(generated: &str) -> String {
    let trimmed = generated.trim();
    let mut repaired = String::with_capacity(trimmed.len() + 2);

    if !trimmed.starts_with('{') {
        repaired.push('{');
    }
    repaired.push_str(trimmed);
    if !trimmed.ends_with('}') {
        repaired.push('}');
    }

    repaired
}

/// Turn generated text into an intent for `question`
pub fn decode_generated(question: &str, generated: &str) -> QueryResult<Intent> {
    let mut payload = IntentPayload::from_json(&repair_braces(generated))?;

    if let Some(entity) = extract_entity(question) {
        payload.road_id = Some(entity.to_string());
    }

    Intent::try_from(payload)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::{Action, QueryError, TimeTarget};
    use axum::{routing::post, Json, Router};
    use serde_json::{json, Value};

    /// Serve `reply` for every generation request on an ephemeral port
    async fn spawn_generator(reply: Value) -> String {
        let app = Router::new().route(
            "/generate",
            post(move |Json(_body): Json<Value>| {
                let reply = reply.clone();
                async move { Json(reply) }
            }),
        );

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{}/generate", addr)
    }

    fn interpreter(endpoint: String) -> GenerativeInterpreter {
        GenerativeInterpreter::new(GeneratorConfig {
            endpoint,
            timeout: Duration::from_secs(2),
            max_new_tokens: 64,
        })
        .unwrap()
    }

    #[test]
    fn test_repair_braces() {
        assert_eq!(repair_braces(r#""action": "max""#), r#"{"action": "max"}"#);
        assert_eq!(repair_braces(r#"{"action": "max""#), r#"{"action": "max"}"#);
        assert_eq!(repair_braces(r#" {"action": "max"} "#), r#"{"action": "max"}"#);
    }

    #[test]
    fn test_decode_overrides_road_from_question() {
        let intent = decode_generated(
            "highest level on road 101",
            r#""action": "max", "road_id": "Road_1""#,
        )
        .unwrap();

        assert_eq!(intent.action, Action::Max);
        assert_eq!(intent.entity_id.as_str(), "Road_101");
    }

    #[test]
    fn test_decode_accepts_long_action_names() {
        let intent = decode_generated(
            "level on road 102 at 2024-10-15 08:00:00",
            r#"{"action": "retrieve_water_level", "road_id": "Road_102", "timestamp": "2024-10-15 08:00:00"}"#,
        )
        .unwrap();

        assert_eq!(intent.action, Action::Point);
        assert_eq!(intent.target, TimeTarget::Point("2024-10-15 08:00:00".to_string()));
    }

    #[test]
    fn test_decode_failures() {
        let err = decode_generated("road 3", "the level is high").unwrap_err();
        assert_eq!(err.code(), "malformed_intent");

        // no road in the question and none generated
        let err = decode_generated("highest level", r#"{"action": "max"}"#).unwrap_err();
        assert_eq!(err, QueryError::EntityMissing);
    }

    #[test]
    fn test_prompt_contains_question() {
        let prompt = build_prompt("average on road 5?");
        assert!(prompt.contains("Question: average on road 5?\nOutput (just JSON): "));
        assert!(prompt.contains(r#"{"action": "max", "road_id": "Road_101"}"#));
    }

    #[tokio::test]
    async fn test_interpret_single_reply() {
        let endpoint = spawn_generator(json!({
            "generated_text": "\"action\": \"average\", \"road_id\": \"Road_5\""
        }))
        .await;

        let intent = interpreter(endpoint)
            .interpret("What is the average water level on road 5?")
            .await
            .unwrap();

        assert_eq!(intent.action, Action::Average);
        assert_eq!(intent.entity_id.as_str(), "Road_5");
    }

    #[tokio::test]
    async fn test_interpret_batch_reply() {
        let endpoint = spawn_generator(json!([{
            "generated_text": "{\"action\": \"latest\", \"road_id\": \"Road_9\"}"
        }]))
        .await;

        let intent = interpreter(endpoint)
            .interpret("latest level on road 9")
            .await
            .unwrap();

        assert_eq!(intent.action, Action::Latest);
    }

    #[tokio::test]
    async fn test_unparseable_generation_is_malformed() {
        let endpoint = spawn_generator(json!({ "generated_text": "Road_101 is very wet" })).await;

        let err = interpreter(endpoint)
            .interpret("highest level on road 101")
            .await
            .unwrap_err();
        assert_eq!(err.code(), "malformed_intent");
    }

    #[tokio::test]
    async fn test_unexpected_reply_shape_falls_back() {
        let endpoint = spawn_generator(json!({ "unexpected": true })).await;

        let intent = interpreter(endpoint)
            .interpret("highest level on road 101")
            .await
            .unwrap();
        assert_eq!(intent.action, Action::Max);
    }

    #[tokio::test]
    async fn test_unreachable_endpoint_falls_back_to_rules() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let intent = interpreter(format!("http://{}/generate", addr))
            .interpret("What's the minimum water level on road 104?")
            .await
            .unwrap();

        assert_eq!(intent.action, Action::Min);
        assert_eq!(intent.entity_id.as_str(), "Road_104");
    }
}
