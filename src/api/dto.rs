//! Data Transfer Objects
//!
//! Request and response types for the API endpoints.
//! These types are serialized/deserialized to/from JSON.

use serde::{Deserialize, Serialize};

use crate::engine::Exchange;
use crate::query::IntentPayload;

// ============================================
// ASK DTOs
// ============================================

/// Free-text question
#[derive(Debug, Deserialize)]
pub struct AskRequest {
    pub question: String,
}

/// Answer to a question or a structured payload
#[derive(Debug, Serialize, Deserialize)]
pub struct AskResponse {
    /// Rendered answer, or the `Error: ...` sentence
    pub answer: String,
    /// Intent that was executed, in wire shape
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub intent: Option<IntentPayload>,
    /// Machine-readable error when the question could not be answered
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorInfo>,
    pub request_id: String,
}

impl From<Exchange> for AskResponse {
    fn from(exchange: Exchange) -> Self {
        let error = exchange.outcome.as_ref().err().map(|e| ErrorInfo {
            code: e.code().to_string(),
            message: e.to_string(),
        });

        Self {
            answer: exchange.text,
            intent: exchange.intent.as_ref().map(|intent| intent.to_payload()),
            error,
            request_id: uuid::Uuid::new_v4().to_string(),
        }
    }
}

/// Error details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorInfo {
    pub code: String,
    pub message: String,
}

// ============================================
// ROADS DTOs
// ============================================

/// Overview of the loaded table
#[derive(Debug, Serialize, Deserialize)]
pub struct RoadsResponse {
    pub roads: Vec<String>,
    pub rows: usize,
    pub first_timestamp: Option<String>,
    pub last_timestamp: Option<String>,
}

// ============================================
// HEALTH DTOs
// ============================================

/// Full health check response
#[derive(Debug, Serialize, Deserialize)]
pub struct HealthResponse {
    /// Overall status: healthy or degraded
    pub status: String,
    /// Store status: ok or empty
    pub store: String,
    /// Number of rows in the table
    pub rows: usize,
    /// Number of road columns
    pub roads: usize,
    /// Active intent source
    pub interpreter: String,
    /// Server uptime in seconds
    pub uptime_seconds: u64,
    /// Application version
    pub version: String,
}
