//! Ask Routes
//!
//! - POST /api/v1/ask - Answer a free-text question
//! - POST /api/v1/execute - Execute a structured intent payload
//!
//! Questions that cannot be answered still return 200; the reason is in the
//! `error` field and the `answer` holds the display sentence.

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::{AskRequest, AskResponse};
use crate::api::error::{ApiError, ApiResult};
use crate::api::state::AppState;

/// POST /api/v1/ask
pub async fn ask(
    State(state): State<Arc<AppState>>,
    Json(req): Json<AskRequest>,
) -> ApiResult<Json<AskResponse>> {
    if req.question.trim().is_empty() {
        return Err(ApiError::Validation("question cannot be empty".to_string()));
    }

    let exchange = state.engine.ask(&req.question).await;
    Ok(Json(AskResponse::from(exchange)))
}

/// POST /api/v1/execute
///
/// Bodies that break the wire shape answer with `malformed_intent`.
pub async fn execute(State(state): State<Arc<AppState>>, body: String) -> Json<AskResponse> {
    Json(AskResponse::from(state.engine.execute_json(&body)))
}
