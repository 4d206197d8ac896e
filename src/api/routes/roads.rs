//! Roads Routes
//!
//! - GET /api/v1/roads - Columns and time span of the loaded table

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::RoadsResponse;
use crate::api::state::AppState;
use crate::storage::format_timestamp;

/// GET /api/v1/roads
pub async fn list_roads(State(state): State<Arc<AppState>>) -> Json<RoadsResponse> {
    let store = state.store();
    let span = store.span();

    Json(RoadsResponse {
        roads: store.entity_ids().iter().map(|id| id.to_string()).collect(),
        rows: store.len(),
        first_timestamp: span.map(|s| format_timestamp(&s.start)),
        last_timestamp: span.map(|s| format_timestamp(&s.end)),
    })
}
