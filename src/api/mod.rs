//! Water Levels REST API
//!
//! HTTP API layer built with Axum.
//!
//! # Endpoints
//!
//! ## Questions
//! - `POST /api/v1/ask` - Answer a free-text question
//! - `POST /api/v1/execute` - Execute a structured intent
//!
//! ## Table
//! - `GET /api/v1/roads` - Road columns and time span
//!
//! ## Health
//! - `GET /health/live` - Liveness probe
//! - `GET /health/ready` - Readiness probe
//! - `GET /health` - Full health status
//!
//! # Example
//!
//! ```rust,ignore
//! use waterlevels::api::{serve, AppState};
//! use waterlevels::config::ApiConfig;
//! use waterlevels::engine::Engine;
//! use std::sync::Arc;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let engine = Arc::new(Engine::with_rules(Arc::new(store)));
//!     let config = ApiConfig::default();
//!
//!     serve(AppState::new(engine, config.clone()), &config).await?;
//!     Ok(())
//! }
//! ```

pub mod dto;
pub mod error;
pub mod routes;
pub mod state;

pub use error::{ApiError, ApiResult};
pub use state::AppState;

use axum::{
    http::HeaderValue,
    routing::{get, post},
    Router,
};
use std::sync::Arc;
use tower_http::{
    cors::{Any, CorsLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ApiConfig;

/// Build the API router with all routes and middleware
pub fn build_router(state: AppState) -> Router {
    let api_routes = Router::new()
        .route("/ask", post(routes::ask::ask))
        .route("/execute", post(routes::ask::execute))
        .route("/roads", get(routes::roads::list_roads));

    let health_routes = Router::new()
        .route("/live", get(routes::health::liveness))
        .route("/ready", get(routes::health::readiness))
        .route("/", get(routes::health::full_health));

    let cors = cors_layer(&state.config);
    let timeout = TimeoutLayer::new(state.config.request_timeout());

    // Create shared state
    let shared_state = Arc::new(state);

    Router::new()
        .nest("/api/v1", api_routes)
        .nest("/health", health_routes)
        .layer(TraceLayer::new_for_http())
        .layer(timeout)
        .layer(cors)
        .with_state(shared_state)
}

/// Permissive unless origins are configured
fn cors_layer(config: &ApiConfig) -> CorsLayer {
    if config.cors_origins.is_empty() {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .cors_origins
        .iter()
        .filter_map(|origin| match origin.parse() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(origins)
        .allow_methods(Any)
        .allow_headers(Any)
}

/// Start the API server
pub async fn serve(state: AppState, config: &ApiConfig) -> Result<(), ApiError> {
    let router = build_router(state);

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    tracing::info!("Water levels API listening on {}", addr);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .map_err(|e| ApiError::Internal(format!("Server error: {}", e)))?;

    tracing::info!("Water levels API shut down gracefully");
    Ok(())
}

/// Wait for shutdown signal
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to install SIGTERM handler: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, starting graceful shutdown");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::dto::{AskResponse, HealthResponse, RoadsResponse};
    use crate::engine::Engine;
    use crate::storage::{parse_timestamp, EntityId, MeasurementStore, Row};
    use axum::{
        body::Body,
        http::{Request, StatusCode},
        response::Response,
    };
    use serde::de::DeserializeOwned;
    use tower::util::ServiceExt;

    fn road(n: &str) -> EntityId {
        EntityId::from_digits(n).unwrap()
    }

    fn create_test_app() -> Router {
        let store = MeasurementStore::new(
            vec![road("101"), road("102")],
            vec![
                Row::new(parse_timestamp("2024-10-01 00:00:00").unwrap(), vec![Some(1.0), Some(0.4)]),
                Row::new(parse_timestamp("2024-10-01 01:00:00").unwrap(), vec![Some(3.0), None]),
                Row::new(parse_timestamp("2024-10-01 02:00:00").unwrap(), vec![Some(3.0), Some(0.6)]),
            ],
        )
        .unwrap();

        create_app_with(store)
    }

    fn create_app_with(store: MeasurementStore) -> Router {
        let engine = Arc::new(Engine::with_rules(Arc::new(store)));
        build_router(AppState::new(engine, ApiConfig::default()))
    }

    fn get_request(uri: &str) -> Request<Body> {
        Request::builder().uri(uri).body(Body::empty()).unwrap()
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    async fn read_json<T: DeserializeOwned>(response: Response) -> T {
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn test_health_live() {
        let app = create_test_app();

        let response = app.oneshot(get_request("/health/live")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_ready() {
        let app = create_test_app();

        let response = app.oneshot(get_request("/health/ready")).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn test_health_ready_without_rows() {
        let store = MeasurementStore::new(vec![road("1")], Vec::new()).unwrap();
        let app = create_app_with(store);

        let response = app.oneshot(get_request("/health/ready")).await.unwrap();

        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[tokio::test]
    async fn test_health_full() {
        let app = create_test_app();

        let response = app.oneshot(get_request("/health")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let health: HealthResponse = read_json(response).await;
        assert_eq!(health.status, "healthy");
        assert_eq!(health.rows, 3);
        assert_eq!(health.roads, 2);
        assert_eq!(health.interpreter, "rules");
    }

    #[tokio::test]
    async fn test_ask_answers_question() {
        let app = create_test_app();

        let response = app
            .oneshot(post_json(
                "/api/v1/ask",
                r#"{"question": "What is the highest water level on road 101?"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: AskResponse = read_json(response).await;
        assert_eq!(
            body.answer,
            "The highest water level on Road_101 was 3.00 meters on 2024-10-01 01:00:00."
        );
        assert!(body.error.is_none());
        let intent = body.intent.unwrap();
        assert_eq!(intent.road_id.as_deref(), Some("Road_101"));
        assert!(!body.request_id.is_empty());
    }

    #[tokio::test]
    async fn test_ask_query_error_is_ok_response() {
        let app = create_test_app();

        let response = app
            .oneshot(post_json(
                "/api/v1/ask",
                r#"{"question": "level on road 102 at 2024-10-01 01:00:00"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: AskResponse = read_json(response).await;
        let error = body.error.unwrap();
        assert_eq!(error.code, "no_data_at_timestamp");
        assert_eq!(
            body.answer,
            "Error: No data available for Road_102 at 2024-10-01 01:00:00."
        );
    }

    #[tokio::test]
    async fn test_ask_blank_question() {
        let app = create_test_app();

        let response = app
            .oneshot(post_json("/api/v1/ask", r#"{"question": "   "}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_ask_invalid_json() {
        let app = create_test_app();

        let response = app
            .oneshot(post_json("/api/v1/ask", "not json"))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_execute_payload() {
        let app = create_test_app();

        let response = app
            .oneshot(post_json(
                "/api/v1/execute",
                r#"{"action": "range_max", "road_id": "Road_102",
                    "start_timestamp": "2024-10-01", "end_timestamp": "2024-10-02"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: AskResponse = read_json(response).await;
        assert_eq!(
            body.answer,
            "The maximum water level on Road_102 between 2024-10-01 00:00:00 and \
             2024-10-02 00:00:00 was 0.60 meters on 2024-10-01 02:00:00."
        );
    }

    #[tokio::test]
    async fn test_execute_malformed_payload() {
        let app = create_test_app();

        let response = app
            .oneshot(post_json(
                "/api/v1/execute",
                r#"{"action": "range_values", "road_id": "Road_101"}"#,
            ))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: AskResponse = read_json(response).await;
        assert_eq!(body.error.unwrap().code, "malformed_intent");
        assert!(body.intent.is_none());
    }

    #[tokio::test]
    async fn test_execute_mistyped_payload() {
        for payload in [
            r#"{"action": 5, "road_id": "Road_101"}"#,
            r#"{"action": "max", "road_id": 101}"#,
            "{\"action\": \"max\"",
        ] {
            let app = create_test_app();

            let response = app.oneshot(post_json("/api/v1/execute", payload)).await.unwrap();
            assert_eq!(response.status(), StatusCode::OK);

            let body: AskResponse = read_json(response).await;
            let error = body.error.unwrap();
            assert_eq!(error.code, "malformed_intent");
            assert!(body.answer.starts_with("Error: Malformed query intent:"));
            assert!(body.intent.is_none());
        }
    }

    #[tokio::test]
    async fn test_list_roads() {
        let app = create_test_app();

        let response = app.oneshot(get_request("/api/v1/roads")).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let body: RoadsResponse = read_json(response).await;
        assert_eq!(body.roads, vec!["Road_101", "Road_102"]);
        assert_eq!(body.rows, 3);
        assert_eq!(body.first_timestamp.as_deref(), Some("2024-10-01 00:00:00"));
        assert_eq!(body.last_timestamp.as_deref(), Some("2024-10-01 02:00:00"));
    }
}
