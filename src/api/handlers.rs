use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Serialize;
use std::sync::Arc;

use crate::storage::{ActionStore, StoreStats};

/// Application state shared across handlers
pub struct AppState {
    pub store: Arc<ActionStore>,
}

// ============================================================================
// Health Check
// ============================================================================

#[derive(Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
}

pub async fn health_check(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let (code, status) = if state.store.stats().running {
        (StatusCode::OK, "healthy")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "stopped")
    };

    (
        code,
        Json(HealthResponse {
            status,
            version: env!("CARGO_PKG_VERSION"),
        }),
    )
}

// ============================================================================
// Actions
// ============================================================================

/// Body is the raw submission, e.g. `{"action":"jump","time":100}`.
/// Accepted submissions may still be dropped under overload.
pub async fn submit_action(
    State(state): State<Arc<AppState>>,
    body: String,
) -> Result<StatusCode, ApiError> {
    state
        .store
        .submit(&body)
        .map_err(|e| ApiError::BadRequest(e.to_string()))?;

    Ok(StatusCode::ACCEPTED)
}

pub async fn report(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        state.store.report(),
    )
}

pub async fn counters(State(state): State<Arc<AppState>>) -> Json<StoreStats> {
    Json(state.store.stats())
}

// ============================================================================
// Error Handling
// ============================================================================

#[derive(Debug)]
pub enum ApiError {
    BadRequest(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
        };

        let body = serde_json::json!({
            "error": message
        });

        (status, Json(body)).into_response()
    }
}
