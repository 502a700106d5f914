// Plain HTTP handlers and shared JSON response types.

use crate::interface_adapters::state::AppState;
use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use std::sync::Arc;

#[derive(Debug, serde::Serialize)]
pub struct ErrorResponse {
    // Human-readable error string for consistent JSON error responses.
    pub error: String,
}

#[derive(Debug, serde::Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub sessions: usize,
}

pub async fn healthz(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        sessions: state.service.session_count().await,
    })
}

pub async fn not_found() -> impl IntoResponse {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse {
            error: "not found".to_string(),
        }),
    )
}
