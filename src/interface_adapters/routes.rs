use crate::interface_adapters::http::{healthz, not_found};
use crate::interface_adapters::net::ws_handler;
use crate::interface_adapters::state::AppState;
use axum::{Router, routing::get};
use std::sync::Arc;

pub fn app(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/ws", get(ws_handler))
        .route("/healthz", get(healthz))
        .fallback(not_found)
        .with_state(state)
}
