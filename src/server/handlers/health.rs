use std::sync::Arc;

use axum::extract::State;
use axum::response::IntoResponse;
use axum::Json;
use serde_json::json;

use crate::state::AppState;

pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(json!({
        "status": "ok",
        "backend": state.backend.kind().as_str(),
        "sessions": state.sessions.len(),
        "version": env!("CARGO_PKG_VERSION")
    }))
}
