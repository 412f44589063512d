use axum::{extract::State, routing::get, Json, Router};
use serde_json::{json, Value};

use super::AppState;

pub fn routes() -> Router<AppState> {
    Router::new().route("/api/health", get(health))
}

/// Liveness plus whether uploads can currently be accepted.
async fn health(State(state): State<AppState>) -> Json<Value> {
    let store = state.service.store();
    Json(json!({
        "status": "ok",
        "service": "aula",
        "version": env!("CARGO_PKG_VERSION"),
        "storage": {
            "backend": store.backend_name(),
            "configured": store.is_configured(),
        },
    }))
}
