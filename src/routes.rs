use axum::routing::{get, post};
use axum::{extract::State, Json, Router};
use serde_json::{json, Value};

use crate::handlers;
use crate::state::AppState;

pub fn create_routes() -> Router<AppState> {
    Router::new()
        .route("/api/health", get(health_check))
        .route("/api/todo", post(handlers::capture_todo))
        .route("/api/talk", post(handlers::talk))
}

async fn health_check(State(state): State<AppState>) -> Json<Value> {
    Json(json!({
        "status": "ok",
        "notion_configured": state.notes.is_some(),
    }))
}
