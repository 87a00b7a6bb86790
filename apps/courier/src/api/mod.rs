//! HTTP API surface.

pub mod send;
pub mod status;

use crate::state::AppState;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde_json::{json, Value};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(root))
        .route("/api/send-email", post(send::send_email_handler))
        .route("/api/smtp-status", get(status::smtp_status_handler))
        .with_state(state)
}

async fn root() -> Json<Value> {
    Json(json!({ "message": "Welcome to the Courier Mail API" }))
}
