//! Mail transport reachability endpoint.

use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use serde_json::{json, Value};
use tracing::warn;

/// Report whether the SMTP server is currently reachable.
///
/// Opens a session, negotiates TLS, authenticates, and issues a liveness
/// probe without sending mail.
pub async fn smtp_status_handler(State(state): State<AppState>) -> (StatusCode, Json<Value>) {
    match state.mail.check_health().await {
        Ok(()) => (StatusCode::OK, Json(json!({ "status": "reachable" }))),
        Err(err) => {
            warn!(error = %err, "SMTP status check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({ "status": "unreachable", "error": err.to_string() })),
            )
        }
    }
}
