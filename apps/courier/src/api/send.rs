//! Synchronous email dispatch endpoint.

use crate::state::AppState;
use axum::extract::State;
use axum::http::StatusCode;
use axum::Json;
use mail::{DispatchError, EmailPayload};
use serde_json::{json, Value};
use tracing::{error, info};

/// Normalize and deliver an email request in-line.
///
/// Every failure is surfaced to the caller; this path never retries.
pub async fn send_email_handler(
    State(state): State<AppState>,
    Json(payload): Json<EmailPayload>,
) -> Result<Json<Value>, (StatusCode, Json<Value>)> {
    match state.mail.send(payload).await {
        Ok(message) => {
            info!(recipients = ?message.recipients, "Email request delivered");
            Ok(Json(json!({ "message": "Email sent successfully" })))
        }
        Err(err) => {
            error!(error = %err, "Email request failed");
            let status = match &err {
                DispatchError::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
                DispatchError::Delivery(delivery) if delivery.is_config() => {
                    StatusCode::BAD_REQUEST
                }
                DispatchError::Delivery(_) => StatusCode::BAD_GATEWAY,
            };
            Err((status, Json(json!({ "detail": err.to_string() }))))
        }
    }
}
