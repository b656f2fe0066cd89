//! # REST API for Browser Logs
//!
//! The web client forwards its errors and warnings here so they end up in the
//! server log on the `frontend` channel.

use axum::{routing::post, Json, Router};
use shared::{LogEntry, LogLevel, LogResponse};
use tracing::{error, warn};

use crate::backend::error::{AppError, AppResult};
use crate::backend::io::rest::extract::ApiJson;
use crate::backend::reporting::redact_input;
use crate::backend::AppState;

pub const MAX_MESSAGE_CHARS: usize = 5000;

pub fn router() -> Router<AppState> {
    Router::new().route("/log", post(log_message))
}

pub fn truncate_message(message: &str) -> String {
    message.chars().take(MAX_MESSAGE_CHARS).collect()
}

pub async fn log_message(ApiJson(entry): ApiJson<LogEntry>) -> AppResult<Json<LogResponse>> {
    if !entry.level.is_reported() {
        return Err(AppError::validation("Only error and warning entries are accepted"));
    }

    let message = truncate_message(&entry.message);
    let context = redact_input(entry.context);

    match entry.level {
        LogLevel::Error => error!(
            target: "frontend",
            url = %entry.url,
            user_agent = %entry.user_agent,
            timestamp = %entry.timestamp,
            context = %context,
            "{}",
            message
        ),
        _ => warn!(
            target: "frontend",
            url = %entry.url,
            user_agent = %entry.user_agent,
            timestamp = %entry.timestamp,
            context = %context,
            "{}",
            message
        ),
    }

    Ok(Json(LogResponse { success: true }))
}
