//! HTTP handlers for the assistant service.

pub mod chat;
pub mod health;

use chrono::{SecondsFormat, Utc};
use service_core::error::AppError;

/// Current UTC time as ISO-8601 with millisecond precision (`2024-01-01T12:00:00.000Z`).
pub(crate) fn iso_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Fallback for unknown `/api/*` paths, which must not reach the static front end.
pub async fn api_not_found() -> AppError {
    AppError::NotFound(anyhow::anyhow!("API endpoint not found"))
}
