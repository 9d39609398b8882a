//! Chat relay and upstream connectivity probe.

use super::iso_timestamp;
use crate::models::{ChatErrorResponse, ChatRequest, ChatResponse};
use crate::services::providers::{GenerationParams, ProviderError};
use crate::services::{build_system_prompt, render_context_now, DIAGNOSTIC_PROMPT};
use crate::startup::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use service_core::error::AppError;
use std::time::Instant;

const AUTH_FAILURE: ChatErrorResponse = ChatErrorResponse {
    error: "AI service temporarily unavailable",
    fallback: "I'm having a little trouble connecting right now. Please try again in a moment.",
};

const RATE_LIMITED: ChatErrorResponse = ChatErrorResponse {
    error: "Too many requests",
    fallback: "I'm helping a lot of people right now. Please wait a minute and then ask me again.",
};

const GENERIC_FAILURE: ChatErrorResponse = ChatErrorResponse {
    error: "Failed to get a response",
    fallback: "I'm sorry, I couldn't think of a reply just now. Could you please try again?",
};

/// Map an upstream failure to the status and user-facing body the front end expects.
pub fn classify_upstream_error(err: &ProviderError) -> (StatusCode, ChatErrorResponse) {
    match err {
        ProviderError::Authentication(_) | ProviderError::NotConfigured(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, AUTH_FAILURE)
        }
        ProviderError::RateLimited => (StatusCode::TOO_MANY_REQUESTS, RATE_LIMITED),
        _ => (StatusCode::INTERNAL_SERVER_ERROR, GENERIC_FAILURE),
    }
}

fn body_rejection(rejection: JsonRejection) -> AppError {
    if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
        AppError::PayloadTooLarge
    } else {
        AppError::BadRequest(anyhow::anyhow!("Invalid JSON body: {}", rejection.body_text()))
    }
}

/// `POST /api/chat`
pub async fn chat(
    State(state): State<AppState>,
    payload: Result<Json<Value>, JsonRejection>,
) -> Result<Response, AppError> {
    let Json(body) = payload.map_err(body_rejection)?;
    let request = ChatRequest::from_json(&body)?;

    let context = render_context_now(&request.user_data);
    let system_prompt = build_system_prompt(&context);

    if state.log_conversations {
        tracing::info!(message = %request.message, "Chat message received");
    }

    let started = Instant::now();
    let result = state
        .provider
        .complete(
            Some(system_prompt.as_str()),
            &request.message,
            &GenerationParams::chat(),
        )
        .await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match result {
        Ok(reply) => {
            tracing::info!(
                provider = state.provider.name(),
                message_len = request.message.len(),
                context_lines = context.lines().count(),
                input_tokens = reply.input_tokens,
                output_tokens = reply.output_tokens,
                finish_reason = ?reply.finish_reason,
                elapsed_ms,
                "Chat response generated"
            );
            if state.log_conversations {
                tracing::info!(response = %reply.text, "Chat response text");
            }

            Ok(Json(ChatResponse {
                response: reply.text,
                timestamp: iso_timestamp(),
            })
            .into_response())
        }
        Err(err) => {
            let (status, body) = classify_upstream_error(&err);
            tracing::error!(
                provider = state.provider.name(),
                error = %err,
                status = status.as_u16(),
                elapsed_ms,
                "Upstream chat request failed"
            );
            Ok((status, Json(body)).into_response())
        }
    }
}

/// `GET /api/chat/test`: sends a fixed prompt upstream without any user context.
pub async fn test_connection(State(state): State<AppState>) -> Response {
    match state
        .provider
        .complete(None, DIAGNOSTIC_PROMPT, &GenerationParams::probe())
        .await
    {
        Ok(reply) => {
            tracing::info!(provider = state.provider.name(), "Upstream connectivity probe succeeded");
            Json(json!({
                "status": "success",
                "message": "AI service connection successful",
                "response": reply.text,
            }))
            .into_response()
        }
        Err(err) => {
            tracing::error!(
                provider = state.provider.name(),
                error = %err,
                "Upstream connectivity probe failed"
            );
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(json!({
                    "status": "error",
                    "message": "AI service connection failed",
                    "error": err.to_string(),
                })),
            )
                .into_response()
        }
    }
}
