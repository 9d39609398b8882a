//! Anthropic Messages API provider.
//!
//! One request per call: no retries, bounded by the client timeout.

use super::{ChatProvider, FinishReason, GenerationParams, ProviderError, ProviderResponse};
use crate::config::AnthropicConfig;
use async_trait::async_trait;
use reqwest::{header::HeaderValue, Client, StatusCode};
use secrecy::ExposeSecret;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Required API version header value.
const ANTHROPIC_VERSION: &str = "2023-06-01";

pub struct AnthropicProvider {
    config: AnthropicConfig,
    client: Client,
}

impl AnthropicProvider {
    pub fn new(config: AnthropicConfig) -> Result<Self, ProviderError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| ProviderError::NotConfigured(format!("HTTP client: {}", e)))?;

        Ok(Self { config, client })
    }

    fn messages_url(&self) -> String {
        format!("{}/v1/messages", self.config.base_url.trim_end_matches('/'))
    }
}

#[async_trait]
impl ChatProvider for AnthropicProvider {
    async fn complete(
        &self,
        system: Option<&str>,
        message: &str,
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        let api_key = self.config.api_key.as_ref().ok_or_else(|| {
            ProviderError::NotConfigured("ANTHROPIC_API_KEY is not set".to_string())
        })?;
        let mut api_key = HeaderValue::from_str(api_key.expose_secret()).map_err(|_| {
            ProviderError::NotConfigured("ANTHROPIC_API_KEY is not a valid header value".to_string())
        })?;
        api_key.set_sensitive(true);

        let request = MessagesRequest {
            model: &self.config.model,
            max_tokens: params.max_tokens,
            temperature: params.temperature,
            system,
            messages: vec![Message {
                role: "user",
                content: message,
            }],
        };

        tracing::debug!(
            model = %self.config.model,
            system_len = system.map(str::len).unwrap_or(0),
            message_len = message.len(),
            "Sending request to Anthropic API"
        );

        let response = self
            .client
            .post(self.messages_url())
            .header("x-api-key", api_key)
            .header("anthropic-version", ANTHROPIC_VERSION)
            .json(&request)
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(map_status_error(status, &body));
        }

        let api_response: MessagesResponse = response
            .json()
            .await
            .map_err(|e| ProviderError::ApiError(format!("Failed to parse response: {}", e)))?;

        let text = api_response
            .content
            .iter()
            .filter(|block| block.block_type == "text")
            .filter_map(|block| block.text.as_deref())
            .collect::<String>();

        if text.is_empty() {
            return Err(ProviderError::EmptyResponse);
        }

        let finish_reason = match api_response.stop_reason.as_deref() {
            Some("end_turn") | Some("stop_sequence") => FinishReason::Complete,
            Some("max_tokens") => FinishReason::Length,
            _ => FinishReason::Other,
        };
        let usage = api_response.usage.unwrap_or_default();

        Ok(ProviderResponse {
            text,
            input_tokens: usage.input_tokens,
            output_tokens: usage.output_tokens,
            finish_reason,
        })
    }

    fn name(&self) -> &'static str {
        "anthropic"
    }
}

fn map_transport_error(err: reqwest::Error) -> ProviderError {
    if err.is_timeout() {
        ProviderError::Timeout
    } else {
        ProviderError::NetworkError(err.to_string())
    }
}

/// Classify a non-2xx upstream response.
fn map_status_error(status: StatusCode, body: &str) -> ProviderError {
    let detail = serde_json::from_str::<ErrorEnvelope>(body)
        .map(|envelope| envelope.error.message)
        .unwrap_or_else(|_| body.to_string());

    match status {
        StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => ProviderError::Authentication(detail),
        StatusCode::TOO_MANY_REQUESTS => ProviderError::RateLimited,
        _ => ProviderError::ApiError(format!("Anthropic API error {}: {}", status, detail)),
    }
}

// ============================================================================
// Anthropic API Request/Response Types
// ============================================================================

#[derive(Debug, Serialize)]
struct MessagesRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system: Option<&'a str>,
    messages: Vec<Message<'a>>,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Deserialize)]
struct MessagesResponse {
    #[serde(default)]
    content: Vec<ContentBlock>,
    #[serde(default)]
    stop_reason: Option<String>,
    #[serde(default)]
    usage: Option<Usage>,
}

#[derive(Debug, Deserialize)]
struct ContentBlock {
    #[serde(rename = "type")]
    block_type: String,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize, Default)]
struct Usage {
    #[serde(default)]
    input_tokens: u32,
    #[serde(default)]
    output_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorBody,
}

#[derive(Debug, Deserialize)]
struct ErrorBody {
    message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn auth_statuses_map_to_authentication() {
        let body = r#"{"type":"error","error":{"type":"authentication_error","message":"invalid x-api-key"}}"#;
        let err = map_status_error(StatusCode::UNAUTHORIZED, body);
        assert!(matches!(err, ProviderError::Authentication(ref m) if m == "invalid x-api-key"));

        let err = map_status_error(StatusCode::FORBIDDEN, "");
        assert!(matches!(err, ProviderError::Authentication(_)));
    }

    #[test]
    fn too_many_requests_maps_to_rate_limited() {
        let err = map_status_error(StatusCode::TOO_MANY_REQUESTS, "slow down");
        assert!(matches!(err, ProviderError::RateLimited));
    }

    #[test]
    fn other_statuses_keep_raw_body() {
        let err = map_status_error(StatusCode::SERVICE_UNAVAILABLE, "overloaded");
        match err {
            ProviderError::ApiError(msg) => {
                assert!(msg.contains("503"));
                assert!(msg.contains("overloaded"));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn request_omits_absent_optional_fields() {
        let request = MessagesRequest {
            model: "claude-test",
            max_tokens: 50,
            temperature: None,
            system: None,
            messages: vec![Message {
                role: "user",
                content: "hi",
            }],
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("temperature").is_none());
        assert!(json.get("system").is_none());
        assert_eq!(json["messages"][0]["role"], "user");
    }

    #[tokio::test]
    async fn missing_api_key_fails_without_network() {
        let provider = AnthropicProvider::new(AnthropicConfig {
            api_key: None,
            model: "claude-test".to_string(),
            base_url: "http://127.0.0.1:9".to_string(),
            timeout_secs: 1,
        })
        .unwrap();

        let err = provider
            .complete(None, "hi", &GenerationParams::probe())
            .await
            .unwrap_err();
        assert!(matches!(err, ProviderError::NotConfigured(_)));
    }
}
