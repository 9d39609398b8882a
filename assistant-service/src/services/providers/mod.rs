//! Upstream language-model provider abstractions and implementations.
//!
//! Handlers talk to a [`ChatProvider`] trait object so the Anthropic client
//! can be swapped for a scripted mock in tests.

pub mod anthropic;
pub mod mock;

use async_trait::async_trait;
use thiserror::Error;

/// Error type for provider operations.
#[derive(Error, Debug)]
pub enum ProviderError {
    #[error("Provider not configured: {0}")]
    NotConfigured(String),

    #[error("Authentication failed: {0}")]
    Authentication(String),

    #[error("Rate limited")]
    RateLimited,

    #[error("API error: {0}")]
    ApiError(String),

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Upstream request timed out")]
    Timeout,

    #[error("Upstream returned no text")]
    EmptyResponse,
}

/// Result of a provider response.
#[derive(Debug, Clone)]
pub struct ProviderResponse {
    pub text: String,

    /// Input tokens consumed.
    pub input_tokens: u32,

    /// Output tokens generated.
    pub output_tokens: u32,

    pub finish_reason: FinishReason,
}

/// Reason why generation stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FinishReason {
    Complete,
    Length,
    Other,
}

/// Generation parameters for a single upstream call.
#[derive(Debug, Clone)]
pub struct GenerationParams {
    /// Sampling temperature (0.0 - 1.0).
    pub temperature: Option<f32>,

    /// Maximum output tokens.
    pub max_tokens: u32,
}

impl GenerationParams {
    /// Short, conversational replies for `/api/chat`.
    pub fn chat() -> Self {
        Self {
            temperature: Some(0.7),
            max_tokens: 300,
        }
    }

    /// Tiny budget for the connectivity probe.
    pub fn probe() -> Self {
        Self {
            temperature: None,
            max_tokens: 50,
        }
    }
}

/// Trait for single-turn chat providers (e.g., Anthropic).
#[async_trait]
pub trait ChatProvider: Send + Sync {
    /// Send `message` as the only user turn, with optional system instructions.
    async fn complete(
        &self,
        system: Option<&str>,
        message: &str,
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError>;

    /// Provider identifier used in logs.
    fn name(&self) -> &'static str;
}
