//! Mock provider implementation for testing.

use super::{ChatProvider, FinishReason, GenerationParams, ProviderError, ProviderResponse};
use async_trait::async_trait;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

/// What the mock answers with on every call.
#[derive(Debug, Clone)]
pub enum MockOutcome {
    Reply(String),
    AuthenticationError,
    RateLimited,
    NetworkError,
}

/// A call observed by the mock.
#[derive(Debug, Clone)]
pub struct RecordedCall {
    pub system: Option<String>,
    pub message: String,
    pub max_tokens: u32,
    pub temperature: Option<f32>,
}

/// Scripted chat provider that counts and records invocations.
pub struct MockChatProvider {
    outcome: MockOutcome,
    calls: AtomicUsize,
    last_call: Mutex<Option<RecordedCall>>,
}

impl MockChatProvider {
    pub fn new(outcome: MockOutcome) -> Self {
        Self {
            outcome,
            calls: AtomicUsize::new(0),
            last_call: Mutex::new(None),
        }
    }

    pub fn replying(text: impl Into<String>) -> Self {
        Self::new(MockOutcome::Reply(text.into()))
    }

    /// Number of upstream calls made so far.
    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn last_call(&self) -> Option<RecordedCall> {
        self.last_call
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .clone()
    }
}

#[async_trait]
impl ChatProvider for MockChatProvider {
    async fn complete(
        &self,
        system: Option<&str>,
        message: &str,
        params: &GenerationParams,
    ) -> Result<ProviderResponse, ProviderError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        *self
            .last_call
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner()) = Some(RecordedCall {
            system: system.map(str::to_string),
            message: message.to_string(),
            max_tokens: params.max_tokens,
            temperature: params.temperature,
        });

        match &self.outcome {
            MockOutcome::Reply(text) => Ok(ProviderResponse {
                text: text.clone(),
                input_tokens: (message.len() / 4) as u32,
                output_tokens: (text.len() / 4) as u32,
                finish_reason: FinishReason::Complete,
            }),
            MockOutcome::AuthenticationError => Err(ProviderError::Authentication(
                "invalid x-api-key".to_string(),
            )),
            MockOutcome::RateLimited => Err(ProviderError::RateLimited),
            MockOutcome::NetworkError => Err(ProviderError::NetworkError(
                "connection refused".to_string(),
            )),
        }
    }

    fn name(&self) -> &'static str {
        "mock"
    }
}
