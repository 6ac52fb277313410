//! Resilient chat completion caller.
//!
//! The outbound HTTP call is hidden behind the [`ChatTransport`] trait so the
//! retry behavior can be tested without network access. Retries follow an
//! explicit [`RetryPolicy`] (exponential backoff, floor 4s, ceiling 10s,
//! 3 attempts total by default) and trigger on any transport or status
//! failure; the response body is only inspected after a successful attempt.

use crate::config::{
    Settings, API_BACKOFF_MAX_SECS, API_BACKOFF_MIN_SECS, API_MAX_ATTEMPTS,
};
use crate::llm::LlmError;
use async_trait::async_trait;
use reqwest::Client as HttpClient;
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tokio_retry::strategy::ExponentialBackoff;
use tokio_retry::Retry;
use tracing::{debug, warn};

/// Transport seam for the chat completions POST.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait ChatTransport: Send + Sync {
    /// Perform one HTTP attempt and return the parsed JSON response.
    async fn post_chat(&self, payload: &Value) -> Result<Value, LlmError>;
}

/// Real HTTP transport against an OpenAI-compatible endpoint.
pub struct HttpTransport {
    client: HttpClient,
    endpoint: String,
    api_key: String,
}

impl HttpTransport {
    /// Build the transport from settings.
    ///
    /// The per-request timeout bounds a hung provider response; a timeout
    /// counts as a failed attempt like any other transport error.
    #[must_use]
    pub fn new(settings: &Settings) -> Self {
        let client = HttpClient::builder()
            .timeout(settings.api_timeout())
            .build()
            .unwrap_or_else(|_| HttpClient::new());
        Self {
            client,
            endpoint: format!("{}/chat/completions", settings.api_base),
            api_key: settings.sambanova_api_key.clone(),
        }
    }
}

#[async_trait]
impl ChatTransport for HttpTransport {
    async fn post_chat(&self, payload: &Value) -> Result<Value, LlmError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .json(payload)
            .send()
            .await
            .map_err(|e| LlmError::NetworkError(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let body = crate::utils::truncate_str(body.trim(), 500);
            return Err(LlmError::ApiError(format!("API error: {status} - {body}")));
        }

        response
            .json()
            .await
            .map_err(|e| LlmError::JsonError(e.to_string()))
    }
}

/// Explicit retry policy for the outbound call.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    /// Total attempts, first try included
    pub max_attempts: usize,
    /// Backoff floor
    pub min_delay: Duration,
    /// Backoff ceiling
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: API_MAX_ATTEMPTS,
            min_delay: Duration::from_secs(API_BACKOFF_MIN_SECS),
            max_delay: Duration::from_secs(API_BACKOFF_MAX_SECS),
        }
    }
}

impl RetryPolicy {
    /// Delay sequence: exponential from the floor, capped at the ceiling,
    /// one delay per retry after the first attempt.
    fn backoff(&self) -> impl Iterator<Item = Duration> {
        #[allow(clippy::cast_possible_truncation)]
        let base_ms = self.min_delay.as_millis() as u64;
        ExponentialBackoff::from_millis(base_ms)
            .max_delay(self.max_delay)
            .take(self.max_attempts.saturating_sub(1))
    }
}

/// Chat completion caller with bounded retry.
pub struct ResilientCaller {
    transport: Arc<dyn ChatTransport>,
    policy: RetryPolicy,
}

impl ResilientCaller {
    /// Wrap a transport with a retry policy.
    #[must_use]
    pub fn new(transport: Arc<dyn ChatTransport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    /// POST the payload, retrying per policy, and extract the generated text.
    ///
    /// The retry loop only sees transport/status failures; a 2xx response
    /// with a malformed body is not retried and surfaces as [`LlmError::ApiError`].
    ///
    /// # Errors
    ///
    /// Returns the last transport error once all attempts are exhausted, or
    /// an `ApiError` when the response lacks `choices[0].message.content`.
    pub async fn complete(&self, payload: &Value) -> Result<String, LlmError> {
        let mut attempt = 0usize;
        let response = Retry::spawn(self.policy.backoff(), || {
            attempt += 1;
            debug!("chat completion attempt {attempt}");
            self.transport.post_chat(payload)
        })
        .await
        .map_err(|e| {
            warn!(
                "chat completion failed after {} attempts: {e}",
                self.policy.max_attempts
            );
            e
        })?;

        extract_content(&response)
    }
}

/// Pull the first choice's message content out of the response body.
fn extract_content(response: &Value) -> Result<String, LlmError> {
    response["choices"][0]["message"]["content"]
        .as_str()
        .map(ToString::to_string)
        .ok_or_else(|| {
            LlmError::ApiError(format!(
                "malformed response: {}",
                crate::utils::truncate_str(response.to_string(), 200)
            ))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fast_policy() -> RetryPolicy {
        RetryPolicy {
            max_attempts: 3,
            min_delay: Duration::from_millis(4),
            max_delay: Duration::from_millis(10),
        }
    }

    fn ok_response() -> Value {
        json!({"choices": [{"message": {"content": "hecho"}}]})
    }

    #[test]
    fn test_backoff_respects_floor_and_ceiling() {
        let delays: Vec<Duration> = RetryPolicy::default().backoff().collect();
        assert_eq!(delays.len(), 2, "two retries after the first attempt");
        assert_eq!(delays[0], Duration::from_secs(4));
        assert_eq!(delays[1], Duration::from_secs(10), "capped at ceiling");
    }

    #[tokio::test]
    async fn test_success_on_first_attempt() {
        let mut mock = MockChatTransport::new();
        mock.expect_post_chat()
            .times(1)
            .returning(|_| Ok(ok_response()));

        let caller = ResilientCaller::new(Arc::new(mock), fast_policy());
        let text = caller.complete(&json!({})).await.expect("completion");
        assert_eq!(text, "hecho");
    }

    #[tokio::test]
    async fn test_retries_then_succeeds() {
        let mut seq = mockall::Sequence::new();
        let mut mock = MockChatTransport::new();
        mock.expect_post_chat()
            .times(2)
            .in_sequence(&mut seq)
            .returning(|_| Err(LlmError::NetworkError("connection reset".into())));
        mock.expect_post_chat()
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Ok(ok_response()));

        let caller = ResilientCaller::new(Arc::new(mock), fast_policy());
        let text = caller.complete(&json!({})).await.expect("third attempt");
        assert_eq!(text, "hecho");
    }

    #[tokio::test]
    async fn test_exhaustion_returns_last_error() {
        let mut mock = MockChatTransport::new();
        mock.expect_post_chat()
            .times(3)
            .returning(|_| Err(LlmError::ApiError("API error: 500".into())));

        let caller = ResilientCaller::new(Arc::new(mock), fast_policy());
        let err = caller.complete(&json!({})).await.expect_err("exhausted");
        assert!(err.to_string().contains("500"));
    }

    #[tokio::test]
    async fn test_malformed_response_not_retried() {
        let mut mock = MockChatTransport::new();
        mock.expect_post_chat()
            .times(1)
            .returning(|_| Ok(json!({"choices": []})));

        let caller = ResilientCaller::new(Arc::new(mock), fast_policy());
        let err = caller.complete(&json!({})).await.expect_err("bad shape");
        assert!(matches!(err, LlmError::ApiError(_)));
        assert!(err.to_string().contains("malformed response"));
    }
}
