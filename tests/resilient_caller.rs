//! End-to-end behavior of the retrying caller and the handler boundary,
//! exercised against an in-process transport instead of the network.

use async_trait::async_trait;
use batuto_bot::bot::handlers::run_completion;
use batuto_bot::bot::AppContext;
use batuto_bot::config::Settings;
use batuto_bot::llm::caller::{ChatTransport, ResilientCaller, RetryPolicy};
use batuto_bot::llm::{ChatRequest, LlmError};
use batuto_bot::personas::{PersonaRegistry, VISION_PERSONA};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Transport that fails the first `fail_count` attempts, then succeeds,
/// recording every payload it sees.
struct FlakyTransport {
    fail_count: usize,
    attempts: AtomicUsize,
    last_payload: Mutex<Option<Value>>,
}

impl FlakyTransport {
    fn new(fail_count: usize) -> Self {
        Self {
            fail_count,
            attempts: AtomicUsize::new(0),
            last_payload: Mutex::new(None),
        }
    }

    fn attempts(&self) -> usize {
        self.attempts.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ChatTransport for FlakyTransport {
    async fn post_chat(&self, payload: &Value) -> Result<Value, LlmError> {
        let attempt = self.attempts.fetch_add(1, Ordering::SeqCst) + 1;
        *self.last_payload.lock().expect("lock") = Some(payload.clone());
        if attempt <= self.fail_count {
            return Err(LlmError::NetworkError(format!(
                "connection reset (attempt {attempt})"
            )));
        }
        Ok(json!({"choices": [{"message": {"content": "análisis listo"}}]}))
    }
}

fn fast_policy() -> RetryPolicy {
    RetryPolicy {
        max_attempts: 3,
        min_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
    }
}

fn test_settings() -> Arc<Settings> {
    Arc::new(Settings {
        telegram_token: "test-token".to_string(),
        sambanova_api_key: "test-key".to_string(),
        api_base: "http://localhost:1".to_string(),
        owner_id: None,
        temperature: 0.8,
        max_tokens: Some(1500),
        api_timeout_secs: 60,
    })
}

fn context_with(transport: Arc<FlakyTransport>) -> AppContext {
    let registry = PersonaRegistry::new().expect("registry");
    let caller = ResilientCaller::new(transport, fast_policy());
    AppContext::new(test_settings(), registry, caller)
}

#[tokio::test]
async fn two_failures_then_success_uses_three_attempts() {
    let transport = Arc::new(FlakyTransport::new(2));
    let caller = ResilientCaller::new(transport.clone(), fast_policy());

    let text = caller.complete(&json!({})).await.expect("third attempt");
    assert_eq!(text, "análisis listo");
    assert_eq!(transport.attempts(), 3);
}

#[tokio::test]
async fn exhausted_retries_become_error_text_not_panic() {
    let transport = Arc::new(FlakyTransport::new(usize::MAX));
    let ctx = context_with(Arc::clone(&transport));

    let reply = run_completion(&ctx, None, ChatRequest::text("hola")).await;
    assert!(reply.starts_with("❌ Error en la conexión:"), "got: {reply}");
    assert!(reply.contains("connection reset"));
    assert_eq!(transport.attempts(), 3, "exactly max_attempts HTTP calls");
}

#[tokio::test]
async fn image_request_forces_vision_model_in_payload() {
    let transport = Arc::new(FlakyTransport::new(0));
    let ctx = context_with(Arc::clone(&transport));

    let picture = image::DynamicImage::ImageRgb8(image::RgbImage::new(2, 2));
    let request = ChatRequest::with_image("mira esto", picture);
    // Requested persona is ignored because of the attached image
    let reply = run_completion(&ctx, Some("poeta"), request).await;
    assert_eq!(reply, "análisis listo");

    let payload = transport
        .last_payload
        .lock()
        .expect("lock")
        .clone()
        .expect("payload sent");
    let vision_model = ctx
        .registry
        .get(VISION_PERSONA)
        .expect("vision persona")
        .model_id;
    assert_eq!(payload["model"], vision_model);

    let blocks = payload["messages"][1]["content"]
        .as_array()
        .expect("content blocks");
    assert_eq!(blocks.len(), 2);
    assert_eq!(blocks[1]["type"], "image_url");
}

#[tokio::test]
async fn malformed_body_surfaces_as_error_text() {
    struct BadShapeTransport;

    #[async_trait]
    impl ChatTransport for BadShapeTransport {
        async fn post_chat(&self, _payload: &Value) -> Result<Value, LlmError> {
            Ok(json!({"unexpected": true}))
        }
    }

    let registry = PersonaRegistry::new().expect("registry");
    let caller = ResilientCaller::new(Arc::new(BadShapeTransport), fast_policy());
    let ctx = AppContext::new(test_settings(), registry, caller);

    let reply = run_completion(&ctx, None, ChatRequest::text("hola")).await;
    assert!(reply.starts_with("❌"), "got: {reply}");
    assert!(reply.contains("malformed response"));
}
