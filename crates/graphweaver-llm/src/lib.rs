//! Graphweaver LLM Backend Layer
//!
//! Pluggable model backends implementing the `ModelBackend` trait from
//! `graphweaver-domain`.
//!
//! # Backends
//!
//! - `MockBackend`: Deterministic scripted replies for testing
//! - `OllamaBackend`: Local Ollama chat API, with JSON-schema structured output
//!
//! # Examples
//!
//! ```
//! use graphweaver_llm::MockBackend;
//! use graphweaver_domain::{ModelBackend, ModelReply, ModelRequest};
//!
//! # async fn example() {
//! let backend = MockBackend::text("[]");
//! let request = ModelRequest { system: String::new(), user: "text".into(), schema: None };
//! let reply = backend.generate(&request).await.unwrap();
//! assert_eq!(reply, ModelReply::Text("[]".to_string()));
//! # }
//! ```

#![warn(missing_docs)]

pub mod ollama;

use graphweaver_domain::{ModelBackend, ModelReply, ModelRequest};
use serde_json::Value;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

pub use ollama::OllamaBackend;

/// Errors that can occur during LLM operations
#[derive(Error, Debug)]
pub enum LlmError {
    /// Network or API communication error
    #[error("Communication error: {0}")]
    Communication(String),

    /// Invalid response from LLM
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// Rate limit exceeded
    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Model not available
    #[error("Model not available: {0}")]
    ModelNotAvailable(String),

    /// Generic error
    #[error("LLM error: {0}")]
    Other(String),
}

/// Scripted entry: replies are chosen when the user message contains `needle`
#[derive(Debug, Clone)]
enum Script {
    Reply(String, ModelReply),
    Error(String),
}

/// Mock backend for deterministic testing
///
/// Returns pre-configured replies without making any network calls. Replies
/// can be scripted per document by matching a substring of the user message,
/// which keeps batch tests deterministic regardless of completion order.
///
/// # Examples
///
/// ```
/// use graphweaver_llm::MockBackend;
/// use graphweaver_domain::ModelBackend;
/// use serde_json::json;
///
/// let backend = MockBackend::structured(json!({"nodes": [], "relationships": []}))
///     .with_backend_id("openai-chat");
/// assert!(backend.supports_structured_output());
/// assert_eq!(backend.backend_id(), "openai-chat");
/// ```
#[derive(Debug, Clone)]
pub struct MockBackend {
    backend_id: String,
    structured_output: bool,
    default_reply: ModelReply,
    scripts: Arc<Mutex<Vec<Script>>>,
    requests: Arc<Mutex<Vec<ModelRequest>>>,
}

impl MockBackend {
    /// Create a mock that answers every request with `reply`
    pub fn new(reply: ModelReply) -> Self {
        Self {
            backend_id: "mock".to_string(),
            structured_output: true,
            default_reply: reply,
            scripts: Arc::new(Mutex::new(Vec::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Structured-output mock whose `parsed` object is `value`
    pub fn structured(value: Value) -> Self {
        Self::new(ModelReply::parsed(value))
    }

    /// Free-text mock without structured-output support
    pub fn text(reply: impl Into<String>) -> Self {
        Self::new(ModelReply::Text(reply.into())).without_structured_output()
    }

    /// Report a different provider identifier
    pub fn with_backend_id(mut self, backend_id: impl Into<String>) -> Self {
        self.backend_id = backend_id.into();
        self
    }

    /// Report no structured-output capability
    pub fn without_structured_output(mut self) -> Self {
        self.structured_output = false;
        self
    }

    /// Answer with `reply` whenever the user message contains `needle`
    pub fn add_reply(&self, needle: impl Into<String>, reply: ModelReply) {
        lock(&self.scripts).push(Script::Reply(needle.into(), reply));
    }

    /// Fail whenever the user message contains `needle`
    pub fn add_error(&self, needle: impl Into<String>) {
        lock(&self.scripts).push(Script::Error(needle.into()));
    }

    /// Get the number of times generate was called
    pub fn call_count(&self) -> usize {
        lock(&self.requests).len()
    }

    /// Requests received so far, in call order
    pub fn requests(&self) -> Vec<ModelRequest> {
        lock(&self.requests).clone()
    }

    fn respond(&self, request: &ModelRequest) -> Result<ModelReply, LlmError> {
        lock(&self.requests).push(request.clone());

        for script in lock(&self.scripts).iter() {
            match script {
                Script::Reply(needle, reply) if request.user.contains(needle.as_str()) => {
                    return Ok(reply.clone());
                }
                Script::Error(needle) if request.user.contains(needle.as_str()) => {
                    return Err(LlmError::Other("Mock error".to_string()));
                }
                _ => {}
            }
        }

        Ok(self.default_reply.clone())
    }
}

impl Default for MockBackend {
    fn default() -> Self {
        Self::text("[]")
    }
}

impl ModelBackend for MockBackend {
    type Error = LlmError;

    fn backend_id(&self) -> &str {
        &self.backend_id
    }

    fn supports_structured_output(&self) -> bool {
        self.structured_output
    }

    async fn generate(&self, request: &ModelRequest) -> Result<ModelReply, Self::Error> {
        self.respond(request)
    }
}

// A poisoned mock only means another test thread panicked; the data is still usable.
fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphweaver_domain::ProviderMessage;
    use serde_json::json;

    fn request(user: &str) -> ModelRequest {
        ModelRequest {
            system: "system".to_string(),
            user: user.to_string(),
            schema: None,
        }
    }

    #[tokio::test]
    async fn test_mock_default_reply() {
        let backend = MockBackend::text("[]");
        let reply = backend.generate(&request("anything")).await.unwrap();
        assert_eq!(reply, ModelReply::Text("[]".to_string()));
        assert!(!backend.supports_structured_output());
    }

    #[tokio::test]
    async fn test_mock_scripted_replies() {
        let backend = MockBackend::structured(json!({"nodes": []}));
        backend.add_reply(
            "Adam",
            ModelReply::unparsed(ProviderMessage::text("broken")),
        );

        let adam = backend.generate(&request("Text: Adam works")).await.unwrap();
        assert!(matches!(adam, ModelReply::Structured { parsed: None, .. }));

        let other = backend.generate(&request("Text: Eve")).await.unwrap();
        assert!(matches!(other, ModelReply::Structured { parsed: Some(_), .. }));
    }

    #[tokio::test]
    async fn test_mock_error() {
        let backend = MockBackend::default();
        backend.add_error("bad document");

        let result = backend.generate(&request("a bad document")).await;
        assert!(matches!(result, Err(LlmError::Other(_))));
    }

    #[tokio::test]
    async fn test_mock_records_requests() {
        let backend = MockBackend::default();
        backend.generate(&request("one")).await.unwrap();
        backend.generate(&request("two")).await.unwrap();

        assert_eq!(backend.call_count(), 2);
        assert_eq!(backend.requests()[1].user, "two");
    }

    #[tokio::test]
    async fn test_mock_clone_shares_state() {
        let backend1 = MockBackend::default();
        let backend2 = backend1.clone();

        backend1.generate(&request("test")).await.unwrap();

        // Both share the same request log due to Arc
        assert_eq!(backend1.call_count(), 1);
        assert_eq!(backend2.call_count(), 1);
    }
}
