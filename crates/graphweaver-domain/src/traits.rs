//! Trait definitions for external interactions
//!
//! These traits define the boundaries between extraction logic and
//! infrastructure. Implementations live in other crates.

use crate::{ModelReply, ModelRequest};
use std::future::Future;

/// Trait for model backend operations
///
/// Implemented by the infrastructure layer (graphweaver-llm). Network
/// transport, retries, timeouts and auth are the backend's concern.
pub trait ModelBackend {
    /// Error type for model calls
    type Error;

    /// Provider identifier (e.g. `"openai-chat"`, `"ollama"`)
    ///
    /// Used to decide whether schemas may carry native enum constraints.
    fn backend_id(&self) -> &str;

    /// Whether the backend can return schema-validated structured output
    fn supports_structured_output(&self) -> bool;

    /// Send a rendered prompt and return the reply
    ///
    /// When `request.schema` is set the backend should answer with
    /// [`ModelReply::Structured`]; otherwise with [`ModelReply::Text`].
    fn generate(
        &self,
        request: &ModelRequest,
    ) -> impl Future<Output = Result<ModelReply, Self::Error>> + Send;
}
