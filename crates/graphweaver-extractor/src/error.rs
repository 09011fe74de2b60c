//! Error types for the Extractor

use thiserror::Error;

/// Errors that can occur during extraction
#[derive(Error, Debug)]
pub enum ExtractorError {
    /// Invalid transformer configuration, raised before any model call
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The model call itself failed
    #[error("LLM error: {0}")]
    Llm(String),
}

impl ExtractorError {
    pub(crate) fn config(message: impl Into<String>) -> Self {
        ExtractorError::Configuration(message.into())
    }
}
