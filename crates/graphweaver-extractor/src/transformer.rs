//! Core graph transformer implementation

use crate::canonical::canonicalize;
use crate::config::TransformerConfig;
use crate::constraint::Constraints;
use crate::error::ExtractorError;
use crate::filter::StrictFilter;
use crate::normalizer::{normalize_reply, Candidates};
use crate::prompt::{structured_prompt, PromptBuilder, PromptTemplate};
use crate::schema::{supports_native_enums, GraphSchema};
use futures::future::join_all;
use graphweaver_domain::{Document, GraphResult, ModelBackend, ModelRequest};
use serde_json::Value;
use std::fmt;
use tracing::{debug, info};

/// How the transformer talks to its backend
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractionMode {
    /// Schema-bound requests, structured replies
    Structured,
    /// Example-bound requests, JSON in plain text replies
    FreeText,
}

impl fmt::Display for ExtractionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ExtractionMode::Structured => write!(f, "structured"),
            ExtractionMode::FreeText => write!(f, "free-text"),
        }
    }
}

/// Turns documents into typed graphs with a language model
///
/// Everything derived from the configuration (constraints, schema, prompt,
/// filter) is built once in [`GraphTransformer::new`] and only read
/// afterwards, so one transformer can serve many documents concurrently.
pub struct GraphTransformer<B>
where
    B: ModelBackend,
{
    backend: B,
    mode: ExtractionMode,
    schema: Option<GraphSchema>,
    json_schema: Option<Value>,
    prompt: PromptTemplate,
    filter: Option<StrictFilter>,
}

impl<B> GraphTransformer<B>
where
    B: ModelBackend + Sync,
    B::Error: fmt::Display,
{
    /// Create a new transformer
    ///
    /// Validates the configuration and selects the extraction mode. Backends
    /// without structured output (or `ignore_tool_usage`) fall back to
    /// free-text mode, which cannot extract properties.
    pub fn new(backend: B, config: TransformerConfig) -> Result<Self, ExtractorError> {
        let constraints = Constraints::from_config(&config)?;

        let mode = if config.ignore_tool_usage || !backend.supports_structured_output() {
            if constraints.wants_properties() {
                return Err(ExtractorError::config(
                    "node and relationship properties cannot be used with a backend that \
doesn't support structured output",
                ));
            }
            if !config.ignore_tool_usage {
                info!(
                    "Backend '{}' has no structured output; using free-text mode",
                    backend.backend_id()
                );
            }
            ExtractionMode::FreeText
        } else {
            ExtractionMode::Structured
        };

        let (schema, prompt) = match mode {
            ExtractionMode::Structured => {
                let native_enums = supports_native_enums(backend.backend_id());
                (
                    Some(GraphSchema::build(&constraints, native_enums)),
                    structured_prompt(&config.additional_instructions),
                )
            }
            ExtractionMode::FreeText => (
                None,
                PromptBuilder::new(&constraints)
                    .with_additional_instructions(&config.additional_instructions)
                    .build(),
            ),
        };
        let json_schema = schema.as_ref().map(GraphSchema::to_json_schema);

        let filter = if config.strict_mode {
            StrictFilter::new(&constraints)
        } else {
            None
        };

        info!(
            "Graph transformer ready: backend '{}', {} mode, strict filtering {}",
            backend.backend_id(),
            mode,
            if filter.is_some() { "on" } else { "off" }
        );

        Ok(Self {
            backend,
            mode,
            schema,
            json_schema,
            prompt,
            filter,
        })
    }

    /// Replace the prompt template for the selected mode
    pub fn with_prompt(mut self, prompt: PromptTemplate) -> Self {
        self.prompt = prompt;
        self
    }

    /// The selected extraction mode
    pub fn mode(&self) -> ExtractionMode {
        self.mode
    }

    /// The record shapes sent to the backend, in structured mode
    pub fn schema(&self) -> Option<&GraphSchema> {
        self.schema.as_ref()
    }

    /// The prompt template in use
    pub fn prompt(&self) -> &PromptTemplate {
        &self.prompt
    }

    /// The backend this transformer calls
    pub fn backend(&self) -> &B {
        &self.backend
    }

    fn request_for(&self, document: &Document) -> ModelRequest {
        let (system, user) = self.prompt.render(&document.text);
        ModelRequest {
            system,
            user,
            schema: self.json_schema.clone(),
        }
    }

    /// Extract the graph of a single document
    ///
    /// Only the model call can fail; a reply that cannot be read yields an
    /// empty graph.
    pub async fn process_document(&self, document: &Document) -> Result<GraphResult, ExtractorError> {
        let request = self.request_for(document);
        debug!(
            "Document {}: prompt {} chars",
            document.id,
            request.system.len() + request.user.len()
        );

        let reply = self
            .backend
            .generate(&request)
            .await
            .map_err(|e| ExtractorError::Llm(e.to_string()))?;

        let candidates = canonicalize(normalize_reply(&reply));
        let Candidates {
            nodes,
            relationships,
        } = match &self.filter {
            Some(filter) => filter.apply(candidates),
            None => candidates,
        };

        info!(
            "Document {}: {} nodes, {} relationships",
            document.id,
            nodes.len(),
            relationships.len()
        );

        Ok(GraphResult::new(nodes, relationships, document.clone()))
    }

    /// Extract graphs one document at a time, in input order
    pub async fn convert_documents(
        &self,
        documents: &[Document],
    ) -> Vec<Result<GraphResult, ExtractorError>> {
        let mut results = Vec::with_capacity(documents.len());
        for document in documents {
            results.push(self.process_document(document).await);
        }
        results
    }

    /// Extract graphs for all documents concurrently
    ///
    /// Results are in input order. A failed model call only fails its own
    /// document.
    pub async fn convert_documents_concurrent(
        &self,
        documents: &[Document],
    ) -> Vec<Result<GraphResult, ExtractorError>> {
        info!("Processing {} documents concurrently", documents.len());
        join_all(documents.iter().map(|document| self.process_document(document))).await
    }
}

impl<B: ModelBackend> fmt::Debug for GraphTransformer<B> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GraphTransformer")
            .field("backend", &self.backend.backend_id())
            .field("mode", &self.mode)
            .field("strict", &self.filter.is_some())
            .finish()
    }
}
