//! Graphweaver Extractor
//!
//! Converts unstructured text into typed graphs using a language model.
//!
//! # Overview
//!
//! Each document is rendered into a prompt, sent to a [`ModelBackend`], and
//! the reply is normalized into nodes and relationships that respect the
//! caller's allow-lists. Backends with structured output get a JSON schema
//! built from the allow-lists; other backends get worked examples and are
//! expected to answer with JSON text.
//!
//! # Architecture
//!
//! ```text
//! Document → Prompt → ModelBackend → Normalizer → Canonicalizer → Strict filter → GraphResult
//! ```
//!
//! # Key Features
//!
//! - **Constraint validation**: Allow-lists are checked once, before any model call
//! - **Dynamic schema**: Node and relationship record shapes built per configuration
//! - **Reply salvage**: Tool-call, function-call and native tool-call payloads are recovered
//! - **Lenient JSON**: Fenced, trailing-comma and single-quoted JSON is repaired
//! - **Batch processing**: Sequential or concurrent, always in input order
//!
//! # Example Usage
//!
//! ```
//! use graphweaver_extractor::{GraphTransformer, TransformerConfig};
//! use graphweaver_domain::Document;
//! use graphweaver_llm::MockBackend;
//! use serde_json::json;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let backend = MockBackend::structured(json!({
//!     "nodes": [{"id": "Adam", "type": "Person"}],
//!     "relationships": []
//! }));
//! let config = TransformerConfig::default().with_allowed_nodes(["Person", "Company"]);
//! let transformer = GraphTransformer::new(backend, config)?;
//!
//! let graph = transformer
//!     .process_document(&Document::new("Adam works for Microsoft."))
//!     .await?;
//!
//! println!("Nodes: {}", graph.nodes().len());
//! # Ok(())
//! # }
//! ```
//!
//! [`ModelBackend`]: graphweaver_domain::ModelBackend

#![warn(missing_docs)]

mod error;
mod config;
mod constraint;
mod schema;
mod prompt;
pub mod parser;
mod normalizer;
pub mod canonical;
mod filter;
mod transformer;


pub use error::ExtractorError;
pub use config::{PropertyMode, PropertySetting, RelationshipRule, TransformerConfig};
pub use constraint::{
    Constraints, PropertyConstraint, RelationshipTriple, TypeConstraint, RESERVED_PROPERTY_KEY,
};
pub use schema::{
    supports_native_enums, FieldDescriptor, FieldKind, GraphSchema, Guidance, RecordDescriptor,
    NATIVE_ENUM_BACKENDS,
};
pub use prompt::{
    examples_json, format_instructions, structured_prompt, PromptBuilder, PromptTemplate,
    WorkedExample, INPUT_PLACEHOLDER, WORKED_EXAMPLES,
};
pub use normalizer::{normalize_reply, normalize_structured, normalize_text, Candidates};
pub use filter::StrictFilter;
pub use transformer::{ExtractionMode, GraphTransformer};
