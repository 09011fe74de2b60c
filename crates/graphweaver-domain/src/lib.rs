//! Graphweaver Domain Layer
//!
//! This crate contains the data model shared by every other graphweaver crate.
//! It defines the graph types produced by extraction, the envelope a model
//! backend answers with, and the trait boundary to the model-call collaborator.
//!
//! ## Key Concepts
//!
//! - **Document**: A unit of input text with a stable identifier
//! - **NodeSpec / RelationshipSpec**: Typed entities and directed relations
//! - **GraphResult**: The graph extracted from exactly one document
//! - **ModelReply**: Either a structured envelope (`raw` + `parsed`) or plain text
//!
//! ## Architecture
//!
//! This crate follows Clean Architecture:
//! - Pure data model only, no I/O
//! - Backend implementations live in `graphweaver-llm`
//! - Extraction logic lives in `graphweaver-extractor`

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod document;
pub mod graph;
pub mod reply;
pub mod traits;

// Re-exports for convenience
pub use document::Document;
pub use graph::{GraphResult, NodeSpec, RelationshipSpec, DEFAULT_NODE_TYPE};
pub use reply::{
    FunctionCall, ModelReply, ModelRequest, NativeToolCall, ProviderMessage, ToolCall,
    ToolCallFunction,
};
pub use traits::ModelBackend;
