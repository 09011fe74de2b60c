//! Graph model produced by extraction

use crate::Document;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Label given to nodes whose type is absent or empty
pub const DEFAULT_NODE_TYPE: &str = "Node";

/// An extracted entity
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct NodeSpec {
    /// Human-readable identifier, never empty
    pub id: String,

    /// Type label
    #[serde(rename = "type")]
    pub node_type: String,

    /// Extracted key/value properties
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

impl NodeSpec {
    /// Create a node, or `None` when `id` is empty
    ///
    /// An empty type falls back to [`DEFAULT_NODE_TYPE`].
    ///
    /// # Examples
    ///
    /// ```
    /// use graphweaver_domain::NodeSpec;
    ///
    /// let node = NodeSpec::new("Adam", "").unwrap();
    /// assert_eq!(node.node_type, "Node");
    /// assert!(NodeSpec::new("", "Person").is_none());
    /// ```
    pub fn new(id: impl Into<String>, node_type: impl Into<String>) -> Option<Self> {
        let id = id.into();
        if id.is_empty() {
            return None;
        }
        let node_type = node_type.into();
        let node_type = if node_type.is_empty() {
            DEFAULT_NODE_TYPE.to_string()
        } else {
            node_type
        };
        Some(Self {
            id,
            node_type,
            properties: BTreeMap::new(),
        })
    }

    /// Replace the property map
    pub fn with_properties(mut self, properties: BTreeMap<String, String>) -> Self {
        self.properties = properties;
        self
    }
}

/// A directed, typed relation between two nodes
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RelationshipSpec {
    /// Source endpoint
    pub source: NodeSpec,

    /// Target endpoint
    pub target: NodeSpec,

    /// Relation label
    #[serde(rename = "type")]
    pub rel_type: String,

    /// Extracted key/value properties
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub properties: BTreeMap<String, String>,
}

impl RelationshipSpec {
    /// Create a relationship, or `None` when the relation label is empty
    ///
    /// Endpoints are already guaranteed non-empty by [`NodeSpec::new`].
    pub fn new(source: NodeSpec, target: NodeSpec, rel_type: impl Into<String>) -> Option<Self> {
        let rel_type = rel_type.into();
        if rel_type.is_empty() {
            return None;
        }
        Some(Self {
            source,
            target,
            rel_type,
            properties: BTreeMap::new(),
        })
    }

    /// Replace the property map
    pub fn with_properties(mut self, properties: BTreeMap<String, String>) -> Self {
        self.properties = properties;
        self
    }
}

/// The graph extracted from a single document
///
/// Immutable once built; the fields are only reachable through accessors.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GraphResult {
    nodes: Vec<NodeSpec>,
    relationships: Vec<RelationshipSpec>,
    source: Document,
}

impl GraphResult {
    /// Assemble a result for `source`
    pub fn new(nodes: Vec<NodeSpec>, relationships: Vec<RelationshipSpec>, source: Document) -> Self {
        Self {
            nodes,
            relationships,
            source,
        }
    }

    /// An empty graph for `source`
    pub fn empty(source: Document) -> Self {
        Self::new(Vec::new(), Vec::new(), source)
    }

    /// Extracted nodes
    pub fn nodes(&self) -> &[NodeSpec] {
        &self.nodes
    }

    /// Extracted relationships
    pub fn relationships(&self) -> &[RelationshipSpec] {
        &self.relationships
    }

    /// Document this graph came from
    pub fn source(&self) -> &Document {
        &self.source
    }

    /// True when neither nodes nor relationships were extracted
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty() && self.relationships.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_node_requires_id() {
        assert!(NodeSpec::new("", "Person").is_none());
        assert!(NodeSpec::new("Adam", "Person").is_some());
    }

    #[test]
    fn test_node_type_defaults() {
        let node = NodeSpec::new("Adam", "").unwrap();
        assert_eq!(node.node_type, DEFAULT_NODE_TYPE);
    }

    #[test]
    fn test_relationship_requires_type() {
        let a = NodeSpec::new("Adam", "Person").unwrap();
        let b = NodeSpec::new("Microsoft", "Company").unwrap();
        assert!(RelationshipSpec::new(a.clone(), b.clone(), "").is_none());
        assert!(RelationshipSpec::new(a, b, "WORKS_FOR").is_some());
    }

    #[test]
    fn test_graph_result_serializes_type_fields() {
        let a = NodeSpec::new("Adam", "Person").unwrap();
        let b = NodeSpec::new("Microsoft", "Company").unwrap();
        let rel = RelationshipSpec::new(a.clone(), b.clone(), "WORKS_FOR").unwrap();
        let graph = GraphResult::new(vec![a, b], vec![rel], Document::with_id("d1", "text"));

        let json = serde_json::to_value(&graph).unwrap();
        assert_eq!(json["nodes"][0]["type"], "Person");
        assert_eq!(json["relationships"][0]["type"], "WORKS_FOR");
        assert!(json["nodes"][0].get("properties").is_none());
    }

    #[test]
    fn test_empty_graph() {
        let graph = GraphResult::empty(Document::with_id("d1", "text"));
        assert!(graph.is_empty());
        assert_eq!(graph.source().id, "d1");
    }
}
