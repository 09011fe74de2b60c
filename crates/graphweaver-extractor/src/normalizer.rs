//! Response normalization
//!
//! Turns a model reply into candidate nodes and relationships. Structured
//! replies are read from the validated object when there is one and salvaged
//! from the provider's raw message otherwise. Free-text replies are repaired
//! into a list of `{head, head_type, relation, tail, tail_type}` records.
//!
//! Malformed replies never fail a document: they are logged and yield an
//! empty candidate set.

use crate::canonical::{format_node_id, format_node_type};
use crate::parser::repair_json;
use graphweaver_domain::{ModelReply, NodeSpec, ProviderMessage, RelationshipSpec, DEFAULT_NODE_TYPE};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use thiserror::Error;
use tracing::{debug, warn};

/// Nodes and relationships recovered from one reply, before canonicalization
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Candidates {
    /// Candidate nodes
    pub nodes: Vec<NodeSpec>,
    /// Candidate relationships
    pub relationships: Vec<RelationshipSpec>,
}

/// Why a reply shape could not be turned into candidates
#[derive(Debug, Error)]
enum MalformedResponse {
    #[error("reply carries no payload")]
    Empty,

    #[error("payload is not valid JSON: {0}")]
    InvalidJson(String),

    #[error("payload is not a JSON object")]
    NotAnObject,

    #[error("payload has no `{0}` list")]
    MissingList(&'static str),
}

/// The places a structured reply may carry its graph
#[derive(Debug, Clone, Copy, PartialEq)]
enum ReplyShape<'a> {
    /// Schema-validated object
    ParsedObject(&'a Value),
    /// OpenAI-style tool call, JSON-encoded arguments
    ToolCallArgs(&'a str),
    /// Legacy function call, JSON-encoded arguments
    FunctionCallArgs(&'a str),
    /// Native tool call with decoded arguments
    NativeToolCallArgs(&'a Value),
    /// Message text
    PlainText(&'a str),
}

impl ReplyShape<'_> {
    fn name(&self) -> &'static str {
        match self {
            ReplyShape::ParsedObject(_) => "parsed object",
            ReplyShape::ToolCallArgs(_) => "tool call arguments",
            ReplyShape::FunctionCallArgs(_) => "function call arguments",
            ReplyShape::NativeToolCallArgs(_) => "native tool call arguments",
            ReplyShape::PlainText(_) => "message text",
        }
    }

    fn extract(self) -> Result<Candidates, MalformedResponse> {
        match self {
            ReplyShape::ParsedObject(value) => from_validated(value),
            ReplyShape::ToolCallArgs(args) | ReplyShape::FunctionCallArgs(args) => {
                let payload: Value = serde_json::from_str(args)
                    .map_err(|e| MalformedResponse::InvalidJson(e.to_string()))?;
                salvage(&payload)
            }
            ReplyShape::NativeToolCallArgs(args) => salvage(&decode_nested_lists(args)?),
            ReplyShape::PlainText(text) => {
                let payload = repair_json(text).ok_or(MalformedResponse::Empty)?;
                salvage(&payload)
            }
        }
    }
}

/// Candidate shapes of a structured reply, in the order they are tried
fn recognize<'a>(raw: &'a ProviderMessage, parsed: Option<&'a Value>) -> Vec<ReplyShape<'a>> {
    let mut shapes = Vec::new();
    if let Some(value) = parsed {
        shapes.push(ReplyShape::ParsedObject(value));
    }
    if let Some(args) = raw.tool_call_arguments() {
        shapes.push(ReplyShape::ToolCallArgs(args));
    }
    if let Some(args) = raw.function_call_arguments() {
        shapes.push(ReplyShape::FunctionCallArgs(args));
    }
    if let Some(args) = raw.native_tool_call_args() {
        shapes.push(ReplyShape::NativeToolCallArgs(args));
    }
    if !raw.content.trim().is_empty() {
        shapes.push(ReplyShape::PlainText(&raw.content));
    }
    shapes
}

/// Normalize any reply
///
/// Dispatches on the reply variant: structured envelopes go through the
/// recognizer chain, plain text through the free-text path.
pub fn normalize_reply(reply: &ModelReply) -> Candidates {
    match reply {
        ModelReply::Structured { raw, parsed } => normalize_structured(raw, parsed.as_ref()),
        ModelReply::Text(text) => normalize_text(text),
    }
}

/// Normalize a structured-output reply
///
/// The first shape that yields a graph wins.
pub fn normalize_structured(raw: &ProviderMessage, parsed: Option<&Value>) -> Candidates {
    let shapes = recognize(raw, parsed);
    if shapes.is_empty() {
        warn!("Structured reply is empty; returning an empty graph");
        return Candidates::default();
    }

    for shape in shapes {
        match shape.extract() {
            Ok(candidates) => {
                debug!(
                    "Read {} nodes and {} relationships from {}",
                    candidates.nodes.len(),
                    candidates.relationships.len(),
                    shape.name()
                );
                return candidates;
            }
            Err(e) => debug!("Could not read graph from {}: {}", shape.name(), e),
        }
    }

    warn!("Could not salvage a graph from the structured reply; returning an empty graph");
    Candidates::default()
}

#[derive(Debug, Deserialize)]
struct SchemaGraph {
    #[serde(default)]
    nodes: Option<Vec<SchemaNode>>,
    #[serde(default)]
    relationships: Option<Vec<SchemaRelationship>>,
}

#[derive(Debug, Deserialize)]
struct SchemaNode {
    id: String,
    #[serde(rename = "type", default)]
    node_type: Option<String>,
    #[serde(default)]
    properties: Option<Vec<SchemaProperty>>,
}

#[derive(Debug, Deserialize)]
struct SchemaRelationship {
    source_node_id: String,
    #[serde(default)]
    source_node_type: Option<String>,
    target_node_id: String,
    #[serde(default)]
    target_node_type: Option<String>,
    #[serde(rename = "type")]
    rel_type: String,
    #[serde(default)]
    properties: Option<Vec<SchemaProperty>>,
}

#[derive(Debug, Deserialize)]
struct SchemaProperty {
    key: String,
    #[serde(default)]
    value: Value,
}

fn schema_properties(properties: Option<Vec<SchemaProperty>>) -> BTreeMap<String, String> {
    properties
        .unwrap_or_default()
        .into_iter()
        .map(|p| (p.key, flatten(&p.value)))
        .collect()
}

/// Map a validated object onto candidates
fn from_validated(value: &Value) -> Result<Candidates, MalformedResponse> {
    let graph = SchemaGraph::deserialize(value)
        .map_err(|e| MalformedResponse::InvalidJson(e.to_string()))?;

    let nodes = graph
        .nodes
        .unwrap_or_default()
        .into_iter()
        .filter_map(|node| {
            NodeSpec::new(node.id, node.node_type.unwrap_or_default())
                .map(|n| n.with_properties(schema_properties(node.properties)))
        })
        .collect();

    let relationships = graph
        .relationships
        .unwrap_or_default()
        .into_iter()
        .filter_map(|rel| {
            let source =
                NodeSpec::new(rel.source_node_id, rel.source_node_type.unwrap_or_default())?;
            let target =
                NodeSpec::new(rel.target_node_id, rel.target_node_type.unwrap_or_default())?;
            RelationshipSpec::new(source, target, rel.rel_type)
                .map(|r| r.with_properties(schema_properties(rel.properties)))
        })
        .collect();

    Ok(Candidates {
        nodes,
        relationships,
    })
}

/// Decode `nodes`/`relationships` that a native tool call sent as JSON strings
fn decode_nested_lists(args: &Value) -> Result<Value, MalformedResponse> {
    let mut payload = args.as_object().cloned().ok_or(MalformedResponse::NotAnObject)?;
    for key in ["nodes", "relationships"] {
        if let Some(Value::String(encoded)) = payload.get(key) {
            let decoded: Value = serde_json::from_str(encoded)
                .map_err(|e| MalformedResponse::InvalidJson(e.to_string()))?;
            payload.insert(key.to_string(), decoded);
        }
    }
    Ok(Value::Object(payload))
}

/// Identifier text: strings as-is, numbers stringified, anything else rejected
fn id_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn label_text(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        _ => None,
    }
}

fn salvage_properties(record: &Map<String, Value>) -> BTreeMap<String, String> {
    let Some(Value::Array(properties)) = record.get("properties") else {
        return BTreeMap::new();
    };
    properties
        .iter()
        .filter_map(|p| {
            let key = p.get("key")?.as_str()?;
            Some((key.to_string(), flatten(p.get("value").unwrap_or(&Value::Null))))
        })
        .collect()
}

/// Clean an unvalidated `{nodes, relationships}` payload
///
/// Endpoint types missing from a relationship are copied from the first
/// node with the same id, falling back to the default label.
fn salvage(payload: &Value) -> Result<Candidates, MalformedResponse> {
    let object = payload.as_object().ok_or(MalformedResponse::NotAnObject)?;
    let raw_nodes = object
        .get("nodes")
        .and_then(Value::as_array)
        .ok_or(MalformedResponse::MissingList("nodes"))?;
    let raw_relationships = object
        .get("relationships")
        .and_then(Value::as_array)
        .ok_or(MalformedResponse::MissingList("relationships"))?;

    let nodes = raw_nodes
        .iter()
        .filter_map(Value::as_object)
        .filter_map(|node| {
            let id = id_text(node.get("id"))?;
            let node_type = label_text(node.get("type")).unwrap_or_default();
            NodeSpec::new(id, node_type).map(|n| n.with_properties(salvage_properties(node)))
        })
        .collect();

    let type_of = |id: &str| -> String {
        raw_nodes
            .iter()
            .find(|node| id_text(node.get("id")).as_deref() == Some(id))
            .and_then(|node| label_text(node.get("type")))
            .unwrap_or_else(|| DEFAULT_NODE_TYPE.to_string())
    };

    let mut relationships = Vec::new();
    for rel in raw_relationships.iter().filter_map(Value::as_object) {
        let (Some(source_id), Some(target_id), Some(rel_type)) = (
            id_text(rel.get("source_node_id")),
            id_text(rel.get("target_node_id")),
            label_text(rel.get("type")),
        ) else {
            warn!("Dropping relationship without source, target or type");
            continue;
        };

        let source_type =
            label_text(rel.get("source_node_type")).unwrap_or_else(|| type_of(&source_id));
        let target_type =
            label_text(rel.get("target_node_type")).unwrap_or_else(|| type_of(&target_id));

        let relationship = NodeSpec::new(source_id, source_type)
            .zip(NodeSpec::new(target_id, target_type))
            .and_then(|(source, target)| RelationshipSpec::new(source, target, rel_type));
        if let Some(relationship) = relationship {
            relationships.push(relationship.with_properties(salvage_properties(rel)));
        }
    }

    Ok(Candidates {
        nodes,
        relationships,
    })
}

/// JSON truthiness: absent, null, false, zero and empty values are falsy
fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null) => false,
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|f| f != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(a)) => !a.is_empty(),
        Some(Value::Object(o)) => !o.is_empty(),
    }
}

/// Flatten a value into plain text
///
/// Lists are joined with `", "`; objects (also inside lists) become JSON text.
fn flatten(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Array(items) => items
            .iter()
            .map(|item| match item {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            })
            .collect::<Vec<_>>()
            .join(", "),
        other => other.to_string(),
    }
}

/// Normalize a free-text reply
///
/// Nodes are deduplicated by their canonical `(id, type)` in first-encounter
/// order, so `adam`/`person` and `Adam`/`Person` count once; relationships
/// keep encounter order and are not deduplicated.
pub fn normalize_text(text: &str) -> Candidates {
    let records = match repair_json(text) {
        Some(Value::Array(records)) => records,
        Some(record @ Value::Object(_)) => vec![record],
        Some(other) => {
            warn!("Free-text reply is JSON but not a list of records: {}", other);
            return Candidates::default();
        }
        None => {
            warn!("Free-text reply is not parseable JSON; returning an empty graph");
            return Candidates::default();
        }
    };

    let mut nodes = Vec::new();
    let mut seen = HashSet::new();
    let mut relationships = Vec::new();

    for record in records.iter().filter_map(Value::as_object) {
        let (head, relation, tail) = (record.get("head"), record.get("relation"), record.get("tail"));
        if !is_truthy(head) || !is_truthy(relation) || !is_truthy(tail) {
            debug!("Dropping record without head, relation or tail");
            continue;
        }

        let endpoint = |id: Option<&Value>, kind: &str| {
            let node_type = record
                .get(kind)
                .filter(|v| !v.is_null())
                .map(flatten)
                .unwrap_or_else(|| DEFAULT_NODE_TYPE.to_string());
            NodeSpec::new(flatten(id.unwrap_or(&Value::Null)), node_type)
        };

        let (Some(source), Some(target)) = (endpoint(head, "head_type"), endpoint(tail, "tail_type"))
        else {
            continue;
        };

        for node in [&source, &target] {
            if seen.insert((format_node_id(&node.id), format_node_type(&node.node_type))) {
                nodes.push(node.clone());
            }
        }

        if let Some(relationship) =
            RelationshipSpec::new(source, target, flatten(relation.unwrap_or(&Value::Null)))
        {
            relationships.push(relationship);
        }
    }

    Candidates {
        nodes,
        relationships,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use graphweaver_domain::{FunctionCall, NativeToolCall, ToolCall, ToolCallFunction};
    use serde_json::json;

    fn adam_graph() -> Value {
        json!({
            "nodes": [{"id": "Adam", "type": "Person"}],
            "relationships": [{
                "source_node_id": "Adam",
                "source_node_type": "Person",
                "target_node_id": "Microsoft",
                "target_node_type": "Company",
                "type": "works for"
            }]
        })
    }

    fn tool_call(arguments: &str) -> ToolCall {
        ToolCall {
            function: ToolCallFunction {
                name: "DynamicGraph".to_string(),
                arguments: arguments.to_string(),
            },
        }
    }

    #[test]
    fn test_parsed_object() {
        let candidates = normalize_reply(&ModelReply::parsed(adam_graph()));
        assert_eq!(candidates.nodes, vec![NodeSpec::new("Adam", "Person").unwrap()]);
        assert_eq!(candidates.relationships.len(), 1);
        assert_eq!(candidates.relationships[0].rel_type, "works for");
        assert_eq!(candidates.relationships[0].target.node_type, "Company");
    }

    #[test]
    fn test_parsed_object_drops_incomplete_records() {
        let value = json!({
            "nodes": [{"id": "", "type": "Person"}, {"id": "Eve", "type": ""}],
            "relationships": [{
                "source_node_id": "Eve",
                "source_node_type": "Person",
                "target_node_id": "Adam",
                "target_node_type": "Person",
                "type": ""
            }]
        });
        let candidates = normalize_reply(&ModelReply::parsed(value));
        assert_eq!(candidates.nodes, vec![NodeSpec::new("Eve", "Node").unwrap()]);
        assert!(candidates.relationships.is_empty());
    }

    #[test]
    fn test_parsed_object_with_null_types() {
        let value = json!({
            "nodes": [{"id": "Adam", "type": null}],
            "relationships": [{
                "source_node_id": "Adam",
                "source_node_type": null,
                "target_node_id": "Microsoft",
                "target_node_type": "Company",
                "type": "WORKS_FOR"
            }]
        });
        let candidates = normalize_reply(&ModelReply::parsed(value));
        assert_eq!(candidates.nodes, vec![NodeSpec::new("Adam", DEFAULT_NODE_TYPE).unwrap()]);
        assert_eq!(candidates.relationships[0].source.node_type, DEFAULT_NODE_TYPE);
        assert_eq!(candidates.relationships[0].target.node_type, "Company");
    }

    #[test]
    fn test_parsed_object_with_properties() {
        let value = json!({
            "nodes": [{
                "id": "Adam",
                "type": "Person",
                "properties": [{"key": "start date", "value": "2009-01-01"}, {"key": "age", "value": 40}]
            }],
            "relationships": null
        });
        let candidates = normalize_reply(&ModelReply::parsed(value));
        let props = &candidates.nodes[0].properties;
        assert_eq!(props.get("start date").map(String::as_str), Some("2009-01-01"));
        assert_eq!(props.get("age").map(String::as_str), Some("40"));
    }

    #[test]
    fn test_tool_call_salvage_backfills_types() {
        let args = json!({
            "nodes": [{"id": "Adam", "type": "Person"}, {"id": "Microsoft", "type": "Company"}],
            "relationships": [{"source_node_id": "Adam", "target_node_id": "Microsoft", "type": "WORKS_FOR"}]
        });
        let raw = ProviderMessage {
            tool_calls: vec![tool_call(&args.to_string())],
            ..ProviderMessage::default()
        };
        let candidates = normalize_reply(&ModelReply::unparsed(raw));

        let rel = &candidates.relationships[0];
        assert_eq!(rel.source.node_type, "Person");
        assert_eq!(rel.target.node_type, "Company");
    }

    #[test]
    fn test_salvage_defaults_unknown_endpoint_type() {
        let args = json!({
            "nodes": [],
            "relationships": [{"source_node_id": "Adam", "target_node_id": 42, "type": "OWNS"}]
        });
        let raw = ProviderMessage {
            function_call: Some(FunctionCall {
                name: "DynamicGraph".to_string(),
                arguments: args.to_string(),
            }),
            ..ProviderMessage::default()
        };
        let candidates = normalize_reply(&ModelReply::unparsed(raw));

        let rel = &candidates.relationships[0];
        assert_eq!(rel.source.node_type, DEFAULT_NODE_TYPE);
        assert_eq!(rel.target.id, "42");
    }

    #[test]
    fn test_salvage_order_prefers_tool_calls() {
        let raw = ProviderMessage {
            tool_calls: vec![tool_call(r#"{"nodes": [{"id": "A", "type": "T"}], "relationships": []}"#)],
            function_call: Some(FunctionCall {
                name: "DynamicGraph".to_string(),
                arguments: r#"{"nodes": [{"id": "B", "type": "T"}], "relationships": []}"#.to_string(),
            }),
            ..ProviderMessage::default()
        };
        let candidates = normalize_reply(&ModelReply::unparsed(raw));
        assert_eq!(candidates.nodes[0].id, "A");
    }

    #[test]
    fn test_salvage_falls_through_broken_tool_call() {
        let raw = ProviderMessage {
            tool_calls: vec![tool_call("{not json")],
            function_call: Some(FunctionCall {
                name: "DynamicGraph".to_string(),
                arguments: r#"{"nodes": [{"id": "B", "type": "T"}], "relationships": []}"#.to_string(),
            }),
            ..ProviderMessage::default()
        };
        let candidates = normalize_reply(&ModelReply::unparsed(raw));
        assert_eq!(candidates.nodes[0].id, "B");
    }

    #[test]
    fn test_native_tool_call_with_encoded_lists() {
        let raw = ProviderMessage {
            native_tool_calls: vec![NativeToolCall {
                name: "DynamicGraph".to_string(),
                args: json!({
                    "nodes": r#"[{"id": "Microsoft", "type": "Company"}]"#,
                    "relationships": r#"[{"source_node_id": "Adam", "source_node_type": "Person", "target_node_id": "Microsoft", "type": "WORKS_FOR"}]"#
                }),
            }],
            ..ProviderMessage::default()
        };
        let candidates = normalize_reply(&ModelReply::unparsed(raw));

        assert_eq!(candidates.nodes.len(), 1);
        assert_eq!(candidates.relationships[0].target.node_type, "Company");
    }

    #[test]
    fn test_salvage_without_lists_is_empty() {
        let raw = ProviderMessage {
            tool_calls: vec![tool_call(r#"{"entities": []}"#)],
            ..ProviderMessage::default()
        };
        assert_eq!(normalize_reply(&ModelReply::unparsed(raw)), Candidates::default());
        assert_eq!(
            normalize_reply(&ModelReply::unparsed(ProviderMessage::default())),
            Candidates::default()
        );
    }

    #[test]
    fn test_salvage_drops_non_scalar_ids() {
        let payload = json!({
            "nodes": [{"id": ["A"], "type": "T"}, {"id": 7, "type": "T"}],
            "relationships": []
        });
        let candidates = salvage(&payload).unwrap();
        assert_eq!(candidates.nodes, vec![NodeSpec::new("7", "T").unwrap()]);
    }

    #[test]
    fn test_recognizer_order() {
        let parsed = json!({});
        let raw = ProviderMessage {
            content: "text".to_string(),
            tool_calls: vec![tool_call("{}")],
            ..ProviderMessage::default()
        };
        let shapes = recognize(&raw, Some(&parsed));
        assert_eq!(
            shapes,
            vec![
                ReplyShape::ParsedObject(&parsed),
                ReplyShape::ToolCallArgs("{}"),
                ReplyShape::PlainText("text"),
            ]
        );
    }

    #[test]
    fn test_free_text_records() {
        let text = r#"```json
[
  {"head": "Adam", "head_type": "Person", "relation": "WORKS_FOR", "tail": "Microsoft", "tail_type": "Company"},
  {"head": "Adam", "head_type": "Person", "relation": "HAS_AWARD", "tail": "Best Talent", "tail_type": "Award"},
  {"head": "Adam", "relation": "", "tail": "Eve"}
]
```"#;
        let candidates = normalize_text(text);

        let ids: Vec<&str> = candidates.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["Adam", "Microsoft", "Best Talent"]);
        assert_eq!(candidates.relationships.len(), 2);
        assert_eq!(candidates.relationships[1].rel_type, "HAS_AWARD");
    }

    #[test]
    fn test_free_text_single_object_and_defaults() {
        let candidates = normalize_text(r#"{"head": "Adam", "relation": "KNOWS", "tail": "Eve"}"#);
        assert_eq!(candidates.nodes.len(), 2);
        assert_eq!(candidates.nodes[0].node_type, DEFAULT_NODE_TYPE);
    }

    #[test]
    fn test_free_text_flattens_nested_values() {
        let text = r#"[{"head": ["Adam", "Eve"], "head_type": "Person", "relation": "KNOW", "tail": {"name": "Cain"}, "tail_type": ["Person", {"k": 1}]}]"#;
        let candidates = normalize_text(text);

        let rel = &candidates.relationships[0];
        assert_eq!(rel.source.id, "Adam, Eve");
        assert_eq!(rel.target.id, r#"{"name":"Cain"}"#);
        assert_eq!(rel.target.node_type, r#"Person, {"k":1}"#);
    }

    #[test]
    fn test_free_text_dedups_nodes_across_casing() {
        let text = r#"[
  {"head": "adam", "head_type": "person", "relation": "KNOWS", "tail": "Eve", "tail_type": "Person"},
  {"head": "Adam", "head_type": "Person", "relation": "LIKES", "tail": "eve", "tail_type": "PERSON"}
]"#;
        let candidates = normalize_text(text);

        let ids: Vec<&str> = candidates.nodes.iter().map(|n| n.id.as_str()).collect();
        assert_eq!(ids, vec!["adam", "Eve"]);
        assert_eq!(candidates.relationships.len(), 2);
    }

    #[test]
    fn test_free_text_keeps_duplicate_relationships() {
        let record = r#"{"head": "A", "relation": "R", "tail": "B"}"#;
        let candidates = normalize_text(&format!("[{0}, {0}]", record));
        assert_eq!(candidates.nodes.len(), 2);
        assert_eq!(candidates.relationships.len(), 2);
    }

    #[test]
    fn test_free_text_truncated_is_empty() {
        let text = r#"[{"head": "Adam", "head_type": "Person", "relation": "WORKS_FOR", "tail": "Micro"#;
        assert_eq!(normalize_text(text), Candidates::default());
    }

    #[test]
    fn test_free_text_non_record_json_is_empty() {
        assert_eq!(normalize_text("42"), Candidates::default());
        assert_eq!(normalize_text("[1, \"two\"]"), Candidates::default());
    }
}
