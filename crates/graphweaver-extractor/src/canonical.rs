//! Canonical forms for identifiers, labels and property keys
//!
//! Every function here is total and idempotent. Case mappings that would
//! expand a character into several (such as `ß` to `SS`) leave that
//! character as it is, so a second pass never sees a different string.

use crate::normalizer::Candidates;
use graphweaver_domain::{NodeSpec, RelationshipSpec, DEFAULT_NODE_TYPE};
use std::collections::BTreeMap;

fn upper(c: char) -> char {
    let mut mapped = c.to_uppercase();
    match (mapped.next(), mapped.next()) {
        (Some(u), None) => u,
        _ => c,
    }
}

fn lower(c: char) -> char {
    let mut mapped = c.to_lowercase();
    match (mapped.next(), mapped.next()) {
        (Some(l), None) => l,
        _ => c,
    }
}

/// First character upper case, the rest lower case
fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => std::iter::once(upper(first)).chain(chars.map(lower)).collect(),
        None => String::new(),
    }
}

/// Lower the leading token of a property key
///
/// An all-caps token (`AGE`) is lowered entirely; any other token only has
/// an upper-case first character lowered, so `startDate` survives.
fn lower_head(word: &str) -> String {
    let mut chars = word.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    if first.is_uppercase() && !word.chars().any(char::is_lowercase) {
        word.chars().map(lower).collect()
    } else {
        std::iter::once(lower(first)).chain(chars).collect()
    }
}

/// Property key to lower camel case
///
/// # Examples
///
/// ```
/// use graphweaver_extractor::canonical::format_property_key;
///
/// assert_eq!(format_property_key("start date"), "startDate");
/// assert_eq!(format_property_key("AGE"), "age");
/// assert_eq!(format_property_key("startDate"), "startDate");
/// ```
pub fn format_property_key(key: &str) -> String {
    let mut words = key.split_whitespace();
    let Some(first) = words.next() else {
        return key.to_string();
    };
    let mut out = lower_head(first);
    for word in words {
        out.push_str(&capitalize(word));
    }
    out
}

/// Node identifier to title case
///
/// Each run of letters starts upper case and continues lower case.
pub fn format_node_id(id: &str) -> String {
    let mut out = String::with_capacity(id.len());
    let mut in_word = false;
    for c in id.chars() {
        if c.is_alphabetic() {
            out.push(if in_word { lower(c) } else { upper(c) });
            in_word = true;
        } else {
            out.push(c);
            in_word = false;
        }
    }
    out
}

/// Node type label: capitalized, `"Node"` when blank
pub fn format_node_type(node_type: &str) -> String {
    if node_type.trim().is_empty() {
        return DEFAULT_NODE_TYPE.to_string();
    }
    capitalize(node_type)
}

/// Relationship label: upper case with whitespace replaced by `_`
pub fn format_relationship_type(rel_type: &str) -> String {
    rel_type
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect::<String>()
        .to_uppercase()
}

fn format_properties(properties: BTreeMap<String, String>) -> BTreeMap<String, String> {
    properties
        .into_iter()
        .map(|(key, value)| (format_property_key(&key), value))
        .collect()
}

/// Canonicalize a node in place of its raw form
pub fn canonicalize_node(node: NodeSpec) -> NodeSpec {
    NodeSpec {
        id: format_node_id(&node.id),
        node_type: format_node_type(&node.node_type),
        properties: format_properties(node.properties),
    }
}

/// Canonicalize a relationship and both of its endpoints
pub fn canonicalize_relationship(rel: RelationshipSpec) -> RelationshipSpec {
    RelationshipSpec {
        source: canonicalize_node(rel.source),
        target: canonicalize_node(rel.target),
        rel_type: format_relationship_type(&rel.rel_type),
        properties: format_properties(rel.properties),
    }
}

/// Canonicalize every node and relationship of a candidate graph
pub fn canonicalize(candidates: Candidates) -> Candidates {
    Candidates {
        nodes: candidates.nodes.into_iter().map(canonicalize_node).collect(),
        relationships: candidates
            .relationships
            .into_iter()
            .map(canonicalize_relationship)
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_property_keys() {
        assert_eq!(format_property_key("start date"), "startDate");
        assert_eq!(format_property_key("Start  DATE of   birth"), "startDateOfBirth");
        assert_eq!(format_property_key("age"), "age");
        assert_eq!(format_property_key("Age"), "age");
        assert_eq!(format_property_key("URL"), "url");
        assert_eq!(format_property_key(""), "");
        assert_eq!(format_property_key("   "), "   ");
    }

    #[test]
    fn test_node_ids() {
        assert_eq!(format_node_id("adam smith"), "Adam Smith");
        assert_eq!(format_node_id("MICROSOFT word"), "Microsoft Word");
        assert_eq!(format_node_id("o'neil"), "O'Neil");
        assert_eq!(format_node_id("route66 east"), "Route66 East");
        assert_eq!(format_node_id("3rd street"), "3Rd Street");
    }

    #[test]
    fn test_node_types() {
        assert_eq!(format_node_type("person"), "Person");
        assert_eq!(format_node_type("PERSON"), "Person");
        assert_eq!(format_node_type(""), "Node");
        assert_eq!(format_node_type("  "), "Node");
    }

    #[test]
    fn test_relationship_types() {
        assert_eq!(format_relationship_type("works for"), "WORKS_FOR");
        assert_eq!(format_relationship_type("has\taward"), "HAS_AWARD");
        assert_eq!(format_relationship_type("WORKS_FOR"), "WORKS_FOR");
    }

    #[test]
    fn test_expanding_case_maps_are_kept() {
        assert_eq!(format_node_id("ßtraße"), "ßtraße");
        assert_eq!(format_node_id(&format_node_id("ßtraße")), "ßtraße");
    }

    #[test]
    fn test_canonicalize_relationship_endpoints() {
        let source = NodeSpec::new("adam", "person").unwrap();
        let target = NodeSpec::new("microsoft", "").unwrap();
        let mut properties = BTreeMap::new();
        properties.insert("start date".to_string(), "2009".to_string());
        let rel = RelationshipSpec::new(source, target, "works for")
            .unwrap()
            .with_properties(properties);

        let rel = canonicalize_relationship(rel);
        assert_eq!(rel.source.id, "Adam");
        assert_eq!(rel.source.node_type, "Person");
        assert_eq!(rel.target.node_type, "Node");
        assert_eq!(rel.rel_type, "WORKS_FOR");
        assert_eq!(rel.properties.get("startDate").map(String::as_str), Some("2009"));
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    const TEXT: &str = "[a-zA-Z0-9éÉüÜß '_\\-\t]{0,24}";

    proptest! {
        /// Property: property-key formatting is idempotent
        #[test]
        fn test_property_key_idempotent(key in TEXT) {
            let once = format_property_key(&key);
            prop_assert_eq!(format_property_key(&once), once);
        }

        /// Property: node-id formatting is idempotent
        #[test]
        fn test_node_id_idempotent(id in TEXT) {
            let once = format_node_id(&id);
            prop_assert_eq!(format_node_id(&once), once);
        }

        /// Property: node-type formatting is idempotent and never blank
        #[test]
        fn test_node_type_idempotent(label in TEXT) {
            let once = format_node_type(&label);
            prop_assert!(!once.trim().is_empty());
            prop_assert_eq!(format_node_type(&once), once);
        }

        /// Property: relationship-type formatting is idempotent and whitespace free
        #[test]
        fn test_relationship_type_idempotent(label in TEXT) {
            let once = format_relationship_type(&label);
            prop_assert!(!once.chars().any(char::is_whitespace));
            prop_assert_eq!(format_relationship_type(&once), once);
        }
    }
}
