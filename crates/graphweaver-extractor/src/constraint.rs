//! Classification and validation of the user's allow-lists
//!
//! Everything here runs once, when the transformer is configured. The
//! resulting values are immutable and every later stage branches on them.

use crate::config::{PropertyMode, PropertySetting, RelationshipRule, TransformerConfig};
use crate::error::ExtractorError;
use std::fmt;

/// Property key that always carries the node identifier
pub const RESERVED_PROPERTY_KEY: &str = "id";

/// Allowed (source type, relation, target type) combination
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RelationshipTriple {
    /// Source node type
    pub source: String,
    /// Relation label
    pub relation: String,
    /// Target node type
    pub target: String,
}

impl fmt::Display for RelationshipTriple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}, {})", self.source, self.relation, self.target)
    }
}

/// Classified relationship allow-list
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TypeConstraint {
    /// Any relation label is allowed
    Unconstrained,
    /// Only these relation labels are allowed
    FlatTypes(Vec<String>),
    /// Only these directed, endpoint-typed relations are allowed
    ///
    /// Every endpoint type is a member of the node allow-list.
    TypedTriples(Vec<RelationshipTriple>),
}

impl TypeConstraint {
    /// Classify a relationship allow-list against the node allow-list
    ///
    /// # Examples
    ///
    /// ```
    /// use graphweaver_extractor::{RelationshipRule, TypeConstraint};
    ///
    /// let nodes = vec!["Person".to_string()];
    /// let rules = vec![RelationshipRule::triple("Person", "KNOWS", "Person")];
    /// let constraint = TypeConstraint::classify(&rules, &nodes).unwrap();
    /// assert!(matches!(constraint, TypeConstraint::TypedTriples(_)));
    ///
    /// let bad = vec![RelationshipRule::triple("Person", "WORKS_FOR", "Company")];
    /// assert!(TypeConstraint::classify(&bad, &nodes).is_err());
    /// ```
    pub fn classify(
        rules: &[RelationshipRule],
        allowed_nodes: &[String],
    ) -> Result<Self, ExtractorError> {
        if rules.is_empty() {
            return Ok(TypeConstraint::Unconstrained);
        }

        let mut labels = Vec::new();
        let mut triples = Vec::new();
        for rule in rules {
            match rule {
                RelationshipRule::Type(label) => labels.push(label.clone()),
                RelationshipRule::Triple(source, relation, target) => {
                    triples.push(RelationshipTriple {
                        source: source.clone(),
                        relation: relation.clone(),
                        target: target.clone(),
                    })
                }
            }
        }

        if triples.is_empty() {
            return Ok(TypeConstraint::FlatTypes(dedup(labels)));
        }

        if !labels.is_empty() {
            return Err(ExtractorError::config(
                "`allowed_relationships` must be a list of strings or a list of 3-item tuples, not a mix of both",
            ));
        }

        for triple in &triples {
            for endpoint in [&triple.source, &triple.target] {
                if !allowed_nodes.contains(endpoint) {
                    return Err(ExtractorError::config(format!(
                        "relationship {} references node type '{}' which is not in `allowed_nodes`",
                        triple, endpoint
                    )));
                }
            }
        }

        Ok(TypeConstraint::TypedTriples(dedup(triples)))
    }

    /// True unless [`TypeConstraint::Unconstrained`]
    pub fn is_constrained(&self) -> bool {
        !matches!(self, TypeConstraint::Unconstrained)
    }

    /// Distinct relation labels, in first-occurrence order
    ///
    /// For typed triples this is the flattened set of middle elements.
    pub fn relation_labels(&self) -> Vec<String> {
        match self {
            TypeConstraint::Unconstrained => Vec::new(),
            TypeConstraint::FlatTypes(labels) => labels.clone(),
            TypeConstraint::TypedTriples(triples) => {
                dedup(triples.iter().map(|t| t.relation.clone()).collect())
            }
        }
    }

    /// The triples, when this is a typed-triple constraint
    pub fn triples(&self) -> &[RelationshipTriple] {
        match self {
            TypeConstraint::TypedTriples(triples) => triples,
            _ => &[],
        }
    }
}

/// Property extraction policy for nodes or relationships
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyConstraint {
    /// No property sub-record is requested
    Disabled,
    /// Any property key may be extracted
    AnyProperties,
    /// Only these keys may be extracted; never contains `"id"`
    RestrictedKeys(Vec<String>),
}

impl PropertyConstraint {
    /// Build from a configuration setting
    ///
    /// `owner` names the record kind ("node" or "relationship") in error messages.
    pub fn from_setting(setting: &PropertySetting, owner: &str) -> Result<Self, ExtractorError> {
        match setting {
            PropertySetting::Mode(PropertyMode::Off) => Ok(PropertyConstraint::Disabled),
            PropertySetting::Mode(PropertyMode::Any) => Ok(PropertyConstraint::AnyProperties),
            PropertySetting::Keys(keys) if keys.is_empty() => Ok(PropertyConstraint::Disabled),
            PropertySetting::Keys(keys) => {
                if keys.iter().any(|key| key == RESERVED_PROPERTY_KEY) {
                    return Err(ExtractorError::config(format!(
                        "The {} property '{}' is reserved and cannot be used.",
                        owner, RESERVED_PROPERTY_KEY
                    )));
                }
                Ok(PropertyConstraint::RestrictedKeys(dedup(keys.clone())))
            }
        }
    }

    /// Whether a property sub-record is requested at all
    pub fn is_enabled(&self) -> bool {
        !matches!(self, PropertyConstraint::Disabled)
    }

    /// Allowed keys, empty unless restricted
    pub fn allowed_keys(&self) -> &[String] {
        match self {
            PropertyConstraint::RestrictedKeys(keys) => keys,
            _ => &[],
        }
    }
}

/// Everything derived from [`TransformerConfig`] at construction time
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Constraints {
    /// Node allow-list, duplicates removed
    pub allowed_nodes: Vec<String>,
    /// Relationship allow-list classification
    pub relationships: TypeConstraint,
    /// Node property policy
    pub node_properties: PropertyConstraint,
    /// Relationship property policy
    pub relationship_properties: PropertyConstraint,
}

impl Constraints {
    /// Validate and classify a configuration
    pub fn from_config(config: &TransformerConfig) -> Result<Self, ExtractorError> {
        let relationships =
            TypeConstraint::classify(&config.allowed_relationships, &config.allowed_nodes)?;
        let node_properties = PropertyConstraint::from_setting(&config.node_properties, "node")?;
        let relationship_properties =
            PropertyConstraint::from_setting(&config.relationship_properties, "relationship")?;

        Ok(Self {
            allowed_nodes: dedup(config.allowed_nodes.clone()),
            relationships,
            node_properties,
            relationship_properties,
        })
    }

    /// True when either property policy is enabled
    pub fn wants_properties(&self) -> bool {
        self.node_properties.is_enabled() || self.relationship_properties.is_enabled()
    }

    /// True when either allow-list is non-empty
    pub fn has_allow_lists(&self) -> bool {
        !self.allowed_nodes.is_empty() || self.relationships.is_constrained()
    }
}

/// Remove duplicates, keeping the first occurrence
fn dedup<T: PartialEq>(items: Vec<T>) -> Vec<T> {
    let mut out: Vec<T> = Vec::with_capacity(items.len());
    for item in items {
        if !out.contains(&item) {
            out.push(item);
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nodes(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_empty_is_unconstrained() {
        let constraint = TypeConstraint::classify(&[], &[]).unwrap();
        assert_eq!(constraint, TypeConstraint::Unconstrained);
        assert!(!constraint.is_constrained());
    }

    #[test]
    fn test_strings_are_flat_types() {
        let rules = vec![RelationshipRule::from("KNOWS"), "WORKS_FOR".into(), "KNOWS".into()];
        let constraint = TypeConstraint::classify(&rules, &[]).unwrap();
        assert_eq!(
            constraint,
            TypeConstraint::FlatTypes(nodes(&["KNOWS", "WORKS_FOR"]))
        );
    }

    #[test]
    fn test_triples_with_declared_endpoints() {
        let rules = vec![
            RelationshipRule::triple("Person", "WORKS_FOR", "Company"),
            RelationshipRule::triple("Person", "KNOWS", "Person"),
            RelationshipRule::triple("Company", "WORKS_FOR", "Company"),
        ];
        let constraint = TypeConstraint::classify(&rules, &nodes(&["Person", "Company"])).unwrap();
        assert_eq!(constraint.triples().len(), 3);
        assert_eq!(constraint.relation_labels(), nodes(&["WORKS_FOR", "KNOWS"]));
    }

    #[test]
    fn test_triple_with_undeclared_endpoint_fails() {
        let rules = vec![RelationshipRule::triple("Person", "WORKS_FOR", "Company")];
        let result = TypeConstraint::classify(&rules, &nodes(&["Person"]));
        assert!(matches!(result, Err(ExtractorError::Configuration(_))));
    }

    #[test]
    fn test_triple_endpoint_membership_is_case_sensitive() {
        let rules = vec![RelationshipRule::triple("person", "KNOWS", "Person")];
        assert!(TypeConstraint::classify(&rules, &nodes(&["Person"])).is_err());
    }

    #[test]
    fn test_mixed_list_fails() {
        let rules = vec![
            RelationshipRule::from("KNOWS"),
            RelationshipRule::triple("Person", "WORKS_FOR", "Person"),
        ];
        let result = TypeConstraint::classify(&rules, &nodes(&["Person"]));
        assert!(matches!(result, Err(ExtractorError::Configuration(_))));
    }

    #[test]
    fn test_reserved_property_key_fails() {
        let setting = PropertySetting::keys(["name", "id"]);
        let result = PropertyConstraint::from_setting(&setting, "node");
        match result {
            Err(ExtractorError::Configuration(msg)) => assert!(msg.contains("reserved")),
            other => panic!("Expected configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_property_settings() {
        assert_eq!(
            PropertyConstraint::from_setting(&PropertySetting::default(), "node").unwrap(),
            PropertyConstraint::Disabled
        );
        assert_eq!(
            PropertyConstraint::from_setting(&PropertySetting::Mode(PropertyMode::Any), "node")
                .unwrap(),
            PropertyConstraint::AnyProperties
        );
        let restricted =
            PropertyConstraint::from_setting(&PropertySetting::keys(["age"]), "node").unwrap();
        assert_eq!(restricted.allowed_keys(), &["age".to_string()]);
    }

    #[test]
    fn test_constraints_from_config() {
        let config = TransformerConfig::default()
            .with_allowed_nodes(["Person", "Person"])
            .with_relationship_properties(PropertySetting::Mode(PropertyMode::Any));
        let constraints = Constraints::from_config(&config).unwrap();

        assert_eq!(constraints.allowed_nodes, nodes(&["Person"]));
        assert!(constraints.has_allow_lists());
        assert!(constraints.wants_properties());
    }
}
