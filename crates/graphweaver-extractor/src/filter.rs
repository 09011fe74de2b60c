//! Strict-mode filtering against the allow-lists
//!
//! Comparison is case-insensitive. Nodes are filtered first, then
//! relationships, so a relationship never outlives an endpoint type that was
//! rejected.

use crate::constraint::{Constraints, TypeConstraint};
use crate::normalizer::Candidates;
use graphweaver_domain::RelationshipSpec;

#[derive(Debug, Clone, PartialEq, Eq)]
enum RelationRule {
    Any,
    Types(Vec<String>),
    Triples(Vec<(String, String, String)>),
}

/// Drops candidates that fall outside the allow-lists
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StrictFilter {
    node_types: Vec<String>,
    relations: RelationRule,
}

impl StrictFilter {
    /// Build a filter, or `None` when both allow-lists are empty
    pub fn new(constraints: &Constraints) -> Option<Self> {
        if !constraints.has_allow_lists() {
            return None;
        }

        let relations = match &constraints.relationships {
            TypeConstraint::Unconstrained => RelationRule::Any,
            TypeConstraint::FlatTypes(labels) => {
                RelationRule::Types(labels.iter().map(|l| l.to_lowercase()).collect())
            }
            TypeConstraint::TypedTriples(triples) => RelationRule::Triples(
                triples
                    .iter()
                    .map(|t| {
                        (
                            t.source.to_lowercase(),
                            t.relation.to_lowercase(),
                            t.target.to_lowercase(),
                        )
                    })
                    .collect(),
            ),
        };

        Some(Self {
            node_types: constraints
                .allowed_nodes
                .iter()
                .map(|n| n.to_lowercase())
                .collect(),
            relations,
        })
    }

    fn node_type_allowed(&self, node_type: &str) -> bool {
        self.node_types.is_empty() || self.node_types.contains(&node_type.to_lowercase())
    }

    fn relationship_allowed(&self, rel: &RelationshipSpec) -> bool {
        if !self.node_type_allowed(&rel.source.node_type)
            || !self.node_type_allowed(&rel.target.node_type)
        {
            return false;
        }

        match &self.relations {
            RelationRule::Any => true,
            RelationRule::Types(types) => types.contains(&rel.rel_type.to_lowercase()),
            RelationRule::Triples(triples) => {
                let key = (
                    rel.source.node_type.to_lowercase(),
                    rel.rel_type.to_lowercase(),
                    rel.target.node_type.to_lowercase(),
                );
                triples.contains(&key)
            }
        }
    }

    /// Keep only the candidates the allow-lists permit, preserving order
    pub fn apply(&self, candidates: Candidates) -> Candidates {
        Candidates {
            nodes: candidates
                .nodes
                .into_iter()
                .filter(|n| self.node_type_allowed(&n.node_type))
                .collect(),
            relationships: candidates
                .relationships
                .into_iter()
                .filter(|r| self.relationship_allowed(r))
                .collect(),
        }
    }
}
