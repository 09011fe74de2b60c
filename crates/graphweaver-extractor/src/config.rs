//! Configuration for the graph transformer

use crate::constraint::Constraints;
use crate::error::ExtractorError;
use serde::{Deserialize, Serialize};

/// One entry of the relationship allow-list
///
/// Deserializes from either a plain string (`"WORKS_FOR"`) or a three-element
/// array (`["Person", "WORKS_FOR", "Company"]`).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RelationshipRule {
    /// Relation label only
    Type(String),
    /// (source type, relation label, target type)
    Triple(String, String, String),
}

impl RelationshipRule {
    /// Shorthand for [`RelationshipRule::Triple`]
    pub fn triple(
        source: impl Into<String>,
        relation: impl Into<String>,
        target: impl Into<String>,
    ) -> Self {
        RelationshipRule::Triple(source.into(), relation.into(), target.into())
    }
}

impl From<&str> for RelationshipRule {
    fn from(label: &str) -> Self {
        RelationshipRule::Type(label.to_string())
    }
}

impl From<(&str, &str, &str)> for RelationshipRule {
    fn from((source, relation, target): (&str, &str, &str)) -> Self {
        RelationshipRule::triple(source, relation, target)
    }
}

/// Switch for property extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PropertyMode {
    /// No properties are requested
    Off,
    /// Any property key may be extracted
    Any,
}

/// Property extraction policy as written in configuration
///
/// Either `"off"`, `"any"`, or a list of allowed keys.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertySetting {
    /// `"off"` or `"any"`
    Mode(PropertyMode),
    /// Restrict extraction to these keys
    Keys(Vec<String>),
}

impl PropertySetting {
    /// Shorthand for a restricted key list
    pub fn keys<I, S>(keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PropertySetting::Keys(keys.into_iter().map(Into::into).collect())
    }

    /// Whether this setting asks for any property extraction at all
    pub fn is_enabled(&self) -> bool {
        match self {
            PropertySetting::Mode(mode) => *mode == PropertyMode::Any,
            PropertySetting::Keys(keys) => !keys.is_empty(),
        }
    }
}

impl Default for PropertySetting {
    fn default() -> Self {
        PropertySetting::Mode(PropertyMode::Off)
    }
}

/// Configuration for the graph transformer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TransformerConfig {
    /// Allowed node types; empty means unconstrained
    pub allowed_nodes: Vec<String>,

    /// Allowed relationship types or typed triples; empty means unconstrained
    pub allowed_relationships: Vec<RelationshipRule>,

    /// Drop results that violate the allow-lists
    pub strict_mode: bool,

    /// Node property extraction policy
    pub node_properties: PropertySetting,

    /// Relationship property extraction policy
    pub relationship_properties: PropertySetting,

    /// Never use the backend's structured-output capability
    pub ignore_tool_usage: bool,

    /// Extra instructions appended verbatim to the prompt
    pub additional_instructions: String,
}

impl Default for TransformerConfig {
    /// Unconstrained extraction with strict mode on and no properties
    fn default() -> Self {
        Self {
            allowed_nodes: Vec::new(),
            allowed_relationships: Vec::new(),
            strict_mode: true,
            node_properties: PropertySetting::default(),
            relationship_properties: PropertySetting::default(),
            ignore_tool_usage: false,
            additional_instructions: String::new(),
        }
    }
}

impl TransformerConfig {
    /// Set the node allow-list
    pub fn with_allowed_nodes<I, S>(mut self, nodes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.allowed_nodes = nodes.into_iter().map(Into::into).collect();
        self
    }

    /// Set the relationship allow-list
    pub fn with_allowed_relationships<I, R>(mut self, rules: I) -> Self
    where
        I: IntoIterator<Item = R>,
        R: Into<RelationshipRule>,
    {
        self.allowed_relationships = rules.into_iter().map(Into::into).collect();
        self
    }

    /// Enable or disable strict-mode filtering
    pub fn with_strict_mode(mut self, strict_mode: bool) -> Self {
        self.strict_mode = strict_mode;
        self
    }

    /// Set the node property policy
    pub fn with_node_properties(mut self, setting: PropertySetting) -> Self {
        self.node_properties = setting;
        self
    }

    /// Set the relationship property policy
    pub fn with_relationship_properties(mut self, setting: PropertySetting) -> Self {
        self.relationship_properties = setting;
        self
    }

    /// Bypass the backend's structured-output capability
    pub fn with_ignore_tool_usage(mut self, ignore: bool) -> Self {
        self.ignore_tool_usage = ignore;
        self
    }

    /// Append extra instructions to the prompt
    pub fn with_additional_instructions(mut self, instructions: impl Into<String>) -> Self {
        self.additional_instructions = instructions.into();
        self
    }

    /// Validate the configuration
    ///
    /// Runs the same checks the transformer runs at construction, minus the
    /// ones that depend on the backend.
    pub fn validate(&self) -> Result<(), ExtractorError> {
        Constraints::from_config(self).map(|_| ())
    }

    /// Load configuration from TOML string
    pub fn from_toml(toml_str: &str) -> Result<Self, ExtractorError> {
        toml::from_str(toml_str)
            .map_err(|e| ExtractorError::config(format!("Failed to parse TOML: {}", e)))
    }

    /// Serialize configuration to TOML string
    pub fn to_toml(&self) -> Result<String, ExtractorError> {
        toml::to_string_pretty(self)
            .map_err(|e| ExtractorError::config(format!("Failed to serialize to TOML: {}", e)))
    }
}
