//! Dynamic output schema
//!
//! The record shapes a structured-output backend is asked to fill are built
//! at configuration time from the classified allow-lists. They are kept as a
//! small descriptor table and compiled to JSON Schema on demand.

use crate::constraint::{Constraints, PropertyConstraint, TypeConstraint};
use serde_json::{json, Map, Value};

/// Backends that accept `enum` constraints inside a JSON Schema
pub const NATIVE_ENUM_BACKENDS: &[&str] = &["openai-chat"];

const NODE_GUIDANCE: &str = "Ensure you use basic or elementary types for node labels.\n\
For example, when you identify an entity representing a person, always label it as \
**'Person'**. Avoid using more specific terms like 'Mathematician' or 'Scientist'";

const RELATIONSHIP_GUIDANCE: &str = "Instead of using specific and momentary types such as \
'BECAME_PROFESSOR', use more general and timeless relationship types like 'PROFESSOR'. \
However, do not sacrifice any accuracy for generality";

const VALUE_DESCRIPTION: &str = "Extracted value. Any date value should be formatted as yyyy-mm-dd.";

/// Whether `backend_id` accepts native schema enums
pub fn supports_native_enums(backend_id: &str) -> bool {
    NATIVE_ENUM_BACKENDS.contains(&backend_id)
}

/// Which free-text guidance an unconstrained field carries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Guidance {
    /// Node type labels
    Node,
    /// Relationship type labels
    Relationship,
    /// Property keys (no extra text)
    Property,
}

impl Guidance {
    fn text(self) -> &'static str {
        match self {
            Guidance::Node => NODE_GUIDANCE,
            Guidance::Relationship => RELATIONSHIP_GUIDANCE,
            Guidance::Property => "",
        }
    }
}

/// Value kind of a field
#[derive(Debug, Clone, PartialEq)]
pub enum FieldKind {
    /// A string
    Text,
    /// A list of nested records
    List(Box<RecordDescriptor>),
}

/// One field of a record shape
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Field name as it appears in the reply
    pub name: String,
    /// Value kind
    pub kind: FieldKind,
    /// Whether the field must be present
    pub required: bool,
    /// Native enum values, set only for backends that accept them
    pub allowed: Option<Vec<String>>,
    /// Human-readable guidance for the model
    pub description: String,
}

impl FieldDescriptor {
    /// Required free-text field
    pub fn text(name: &str, description: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::Text,
            required: true,
            allowed: None,
            description: description.into(),
        }
    }

    /// Required text field optionally restricted to `values`
    ///
    /// With no values the description gains the guidance text for `guidance`.
    /// With values, a native-enum backend gets a schema `enum`; any other
    /// backend gets the options listed in the description instead.
    pub fn choice(
        name: &str,
        values: &[String],
        description: &str,
        guidance: Guidance,
        native_enums: bool,
    ) -> Self {
        if values.is_empty() {
            let extra = guidance.text();
            let description = if extra.is_empty() {
                description.to_string()
            } else {
                format!("{} {}", description, extra)
            };
            return Self::text(name, description);
        }

        if native_enums {
            Self {
                allowed: Some(values.to_vec()),
                ..Self::text(name, description)
            }
        } else {
            Self::text(
                name,
                format!("{} Available options are {}", description, quoted_list(values)),
            )
        }
    }

    /// Optional list of nested records
    pub fn list(name: &str, record: RecordDescriptor, description: impl Into<String>) -> Self {
        Self {
            name: name.to_string(),
            kind: FieldKind::List(Box::new(record)),
            required: false,
            allowed: None,
            description: description.into(),
        }
    }

    fn to_json_schema(&self) -> Value {
        let mut schema = Map::new();
        match &self.kind {
            FieldKind::Text => {
                schema.insert("type".into(), json!("string"));
            }
            FieldKind::List(record) => {
                schema.insert("type".into(), json!("array"));
                schema.insert("items".into(), record.to_json_schema());
            }
        }
        if let Some(values) = &self.allowed {
            schema.insert("enum".into(), json!(values));
        }
        schema.insert("description".into(), json!(self.description));
        Value::Object(schema)
    }
}

/// A record shape: named, optionally described, with ordered fields
#[derive(Debug, Clone, PartialEq)]
pub struct RecordDescriptor {
    /// Record name, used as the schema title
    pub name: String,
    /// Record-level description
    pub description: Option<String>,
    /// Fields in declaration order
    pub fields: Vec<FieldDescriptor>,
}

impl RecordDescriptor {
    /// Look up a field by name
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Compile to a JSON Schema object
    pub fn to_json_schema(&self) -> Value {
        let properties: Map<String, Value> = self
            .fields
            .iter()
            .map(|f| (f.name.clone(), f.to_json_schema()))
            .collect();
        let required: Vec<&str> = self
            .fields
            .iter()
            .filter(|f| f.required)
            .map(|f| f.name.as_str())
            .collect();

        let mut schema = Map::new();
        schema.insert("title".into(), json!(self.name));
        if let Some(description) = &self.description {
            schema.insert("description".into(), json!(description));
        }
        schema.insert("type".into(), json!("object"));
        schema.insert("properties".into(), Value::Object(properties));
        schema.insert("required".into(), json!(required));
        Value::Object(schema)
    }
}

/// The node and relationship record shapes for one transformer
#[derive(Debug, Clone, PartialEq)]
pub struct GraphSchema {
    node: RecordDescriptor,
    relationship: RecordDescriptor,
    native_enums: bool,
}

impl GraphSchema {
    /// Build the record shapes from validated constraints
    ///
    /// # Examples
    ///
    /// ```
    /// use graphweaver_extractor::{Constraints, GraphSchema, TransformerConfig};
    ///
    /// let config = TransformerConfig::default().with_allowed_nodes(["Person"]);
    /// let constraints = Constraints::from_config(&config).unwrap();
    ///
    /// let schema = GraphSchema::build(&constraints, true);
    /// let json = schema.to_json_schema();
    /// assert_eq!(
    ///     json["properties"]["nodes"]["items"]["properties"]["type"]["enum"][0],
    ///     "Person"
    /// );
    /// ```
    pub fn build(constraints: &Constraints, native_enums: bool) -> Self {
        let nodes = &constraints.allowed_nodes;
        let relations = constraints.relationships.relation_labels();

        let mut node_fields = vec![
            FieldDescriptor::text("id", "Name or human-readable unique identifier."),
            FieldDescriptor::choice(
                "type",
                nodes,
                "The type or label of the node.",
                Guidance::Node,
                native_enums,
            ),
        ];
        if let Some(field) = property_field(
            &constraints.node_properties,
            "PropertyRecord",
            "List of node properties",
            native_enums,
        ) {
            node_fields.push(field);
        }

        let mut relationship_fields = vec![
            FieldDescriptor::text(
                "source_node_id",
                "Name or human-readable unique identifier of source node",
            ),
            FieldDescriptor::choice(
                "source_node_type",
                nodes,
                "The type or label of the source node.",
                Guidance::Node,
                native_enums,
            ),
            FieldDescriptor::text(
                "target_node_id",
                "Name or human-readable unique identifier of target node",
            ),
            FieldDescriptor::choice(
                "target_node_type",
                nodes,
                "The type or label of the target node.",
                Guidance::Node,
                native_enums,
            ),
            FieldDescriptor::choice(
                "type",
                &relations,
                "The type of the relationship.",
                Guidance::Relationship,
                native_enums,
            ),
        ];
        if let Some(field) = property_field(
            &constraints.relationship_properties,
            "RelationshipPropertyRecord",
            "List of relationship properties",
            native_enums,
        ) {
            relationship_fields.push(field);
        }

        let relationship_description = match &constraints.relationships {
            TypeConstraint::TypedTriples(_) => {
                Some(triple_schema_text(&constraints.relationships))
            }
            _ => None,
        };

        Self {
            node: RecordDescriptor {
                name: "NodeRecord".to_string(),
                description: None,
                fields: node_fields,
            },
            relationship: RecordDescriptor {
                name: "RelationshipRecord".to_string(),
                description: relationship_description,
                fields: relationship_fields,
            },
            native_enums,
        }
    }

    /// Node record shape
    pub fn node(&self) -> &RecordDescriptor {
        &self.node
    }

    /// Relationship record shape
    pub fn relationship(&self) -> &RecordDescriptor {
        &self.relationship
    }

    /// Whether enum values were emitted as native schema enums
    pub fn native_enums(&self) -> bool {
        self.native_enums
    }

    /// Compile the whole graph shape to a JSON Schema document
    pub fn to_json_schema(&self) -> Value {
        json!({
            "title": "DynamicGraph",
            "description": "Represents a graph document consisting of nodes and relationships.",
            "type": "object",
            "properties": {
                "nodes": {
                    "type": "array",
                    "items": self.node.to_json_schema(),
                    "description": "List of nodes",
                },
                "relationships": {
                    "type": "array",
                    "items": self.relationship.to_json_schema(),
                    "description": "List of relationships",
                },
            },
            "required": ["nodes", "relationships"],
        })
    }
}

fn property_field(
    constraint: &PropertyConstraint,
    record_name: &str,
    description: &str,
    native_enums: bool,
) -> Option<FieldDescriptor> {
    if !constraint.is_enabled() {
        return None;
    }
    let record = RecordDescriptor {
        name: record_name.to_string(),
        description: Some("A single property consisting of key and value".to_string()),
        fields: vec![
            FieldDescriptor::choice(
                "key",
                constraint.allowed_keys(),
                "Property key.",
                Guidance::Property,
                native_enums,
            ),
            FieldDescriptor::text("value", VALUE_DESCRIPTION),
        ],
    };
    Some(FieldDescriptor::list("properties", record, description))
}

/// Instruction text describing a typed-triple allow-list
///
/// Empty unless `constraint` is [`TypeConstraint::TypedTriples`].
pub fn triple_schema_text(constraint: &TypeConstraint) -> String {
    let triples = constraint.triples();
    if triples.is_empty() {
        return String::new();
    }
    let listed: Vec<String> = triples.iter().map(ToString::to_string).collect();
    format!(
        "Your task is to extract relationships from text strictly adhering to the provided \
schema. The relationships can only appear between specific node types are presented in the \
schema format like: (Entity1Type, RELATIONSHIP_TYPE, Entity2Type)\nProvided schema is [{}]",
        listed.join(", ")
    )
}

/// Render labels as `['A', 'B']`
pub(crate) fn quoted_list(values: &[String]) -> String {
    let quoted: Vec<String> = values.iter().map(|v| format!("'{}'", v)).collect();
    format!("[{}]", quoted.join(", "))
}
