//! Prompt templates for graph extraction
//!
//! Two templates exist: one paired with a JSON schema for structured-output
//! backends, and one that carries worked examples and explicit JSON format
//! instructions for backends that only return text.

use crate::constraint::Constraints;
use crate::schema::{quoted_list, triple_schema_text};
use serde::{Deserialize, Serialize};
use serde_json::json;

/// Placeholder substituted with the document text
pub const INPUT_PLACEHOLDER: &str = "{input}";

/// A system/user message pair with an `{input}` placeholder
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptTemplate {
    /// System message
    pub system: String,
    /// User message
    pub user: String,
}

impl PromptTemplate {
    /// Create a template from its two messages
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }

    /// Substitute `input` for the placeholder in both messages
    ///
    /// # Examples
    ///
    /// ```
    /// use graphweaver_extractor::PromptTemplate;
    ///
    /// let template = PromptTemplate::new("Extract a graph.", "Text: {input}");
    /// let (system, user) = template.render("Adam works at Microsoft");
    /// assert_eq!(system, "Extract a graph.");
    /// assert_eq!(user, "Text: Adam works at Microsoft");
    /// ```
    pub fn render(&self, input: &str) -> (String, String) {
        (
            self.system.replace(INPUT_PLACEHOLDER, input),
            self.user.replace(INPUT_PLACEHOLDER, input),
        )
    }
}

/// One worked example shown to free-text backends
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WorkedExample {
    /// Source sentence
    pub text: &'static str,
    /// Head entity
    pub head: &'static str,
    /// Head entity type
    pub head_type: &'static str,
    /// Relation label
    pub relation: &'static str,
    /// Tail entity
    pub tail: &'static str,
    /// Tail entity type
    pub tail_type: &'static str,
}

const ADAM_TEXT: &str =
    "Adam is a software engineer in Microsoft since 2009, and last year he got an award as the Best Talent";
const MICROSOFT_TEXT: &str =
    "Microsoft is a tech company that provide several products such as Microsoft Word";
const WORD_TEXT: &str = "Microsoft Word is a lightweight app that accessible offline";

/// Worked examples embedded in the free-text prompt
pub const WORKED_EXAMPLES: &[WorkedExample] = &[
    WorkedExample {
        text: ADAM_TEXT,
        head: "Adam",
        head_type: "Person",
        relation: "WORKS_FOR",
        tail: "Microsoft",
        tail_type: "Company",
    },
    WorkedExample {
        text: ADAM_TEXT,
        head: "Adam",
        head_type: "Person",
        relation: "HAS_AWARD",
        tail: "Best Talent",
        tail_type: "Award",
    },
    WorkedExample {
        text: MICROSOFT_TEXT,
        head: "Microsoft Word",
        head_type: "Product",
        relation: "PRODUCED_BY",
        tail: "Microsoft",
        tail_type: "Company",
    },
    WorkedExample {
        text: WORD_TEXT,
        head: "Microsoft Word",
        head_type: "Product",
        relation: "HAS_CHARACTERISTIC",
        tail: "lightweight app",
        tail_type: "Characteristic",
    },
    WorkedExample {
        text: WORD_TEXT,
        head: "Microsoft Word",
        head_type: "Product",
        relation: "HAS_CHARACTERISTIC",
        tail: "accessible offline",
        tail_type: "Characteristic",
    },
];

const KNOWLEDGE_GRAPH_INSTRUCTIONS: &str = r#"# Knowledge Graph Instructions
## 1. Overview
You are a top-tier algorithm designed for extracting information in structured formats to build a knowledge graph.
Try to capture as much information from the text as possible without sacrificing accuracy. Do not add any information that is not explicitly mentioned in the text.
- **Nodes** represent entities and concepts.
- The aim is to achieve simplicity and clarity in the knowledge graph, making it
accessible for a vast audience.
## 2. Labeling Nodes
- **Consistency**: Ensure you use available types for node labels.
Ensure you use basic or elementary types for node labels.
- For example, when you identify an entity representing a person, always label it as **'person'**. Avoid using more specific terms like 'mathematician' or 'scientist'.
- **Node IDs**: Never utilize integers as node IDs. Node IDs should be names or human-readable identifiers found in the text.
- **Relationships** represent connections between entities or concepts.
Ensure consistency and generality in relationship types when constructing knowledge graphs. Instead of using specific and momentary types such as 'BECAME_PROFESSOR', use more general and timeless relationship types like 'PROFESSOR'. Make sure to use general and timeless relationship types!
## 3. Coreference Resolution
- **Maintain Entity Consistency**: When extracting entities, it's vital to ensure consistency.
If an entity, such as "John Doe", is mentioned multiple times in the text but is referred to by different names or pronouns (e.g., "Joe", "he"), always use the most complete identifier for that entity throughout the knowledge graph. In this example, use "John Doe" as the entity ID.
Remember, the knowledge graph should be coherent and easily understandable, so maintaining consistency in entity references is crucial.
## 4. Strict Compliance
Adhere to the rules strictly. Non-compliance will result in termination."#;

const FORMAT_TIP: &str = "Tip: Make sure to answer in the correct format and do not include any \
explanations. Use the given format to extract information from the following input: ";

const FREE_TEXT_INTRO: &str = "You are a top-tier algorithm designed for extracting information \
in structured formats to build a knowledge graph. Your task is to identify the entities and \
relations requested with the user prompt from a given text. You must generate the output in a \
JSON format containing a list with JSON objects. Each object should have the keys: \"head\", \
\"head_type\", \"relation\", \"tail\", and \"tail_type\". The \"head\" key must contain the text \
of the extracted entity with one of the types from the provided list in the user prompt.";

const ENTITY_CONSISTENCY: &str = "Attempt to extract as many entities and relations as you can. \
Maintain Entity Consistency: When extracting entities, it's vital to ensure consistency. If an \
entity, such as \"John Doe\", is mentioned multiple times in the text but is referred to by \
different names or pronouns (e.g., \"Joe\", \"he\"), always use the most complete identifier for \
that entity. The knowledge graph should be coherent and easily understandable, so maintaining \
consistency in entity references is crucial.";

const IMPORTANT_NOTES: &str = "IMPORTANT NOTES:\n- Don't add any explanation and text.";

/// Template used with structured-output backends
pub fn structured_prompt(additional_instructions: &str) -> PromptTemplate {
    let mut user = String::new();
    if !additional_instructions.is_empty() {
        user.push_str(additional_instructions);
        user.push(' ');
    }
    user.push_str(FORMAT_TIP);
    user.push_str(INPUT_PLACEHOLDER);

    PromptTemplate::new(KNOWLEDGE_GRAPH_INSTRUCTIONS, user)
}

/// Builds the free-text template from the classified allow-lists
pub struct PromptBuilder<'a> {
    constraints: &'a Constraints,
    additional_instructions: &'a str,
}

impl<'a> PromptBuilder<'a> {
    /// Create a builder over validated constraints
    pub fn new(constraints: &'a Constraints) -> Self {
        Self {
            constraints,
            additional_instructions: "",
        }
    }

    /// Append caller instructions to both messages
    pub fn with_additional_instructions(mut self, instructions: &'a str) -> Self {
        self.additional_instructions = instructions;
        self
    }

    /// Build the free-text template
    pub fn build(&self) -> PromptTemplate {
        PromptTemplate::new(self.system_message(), self.user_message())
    }

    fn node_labels(&self) -> Option<String> {
        let nodes = &self.constraints.allowed_nodes;
        (!nodes.is_empty()).then(|| quoted_list(nodes))
    }

    fn relation_labels(&self) -> Option<String> {
        let labels = self.constraints.relationships.relation_labels();
        (!labels.is_empty()).then(|| quoted_list(&labels))
    }

    fn system_message(&self) -> String {
        let node_labels = self.node_labels();
        let relation_labels = self.relation_labels();
        let mut parts = vec![FREE_TEXT_INTRO.to_string()];

        if let Some(nodes) = &node_labels {
            parts.push(format!(
                "The \"head_type\" key must contain the type of the extracted head entity, \
which must be one of the types from {}.",
                nodes
            ));
        }
        if let Some(relations) = &relation_labels {
            parts.push(format!(
                "The \"relation\" key must contain the type of relation between the \"head\" \
and the \"tail\", which must be one of the relations from {}.",
                relations
            ));
        }
        if let Some(nodes) = &node_labels {
            parts.push(format!(
                "The \"tail\" key must represent the text of an extracted entity which is the \
tail of the relation, and the \"tail_type\" key must contain the type of the tail entity from {}.",
                nodes
            ));
        }
        parts.push(triple_schema_text(&self.constraints.relationships));
        parts.push(ENTITY_CONSISTENCY.to_string());
        parts.push(IMPORTANT_NOTES.to_string());
        parts.push(self.additional_instructions.to_string());

        join_non_empty(parts)
    }

    fn user_message(&self) -> String {
        let mut parts = vec![
            "Based on the following example, extract entities and relations from the provided text.\n"
                .to_string(),
        ];

        if let Some(nodes) = self.node_labels() {
            parts.push(format!(
                "Use the following entity types, don't use other entity that is not defined \
below:\n# ENTITY TYPES:\n{}",
                nodes
            ));
        }
        if let Some(relations) = self.relation_labels() {
            parts.push(format!(
                "Use the following relation types, don't use other relation that is not \
defined below:\n# RELATION TYPES:\n{}",
                relations
            ));
        }
        parts.push(triple_schema_text(&self.constraints.relationships));
        parts.push(format!(
            "Below are a number of examples of text and their extracted entities and \
relationships.\n{}\n",
            examples_json()
        ));
        parts.push(self.additional_instructions.to_string());
        parts.push(format!(
            "For the following text, extract entities and relations as in the provided \
example.\n{}\nText: {}",
            format_instructions(),
            INPUT_PLACEHOLDER
        ));

        join_non_empty(parts)
    }
}

/// The worked examples as pretty-printed JSON
pub fn examples_json() -> String {
    serde_json::to_string_pretty(WORKED_EXAMPLES).unwrap_or_default()
}

/// Output format instructions for the `{head, head_type, relation, tail, tail_type}` record
pub fn format_instructions() -> String {
    let record = json!({
        "type": "object",
        "properties": {
            "head": {
                "type": "string",
                "description": "extracted head entity like Microsoft, Apple, John. Must use human-readable unique identifier.",
            },
            "head_type": {
                "type": "string",
                "description": "type of the extracted head entity like Person, Company, etc",
            },
            "relation": {
                "type": "string",
                "description": "relation between the head and the tail entities",
            },
            "tail": {
                "type": "string",
                "description": "extracted tail entity like Microsoft, Apple, John. Must use human-readable unique identifier.",
            },
            "tail_type": {
                "type": "string",
                "description": "type of the extracted tail entity like Person, Company, etc",
            },
        },
        "required": ["head", "head_type", "relation", "tail", "tail_type"],
    });
    format!(
        "Return a JSON array in which every element is a JSON object conforming to the JSON \
schema below.\n```\n{}\n```",
        serde_json::to_string(&record).unwrap_or_default()
    )
}

fn join_non_empty(parts: Vec<String>) -> String {
    parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}
