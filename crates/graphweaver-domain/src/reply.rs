//! Request and reply envelopes exchanged with a model backend

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A rendered prompt ready to send to a model
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelRequest {
    /// System message
    pub system: String,

    /// User message (contains the document text)
    pub user: String,

    /// JSON Schema the reply must conform to (structured mode only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub schema: Option<Value>,
}

impl ModelRequest {
    /// True when the backend is asked for schema-conforming output
    pub fn is_structured(&self) -> bool {
        self.schema.is_some()
    }
}

/// What a backend answers with
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelReply {
    /// Structured-output envelope
    Structured {
        /// Provider-native message, kept so failed replies can be salvaged
        raw: ProviderMessage,
        /// Schema-shaped object, `None` when the provider could not validate it
        parsed: Option<Value>,
    },
    /// Plain text reply (free-text mode)
    Text(String),
}

impl ModelReply {
    /// Structured reply whose `parsed` object validated
    pub fn parsed(value: Value) -> Self {
        ModelReply::Structured {
            raw: ProviderMessage::default(),
            parsed: Some(value),
        }
    }

    /// Structured reply that failed validation, carrying only the raw message
    pub fn unparsed(raw: ProviderMessage) -> Self {
        ModelReply::Structured { raw, parsed: None }
    }
}

/// Provider-native chat message
///
/// Different providers report tool output in different places; each location
/// is an explicit optional field with its own accessor.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProviderMessage {
    /// Text content of the message
    #[serde(default)]
    pub content: String,

    /// OpenAI-style tool calls (JSON-encoded argument strings)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub tool_calls: Vec<ToolCall>,

    /// Legacy function-call payload (JSON-encoded argument string)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_call: Option<FunctionCall>,

    /// Native tool calls with already-decoded argument objects
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub native_tool_calls: Vec<NativeToolCall>,
}

impl ProviderMessage {
    /// Plain message with text content only
    pub fn text(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    /// Argument string of the first OpenAI-style tool call
    pub fn tool_call_arguments(&self) -> Option<&str> {
        self.tool_calls
            .first()
            .map(|call| call.function.arguments.as_str())
    }

    /// Argument string of the function call
    pub fn function_call_arguments(&self) -> Option<&str> {
        self.function_call
            .as_ref()
            .map(|call| call.arguments.as_str())
    }

    /// Argument object of the first native tool call
    pub fn native_tool_call_args(&self) -> Option<&Value> {
        self.native_tool_calls.first().map(|call| &call.args)
    }
}

/// OpenAI-style tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    /// Called function
    pub function: ToolCallFunction,
}

/// Function reference inside an OpenAI-style tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCallFunction {
    /// Function name
    #[serde(default)]
    pub name: String,
    /// JSON-encoded arguments
    pub arguments: String,
}

/// Function-call-style payload
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionCall {
    /// Function name
    #[serde(default)]
    pub name: String,
    /// JSON-encoded arguments
    pub arguments: String,
}

/// Native tool call whose arguments are already an object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeToolCall {
    /// Tool name
    #[serde(default)]
    pub name: String,
    /// Decoded arguments
    pub args: Value,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_accessors_on_empty_message() {
        let msg = ProviderMessage::text("hello");
        assert_eq!(msg.tool_call_arguments(), None);
        assert_eq!(msg.function_call_arguments(), None);
        assert_eq!(msg.native_tool_call_args(), None);
    }

    #[test]
    fn test_accessors_pick_first_call() {
        let msg: ProviderMessage = serde_json::from_value(json!({
            "tool_calls": [
                {"function": {"name": "DynamicGraph", "arguments": "{\"nodes\": []}"}},
                {"function": {"name": "Other", "arguments": "{}"}}
            ],
            "native_tool_calls": [{"name": "DynamicGraph", "args": {"nodes": []}}]
        }))
        .unwrap();

        assert_eq!(msg.tool_call_arguments(), Some("{\"nodes\": []}"));
        assert_eq!(msg.native_tool_call_args(), Some(&json!({"nodes": []})));
    }

    #[test]
    fn test_request_structured_flag() {
        let request = ModelRequest {
            system: "s".to_string(),
            user: "u".to_string(),
            schema: None,
        };
        assert!(!request.is_structured());
    }
}
