//! Model-facing tool signatures and model-produced tool calls.

use serde::{Deserialize, Serialize};

/// Tool definition offered to the model (the handler never leaves the process).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolDefinition {
    #[serde(rename = "type")]
    pub tool_type: String, // "function"
    pub function: FunctionDefinition,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FunctionDefinition {
    pub name: String,
    pub description: Option<String>,
    pub parameters: Option<serde_json::Value>, // JSON Schema
}

impl ToolDefinition {
    pub fn function(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: serde_json::Value,
    ) -> Self {
        Self {
            tool_type: "function".to_string(),
            function: FunctionDefinition {
                name: name.into(),
                description: Some(description.into()),
                parameters: Some(parameters),
            },
        }
    }

    pub fn name(&self) -> &str {
        &self.function.name
    }
}

/// Tool call (invocation from model)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolCall {
    pub id: String,
    pub name: String,
    /// Untrusted and undecoded: providers usually send a JSON-encoded string, which
    /// dispatch decodes exactly once.
    pub arguments: serde_json::Value,
}

impl ToolCall {
    pub fn new(id: impl Into<String>, name: impl Into<String>, arguments: serde_json::Value) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            arguments,
        }
    }
}

/// What the model capability answered with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ModelOutput {
    ToolCalls { calls: Vec<ToolCall> },
    Text { text: String },
}

impl ModelOutput {
    pub fn tool_call(name: impl Into<String>, arguments: serde_json::Value) -> Self {
        ModelOutput::ToolCalls {
            calls: vec![ToolCall::new("call_0", name, arguments)],
        }
    }

    pub fn text(text: impl Into<String>) -> Self {
        ModelOutput::Text { text: text.into() }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_definition_serializes_openai_shape() {
        let def = ToolDefinition::function("noop", "Does nothing", json!({"type": "object"}));
        let v = serde_json::to_value(&def).unwrap();
        assert_eq!(v["type"], "function");
        assert_eq!(v["function"]["name"], "noop");
        assert_eq!(v["function"]["parameters"]["type"], "object");
    }
}
