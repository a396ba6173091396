//! Schema construction and compilation checks for tool argument schemas.

use jsonschema::{Draft, JSONSchema};
use serde_json::json;

/// Builder for closed object schemas: every property is required and unknown properties
/// are rejected.
#[derive(Debug, Clone, Default)]
pub struct SchemaGenerator {
    title: Option<String>,
    properties: Vec<(String, serde_json::Value)>,
    required: Vec<String>,
}

impl SchemaGenerator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    /// Add a property and mark it required in one step.
    pub fn add_required_property(
        mut self,
        name: impl Into<String>,
        schema: serde_json::Value,
    ) -> Self {
        let name = name.into();
        self.required.push(name.clone());
        self.properties.push((name, schema));
        self
    }

    pub fn build(self) -> serde_json::Value {
        let mut map = serde_json::Map::new();
        map.insert("type".into(), json!("object"));

        let mut properties = serde_json::Map::new();
        for (name, schema) in self.properties {
            properties.insert(name, schema);
        }
        map.insert("properties".into(), properties.into());

        if !self.required.is_empty() {
            map.insert("required".into(), self.required.into());
        }

        map.insert("additionalProperties".into(), json!(false));

        if let Some(title) = self.title {
            map.insert("title".into(), title.into());
        }

        map.into()
    }
}

/// Derive a schema from a Rust argument type.
///
/// Pair with `#[serde(deny_unknown_fields)]` on the type so the derived schema carries
/// `additionalProperties: false`.
pub fn json_schema_from_type<T: schemars::JsonSchema>() -> serde_json::Value {
    let schema = schemars::schema_for!(T);
    serde_json::to_value(&schema).unwrap_or_else(|_| json!({}))
}

/// Check that a tool schema is usable: it must compile as a Draft 7 JSON Schema and
/// describe an object, since tool arguments are always objects.
pub fn check_tool_schema(schema: &serde_json::Value) -> Result<(), String> {
    JSONSchema::options()
        .with_draft(Draft::Draft7)
        .compile(schema)
        .map_err(|e| format!("schema does not compile: {}", e))?;

    match schema.get("type") {
        Some(serde_json::Value::String(t)) if t == "object" => Ok(()),
        Some(other) => Err(format!("tool schema root must be an object, found type {}", other)),
        None => Err("tool schema root must declare \"type\": \"object\"".to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[test]
    fn test_schema_generator_basic() {
        let schema = SchemaGenerator::new()
            .title("Post")
            .add_required_property("copy", json!({"type": "string"}))
            .add_required_property("issueId", json!({"type": "string"}))
            .build();

        assert_eq!(schema["type"], "object");
        assert_eq!(schema["title"], "Post");
        assert_eq!(schema["properties"]["copy"]["type"], "string");
        assert_eq!(schema["required"], json!(["copy", "issueId"]));
        assert_eq!(schema["additionalProperties"], false);
    }

    #[test]
    fn test_empty_generator_is_a_closed_object() {
        let schema = SchemaGenerator::new().build();
        assert_eq!(schema["properties"], json!({}));
        assert!(schema.get("required").is_none());
        assert!(check_tool_schema(&schema).is_ok());
    }

    #[derive(Deserialize, schemars::JsonSchema)]
    #[serde(deny_unknown_fields, rename_all = "camelCase")]
    #[allow(dead_code)]
    struct Sample {
        issue_id: String,
        note: Option<String>,
    }

    #[test]
    fn test_json_schema_from_type() {
        let schema = json_schema_from_type::<Sample>();
        assert_eq!(schema["type"], "object");
        assert_eq!(schema["additionalProperties"], false);
        assert_eq!(schema["required"], json!(["issueId"]));
        assert!(check_tool_schema(&schema).is_ok());
    }

    #[test]
    fn test_check_tool_schema_rejects_non_objects() {
        assert!(check_tool_schema(&json!({"type": "string"})).is_err());
        assert!(check_tool_schema(&json!({})).is_err());
        assert!(check_tool_schema(&json!({"type": 12})).is_err());
    }
}
