//! Argument validator for model-produced tool calls.
//!
//! Validates untrusted JSON against a tool's JSON schema, supporting:
//! - Type validation (string, integer, number, boolean, array, object, null), including
//!   `type` arrays such as `["string", "null"]`
//! - String constraints (minLength, maxLength, pattern), counted in characters
//! - Numeric constraints (minimum, maximum, exclusiveMinimum, exclusiveMaximum)
//! - Array constraints (minItems, maxItems, items schema)
//! - Object constraints (required, properties, additionalProperties)
//! - `enum` and `const`
//!
//! Nothing is coerced unless the property schema carries `"x-coerce": true`, in which case
//! a string holding a number or boolean is converted to the declared type. `$ref` is not
//! resolved; tool schemas are expected to be self-contained.

use crate::structured::error::{ValidationError, ValidationResult, ViolationKind};
use regex::Regex;
use serde_json::{Map, Value};

/// Schema keyword enabling string-to-scalar coercion for one property.
pub const COERCE_KEYWORD: &str = "x-coerce";

/// Validator for tool arguments.
#[derive(Debug, Clone)]
pub struct ArgumentValidator {
    schema: Value,
    /// Reject object keys the schema does not declare, unless the schema says otherwise.
    strict: bool,
}

impl ArgumentValidator {
    pub fn new(schema: Value, strict: bool) -> Self {
        Self { schema, strict }
    }

    /// Unknown fields are rejected unless `additionalProperties` allows them.
    pub fn strict(schema: Value) -> Self {
        Self::new(schema, true)
    }

    /// Unknown fields are accepted unless `additionalProperties` is `false`.
    pub fn lenient(schema: Value) -> Self {
        Self::new(schema, false)
    }

    pub fn schema(&self) -> &Value {
        &self.schema
    }

    /// Validate data against the schema.
    ///
    /// Total over its input: any JSON value yields a decision.
    pub fn validate(&self, data: impl IntoValidatorData) -> ValidationResult {
        let parsed = data.into_value();
        let mut errors = Vec::new();
        let checked = self.check(&parsed, &self.schema, "", &mut errors);
        if errors.is_empty() {
            ValidationResult::success(checked)
        } else {
            ValidationResult::failure(errors)
        }
    }

    /// Check `data` against `schema`, returning the value to hand on (coercions applied).
    fn check(&self, data: &Value, schema: &Value, path: &str, errors: &mut Vec<ValidationError>) -> Value {
        let schema = match schema {
            Value::Bool(true) => return data.clone(),
            Value::Bool(false) => {
                errors.push(
                    ValidationError::new(ViolationKind::UnknownField, "Value not allowed here", path)
                        .with_value(data),
                );
                return data.clone();
            }
            Value::Object(map) => map,
            _ => return data.clone(),
        };

        let is_nullable = schema
            .get("nullable")
            .and_then(|n| n.as_bool())
            .unwrap_or(false);
        if is_nullable && data.is_null() {
            return Value::Null;
        }

        let declared = declared_types(schema);
        let mut value = data.clone();
        if !declared.is_empty() && !declared.iter().any(|t| matches_type(&value, t)) {
            let coerced = if schema.get(COERCE_KEYWORD).and_then(|c| c.as_bool()) == Some(true) {
                coerce(&value, &declared)
            } else {
                None
            };
            match coerced {
                Some(v) => value = v,
                None => {
                    errors.push(
                        ValidationError::new(
                            ViolationKind::WrongType,
                            format!(
                                "Expected type '{}', got '{}'",
                                declared.join("' or '"),
                                type_name(&value)
                            ),
                            path,
                        )
                        .with_value(&value),
                    );
                    return value;
                }
            }
        }

        match &value {
            Value::String(s) => self.validate_string(s, schema, path, errors),
            Value::Number(n) => {
                if let Some(num) = n.as_f64() {
                    self.validate_number(num, schema, path, errors);
                }
            }
            Value::Array(items) => {
                value = Value::Array(self.validate_array(items, schema, path, errors));
            }
            Value::Object(obj) => {
                value = Value::Object(self.validate_object(obj, schema, path, errors));
            }
            _ => {}
        }

        if let Some(enum_values) = schema.get("enum").and_then(|e| e.as_array()) {
            self.validate_enum(&value, enum_values, path, errors);
        }
        if let Some(expected) = schema.get("const") {
            if expected != &value {
                errors.push(
                    ValidationError::new(
                        ViolationKind::NotInEnum,
                        format!("Value must equal {}", expected),
                        path,
                    )
                    .with_value(&value),
                );
            }
        }

        value
    }

    fn validate_string(
        &self,
        s: &str,
        schema: &Map<String, Value>,
        path: &str,
        errors: &mut Vec<ValidationError>,
    ) {
        let len = s.chars().count() as u64;

        if let Some(min_length) = schema.get("minLength").and_then(|m| m.as_u64()) {
            if len < min_length {
                errors.push(ValidationError::new(
                    ViolationKind::TooShort,
                    format!(
                        "String too short ({} characters, minimum {})",
                        len, min_length
                    ),
                    path,
                ));
            }
        }

        if let Some(max_length) = schema.get("maxLength").and_then(|m| m.as_u64()) {
            if len > max_length {
                errors.push(ValidationError::new(
                    ViolationKind::TooLong,
                    format!(
                        "String too long ({} characters, maximum {})",
                        len, max_length
                    ),
                    path,
                ));
            }
        }

        if let Some(pattern) = schema.get("pattern").and_then(|p| p.as_str()) {
            match Regex::new(pattern) {
                Ok(re) => {
                    if !re.is_match(s) {
                        errors.push(
                            ValidationError::new(
                                ViolationKind::PatternMismatch,
                                format!("String does not match pattern {}", pattern),
                                path,
                            )
                            .with_value(&Value::String(s.to_string())),
                        );
                    }
                }
                // Fail closed: an unusable pattern must not let arbitrary strings through.
                Err(e) => errors.push(ValidationError::new(
                    ViolationKind::InvalidSchema,
                    format!("Schema pattern does not compile: {}", e),
                    path,
                )),
            }
        }
    }

    fn validate_number(
        &self,
        value: f64,
        schema: &Map<String, Value>,
        path: &str,
        errors: &mut Vec<ValidationError>,
    ) {
        let mut out_of_range = |message: String| {
            errors.push(ValidationError::new(ViolationKind::OutOfRange, message, path));
        };

        if let Some(minimum) = schema.get("minimum").and_then(|m| m.as_f64()) {
            if value < minimum {
                out_of_range(format!("Value {} below minimum ({})", value, minimum));
            }
        }
        if let Some(maximum) = schema.get("maximum").and_then(|m| m.as_f64()) {
            if value > maximum {
                out_of_range(format!("Value {} above maximum ({})", value, maximum));
            }
        }
        if let Some(bound) = schema.get("exclusiveMinimum").and_then(|m| m.as_f64()) {
            if value <= bound {
                out_of_range(format!("Value {} must be greater than {}", value, bound));
            }
        }
        if let Some(bound) = schema.get("exclusiveMaximum").and_then(|m| m.as_f64()) {
            if value >= bound {
                out_of_range(format!("Value {} must be less than {}", value, bound));
            }
        }
    }

    fn validate_array(
        &self,
        items: &[Value],
        schema: &Map<String, Value>,
        path: &str,
        errors: &mut Vec<ValidationError>,
    ) -> Vec<Value> {
        if let Some(min_items) = schema.get("minItems").and_then(|m| m.as_u64()) {
            if (items.len() as u64) < min_items {
                errors.push(ValidationError::new(
                    ViolationKind::TooFewItems,
                    format!("Array too short (minimum {} items)", min_items),
                    path,
                ));
            }
        }

        if let Some(max_items) = schema.get("maxItems").and_then(|m| m.as_u64()) {
            if (items.len() as u64) > max_items {
                errors.push(ValidationError::new(
                    ViolationKind::TooManyItems,
                    format!("Array too long (maximum {} items)", max_items),
                    path,
                ));
            }
        }

        match schema.get("items") {
            Some(items_schema) => items
                .iter()
                .enumerate()
                .map(|(i, item)| {
                    let item_path = format!("{}[{}]", path, i);
                    self.check(item, items_schema, &item_path, errors)
                })
                .collect(),
            None => items.to_vec(),
        }
    }

    fn validate_object(
        &self,
        obj: &Map<String, Value>,
        schema: &Map<String, Value>,
        path: &str,
        errors: &mut Vec<ValidationError>,
    ) -> Map<String, Value> {
        let required = schema
            .get("required")
            .and_then(|r| r.as_array())
            .map(|arr| arr.iter().filter_map(|v| v.as_str()).collect::<Vec<_>>())
            .unwrap_or_default();

        for prop_name in required {
            if !obj.contains_key(prop_name) {
                errors.push(ValidationError::new(
                    ViolationKind::MissingField,
                    format!("Missing required property: {}", prop_name),
                    &child_path(path, prop_name),
                ));
            }
        }

        let properties = schema.get("properties").and_then(|p| p.as_object());
        let additional = schema.get("additionalProperties");

        let mut out = Map::with_capacity(obj.len());
        for (key, value) in obj {
            let prop_path = child_path(path, key);
            if let Some(prop_schema) = properties.and_then(|p| p.get(key)) {
                let checked = self.check(value, prop_schema, &prop_path, errors);
                out.insert(key.clone(), checked);
                continue;
            }

            let allowed = match additional {
                Some(Value::Bool(b)) => *b,
                Some(extra_schema @ Value::Object(_)) => {
                    let checked = self.check(value, extra_schema, &prop_path, errors);
                    out.insert(key.clone(), checked);
                    continue;
                }
                _ => !self.strict,
            };

            if allowed {
                out.insert(key.clone(), value.clone());
            } else {
                errors.push(ValidationError::new(
                    ViolationKind::UnknownField,
                    format!("Additional property not allowed: {}", key),
                    &prop_path,
                ));
            }
        }
        out
    }

    fn validate_enum(
        &self,
        data: &Value,
        enum_values: &[Value],
        path: &str,
        errors: &mut Vec<ValidationError>,
    ) {
        if !enum_values.contains(data) {
            let allowed: Vec<String> = enum_values
                .iter()
                .map(|v| match v {
                    Value::String(s) => format!("\"{}\"", s),
                    _ => v.to_string(),
                })
                .collect();
            errors.push(
                ValidationError::new(
                    ViolationKind::NotInEnum,
                    format!("Value not in allowed enum values: {}", allowed.join(", ")),
                    path,
                )
                .with_value(data),
            );
        }
    }
}

fn child_path(parent: &str, key: &str) -> String {
    if parent.is_empty() {
        key.to_string()
    } else {
        format!("{}.{}", parent, key)
    }
}

fn declared_types(schema: &Map<String, Value>) -> Vec<&str> {
    match schema.get("type") {
        Some(Value::String(t)) => vec![t.as_str()],
        Some(Value::Array(ts)) => ts.iter().filter_map(|t| t.as_str()).collect(),
        _ => Vec::new(),
    }
}

fn matches_type(data: &Value, expected: &str) -> bool {
    match expected {
        "string" => data.is_string(),
        "integer" => data.is_i64() || data.is_u64(),
        "number" => data.is_number(),
        "boolean" => data.is_boolean(),
        "array" => data.is_array(),
        "object" => data.is_object(),
        "null" => data.is_null(),
        // Unknown type names never match; a typo in a schema must not open it up.
        _ => false,
    }
}

fn type_name(data: &Value) -> &'static str {
    match data {
        Value::String(_) => "string",
        Value::Number(_) => {
            if data.is_i64() || data.is_u64() {
                "integer"
            } else {
                "number"
            }
        }
        Value::Bool(_) => "boolean",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
        Value::Null => "null",
    }
}

fn coerce(data: &Value, declared: &[&str]) -> Option<Value> {
    let raw = data.as_str()?.trim();
    declared.iter().find_map(|t| match *t {
        "integer" => raw.parse::<i64>().ok().map(Value::from),
        "number" => raw
            .parse::<f64>()
            .ok()
            .and_then(serde_json::Number::from_f64)
            .map(Value::Number),
        "boolean" => match raw {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        _ => None,
    })
}

/// Trait for types that can be converted to validator data.
pub trait IntoValidatorData {
    fn into_value(self) -> Value;
}

impl IntoValidatorData for Value {
    fn into_value(self) -> Value {
        self
    }
}

impl IntoValidatorData for &Value {
    fn into_value(self) -> Value {
        self.clone()
    }
}

impl IntoValidatorData for &str {
    fn into_value(self) -> Value {
        // Try to parse as JSON, fall back to string
        serde_json::from_str(self).unwrap_or_else(|_| Value::String(self.to_string()))
    }
}

impl IntoValidatorData for String {
    fn into_value(self) -> Value {
        #[allow(clippy::unnecessary_lazy_evaluations)]
        serde_json::from_str(&self).unwrap_or_else(|_| Value::String(self))
    }
}
