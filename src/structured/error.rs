//! Violation types reported by the argument validator.

use serde::Serialize;
use std::fmt;

/// What kind of constraint a value broke.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ViolationKind {
    MissingField,
    WrongType,
    TooShort,
    TooLong,
    OutOfRange,
    NotInEnum,
    PatternMismatch,
    UnknownField,
    TooFewItems,
    TooManyItems,
    /// The schema itself could not be applied (e.g. an invalid `pattern`).
    InvalidSchema,
    /// Arguments passed validation but did not decode into the handler's type.
    Decode,
}

impl ViolationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MissingField => "missing_field",
            Self::WrongType => "wrong_type",
            Self::TooShort => "too_short",
            Self::TooLong => "too_long",
            Self::OutOfRange => "out_of_range",
            Self::NotInEnum => "not_in_enum",
            Self::PatternMismatch => "pattern_mismatch",
            Self::UnknownField => "unknown_field",
            Self::TooFewItems => "too_few_items",
            Self::TooManyItems => "too_many_items",
            Self::InvalidSchema => "invalid_schema",
            Self::Decode => "decode",
        }
    }
}

impl fmt::Display for ViolationKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Validation error with location information.
///
/// Contains details about what failed and where in the argument object.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidationError {
    pub kind: ViolationKind,
    /// Error message describing what went wrong
    pub message: String,
    /// Path to the error location (e.g., "copy", "insights[0]"); `None` for the root value
    pub path: Option<String>,
    /// The offending value, when small enough to be useful in logs
    #[serde(skip_serializing_if = "Option::is_none")]
    pub value: Option<serde_json::Value>,
}

impl ValidationError {
    pub fn new(kind: ViolationKind, message: impl Into<String>, path: &str) -> Self {
        Self {
            kind,
            message: message.into(),
            path: if path.is_empty() {
                None
            } else {
                Some(path.to_string())
            },
            value: None,
        }
    }

    pub fn with_value(mut self, value: &serde_json::Value) -> Self {
        // Large payloads (e.g. a whole post body) stay out of the violation list.
        let small = match value {
            serde_json::Value::String(s) => s.chars().count() <= 64,
            serde_json::Value::Array(_) | serde_json::Value::Object(_) => false,
            _ => true,
        };
        if small {
            self.value = Some(value.clone());
        }
        self
    }
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.path {
            Some(path) => write!(f, "{}: {}", path, self.message),
            None => write!(f, "{}", self.message),
        }
    }
}

impl std::error::Error for ValidationError {}

/// Result of validation operation.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ValidationResult {
    /// Whether validation passed
    pub valid: bool,
    /// List of validation errors (empty if valid)
    pub errors: Vec<ValidationError>,
    /// Validated data, with any opted-in coercions applied (None if invalid)
    pub data: Option<serde_json::Value>,
}

impl ValidationResult {
    pub fn success(data: serde_json::Value) -> Self {
        Self {
            valid: true,
            errors: Vec::new(),
            data: Some(data),
        }
    }

    pub fn failure(errors: Vec<ValidationError>) -> Self {
        Self {
            valid: false,
            errors,
            data: None,
        }
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    pub fn data(&self) -> Option<&serde_json::Value> {
        self.data.as_ref()
    }

    /// Get errors as formatted strings.
    pub fn error_messages(&self) -> Vec<String> {
        self.errors.iter().map(|e| e.to_string()).collect()
    }

    pub fn has_violation(&self, kind: ViolationKind) -> bool {
        self.errors.iter().any(|e| e.kind == kind)
    }

    pub fn into_result(self) -> Result<serde_json::Value, Vec<ValidationError>> {
        if self.valid {
            Ok(self.data.unwrap_or(serde_json::Value::Null))
        } else {
            Err(self.errors)
        }
    }
}

impl From<ValidationError> for ValidationResult {
    fn from(error: ValidationError) -> Self {
        Self::failure(vec![error])
    }
}

impl From<Vec<ValidationError>> for ValidationResult {
    fn from(errors: Vec<ValidationError>) -> Self {
        Self::failure(errors)
    }
}
