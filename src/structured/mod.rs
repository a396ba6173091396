//! Schema validation for model-produced tool arguments.
//!
//! - `ArgumentValidator`: validate untrusted JSON against a tool schema
//! - `ValidationResult`: decision plus the validated value
//! - `ValidationError` / `ViolationKind`: structured violations
//!
//! # Examples
//!
//! ```
//! use newsletter_agent::structured::{ArgumentValidator, ViolationKind};
//! use serde_json::json;
//!
//! let schema = json!({
//!     "type": "object",
//!     "properties": {
//!         "issueId": {"type": "string"},
//!         "count": {"type": "integer"}
//!     },
//!     "required": ["issueId"]
//! });
//!
//! let validator = ArgumentValidator::strict(schema);
//! assert!(validator.validate(json!({"issueId": "198", "count": 2})).is_valid());
//!
//! let rejected = validator.validate(json!({"issueId": "198", "count": "2"}));
//! assert!(rejected.has_violation(ViolationKind::WrongType));
//! ```

pub mod error;
pub mod schema;
pub mod validator;

pub use error::{ValidationError, ValidationResult, ViolationKind};
pub use schema::{check_tool_schema, json_schema_from_type, SchemaGenerator};
pub use validator::{ArgumentValidator, IntoValidatorData, COERCE_KEYWORD};
