//! Tool descriptors: a named capability, its argument schema, and its handler.

use crate::structured::{ArgumentValidator, ValidationError, ValidationResult, ViolationKind};
use crate::tools::TenantContext;
use crate::types::ToolDefinition;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::sync::Arc;

/// Outcome reported by a tool handler.
///
/// `success: false` promises that the handler made no observable change.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ToolResult {
    pub fn ok(payload: Value) -> Self {
        Self {
            success: true,
            payload: Some(payload),
            error: None,
        }
    }

    pub fn ok_empty() -> Self {
        Self {
            success: true,
            payload: None,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            payload: None,
            error: Some(error.into()),
        }
    }
}

/// A side-effecting capability the model may select.
///
/// Arguments reach [`Tool::call`] only after they passed [`Tool::schema`] validation and
/// decoded into `Args`; handlers never see raw maps.
#[async_trait]
pub trait Tool: Send + Sync + 'static {
    type Args: DeserializeOwned + Send + 'static;

    /// Dispatch key and model-facing function name.
    fn name(&self) -> &str;

    /// Shown to the model to explain when this tool applies.
    fn description(&self) -> &str;

    /// JSON Schema (object) for the arguments.
    fn schema(&self) -> Value;

    /// Whether the handler needs a tenant id in its context.
    fn is_multi_tenant(&self) -> bool {
        true
    }

    async fn call(&self, ctx: &TenantContext, args: Self::Args) -> ToolResult;
}

#[async_trait]
trait ErasedCall: Send {
    async fn call(self: Box<Self>, ctx: &TenantContext) -> ToolResult;
}

struct TypedCall<T: Tool> {
    tool: Arc<T>,
    args: T::Args,
}

#[async_trait]
impl<T: Tool> ErasedCall for TypedCall<T> {
    async fn call(self: Box<Self>, ctx: &TenantContext) -> ToolResult {
        let TypedCall { tool, args } = *self;
        tool.call(ctx, args).await
    }
}

trait ErasedHandler: Send + Sync {
    fn bind(&self, args: Value) -> Result<Box<dyn ErasedCall>, ValidationError>;
}

struct TypedHandler<T: Tool> {
    tool: Arc<T>,
}

impl<T: Tool> ErasedHandler for TypedHandler<T> {
    fn bind(&self, args: Value) -> Result<Box<dyn ErasedCall>, ValidationError> {
        let decoded: T::Args = serde_json::from_value(args).map_err(|e| {
            ValidationError::new(
                ViolationKind::Decode,
                format!("Arguments do not decode into the tool's type: {}", e),
                "",
            )
        })?;
        Ok(Box::new(TypedCall {
            tool: self.tool.clone(),
            args: decoded,
        }))
    }
}

/// Arguments already decoded into a tool's own type, ready to run once.
pub struct BoundCall {
    inner: Box<dyn ErasedCall>,
}

impl BoundCall {
    pub(crate) async fn call(self, ctx: &TenantContext) -> ToolResult {
        self.inner.call(ctx).await
    }
}

/// Immutable, type-erased descriptor held by a [`crate::tools::ToolRegistry`].
#[derive(Clone)]
pub struct ToolDescriptor {
    name: String,
    description: String,
    schema: Value,
    multi_tenant: bool,
    validator: ArgumentValidator,
    handler: Arc<dyn ErasedHandler>,
}

impl ToolDescriptor {
    pub fn from_tool<T: Tool>(tool: T) -> Self {
        Self::from_shared(Arc::new(tool))
    }

    /// Build a descriptor around a tool shared with other registries.
    pub fn from_shared<T: Tool>(tool: Arc<T>) -> Self {
        let schema = tool.schema();
        Self {
            name: tool.name().to_string(),
            description: tool.description().to_string(),
            validator: ArgumentValidator::strict(schema.clone()),
            schema,
            multi_tenant: tool.is_multi_tenant(),
            handler: Arc::new(TypedHandler { tool }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn schema(&self) -> &Value {
        &self.schema
    }

    pub fn is_multi_tenant(&self) -> bool {
        self.multi_tenant
    }

    /// The model-facing signature: name, description and schema, never the handler.
    pub fn signature(&self) -> ToolDefinition {
        ToolDefinition::function(&self.name, &self.description, self.schema.clone())
    }

    /// Validate untrusted arguments. A string is first decoded as JSON, since providers
    /// deliver arguments JSON-encoded; one that does not decode fails as a wrong type.
    pub fn validate(&self, args: &Value) -> ValidationResult {
        match args {
            Value::String(raw) => self.validator.validate(raw.as_str()),
            other => self.validator.validate(other),
        }
    }

    /// Decode validated arguments into the tool's `Args`.
    pub(crate) fn bind(&self, validated: Value) -> Result<BoundCall, ValidationError> {
        self.handler
            .bind(validated)
            .map(|inner| BoundCall { inner })
    }
}

impl fmt::Debug for ToolDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ToolDescriptor")
            .field("name", &self.name)
            .field("multi_tenant", &self.multi_tenant)
            .finish_non_exhaustive()
    }
}
