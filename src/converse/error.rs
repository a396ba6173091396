use crate::structured::ValidationError;
use crate::tools::{DispatchError, ToolResult};
use serde::{Deserialize, Serialize};
use std::fmt;
use thiserror::Error;

/// Stable failure code for logs, telemetry and caller-facing payloads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureKind {
    /// The model answered in prose.
    NoToolSelected,
    /// Transport fault, timeout or unreadable response from the model.
    ModelError,
    UnknownTool,
    MissingTenantScope,
    InvalidArguments,
    /// The handler reported `success: false` or panicked.
    HandlerFailure,
}

impl FailureKind {
    #[inline]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::NoToolSelected => "no_tool_selected",
            Self::ModelError => "model_error",
            Self::UnknownTool => "unknown_tool",
            Self::MissingTenantScope => "missing_tenant_scope",
            Self::InvalidArguments => "invalid_arguments",
            Self::HandlerFailure => "handler_failure",
        }
    }

    /// Failures raised before any handler could have run.
    pub fn is_pre_dispatch(&self) -> bool {
        !matches!(self, Self::HandlerFailure)
    }
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Terminal failure of one conversation. Returned as a value, never raised.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConverseError {
    #[error("model did not select a tool")]
    NoToolSelected { text: String },

    #[error("model error: {message}")]
    ModelError { message: String },

    #[error("unknown tool '{name}'")]
    UnknownTool { name: String },

    #[error("tool '{tool}' requires a tenant id in its context")]
    MissingTenantScope { tool: String },

    #[error("invalid arguments for '{tool}': {} violation(s)", .violations.len())]
    InvalidArguments {
        tool: String,
        violations: Vec<ValidationError>,
    },

    /// `result` holds the handler's own report when it returned one.
    #[error("tool '{tool}' failed: {message}")]
    HandlerFailure {
        tool: String,
        message: String,
        result: Option<ToolResult>,
    },
}

impl ConverseError {
    pub fn kind(&self) -> FailureKind {
        match self {
            Self::NoToolSelected { .. } => FailureKind::NoToolSelected,
            Self::ModelError { .. } => FailureKind::ModelError,
            Self::UnknownTool { .. } => FailureKind::UnknownTool,
            Self::MissingTenantScope { .. } => FailureKind::MissingTenantScope,
            Self::InvalidArguments { .. } => FailureKind::InvalidArguments,
            Self::HandlerFailure { .. } => FailureKind::HandlerFailure,
        }
    }

    pub fn violations(&self) -> &[ValidationError] {
        match self {
            Self::InvalidArguments { violations, .. } => violations,
            _ => &[],
        }
    }
}

impl From<DispatchError> for ConverseError {
    fn from(err: DispatchError) -> Self {
        match err {
            DispatchError::UnknownTool { name } => Self::UnknownTool { name },
            DispatchError::MissingTenantScope { tool } => Self::MissingTenantScope { tool },
            DispatchError::InvalidArguments { tool, violations } => {
                Self::InvalidArguments { tool, violations }
            }
            DispatchError::HandlerFailure { tool, message } => Self::HandlerFailure {
                tool,
                message,
                result: None,
            },
        }
    }
}
