//! Tenant scoping threaded through every handler invocation.

use serde::{Deserialize, Serialize};

/// Per-invocation scope. Created by the caller, never persisted.
///
/// `trace_id` and `caller` feed logs and telemetry only; authorization is the caller's job
/// and is expressed solely through which `tenant_id` it wires in.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TenantContext {
    pub tenant_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trace_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller: Option<String>,
}

impl TenantContext {
    pub fn new(tenant_id: impl Into<String>) -> Self {
        Self {
            tenant_id: Some(tenant_id.into()),
            trace_id: None,
            caller: None,
        }
    }

    /// A context with no tenant, for single-tenant tools.
    pub fn unscoped() -> Self {
        Self::default()
    }

    pub fn with_trace_id(mut self, trace_id: impl Into<String>) -> Self {
        self.trace_id = Some(trace_id.into());
        self
    }

    pub fn with_caller(mut self, caller: impl Into<String>) -> Self {
        self.caller = Some(caller.into());
        self
    }

    /// The tenant id, treating blank strings as absent.
    pub fn tenant_id(&self) -> Option<&str> {
        self.tenant_id
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }

    pub fn is_scoped(&self) -> bool {
        self.tenant_id().is_some()
    }
}
