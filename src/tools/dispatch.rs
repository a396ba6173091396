//! Resolve a model-selected tool, enforce tenancy, validate, and invoke exactly once.

use crate::structured::ValidationError;
use crate::tools::descriptor::BoundCall;
use crate::tools::{TenantContext, ToolRegistry, ToolResult};
use futures::FutureExt;
use serde_json::Value;
use std::any::Any;
use std::panic::AssertUnwindSafe;
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DispatchError {
    #[error("unknown tool '{name}'")]
    UnknownTool { name: String },

    #[error("tool '{tool}' requires a tenant id in its context")]
    MissingTenantScope { tool: String },

    #[error("invalid arguments for '{tool}': {}", join_violations(.violations))]
    InvalidArguments {
        tool: String,
        violations: Vec<ValidationError>,
    },

    /// The handler faulted; the fault was caught at the dispatch boundary.
    #[error("tool '{tool}' failed: {message}")]
    HandlerFailure { tool: String, message: String },
}

fn join_violations(violations: &[ValidationError]) -> String {
    violations
        .iter()
        .map(|v| v.to_string())
        .collect::<Vec<_>>()
        .join("; ")
}

/// A call that resolved, passed the scope check and decoded into its tool's arguments.
/// Nothing has run yet.
pub struct PreparedCall<'a> {
    tool: &'a str,
    bound: BoundCall,
}

impl PreparedCall<'_> {
    pub fn tool(&self) -> &str {
        self.tool
    }

    /// Run the handler once. A panic is caught here and reported as a handler failure.
    pub async fn invoke(self, ctx: &TenantContext) -> Result<ToolResult, DispatchError> {
        let name = self.tool;
        debug!(tool = name, tenant_id = ?ctx.tenant_id(), trace_id = ?ctx.trace_id, "invoking tool handler");

        match AssertUnwindSafe(self.bound.call(ctx)).catch_unwind().await {
            Ok(result) => Ok(result),
            Err(panic) => {
                let message = panic_message(panic.as_ref());
                warn!(tool = name, tenant_id = ?ctx.tenant_id(), %message, "tool handler panicked");
                Err(DispatchError::HandlerFailure {
                    tool: name.to_string(),
                    message,
                })
            }
        }
    }
}

/// Everything that happens before the handler: resolve the name, enforce tenancy,
/// validate and decode the arguments.
pub fn prepare<'a>(
    registry: &'a ToolRegistry,
    name: &str,
    arguments: &Value,
    ctx: &TenantContext,
) -> Result<PreparedCall<'a>, DispatchError> {
    let Some(descriptor) = registry.get(name) else {
        warn!(tool = name, tenant_id = ?ctx.tenant_id(), "rejected call to unknown tool");
        return Err(DispatchError::UnknownTool {
            name: name.to_string(),
        });
    };

    if descriptor.is_multi_tenant() && !ctx.is_scoped() {
        warn!(tool = name, trace_id = ?ctx.trace_id, "rejected multi-tenant tool without tenant scope");
        return Err(DispatchError::MissingTenantScope {
            tool: name.to_string(),
        });
    }

    let rejected = |violations: Vec<ValidationError>| {
        warn!(
            tool = name,
            tenant_id = ?ctx.tenant_id(),
            violations = %join_violations(&violations),
            "rejected tool arguments"
        );
        DispatchError::InvalidArguments {
            tool: name.to_string(),
            violations,
        }
    };

    let validated = descriptor.validate(arguments).into_result().map_err(&rejected)?;
    let bound = descriptor
        .bind(validated)
        .map_err(|decode| rejected(vec![decode]))?;

    Ok(PreparedCall {
        tool: descriptor.name(),
        bound,
    })
}

/// Dispatch one tool call.
///
/// The handler runs only after the name resolves, the tenant scope is satisfied and the
/// arguments validate. Whatever it returns, success or not, comes back unchanged. There
/// is no retry here: handlers are not idempotent by contract.
pub async fn dispatch(
    registry: &ToolRegistry,
    name: &str,
    arguments: &Value,
    ctx: &TenantContext,
) -> Result<ToolResult, DispatchError> {
    prepare(registry, name, arguments, ctx)?.invoke(ctx).await
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        format!("handler panicked: {}", s)
    } else if let Some(s) = payload.downcast_ref::<String>() {
        format!("handler panicked: {}", s)
    } else {
        "handler panicked".to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::structured::ViolationKind;
    use crate::tools::test_support::{LooseTool, PanickingTool, SpyTool};
    use crate::tools::ToolDescriptor;
    use serde_json::json;

    fn registry(spy: &SpyTool) -> ToolRegistry {
        ToolRegistry::new(vec![
            ToolDescriptor::from_tool(spy.clone()),
            ToolDescriptor::from_tool(PanickingTool),
        ])
        .unwrap()
    }

    #[tokio::test]
    async fn test_valid_call_invokes_once_and_returns_result_unchanged() {
        let spy = SpyTool::multi_tenant("spy");
        let reg = registry(&spy);
        let result = dispatch(&reg, "spy", &json!({"label": "hello"}), &TenantContext::new("t1"))
            .await
            .unwrap();
        assert_eq!(spy.calls(), 1);
        assert_eq!(result, ToolResult::ok(json!({"label": "hello", "tenant": "t1"})));
    }

    #[tokio::test]
    async fn test_unknown_tool() {
        let spy = SpyTool::multi_tenant("spy");
        let reg = registry(&spy);
        let err = dispatch(&reg, "deleteEverything", &json!({}), &TenantContext::new("t1"))
            .await
            .unwrap_err();
        assert_eq!(
            err,
            DispatchError::UnknownTool {
                name: "deleteEverything".into()
            }
        );
        assert_eq!(spy.calls(), 0);
    }

    #[tokio::test]
    async fn test_missing_tenant_scope() {
        let spy = SpyTool::multi_tenant("spy");
        let reg = registry(&spy);
        let err = dispatch(&reg, "spy", &json!({"label": "x"}), &TenantContext::unscoped())
            .await
            .unwrap_err();
        assert!(matches!(err, DispatchError::MissingTenantScope { .. }));
        assert_eq!(spy.calls(), 0);
    }

    #[tokio::test]
    async fn test_single_tenant_tool_runs_unscoped() {
        let spy = SpyTool::single_tenant("spy");
        let reg = ToolRegistry::new(vec![ToolDescriptor::from_tool(spy.clone())]).unwrap();
        let result = dispatch(&reg, "spy", &json!({"label": "x"}), &TenantContext::unscoped())
            .await
            .unwrap();
        assert!(result.success);
        assert_eq!(spy.calls(), 1);
    }

    #[tokio::test]
    async fn test_invalid_arguments_never_reach_handler() {
        let spy = SpyTool::multi_tenant("spy");
        let reg = registry(&spy);
        for bad in [
            json!({}),
            json!({"label": 7}),
            json!({"label": ""}),
            json!({"label": "ok", "extra": true}),
            json!("{\"label\": \"ok\""),
            json!(null),
        ] {
            let err = dispatch(&reg, "spy", &bad, &TenantContext::new("t1"))
                .await
                .unwrap_err();
            assert!(
                matches!(err, DispatchError::InvalidArguments { .. }),
                "{:?} gave {:?}",
                bad,
                err
            );
        }
        assert_eq!(spy.calls(), 0);
    }

    #[tokio::test]
    async fn test_handler_failure_result_is_returned_unchanged() {
        let spy = SpyTool::multi_tenant("spy");
        let reg = registry(&spy);
        let result = dispatch(&reg, "spy", &json!({"label": "fail"}), &TenantContext::new("t1"))
            .await
            .unwrap();
        assert_eq!(result, ToolResult::failed("asked to fail"));
        assert_eq!(spy.calls(), 1);
    }

    #[tokio::test]
    async fn test_handler_panic_is_normalized() {
        let spy = SpyTool::multi_tenant("spy");
        let reg = registry(&spy);
        let err = dispatch(&reg, "explode", &json!({}), &TenantContext::new("t1"))
            .await
            .unwrap_err();
        match err {
            DispatchError::HandlerFailure { tool, message } => {
                assert_eq!(tool, "explode");
                assert!(message.contains("boom"));
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_prepare_runs_nothing_until_invoked() {
        let spy = SpyTool::multi_tenant("spy");
        let reg = registry(&spy);
        let ctx = TenantContext::new("t1");

        let prepared = prepare(&reg, "spy", &json!({"label": "x"}), &ctx).unwrap();
        assert_eq!(prepared.tool(), "spy");
        assert_eq!(spy.calls(), 0);

        assert!(prepared.invoke(&ctx).await.unwrap().success);
        assert_eq!(spy.calls(), 1);
    }

    #[test]
    fn test_typed_decode_failure_is_caught_while_preparing() {
        let reg = ToolRegistry::new(vec![ToolDescriptor::from_tool(LooseTool)]).unwrap();
        let err = prepare(&reg, "loose", &json!({"count": "many"}), &TenantContext::new("t1"))
            .err()
            .unwrap();
        match err {
            DispatchError::InvalidArguments { violations, .. } => {
                assert_eq!(violations[0].kind, ViolationKind::Decode);
            }
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_invalid_arguments_display_lists_violations() {
        let err = DispatchError::InvalidArguments {
            tool: "spy".into(),
            violations: vec![crate::structured::ValidationError::new(
                ViolationKind::MissingField,
                "Missing required property: label",
                "label",
            )],
        };
        assert_eq!(
            err.to_string(),
            "invalid arguments for 'spy': label: Missing required property: label"
        );
    }
}
