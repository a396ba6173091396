//! Tool descriptors, the per-conversation registry, and dispatch.
//!
//! | Item | Description |
//! |------|-------------|
//! | [`Tool`] | Typed capability: name, description, schema, handler |
//! | [`ToolDescriptor`] | Type-erased, immutable wrapper used for dispatch |
//! | [`ToolRegistry`] | Unique-name set of descriptors for one conversation |
//! | [`TenantContext`] | Tenant id plus observability metadata |
//! | [`prepare`] | Resolve, scope-check, validate, decode |
//! | [`dispatch`] | [`prepare`], then invoke once |

mod context;
mod descriptor;
mod dispatch;
mod registry;

pub use context::TenantContext;
pub use descriptor::{Tool, ToolDescriptor, ToolResult};
pub use dispatch::{dispatch, prepare, DispatchError, PreparedCall};
pub use registry::{RegistryError, ToolRegistry};

#[cfg(test)]
pub(crate) mod test_support {
    use super::{TenantContext, Tool, ToolResult};
    use async_trait::async_trait;
    use serde::Deserialize;
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    /// Counts handler invocations. `label: "fail"` makes it report failure.
    #[derive(Clone)]
    pub struct SpyTool {
        name: String,
        multi_tenant: bool,
        calls: Arc<AtomicUsize>,
    }

    impl SpyTool {
        pub fn multi_tenant(name: &str) -> Self {
            Self {
                name: name.to_string(),
                multi_tenant: true,
                calls: Arc::new(AtomicUsize::new(0)),
            }
        }

        pub fn single_tenant(name: &str) -> Self {
            Self {
                multi_tenant: false,
                ..Self::multi_tenant(name)
            }
        }

        pub fn calls(&self) -> usize {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[derive(Deserialize)]
    pub struct SpyArgs {
        label: String,
    }

    #[async_trait]
    impl Tool for SpyTool {
        type Args = SpyArgs;

        fn name(&self) -> &str {
            &self.name
        }

        fn description(&self) -> &str {
            "Records that it was called"
        }

        fn schema(&self) -> Value {
            json!({
                "type": "object",
                "properties": {"label": {"type": "string", "minLength": 1}},
                "required": ["label"]
            })
        }

        fn is_multi_tenant(&self) -> bool {
            self.multi_tenant
        }

        async fn call(&self, ctx: &TenantContext, args: SpyArgs) -> ToolResult {
            self.calls.fetch_add(1, Ordering::SeqCst);
            if args.label == "fail" {
                return ToolResult::failed("asked to fail");
            }
            ToolResult::ok(json!({"label": args.label, "tenant": ctx.tenant_id()}))
        }
    }

    /// Accepts any object, but its typed arguments still need a numeric `count`.
    pub struct LooseTool;

    #[derive(Deserialize)]
    pub struct CountArgs {
        #[allow(dead_code)]
        count: u32,
    }

    #[async_trait]
    impl Tool for LooseTool {
        type Args = CountArgs;

        fn name(&self) -> &str {
            "loose"
        }

        fn description(&self) -> &str {
            "Schema looser than its arguments"
        }

        fn schema(&self) -> Value {
            json!({"type": "object", "additionalProperties": true})
        }

        async fn call(&self, _ctx: &TenantContext, _args: CountArgs) -> ToolResult {
            ToolResult::ok_empty()
        }
    }

    pub struct PanickingTool;

    #[derive(Deserialize)]
    pub struct NoArgs {}

    #[async_trait]
    impl Tool for PanickingTool {
        type Args = NoArgs;

        fn name(&self) -> &str {
            "explode"
        }

        fn description(&self) -> &str {
            "Always panics"
        }

        fn schema(&self) -> Value {
            json!({"type": "object", "properties": {}})
        }

        async fn call(&self, _ctx: &TenantContext, _args: NoArgs) -> ToolResult {
            panic!("boom")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::test_support::SpyTool;
    use super::*;

    #[test]
    fn test_duplicate_names_rejected_at_construction() {
        let err = ToolRegistry::new(vec![
            ToolDescriptor::from_tool(SpyTool::multi_tenant("createSocialMediaPost")),
            ToolDescriptor::from_tool(SpyTool::multi_tenant("createSocialMediaPost")),
        ])
        .unwrap_err();
        assert_eq!(
            err,
            RegistryError::DuplicateTool("createSocialMediaPost".to_string())
        );
    }

    #[test]
    fn test_empty_name_rejected() {
        let err = ToolRegistry::new(vec![ToolDescriptor::from_tool(SpyTool::multi_tenant(" "))])
            .unwrap_err();
        assert_eq!(err, RegistryError::EmptyName);
    }

    #[test]
    fn test_signatures_preserve_registration_order() {
        let registry = ToolRegistry::new(vec![
            ToolDescriptor::from_tool(SpyTool::multi_tenant("b")),
            ToolDescriptor::from_tool(SpyTool::multi_tenant("a")),
        ])
        .unwrap();
        let names: Vec<_> = registry
            .signatures()
            .into_iter()
            .map(|s| s.function.name)
            .collect();
        assert_eq!(names, vec!["b", "a"]);
        assert_eq!(registry.names(), vec!["b", "a"]);
        assert!(registry.contains("a"));
        assert!(!registry.contains("c"));
        assert_eq!(registry.len(), 2);
    }

    #[test]
    fn test_empty_registry_is_allowed() {
        let registry = ToolRegistry::new(Vec::new()).unwrap();
        assert!(registry.is_empty());
        assert!(registry.signatures().is_empty());
    }
}
