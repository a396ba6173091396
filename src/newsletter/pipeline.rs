//! Caller-side steps of the newsletter workflow.
//!
//! Each step builds a fresh single-tool registry, runs one conversation and, when it
//! completes, re-reads the artifact at the key the handler reports it wrote. Steps never
//! fail: a failed conversation means the feature is skipped and the workflow carries on.
//!
//! The model chooses `issueId` and `platform` itself. A completed call that wrote
//! somewhere other than the requested key is reported as `success: false`, with the
//! artifact it did write attached.

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{info, warn};

use crate::config::AgentConfig;
use crate::converse::{ConversationRequest, Converser, FailureKind};
use crate::model::ModelCapability;
use crate::store::{ArtifactKind, PersistenceSink, Record, RowKey};
use crate::telemetry::DispatchSink;
use crate::tools::{TenantContext, ToolDescriptor, ToolRegistry};

use super::insights::InsightsTool;
use super::social::{Platform, SocialPostTool};

/// What a step reports back to the workflow.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StepOutcome {
    pub success: bool,
    /// Key the dispatched handler wrote to.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub key: Option<RowKey>,
    /// The artifact as read back from `key`.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub record: Option<Record>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub failure: Option<FailureKind>,
}

impl StepOutcome {
    fn skipped(error: impl Into<String>, failure: Option<FailureKind>) -> Self {
        Self {
            success: false,
            key: None,
            record: None,
            error: Some(error.into()),
            failure,
        }
    }
}

/// Shared plumbing of both steps.
struct StepRunner {
    model: Arc<dyn ModelCapability>,
    sink: Arc<dyn PersistenceSink>,
    dispatch_sink: Option<Arc<dyn DispatchSink>>,
    config: AgentConfig,
}

impl StepRunner {
    async fn run(
        &self,
        tool: ToolDescriptor,
        system_prompt: String,
        user_prompt: String,
        context: &TenantContext,
        requested: Option<RowKey>,
    ) -> StepOutcome {
        let tool_name = tool.name().to_string();
        let registry = match ToolRegistry::new([tool]) {
            Ok(r) => r,
            Err(e) => return StepOutcome::skipped(e.to_string(), None),
        };

        let mut converser =
            Converser::new(self.model.clone()).with_tool_choice(self.config.model.tool_choice);
        if let Some(sink) = &self.dispatch_sink {
            converser = converser.with_sink(sink.clone());
        }

        let outcome = converser
            .run(ConversationRequest::new(
                self.config.model.model_id.clone(),
                system_prompt,
                user_prompt,
                registry,
                context.clone(),
            ))
            .await;

        let result = match outcome.outcome {
            Ok(result) => result,
            Err(err) => {
                info!(
                    tool = %tool_name,
                    tenant_id = ?context.tenant_id(),
                    failure = err.kind().as_str(),
                    "step skipped"
                );
                return StepOutcome::skipped(err.to_string(), Some(err.kind()));
            }
        };

        let Some(written) = written_key(&result.payload) else {
            warn!(tool = %tool_name, "handler result does not name the key it wrote");
            return StepOutcome::skipped(
                format!("'{}' did not report where it wrote", tool_name),
                None,
            );
        };

        let record = match self.sink.get(&written).await {
            Ok(record) => record,
            Err(e) => {
                warn!(sink = self.sink.name(), key = %written, error = %e, "read-back failed");
                None
            }
        };

        if let Some(requested) = requested.filter(|k| k != &written) {
            warn!(
                tool = %tool_name,
                tenant_id = ?context.tenant_id(),
                requested = %requested,
                written = %written,
                "model wrote a different artifact than requested"
            );
            return StepOutcome {
                success: false,
                error: Some(format!("wrote {} instead of {}", written, requested)),
                key: Some(written),
                record,
                failure: None,
            };
        }

        StepOutcome {
            success: true,
            key: Some(written),
            record,
            error: None,
            failure: None,
        }
    }
}

fn requested_key(context: &TenantContext, issue_id: &str, kind: ArtifactKind) -> Option<RowKey> {
    context
        .tenant_id()
        .map(|tenant| RowKey::for_artifact(tenant, issue_id, &kind))
}

/// `partitionKey`/`sortKey` from a completed handler's payload.
fn written_key(payload: &Option<Value>) -> Option<RowKey> {
    let payload = payload.as_ref()?;
    let partition = payload.get("partitionKey")?.as_str()?;
    let sort = payload.get("sortKey")?.as_str()?;
    Some(RowKey::new(partition, sort))
}

/// Drafts a social post for one platform.
pub struct SocialPostStep {
    runner: StepRunner,
}

impl SocialPostStep {
    pub fn new(
        model: Arc<dyn ModelCapability>,
        sink: Arc<dyn PersistenceSink>,
        config: AgentConfig,
    ) -> Self {
        Self {
            runner: StepRunner {
                model,
                sink,
                dispatch_sink: None,
                config,
            },
        }
    }

    pub fn with_dispatch_sink(mut self, sink: Arc<dyn DispatchSink>) -> Self {
        self.runner.dispatch_sink = Some(sink);
        self
    }

    pub async fn run(
        &self,
        context: &TenantContext,
        issue_id: &str,
        platform: &str,
        issue_content: &str,
    ) -> StepOutcome {
        let Some(platform) = Platform::parse(platform) else {
            return StepOutcome::skipped(format!("unsupported platform '{}'", platform), None);
        };

        let tool = SocialPostTool::new(self.runner.sink.clone(), self.runner.config.social.clone());
        let system_prompt = social_system_prompt(&tool, platform);
        let user_prompt = social_user_prompt(issue_id, platform, issue_content);
        let key = requested_key(context, issue_id, ArtifactKind::social(platform.as_str()));

        self.runner
            .run(
                ToolDescriptor::from_tool(tool),
                system_prompt,
                user_prompt,
                context,
                key,
            )
            .await
    }
}

/// Turns a performance report into recorded insights.
pub struct InsightsStep {
    runner: StepRunner,
}

impl InsightsStep {
    pub fn new(
        model: Arc<dyn ModelCapability>,
        sink: Arc<dyn PersistenceSink>,
        config: AgentConfig,
    ) -> Self {
        Self {
            runner: StepRunner {
                model,
                sink,
                dispatch_sink: None,
                config,
            },
        }
    }

    pub fn with_dispatch_sink(mut self, sink: Arc<dyn DispatchSink>) -> Self {
        self.runner.dispatch_sink = Some(sink);
        self
    }

    pub async fn run(&self, context: &TenantContext, issue_id: &str, report_data: &Value) -> StepOutcome {
        let tool = InsightsTool::new(self.runner.sink.clone());
        let key = requested_key(context, issue_id, ArtifactKind::Analytics);

        self.runner
            .run(
                ToolDescriptor::from_tool(tool),
                insights_system_prompt(),
                insights_user_prompt(issue_id, report_data),
                context,
                key,
            )
            .await
    }
}

pub fn social_system_prompt(tool: &SocialPostTool, platform: Platform) -> String {
    format!(
        "You are the social media editor of an email newsletter. Promote the issue below \
         with a single post and save it by calling the createSocialMediaPost tool exactly once. \
         {} Do not invent facts that are not in the issue.",
        tool.guidelines(platform)
    )
}

pub fn social_user_prompt(issue_id: &str, platform: Platform, issue_content: &str) -> String {
    format!(
        "Issue id: {}\nPlatform: {}\n\nIssue content:\n{}",
        issue_id, platform, issue_content
    )
}

pub fn insights_system_prompt() -> String {
    "You analyse newsletter performance reports. Identify up to ten concrete, actionable \
     insights and store them by calling the recordInsights tool exactly once."
        .to_string()
}

pub fn insights_user_prompt(issue_id: &str, report_data: &Value) -> String {
    let report = serde_json::to_string_pretty(report_data).unwrap_or_else(|_| report_data.to_string());
    format!("Issue id: {}\n\nPerformance report:\n{}", issue_id, report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::SocialConfig;
    use crate::store::MemoryStore;

    #[test]
    fn test_prompts_carry_issue_and_bounds() {
        let tool = SocialPostTool::new(Arc::new(MemoryStore::new()), SocialConfig::default());
        let system = social_system_prompt(&tool, Platform::X);
        assert!(system.contains("createSocialMediaPost"));
        assert!(system.contains("between 100 and 3000 characters"));

        let user = social_user_prompt("198", Platform::X, "Rust 2024 edition");
        assert!(user.contains("Issue id: 198"));
        assert!(user.contains("Platform: X"));

        let user = insights_user_prompt("7", &serde_json::json!({"opens": 1}));
        assert!(user.contains("\"opens\": 1"));
    }

    #[test]
    fn test_requested_key_needs_tenant() {
        assert!(requested_key(&TenantContext::unscoped(), "1", ArtifactKind::Analytics).is_none());
        assert_eq!(
            requested_key(&TenantContext::new("t1"), "1", ArtifactKind::Analytics),
            Some(RowKey::new("t1#1", "analytics"))
        );
    }

    #[test]
    fn test_written_key_comes_from_payload() {
        let payload = Some(serde_json::json!({"partitionKey": "t1#9", "sortKey": "SOCIAL#x"}));
        assert_eq!(written_key(&payload), Some(RowKey::new("t1#9", "SOCIAL#x")));
        assert_eq!(written_key(&Some(serde_json::json!({"sortKey": "analytics"}))), None);
        assert_eq!(written_key(&None), None);
    }
}
