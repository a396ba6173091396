//! `createSocialMediaPost`: store a platform-specific draft for one issue.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, error};

use crate::config::SocialConfig;
use crate::store::{now_epoch_secs, ArtifactKind, PersistenceSink, Record, RowKey};
use crate::structured::SchemaGenerator;
use crate::tools::{TenantContext, Tool, ToolResult};

pub const SOCIAL_POST_TOOL: &str = "createSocialMediaPost";

/// Issue ids end up inside partition keys, so `#` must never appear in one.
pub const ISSUE_ID_PATTERN: &str = "^[A-Za-z0-9_-]{1,64}$";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Platform {
    LinkedIn,
    X,
    Facebook,
    Instagram,
}

impl Platform {
    pub const ALL: [Platform; 4] = [
        Platform::LinkedIn,
        Platform::X,
        Platform::Facebook,
        Platform::Instagram,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Platform::LinkedIn => "LinkedIn",
            Platform::X => "X",
            Platform::Facebook => "Facebook",
            Platform::Instagram => "Instagram",
        }
    }

    /// Case-insensitive lookup, so CLI input like `linkedin` resolves.
    pub fn parse(s: &str) -> Option<Platform> {
        Self::ALL
            .into_iter()
            .find(|p| p.as_str().eq_ignore_ascii_case(s.trim()))
    }

    fn style_hint(&self) -> &'static str {
        match self {
            Platform::LinkedIn => "professional tone, short paragraphs, up to three hashtags",
            Platform::X => "punchy and brief, one idea, at most two hashtags",
            Platform::Facebook => "conversational, invite comments",
            Platform::Instagram => "visual language, emoji allowed, hashtags at the end",
        }
    }
}

impl fmt::Display for Platform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct SocialPostArgs {
    pub copy: String,
    pub platform: Platform,
    pub issue_id: String,
}

pub struct SocialPostTool {
    sink: Arc<dyn PersistenceSink>,
    config: SocialConfig,
}

impl SocialPostTool {
    pub fn new(sink: Arc<dyn PersistenceSink>, config: SocialConfig) -> Self {
        Self { sink, config }
    }

    /// Writing guidance for the system prompt.
    pub fn guidelines(&self, platform: Platform) -> String {
        format!(
            "Write between {} and {} characters for {}: {}.",
            self.config.min_copy_chars,
            self.config.max_copy_chars,
            platform,
            platform.style_hint()
        )
    }
}

#[async_trait]
impl Tool for SocialPostTool {
    type Args = SocialPostArgs;

    fn name(&self) -> &str {
        SOCIAL_POST_TOOL
    }

    fn description(&self) -> &str {
        "Create a social media post draft promoting a newsletter issue on one platform."
    }

    fn schema(&self) -> Value {
        let platforms: Vec<&str> = Platform::ALL.iter().map(|p| p.as_str()).collect();
        SchemaGenerator::new()
            .title("SocialMediaPost")
            .add_required_property(
                "copy",
                json!({
                    "type": "string",
                    "description": "Full text of the post",
                    "minLength": self.config.min_copy_chars,
                    "maxLength": self.config.max_copy_chars,
                }),
            )
            .add_required_property(
                "platform",
                json!({"type": "string", "enum": platforms}),
            )
            .add_required_property(
                "issueId",
                json!({"type": "string", "pattern": ISSUE_ID_PATTERN}),
            )
            .build()
    }

    async fn call(&self, ctx: &TenantContext, args: SocialPostArgs) -> ToolResult {
        let Some(tenant_id) = ctx.tenant_id() else {
            return ToolResult::failed("tenant id is required");
        };

        let key = RowKey::for_artifact(
            tenant_id,
            &args.issue_id,
            &ArtifactKind::social(args.platform.as_str()),
        );
        let now = now_epoch_secs();
        let expires_at = now.saturating_add(self.config.retention_secs());

        let mut attributes = Map::new();
        attributes.insert("copy".into(), json!(args.copy));
        attributes.insert("platform".into(), json!(args.platform.as_str()));
        attributes.insert("issueId".into(), json!(args.issue_id));
        attributes.insert("tenantId".into(), json!(tenant_id));
        attributes.insert("status".into(), json!("draft"));
        attributes.insert("createdAt".into(), json!(now));

        let attribute_names: Vec<String> = attributes.keys().cloned().collect();
        let record = Record::new(key.clone(), attributes).with_expiry(expires_at);

        if let Err(e) = self.sink.put(record).await {
            error!(
                sink = self.sink.name(),
                key = %key,
                attributes = ?attribute_names,
                error = %e,
                "failed to store social post draft"
            );
            return ToolResult::failed(format!("could not store social post: {}", e));
        }

        debug!(key = %key, expires_at, "social post draft stored");
        ToolResult::ok(json!({
            "partitionKey": key.partition,
            "sortKey": key.sort,
            "expiresAt": expires_at,
        }))
    }
}
