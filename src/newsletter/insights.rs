//! `recordInsights`: attach model-written insights to an issue's analytics record.

use async_trait::async_trait;
use schemars::JsonSchema;
use serde::Deserialize;
use serde_json::{json, Map, Value};
use std::sync::Arc;
use tracing::{debug, error};

use crate::store::{now_epoch_secs, ArtifactKind, PersistenceSink, RowKey};
use crate::structured::json_schema_from_type;
use crate::tools::{TenantContext, Tool, ToolResult};

pub const INSIGHTS_TOOL: &str = "recordInsights";

/// Arguments of `recordInsights`. The tool schema is derived from this type.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct InsightsArgs {
    /// Newsletter issue the insights belong to.
    #[schemars(regex(pattern = r"^[A-Za-z0-9_-]{1,64}$"))]
    pub issue_id: String,
    /// One actionable observation per entry.
    #[schemars(length(min = 1, max = 10))]
    pub insights: Vec<String>,
    /// Optional one-paragraph overview. Omitted keeps the stored one; `null` is rejected.
    #[serde(default)]
    #[schemars(with = "String")]
    pub summary: Option<String>,
}

pub struct InsightsTool {
    sink: Arc<dyn PersistenceSink>,
}

impl InsightsTool {
    pub fn new(sink: Arc<dyn PersistenceSink>) -> Self {
        Self { sink }
    }
}

#[async_trait]
impl Tool for InsightsTool {
    type Args = InsightsArgs;

    fn name(&self) -> &str {
        INSIGHTS_TOOL
    }

    fn description(&self) -> &str {
        "Record insights about a newsletter issue's performance on its analytics record."
    }

    fn schema(&self) -> Value {
        let mut schema = json_schema_from_type::<InsightsArgs>();
        // Blank insight strings carry nothing.
        if let Some(items) = schema.pointer_mut("/properties/insights/items") {
            items["minLength"] = json!(1);
        }
        schema
    }

    async fn call(&self, ctx: &TenantContext, args: InsightsArgs) -> ToolResult {
        let Some(tenant_id) = ctx.tenant_id() else {
            return ToolResult::failed("tenant id is required");
        };

        let key = RowKey::for_artifact(tenant_id, &args.issue_id, &ArtifactKind::Analytics);

        let mut attributes = Map::new();
        attributes.insert("insights".into(), json!(args.insights));
        if let Some(summary) = &args.summary {
            attributes.insert("summary".into(), json!(summary));
        }
        attributes.insert("insightsUpdatedAt".into(), json!(now_epoch_secs()));
        attributes.insert("issueId".into(), json!(args.issue_id));
        attributes.insert("tenantId".into(), json!(tenant_id));

        let attribute_names: Vec<String> = attributes.keys().cloned().collect();
        match self.sink.update(&key, attributes).await {
            Ok(record) => {
                debug!(key = %key, count = args.insights.len(), "insights recorded");
                ToolResult::ok(json!({
                    "partitionKey": record.key.partition,
                    "sortKey": record.key.sort,
                    "insightCount": args.insights.len(),
                }))
            }
            Err(e) => {
                error!(
                    sink = self.sink.name(),
                    key = %key,
                    attributes = ?attribute_names,
                    error = %e,
                    "failed to record insights"
                );
                ToolResult::failed(format!("could not record insights: {}", e))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryStore, Record};
    use crate::structured::{check_tool_schema, ArgumentValidator, ViolationKind};

    fn tool(store: &Arc<MemoryStore>) -> InsightsTool {
        InsightsTool::new(store.clone())
    }

    #[test]
    fn test_derived_schema_shape() {
        let schema = tool(&Arc::new(MemoryStore::new())).schema();
        check_tool_schema(&schema).unwrap();
        assert_eq!(schema["additionalProperties"], false);
        assert_eq!(schema["properties"]["insights"]["minItems"], 1);
        assert_eq!(schema["properties"]["insights"]["maxItems"], 10);
        assert_eq!(schema["properties"]["insights"]["items"]["minLength"], 1);
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(|v| v.as_str())
            .collect();
        assert!(required.contains(&"issueId"));
        assert!(required.contains(&"insights"));
        assert!(!required.contains(&"summary"));
    }

    #[test]
    fn test_schema_rejects_hash_in_issue_id_and_empty_list() {
        let validator = ArgumentValidator::strict(tool(&Arc::new(MemoryStore::new())).schema());
        let res = validator.validate(json!({"issueId": "1#2", "insights": ["a"]}));
        assert!(res.has_violation(ViolationKind::PatternMismatch));
        let res = validator.validate(json!({"issueId": "12", "insights": []}));
        assert!(res.has_violation(ViolationKind::TooFewItems));
        assert!(validator
            .validate(json!({"issueId": "12", "insights": ["a"]}))
            .is_valid());
    }

    #[test]
    fn test_null_summary_is_rejected() {
        let schema = tool(&Arc::new(MemoryStore::new())).schema();
        assert_eq!(schema["properties"]["summary"]["type"], "string");

        let res = ArgumentValidator::strict(schema)
            .validate(json!({"issueId": "12", "insights": ["a"], "summary": null}));
        assert!(res.has_violation(ViolationKind::WrongType));
    }

    #[tokio::test]
    async fn test_update_keeps_existing_analytics() {
        let store = Arc::new(MemoryStore::new());
        let key = RowKey::new("t1#7", "analytics");
        let mut existing = Map::new();
        existing.insert("opens".into(), json!(420));
        store.put(Record::new(key.clone(), existing)).await.unwrap();

        let result = tool(&store)
            .call(
                &TenantContext::new("t1"),
                InsightsArgs {
                    issue_id: "7".into(),
                    insights: vec!["Subject lines with numbers won".into()],
                    summary: None,
                },
            )
            .await;
        assert!(result.success);

        let row = store.get(&key).await.unwrap().unwrap();
        assert_eq!(row.get("opens"), Some(&json!(420)));
        assert_eq!(row.get("insights"), Some(&json!(["Subject lines with numbers won"])));
        assert!(row.get("summary").is_none());
    }
}
