//! Anthropic Messages API adapter.
//!
//! Differences from the OpenAI shape:
//! - The system prompt is a top-level `system` parameter.
//! - Tools are `{name, description, input_schema}`.
//! - Tool calls come back as `tool_use` content blocks with an already-decoded `input`.
//! - `max_tokens` is required.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::{ModelConfig, ToolChoice};
use crate::transport::{AuthScheme, HttpTransport};
use crate::types::{ModelOutput, ToolCall};
use crate::{Error, Result};

use super::{ModelCapability, ModelRequest};

const MESSAGES_PATH: &str = "/messages";
const API_VERSION: &str = "2023-06-01";

pub struct AnthropicMessagesModel {
    transport: HttpTransport,
    max_tokens: u32,
    temperature: Option<f64>,
}

impl AnthropicMessagesModel {
    pub fn new(config: &ModelConfig) -> Result<Self> {
        Ok(Self {
            transport: HttpTransport::new(config, AuthScheme::ApiKeyHeader)?,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    pub fn build_body(&self, request: &ModelRequest) -> Value {
        let mut body = json!({
            "model": request.model_id,
            "system": request.system_prompt,
            "messages": [{
                "role": "user",
                "content": [{"type": "text", "text": request.user_prompt}],
            }],
            "max_tokens": self.max_tokens,
        });

        if !request.tools.is_empty() {
            let tools: Vec<Value> = request
                .tools
                .iter()
                .map(|t| {
                    json!({
                        "name": t.function.name,
                        "description": t.function.description.clone().unwrap_or_default(),
                        "input_schema": t.function.parameters.clone()
                            .unwrap_or_else(|| json!({"type": "object"})),
                    })
                })
                .collect();
            body["tools"] = Value::Array(tools);
            body["tool_choice"] = match request.tool_choice {
                ToolChoice::Auto => json!({"type": "auto"}),
                ToolChoice::Required => json!({"type": "any"}),
            };
        }
        if let Some(t) = self.temperature {
            body["temperature"] = json!(t);
        }
        body
    }

    pub fn parse_response(body: &Value) -> Result<ModelOutput> {
        let blocks = body
            .get("content")
            .and_then(|c| c.as_array())
            .ok_or_else(|| Error::model("response has no content array", false))?;

        let calls: Vec<ToolCall> = blocks
            .iter()
            .filter(|b| b.get("type").and_then(|t| t.as_str()) == Some("tool_use"))
            .filter_map(|b| {
                let name = b.get("name")?.as_str()?;
                let id = b.get("id").and_then(|i| i.as_str()).unwrap_or("toolu_0");
                let input = b.get("input").cloned().unwrap_or(Value::Null);
                Some(ToolCall::new(id, name, input))
            })
            .collect();

        if !calls.is_empty() {
            return Ok(ModelOutput::ToolCalls { calls });
        }

        let text = blocks
            .iter()
            .filter(|b| b.get("type").and_then(|t| t.as_str()) == Some("text"))
            .filter_map(|b| b.get("text").and_then(|t| t.as_str()))
            .collect::<Vec<_>>()
            .join("\n");
        Ok(ModelOutput::text(text))
    }
}

#[async_trait]
impl ModelCapability for AnthropicMessagesModel {
    fn name(&self) -> &str {
        "anthropic_messages"
    }

    async fn invoke(&self, request: &ModelRequest) -> Result<ModelOutput> {
        let body = self.build_body(request);
        let response = self
            .transport
            .post_json(
                MESSAGES_PATH,
                &body,
                &[("anthropic-version", API_VERSION)],
                request.request_id.as_deref(),
            )
            .await?;
        Self::parse_response(&response)
    }
}
