//! OpenAI-compatible chat completions adapter (OpenAI, DeepSeek, Groq, vLLM, ...).

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::config::{ModelConfig, ToolChoice};
use crate::transport::{AuthScheme, HttpTransport};
use crate::types::{Message, ModelOutput, ToolCall};
use crate::{Error, Result};

use super::{ModelCapability, ModelRequest};

const CHAT_PATH: &str = "/chat/completions";

pub struct OpenAiCompatibleModel {
    transport: HttpTransport,
    max_tokens: u32,
    temperature: Option<f64>,
}

impl OpenAiCompatibleModel {
    pub fn new(config: &ModelConfig) -> Result<Self> {
        Ok(Self {
            transport: HttpTransport::new(config, AuthScheme::Bearer)?,
            max_tokens: config.max_tokens,
            temperature: config.temperature,
        })
    }

    pub fn build_body(&self, request: &ModelRequest) -> Value {
        let messages = vec![
            Message::system(&request.system_prompt),
            Message::user(&request.user_prompt),
        ];

        let mut body = json!({
            "model": request.model_id,
            "messages": messages,
            "max_tokens": self.max_tokens,
        });

        if !request.tools.is_empty() {
            body["tools"] = json!(request.tools);
            body["tool_choice"] = match request.tool_choice {
                ToolChoice::Auto => json!("auto"),
                ToolChoice::Required => json!("required"),
            };
        }
        if let Some(t) = self.temperature {
            body["temperature"] = json!(t);
        }
        body
    }

    /// Read `choices[0].message`: tool calls win over content.
    pub fn parse_response(body: &Value) -> Result<ModelOutput> {
        let message = body.pointer("/choices/0/message").ok_or_else(|| {
            Error::model("response has no choices[0].message", false)
        })?;

        let calls: Vec<ToolCall> = message
            .get("tool_calls")
            .and_then(|v| v.as_array())
            .map(|arr| arr.iter().filter_map(parse_tool_call).collect())
            .unwrap_or_default();

        if !calls.is_empty() {
            return Ok(ModelOutput::ToolCalls { calls });
        }

        let text = message
            .get("content")
            .and_then(|v| v.as_str())
            .unwrap_or_default();
        Ok(ModelOutput::text(text))
    }
}

fn parse_tool_call(v: &Value) -> Option<ToolCall> {
    let function = v.get("function")?;
    let name = function.get("name")?.as_str()?;
    let id = v.get("id").and_then(|i| i.as_str()).unwrap_or("call_0");

    let arguments = function.get("arguments").cloned().unwrap_or(Value::Null);
    Some(ToolCall::new(id, name, arguments))
}

#[async_trait]
impl ModelCapability for OpenAiCompatibleModel {
    fn name(&self) -> &str {
        "openai_compatible"
    }

    async fn invoke(&self, request: &ModelRequest) -> Result<ModelOutput> {
        let body = self.build_body(request);
        let response = self
            .transport
            .post_json(CHAT_PATH, &body, &[], request.request_id.as_deref())
            .await?;
        Self::parse_response(&response)
    }
}
