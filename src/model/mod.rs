//! Model capability: one prompt pair plus tool signatures in, tool calls or text out.
//!
//! Each wire style has its own adapter behind [`ModelCapability`], selected at runtime
//! from [`ApiStyle`] the way the client picks a provider driver:
//!
//! - [`OpenAiCompatibleModel`]: `POST {base_url}/chat/completions`
//! - [`AnthropicMessagesModel`]: `POST {base_url}/messages`
//! - [`ScriptedModel`]: replays queued outputs, records every request

pub mod anthropic;
pub mod openai;
pub mod scripted;

pub use anthropic::AnthropicMessagesModel;
pub use openai::OpenAiCompatibleModel;
pub use scripted::ScriptedModel;

use crate::config::{ApiStyle, ModelConfig, ToolChoice};
use crate::types::{ModelOutput, ToolDefinition};
use crate::Result;
use async_trait::async_trait;
use std::sync::Arc;

/// Everything a capability needs for one exchange. Handlers are never part of it.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelRequest {
    pub model_id: String,
    pub system_prompt: String,
    pub user_prompt: String,
    pub tools: Vec<ToolDefinition>,
    pub tool_choice: ToolChoice,
    /// Correlates provider logs with dispatch telemetry.
    pub request_id: Option<String>,
}

impl ModelRequest {
    pub fn new(
        model_id: impl Into<String>,
        system_prompt: impl Into<String>,
        user_prompt: impl Into<String>,
        tools: Vec<ToolDefinition>,
    ) -> Self {
        Self {
            model_id: model_id.into(),
            system_prompt: system_prompt.into(),
            user_prompt: user_prompt.into(),
            tools,
            tool_choice: ToolChoice::default(),
            request_id: None,
        }
    }

    pub fn with_tool_choice(mut self, choice: ToolChoice) -> Self {
        self.tool_choice = choice;
        self
    }

    pub fn with_request_id(mut self, id: impl Into<String>) -> Self {
        self.request_id = Some(id.into());
        self
    }
}

#[async_trait]
pub trait ModelCapability: Send + Sync {
    /// Short adapter name used in logs.
    fn name(&self) -> &str;

    /// Run one exchange. Timeouts, transport faults and unreadable responses are errors;
    /// a prose answer is a successful [`ModelOutput::Text`].
    async fn invoke(&self, request: &ModelRequest) -> Result<ModelOutput>;
}

/// Build the adapter selected by `config.api_style`.
///
/// `Scripted` yields an empty [`ScriptedModel`] which answers every request with a
/// decline; it exists for dry runs.
pub fn from_config(config: &ModelConfig) -> Result<Arc<dyn ModelCapability>> {
    let model: Arc<dyn ModelCapability> = match config.api_style {
        ApiStyle::OpenAiCompatible => Arc::new(OpenAiCompatibleModel::new(config)?),
        ApiStyle::AnthropicMessages => Arc::new(AnthropicMessagesModel::new(config)?),
        ApiStyle::Scripted => Arc::new(ScriptedModel::new()),
    };
    tracing::debug!(
        adapter = model.name(),
        model_id = %config.model_id,
        "model capability ready"
    );
    Ok(model)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_config_selects_adapter() {
        let mut config = ModelConfig {
            api_key_env: None,
            ..ModelConfig::default()
        };
        assert_eq!(from_config(&config).unwrap().name(), "openai_compatible");

        config.api_style = ApiStyle::AnthropicMessages;
        assert_eq!(from_config(&config).unwrap().name(), "anthropic_messages");

        config.api_style = ApiStyle::Scripted;
        assert_eq!(from_config(&config).unwrap().name(), "scripted");
    }

    #[test]
    fn test_request_defaults_to_required_tool_choice() {
        let req = ModelRequest::new("m", "sys", "user", Vec::new()).with_request_id("r1");
        assert_eq!(req.tool_choice, ToolChoice::Required);
        assert_eq!(req.request_id.as_deref(), Some("r1"));
    }
}
