//! Runtime configuration.
//!
//! Loaded from YAML, then overridden by `NEWSLETTER_AGENT_*` environment variables:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `NEWSLETTER_AGENT_API_STYLE` | `model.api_style` |
//! | `NEWSLETTER_AGENT_MODEL` | `model.model_id` |
//! | `NEWSLETTER_AGENT_BASE_URL` | `model.base_url` |
//! | `NEWSLETTER_AGENT_TIMEOUT_SECS` | `model.timeout_secs` |
//! | `NEWSLETTER_AGENT_RETENTION_DAYS` | `social.retention_days` |

use crate::error::ErrorContext;
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct AgentConfig {
    #[serde(default)]
    pub model: ModelConfig,
    #[serde(default)]
    pub social: SocialConfig,
}

/// Wire format spoken by the model endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ApiStyle {
    OpenAiCompatible,
    AnthropicMessages,
    /// Offline capability that replays queued outputs.
    Scripted,
}

impl std::str::FromStr for ApiStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "openai_compatible" | "openai" => Ok(ApiStyle::OpenAiCompatible),
            "anthropic_messages" | "anthropic" => Ok(ApiStyle::AnthropicMessages),
            "scripted" => Ok(ApiStyle::Scripted),
            other => Err(Error::configuration_with_context(
                format!("unknown api style '{}'", other),
                ErrorContext::new().with_field_path("model.api_style"),
            )),
        }
    }
}

/// Whether the model may answer in prose instead of calling a tool.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ToolChoice {
    Auto,
    #[default]
    Required,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_api_style")]
    pub api_style: ApiStyle,
    #[serde(default = "default_model_id")]
    pub model_id: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key_env: Option<String>,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f64>,
    #[serde(default)]
    pub tool_choice: ToolChoice,
}

fn default_api_style() -> ApiStyle {
    ApiStyle::OpenAiCompatible
}

fn default_model_id() -> String {
    "gpt-4o-mini".to_string()
}

fn default_base_url() -> String {
    "https://api.openai.com/v1".to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_max_tokens() -> u32 {
    1024
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            api_style: default_api_style(),
            model_id: default_model_id(),
            base_url: default_base_url(),
            api_key_env: Some("OPENAI_API_KEY".to_string()),
            timeout_secs: default_timeout_secs(),
            max_tokens: default_max_tokens(),
            temperature: None,
            tool_choice: ToolChoice::default(),
        }
    }
}

/// Social post drafting rules.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SocialConfig {
    /// Drafts expire this many days after they are written.
    #[serde(default = "default_retention_days")]
    pub retention_days: u64,
    #[serde(default = "default_min_copy_chars")]
    pub min_copy_chars: u64,
    #[serde(default = "default_max_copy_chars")]
    pub max_copy_chars: u64,
}

fn default_retention_days() -> u64 {
    7
}

fn default_min_copy_chars() -> u64 {
    100
}

fn default_max_copy_chars() -> u64 {
    3000
}

impl Default for SocialConfig {
    fn default() -> Self {
        Self {
            retention_days: default_retention_days(),
            min_copy_chars: default_min_copy_chars(),
            max_copy_chars: default_max_copy_chars(),
        }
    }
}

impl SocialConfig {
    pub fn retention_secs(&self) -> u64 {
        self.retention_days.saturating_mul(24 * 60 * 60)
    }
}

impl AgentConfig {
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        let config: AgentConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a YAML file and apply environment overrides.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let mut config: AgentConfig = serde_yaml::from_str(&content)?;
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    /// Defaults plus environment overrides, for runs without a config file.
    pub fn from_env() -> Result<Self> {
        let mut config = AgentConfig::default();
        config.apply_env_overrides()?;
        config.validate()?;
        Ok(config)
    }

    pub fn apply_env_overrides(&mut self) -> Result<()> {
        self.apply_overrides(|name| std::env::var(name).ok())
    }

    fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) -> Result<()> {
        if let Some(style) = lookup("NEWSLETTER_AGENT_API_STYLE") {
            self.model.api_style = style.parse()?;
        }
        if let Some(model) = lookup("NEWSLETTER_AGENT_MODEL") {
            self.model.model_id = model;
        }
        if let Some(url) = lookup("NEWSLETTER_AGENT_BASE_URL") {
            self.model.base_url = url;
        }
        if let Some(raw) = lookup("NEWSLETTER_AGENT_TIMEOUT_SECS") {
            self.model.timeout_secs = parse_number(&raw, "model.timeout_secs")?;
        }
        if let Some(raw) = lookup("NEWSLETTER_AGENT_RETENTION_DAYS") {
            self.social.retention_days = parse_number(&raw, "social.retention_days")?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.model.model_id.trim().is_empty() {
            return Err(Error::configuration_with_context(
                "model id must not be empty",
                ErrorContext::new().with_field_path("model.model_id"),
            ));
        }
        if self.model.api_style != ApiStyle::Scripted && self.model.base_url.trim().is_empty() {
            return Err(Error::configuration_with_context(
                "base url must not be empty",
                ErrorContext::new().with_field_path("model.base_url"),
            ));
        }
        if self.model.timeout_secs == 0 {
            return Err(Error::configuration_with_context(
                "timeout must be at least one second",
                ErrorContext::new().with_field_path("model.timeout_secs"),
            ));
        }
        if self.social.min_copy_chars > self.social.max_copy_chars {
            return Err(Error::configuration_with_context(
                "min_copy_chars exceeds max_copy_chars",
                ErrorContext::new()
                    .with_field_path("social.min_copy_chars")
                    .with_details(format!(
                        "{} > {}",
                        self.social.min_copy_chars, self.social.max_copy_chars
                    )),
            ));
        }
        Ok(())
    }
}

fn parse_number(raw: &str, field: &str) -> Result<u64> {
    raw.trim().parse::<u64>().map_err(|_| {
        Error::configuration_with_context(
            format!("expected an unsigned integer, got '{}'", raw),
            ErrorContext::new()
                .with_field_path(field)
                .with_source("env_override"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_defaults() {
        let config = AgentConfig::default();
        assert_eq!(config.model.api_style, ApiStyle::OpenAiCompatible);
        assert_eq!(config.model.tool_choice, ToolChoice::Required);
        assert_eq!(config.social.min_copy_chars, 100);
        assert_eq!(config.social.retention_secs(), 7 * 86_400);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_yaml_partial_sections_fill_defaults() {
        let yaml = r#"
model:
  api_style: anthropic_messages
  model_id: claude-sonnet
  base_url: https://api.anthropic.com/v1
  api_key_env: ANTHROPIC_API_KEY
social:
  retention_days: 3
"#;
        let config = AgentConfig::from_yaml_str(yaml).unwrap();
        assert_eq!(config.model.api_style, ApiStyle::AnthropicMessages);
        assert_eq!(config.model.timeout_secs, 30);
        assert_eq!(config.social.retention_days, 3);
        assert_eq!(config.social.max_copy_chars, 3000);
    }

    #[test]
    fn test_inverted_copy_bounds_rejected() {
        let yaml = "social:\n  min_copy_chars: 500\n  max_copy_chars: 200\n";
        let err = AgentConfig::from_yaml_str(yaml).unwrap_err();
        assert!(matches!(err, Error::Configuration { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("NEWSLETTER_AGENT_API_STYLE", "scripted"),
            ("NEWSLETTER_AGENT_MODEL", "local-test"),
            ("NEWSLETTER_AGENT_RETENTION_DAYS", "14"),
        ]
        .into_iter()
        .collect();
        let mut config = AgentConfig::default();
        config
            .apply_overrides(|k| vars.get(k).map(|v| v.to_string()))
            .unwrap();
        assert_eq!(config.model.api_style, ApiStyle::Scripted);
        assert_eq!(config.model.model_id, "local-test");
        assert_eq!(config.social.retention_days, 14);
    }

    #[test]
    fn test_bad_numeric_override() {
        let mut config = AgentConfig::default();
        let err = config
            .apply_overrides(|k| (k == "NEWSLETTER_AGENT_TIMEOUT_SECS").then(|| "soon".to_string()))
            .unwrap_err();
        assert_eq!(
            err.context().and_then(|c| c.field_path.as_deref()),
            Some("model.timeout_secs")
        );
    }
}
