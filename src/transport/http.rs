use crate::config::ModelConfig;
use crate::{Error, Result};
use std::env;
use std::time::Duration;

/// How the API key is attached to outgoing requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthScheme {
    /// `Authorization: Bearer <key>` (OpenAI-compatible providers)
    Bearer,
    /// `x-api-key: <key>` (Anthropic Messages API)
    ApiKeyHeader,
}

pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    auth: AuthScheme,
}

impl HttpTransport {
    pub fn new(config: &ModelConfig, auth: AuthScheme) -> Result<Self> {
        let api_key = config
            .api_key_env
            .as_deref()
            .and_then(|name| env::var(name).ok())
            .filter(|k| !k.trim().is_empty());

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs.max(1)))
            .build()
            .map_err(|e| Error::Transport(TransportError::Other(e.to_string())))?;

        Ok(Self {
            client,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key,
            auth,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// POST a JSON body and decode a JSON response.
    ///
    /// Non-2xx statuses become [`Error::Model`]; 429 and 5xx are flagged retryable so the
    /// workflow layer can decide, the dispatch layer itself never retries.
    pub async fn post_json(
        &self,
        path: &str,
        body: &serde_json::Value,
        headers: &[(&str, &str)],
        request_id: Option<&str>,
    ) -> Result<serde_json::Value> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.post(&url).json(body);

        if let Some(key) = &self.api_key {
            req = match self.auth {
                AuthScheme::Bearer => req.bearer_auth(key),
                AuthScheme::ApiKeyHeader => req.header("x-api-key", key),
            };
        }
        for (k, v) in headers {
            req = req.header(*k, *v);
        }
        if let Some(id) = request_id {
            req = req.header("x-request-id", id);
        }

        let response = req
            .send()
            .await
            .map_err(|e| Error::Transport(TransportError::Http(e)))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let snippet: String = text.chars().take(512).collect();
            return Err(Error::model(
                format!("HTTP {} from {}: {}", status.as_u16(), path, snippet),
                status.as_u16() == 429 || status.is_server_error(),
            ));
        }

        response
            .json()
            .await
            .map_err(|e| Error::Transport(TransportError::Http(e)))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum TransportError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Transport error: {0}")]
    Other(String),
}
