//! Ollama Backend Implementation
//!
//! Resolution backend for Ollama (local LLM server).
//!
//! # Ollama API
//!
//! - `/api/generate` - Generate completions (used here non-streaming)
//! - `/api/tags` - List available models (used for health checks)
//!
//! Local models have no search grounding, so results from this backend
//! never carry sources.

use std::time::Duration;

use async_trait::async_trait;

use super::gemini::status_error;
use super::parse::{build_prompt, parse_answer};
use super::traits::{BackendConfig, ResolutionBackend};
use crate::error::ResolutionError;
use crate::messages::ResolutionResult;

/// Ollama backend client
#[derive(Clone, Debug)]
pub struct OllamaBackend {
    /// Host address
    host: String,
    /// Port number
    port: u16,
    /// Model identifier
    model: String,
    /// HTTP client
    http_client: reqwest::Client,
}

impl OllamaBackend {
    /// Create a new Ollama backend
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::Configuration`] if the HTTP client cannot be built.
    pub fn new(
        host: impl Into<String>,
        port: u16,
        model: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ResolutionError> {
        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ResolutionError::Configuration(e.to_string()))?;

        Ok(Self {
            host: host.into(),
            port,
            model: model.into(),
            http_client,
        })
    }

    /// Create from `BackendConfig`
    ///
    /// Returns `None` for non-Ollama configs.
    pub fn from_config(
        config: &BackendConfig,
        timeout: Duration,
    ) -> Option<Result<Self, ResolutionError>> {
        match config {
            BackendConfig::Ollama { host, port, model } => {
                Some(Self::new(host.clone(), *port, model.clone(), timeout))
            }
            BackendConfig::Gemini { .. } => None,
        }
    }

    /// Model in use
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get the base URL
    fn base_url(&self) -> String {
        format!("http://{}:{}", self.host, self.port)
    }

    /// Get generate endpoint URL
    fn generate_url(&self) -> String {
        format!("{}/api/generate", self.base_url())
    }

    /// Get tags endpoint URL
    fn tags_url(&self) -> String {
        format!("{}/api/tags", self.base_url())
    }
}

#[async_trait]
impl ResolutionBackend for OllamaBackend {
    fn name(&self) -> &str {
        "Ollama"
    }

    async fn health_check(&self) -> bool {
        self.http_client
            .get(self.tags_url())
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .is_ok()
    }

    async fn resolve(&self, citation: &str) -> Result<ResolutionResult, ResolutionError> {
        let json_request = serde_json::json!({
            "model": self.model,
            "prompt": build_prompt(citation),
            "stream": false,
            "options": { "temperature": 0.0 },
        });

        let response = self
            .http_client
            .post(self.generate_url())
            .json(&json_request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(status_error(status, &body));
        }

        let data: serde_json::Value = response.json().await?;
        parse_generate_value(&data)
    }
}

/// Turn an `/api/generate` response into a resolution result
fn parse_generate_value(data: &serde_json::Value) -> Result<ResolutionResult, ResolutionError> {
    let raw_text = data
        .get("response")
        .and_then(|r| r.as_str())
        .map(str::trim)
        .unwrap_or("");

    if raw_text.is_empty() {
        return Err(ResolutionError::MalformedResponse(
            "Ollama returned an empty response".to_string(),
        ));
    }

    let (doi, title) = parse_answer(raw_text);
    Ok(ResolutionResult::new(doi, title, raw_text))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::DEFAULT_REQUEST_TIMEOUT;

    #[test]
    fn test_ollama_backend_creation() {
        let backend =
            OllamaBackend::new("localhost", 11434, "llama3.2", DEFAULT_REQUEST_TIMEOUT).unwrap();
        assert_eq!(backend.host, "localhost");
        assert_eq!(backend.port, 11434);
        assert_eq!(backend.base_url(), "http://localhost:11434");
        assert_eq!(backend.generate_url(), "http://localhost:11434/api/generate");
    }

    #[test]
    fn test_from_config() {
        let config = BackendConfig::Ollama {
            host: "example.com".to_string(),
            port: 8080,
            model: "mistral".to_string(),
        };

        let backend = OllamaBackend::from_config(&config, DEFAULT_REQUEST_TIMEOUT)
            .unwrap()
            .unwrap();
        assert_eq!(backend.host, "example.com");
        assert_eq!(backend.port, 8080);
        assert_eq!(backend.model(), "mistral");

        // Wrong config type returns None
        let config = BackendConfig::gemini(Some("test".to_string()));
        assert!(OllamaBackend::from_config(&config, DEFAULT_REQUEST_TIMEOUT).is_none());
    }

    #[test]
    fn test_parse_generate_value() {
        let data = serde_json::json!({
            "model": "llama3.2",
            "response": "DOI: 10.1000/xyz\nTitle: Title",
            "done": true
        });
        let result = parse_generate_value(&data).unwrap();
        assert_eq!(result.doi.as_deref(), Some("10.1000/xyz"));
        assert_eq!(result.title.as_deref(), Some("Title"));
        assert!(result.sources.is_empty());

        let empty = serde_json::json!({ "response": "  " });
        assert!(matches!(
            parse_generate_value(&empty),
            Err(ResolutionError::MalformedResponse(_))
        ));
    }
}
