//! Gemini Backend Implementation
//!
//! Resolution backend for Google Gemini with Google Search grounding.
//!
//! # Gemini API
//!
//! - `POST /v1beta/models/{model}:generateContent` - single-shot generation
//!
//! The `google_search` tool is enabled so answers are grounded; the
//! grounding chunks of the first candidate become the result's sources,
//! in the order Gemini returns them.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::Deserialize;

use super::parse::{build_prompt, parse_answer};
use super::traits::{BackendConfig, ResolutionBackend};
use crate::error::ResolutionError;
use crate::messages::{ResolutionResult, Source};

/// Gemini backend client
#[derive(Clone)]
pub struct GeminiBackend {
    /// API key sent as `x-goog-api-key`
    api_key: String,
    /// Model identifier
    model: String,
    /// API base URL (no trailing slash)
    base_url: String,
    /// HTTP client
    http_client: reqwest::Client,
}

impl std::fmt::Debug for GeminiBackend {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GeminiBackend")
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish_non_exhaustive()
    }
}

impl GeminiBackend {
    /// Create a new Gemini backend
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::Configuration`] if the API key is blank or
    /// the HTTP client cannot be built.
    pub fn new(
        api_key: impl Into<String>,
        model: impl Into<String>,
        base_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self, ResolutionError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ResolutionError::Configuration(
                "a Gemini API key is required (set GEMINI_API_KEY)".to_string(),
            ));
        }

        let http_client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| ResolutionError::Configuration(e.to_string()))?;

        Ok(Self {
            api_key,
            model: model.into(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            http_client,
        })
    }

    /// Create from `BackendConfig`
    ///
    /// Returns `None` for non-Gemini configs.
    ///
    /// # Errors
    ///
    /// Returns [`ResolutionError::Configuration`] if no API key is configured.
    pub fn from_config(
        config: &BackendConfig,
        timeout: Duration,
    ) -> Option<Result<Self, ResolutionError>> {
        match config {
            BackendConfig::Gemini {
                api_key,
                model,
                base_url,
            } => Some(Self::new(
                api_key.clone().unwrap_or_default(),
                model.clone(),
                base_url.clone(),
                timeout,
            )),
            BackendConfig::Ollama { .. } => None,
        }
    }

    /// Model in use
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    fn generate_url(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }

    fn model_url(&self) -> String {
        format!("{}/v1beta/models/{}", self.base_url, self.model)
    }
}

#[async_trait]
impl ResolutionBackend for GeminiBackend {
    fn name(&self) -> &str {
        "Gemini"
    }

    async fn health_check(&self) -> bool {
        self.http_client
            .get(self.model_url())
            .header("x-goog-api-key", &self.api_key)
            .timeout(Duration::from_secs(5))
            .send()
            .await
            .map(|r| r.status().is_success())
            .unwrap_or(false)
    }

    async fn resolve(&self, citation: &str) -> Result<ResolutionResult, ResolutionError> {
        let body = serde_json::json!({
            "contents": [{
                "role": "user",
                "parts": [{ "text": build_prompt(citation) }],
            }],
            "tools": [{ "google_search": {} }],
        });

        tracing::debug!(model = %self.model, "Sending Gemini resolution request");

        let response = self
            .http_client
            .post(self.generate_url())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let text = response.text().await?;

        if !status.is_success() {
            return Err(status_error(status, &text));
        }

        parse_generate_response(&text)
    }
}

/// Map a non-success HTTP status to a resolution error
pub(crate) fn status_error(status: StatusCode, body: &str) -> ResolutionError {
    let message = api_error_message(body).unwrap_or_else(|| body.trim().to_string());
    if status == StatusCode::TOO_MANY_REQUESTS {
        ResolutionError::Quota(message)
    } else {
        ResolutionError::Upstream {
            status: status.as_u16(),
            body: message,
        }
    }
}

/// Pull `error.message` out of a Google-style JSON error body
fn api_error_message(body: &str) -> Option<String> {
    let value: serde_json::Value = serde_json::from_str(body).ok()?;
    value
        .get("error")?
        .get("message")?
        .as_str()
        .map(str::to_string)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<Content>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Deserialize)]
struct Content {
    #[serde(default)]
    parts: Vec<Part>,
}

#[derive(Debug, Deserialize)]
struct Part {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Deserialize)]
struct GroundingChunk {
    web: Option<WebChunk>,
}

#[derive(Debug, Deserialize)]
struct WebChunk {
    uri: Option<String>,
    title: Option<String>,
}

/// Turn a `generateContent` response body into a resolution result
///
/// # Errors
///
/// Returns [`ResolutionError::MalformedResponse`] if the body is not valid
/// JSON, has no candidates, or the first candidate carries no text.
pub fn parse_generate_response(body: &str) -> Result<ResolutionResult, ResolutionError> {
    let response: GenerateResponse = serde_json::from_str(body)?;

    let Some(candidate) = response.candidates.into_iter().next() else {
        let reason = response
            .prompt_feedback
            .and_then(|f| f.block_reason)
            .map_or_else(
                || "response contained no candidates".to_string(),
                |reason| format!("request blocked ({reason})"),
            );
        return Err(ResolutionError::MalformedResponse(reason));
    };

    let raw_text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();
    let raw_text = raw_text.trim().to_string();

    if raw_text.is_empty() {
        return Err(ResolutionError::MalformedResponse(
            "response contained no text".to_string(),
        ));
    }

    let sources = candidate
        .grounding_metadata
        .map(|meta| {
            meta.grounding_chunks
                .into_iter()
                .filter_map(|chunk| {
                    let web = chunk.web?;
                    let uri = web.uri.filter(|u| !u.trim().is_empty())?;
                    let title = web
                        .title
                        .filter(|t| !t.trim().is_empty())
                        .unwrap_or_else(|| uri.clone());
                    Some(Source { title, uri })
                })
                .collect()
        })
        .unwrap_or_default();

    let (doi, title) = parse_answer(&raw_text);

    Ok(ResolutionResult {
        doi,
        title,
        raw_text,
        sources,
    })
}
