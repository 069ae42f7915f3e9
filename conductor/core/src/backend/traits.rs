//! Resolution Backend Traits
//!
//! Trait definitions for resolution backends. This abstraction lets the
//! Conductor drive different AI providers (Gemini with search grounding,
//! a local Ollama model, a scripted mock) without changing core logic.
//!
//! # Contract
//!
//! - `resolve` receives citation text that is already trimmed-non-empty.
//! - A result with `doi: None` is a success ("no DOI found"), never an error.
//! - Failures are reported as [`ResolutionError`]; backends never retry.

use std::time::Duration;

use async_trait::async_trait;

use crate::error::ResolutionError;
use crate::messages::ResolutionResult;

/// Default HTTP timeout for backend requests
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Default Gemini model
pub const DEFAULT_GEMINI_MODEL: &str = "gemini-2.5-flash";

/// Default Gemini API base URL
pub const DEFAULT_GEMINI_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Default Ollama model
pub const DEFAULT_OLLAMA_MODEL: &str = "llama3.2";

/// Resolution backend trait
///
/// Implement this trait to add support for a different lookup provider.
#[async_trait]
pub trait ResolutionBackend: Send + Sync {
    /// Get the backend name (e.g., "Gemini", "Ollama")
    fn name(&self) -> &str;

    /// Check if the backend is healthy and reachable
    async fn health_check(&self) -> bool;

    /// Resolve one citation into a DOI, title and sources
    async fn resolve(&self, citation: &str) -> Result<ResolutionResult, ResolutionError>;
}

#[async_trait]
impl<T> ResolutionBackend for Box<T>
where
    T: ResolutionBackend + ?Sized,
{
    fn name(&self) -> &str {
        (**self).name()
    }

    async fn health_check(&self) -> bool {
        (**self).health_check().await
    }

    async fn resolve(&self, citation: &str) -> Result<ResolutionResult, ResolutionError> {
        (**self).resolve(citation).await
    }
}

/// Backend connection configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendConfig {
    /// Google Gemini with search grounding
    Gemini {
        /// API key (required to build the backend)
        api_key: Option<String>,
        /// Model identifier
        model: String,
        /// API base URL
        base_url: String,
    },
    /// Local Ollama server (no grounding sources)
    Ollama {
        /// Ollama host address
        host: String,
        /// Ollama port number
        port: u16,
        /// Model identifier
        model: String,
    },
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self::gemini(None)
    }
}

impl BackendConfig {
    /// Gemini configuration with default model and endpoint
    pub fn gemini(api_key: Option<String>) -> Self {
        Self::Gemini {
            api_key,
            model: DEFAULT_GEMINI_MODEL.to_string(),
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
        }
    }

    /// Ollama configuration
    pub fn ollama(host: impl Into<String>, port: u16) -> Self {
        Self::Ollama {
            host: host.into(),
            port,
            model: DEFAULT_OLLAMA_MODEL.to_string(),
        }
    }

    /// Provider name as used in config files
    #[must_use]
    pub fn provider(&self) -> &'static str {
        match self {
            Self::Gemini { .. } => "gemini",
            Self::Ollama { .. } => "ollama",
        }
    }

    /// Configured model identifier
    #[must_use]
    pub fn model(&self) -> &str {
        match self {
            Self::Gemini { model, .. } | Self::Ollama { model, .. } => model,
        }
    }

    /// Replace the model identifier
    pub fn set_model(&mut self, new_model: impl Into<String>) {
        match self {
            Self::Gemini { model, .. } | Self::Ollama { model, .. } => *model = new_model.into(),
        }
    }
}
