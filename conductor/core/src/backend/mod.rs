//! Resolution Backend Integration
//!
//! This module provides abstracted access to citation resolution services
//! through a common trait interface.
//!
//! # Available Backends
//!
//! - **Gemini**: Google Gemini with search grounding (default)
//! - **Ollama**: Local LLM server, no grounding sources
//! - **Mock**: Scripted outcomes for tests
//!
//! # Usage
//!
//! ```ignore
//! use doi_conductor::backend::{from_config, BackendConfig, ResolutionBackend};
//!
//! let backend = from_config(&BackendConfig::gemini(Some(key)), DEFAULT_REQUEST_TIMEOUT)?;
//! let result = backend.resolve("Smith, J. (2020). Title. Journal, 1(1), 1-10.").await?;
//! ```

mod gemini;
mod mock;
mod ollama;
pub mod parse;
mod traits;

use std::time::Duration;

pub use gemini::{parse_generate_response, GeminiBackend};
pub use mock::MockBackend;
pub use ollama::OllamaBackend;
pub use traits::{
    BackendConfig, ResolutionBackend, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL,
    DEFAULT_OLLAMA_MODEL, DEFAULT_REQUEST_TIMEOUT,
};

use crate::error::ResolutionError;

/// Build the backend described by `config`
///
/// # Errors
///
/// Returns [`ResolutionError::Configuration`] if the backend cannot be
/// constructed (e.g. Gemini without an API key).
pub fn from_config(
    config: &BackendConfig,
    timeout: Duration,
) -> Result<Box<dyn ResolutionBackend>, ResolutionError> {
    match config {
        BackendConfig::Gemini { .. } => GeminiBackend::from_config(config, timeout)
            .unwrap_or_else(|| Err(ResolutionError::Configuration("not a Gemini config".into())))
            .map(|b| Box::new(b) as Box<dyn ResolutionBackend>),
        BackendConfig::Ollama { .. } => OllamaBackend::from_config(config, timeout)
            .unwrap_or_else(|| Err(ResolutionError::Configuration("not an Ollama config".into())))
            .map(|b| Box::new(b) as Box<dyn ResolutionBackend>),
    }
}
