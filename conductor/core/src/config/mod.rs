//! TOML Configuration File Support
//!
//! Centralized configuration loading for doi-finder, supporting a TOML file
//! at `~/.config/doi-finder/config.toml`.
//!
//! # Configuration Priority
//!
//! Configuration values are loaded with the following priority (highest first):
//! 1. CLI arguments (applied by the caller via [`ConfigOverrides`])
//! 2. Environment variables
//! 3. TOML configuration file
//! 4. Default values
//!
//! # XDG Base Directory Compliance
//!
//! The configuration file follows XDG Base Directory specification:
//! - `$XDG_CONFIG_HOME/doi-finder/config.toml` (typically `~/.config/doi-finder/config.toml`)
//!
//! # Example Configuration
//!
//! ```toml
//! [backend]
//! provider = "gemini"
//! model = "gemini-2.5-flash"
//! timeout_secs = 60
//!
//! [conductor]
//! fallback_error_message = "Something went wrong. Please try again."
//! id_length = 10
//! ```
//!
//! # Environment Variables
//!
//! - `GEMINI_API_KEY` (or `API_KEY`): Gemini API key
//! - `DOI_FINDER_PROVIDER`: `gemini` or `ollama`
//! - `DOI_FINDER_MODEL`: model identifier
//! - `DOI_FINDER_BASE_URL`: Gemini API base URL
//! - `OLLAMA_HOST` / `OLLAMA_PORT`: Ollama server address
//! - `DOI_FINDER_TIMEOUT_SECS`: backend request timeout
//! - `DOI_FINDER_FALLBACK_MESSAGE`: message for failures without a description

use std::fmt;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::backend::{
    BackendConfig, DEFAULT_GEMINI_BASE_URL, DEFAULT_GEMINI_MODEL, DEFAULT_OLLAMA_MODEL,
    DEFAULT_REQUEST_TIMEOUT,
};
use crate::conductor::{ConductorConfig, DEFAULT_FALLBACK_ERROR_MESSAGE};
use crate::ids::DEFAULT_ID_LENGTH;

/// Default Ollama host
pub const DEFAULT_OLLAMA_HOST: &str = "localhost";

/// Default Ollama port
pub const DEFAULT_OLLAMA_PORT: u16 = 11434;

// =============================================================================
// Error Types
// =============================================================================

/// Errors that can occur when loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read config file
    #[error("Failed to read config file at {path}: {source}")]
    ReadError {
        /// The path that was attempted
        path: PathBuf,
        /// The underlying IO error
        source: std::io::Error,
    },

    /// Failed to parse TOML
    #[error("Failed to parse TOML config: {0}")]
    ParseError(#[from] toml::de::Error),

    /// Invalid configuration value
    #[error("Invalid configuration: {0}")]
    ValidationError(String),
}

// =============================================================================
// Configuration Source Tracking
// =============================================================================

/// Tracks where a configuration value came from
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfigSource {
    /// Value from command-line argument
    Cli,
    /// Value from environment variable
    Env,
    /// Value from TOML configuration file
    File,
    /// Default value
    Default,
}

impl fmt::Display for ConfigSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cli => write!(f, "CLI"),
            Self::Env => write!(f, "environment"),
            Self::File => write!(f, "config file"),
            Self::Default => write!(f, "default"),
        }
    }
}

/// Which resolution service to use
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    /// Google Gemini with search grounding
    #[default]
    Gemini,
    /// Local Ollama server
    Ollama,
}

impl FromStr for Provider {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "gemini" => Ok(Self::Gemini),
            "ollama" => Ok(Self::Ollama),
            other => Err(ConfigError::ValidationError(format!(
                "unknown provider '{other}' (expected 'gemini' or 'ollama')"
            ))),
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Gemini => write!(f, "gemini"),
            Self::Ollama => write!(f, "ollama"),
        }
    }
}

// =============================================================================
// TOML Configuration Structures
// =============================================================================

/// Backend section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BackendToml {
    /// `gemini` or `ollama`
    pub provider: Option<String>,

    /// Model identifier
    pub model: Option<String>,

    /// Gemini API key
    pub api_key: Option<String>,

    /// Gemini API base URL
    pub base_url: Option<String>,

    /// Ollama host
    pub host: Option<String>,

    /// Ollama port
    pub port: Option<u16>,

    /// Request timeout in seconds
    pub timeout_secs: Option<u64>,
}

/// Conductor section of the TOML configuration
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConductorToml {
    /// Message for failures without a description
    pub fallback_error_message: Option<String>,

    /// Length of generated history ids
    pub id_length: Option<usize>,
}

/// Top-level TOML configuration structure
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigToml {
    /// Backend configuration section
    pub backend: BackendToml,

    /// Conductor configuration section
    pub conductor: ConductorToml,
}

// =============================================================================
// Main Configuration Struct
// =============================================================================

/// Centralized configuration
///
/// Consolidates all configuration sources. Use [`load_config`] to load with
/// proper priority handling, then [`Settings::backend_config`] and
/// [`Settings::conductor_config`] to build the runtime pieces.
#[derive(Clone, Debug)]
pub struct Settings {
    /// Resolution provider
    pub provider: Provider,

    /// Model override (`None` = provider default)
    pub model: Option<String>,

    /// Gemini API key
    pub api_key: Option<String>,

    /// Gemini API base URL
    pub base_url: String,

    /// Ollama host
    pub ollama_host: String,

    /// Ollama port
    pub ollama_port: u16,

    /// Backend request timeout
    pub request_timeout: Duration,

    /// Message for failures without a description
    pub fallback_error_message: String,

    /// Length of generated history ids
    pub id_length: usize,

    /// Path to the config file that was loaded (if any)
    pub config_file_path: Option<PathBuf>,

    /// Source of configuration values
    source: ConfigSource,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            provider: Provider::Gemini,
            model: None,
            api_key: None,
            base_url: DEFAULT_GEMINI_BASE_URL.to_string(),
            ollama_host: DEFAULT_OLLAMA_HOST.to_string(),
            ollama_port: DEFAULT_OLLAMA_PORT,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
            fallback_error_message: DEFAULT_FALLBACK_ERROR_MESSAGE.to_string(),
            id_length: DEFAULT_ID_LENGTH,
            config_file_path: None,
            source: ConfigSource::Default,
        }
    }
}

impl Settings {
    /// Create a new configuration with default values
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the primary source of this configuration
    #[must_use]
    pub fn source(&self) -> ConfigSource {
        self.source
    }

    /// Model that will actually be used
    #[must_use]
    pub fn effective_model(&self) -> &str {
        match (&self.model, self.provider) {
            (Some(model), _) => model,
            (None, Provider::Gemini) => DEFAULT_GEMINI_MODEL,
            (None, Provider::Ollama) => DEFAULT_OLLAMA_MODEL,
        }
    }

    /// Backend configuration for the selected provider
    #[must_use]
    pub fn backend_config(&self) -> BackendConfig {
        let model = self.effective_model().to_string();
        match self.provider {
            Provider::Gemini => BackendConfig::Gemini {
                api_key: self.api_key.clone(),
                model,
                base_url: self.base_url.clone(),
            },
            Provider::Ollama => BackendConfig::Ollama {
                host: self.ollama_host.clone(),
                port: self.ollama_port,
                model,
            },
        }
    }

    /// Conductor configuration
    #[must_use]
    pub fn conductor_config(&self) -> ConductorConfig {
        ConductorConfig {
            fallback_error_message: self.fallback_error_message.clone(),
            id_length: self.id_length,
        }
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.request_timeout.is_zero() {
            return Err(ConfigError::ValidationError(
                "timeout_secs must be greater than zero".to_string(),
            ));
        }
        if self.fallback_error_message.trim().is_empty() {
            return Err(ConfigError::ValidationError(
                "fallback_error_message must not be empty".to_string(),
            ));
        }
        Ok(())
    }
}

// =============================================================================
// Configuration Loading
// =============================================================================

/// Get the default configuration file path
///
/// Returns `$XDG_CONFIG_HOME/doi-finder/config.toml` or
/// `~/.config/doi-finder/config.toml` if `XDG_CONFIG_HOME` is not set.
#[must_use]
pub fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|p| p.join("doi-finder").join("config.toml"))
}

/// Load configuration from all sources with proper priority
///
/// # Errors
///
/// Returns an error if the config file exists but cannot be parsed, or a
/// value is invalid. A missing config file is not an error.
pub fn load_config() -> Result<Settings, ConfigError> {
    load_config_from_path(default_config_path())
}

/// Load configuration from a specific path
///
/// # Errors
///
/// Returns an error if the specified config file cannot be read or parsed.
pub fn load_config_from_path(path: Option<PathBuf>) -> Result<Settings, ConfigError> {
    load_config_with_env(path, |key| std::env::var(key).ok())
}

/// Load configuration reading environment values through `env`
///
/// # Errors
///
/// Same as [`load_config_from_path`].
pub fn load_config_with_env<F>(path: Option<PathBuf>, env: F) -> Result<Settings, ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    // Start with defaults
    let mut config = Settings::default();

    if let Some(ref config_path) = path {
        if config_path.exists() {
            let toml_content =
                std::fs::read_to_string(config_path).map_err(|e| ConfigError::ReadError {
                    path: config_path.clone(),
                    source: e,
                })?;

            let toml_config: ConfigToml = toml::from_str(&toml_content)?;
            apply_toml_config(&mut config, &toml_config)?;
            config.config_file_path = Some(config_path.clone());
            config.source = ConfigSource::File;

            tracing::info!(
                path = %config_path.display(),
                "Loaded configuration from file"
            );
        } else {
            tracing::debug!(
                path = %config_path.display(),
                "Config file not found, using defaults"
            );
        }
    }

    // Environment overrides file values
    apply_env_config(&mut config, env)?;

    config.validate()?;
    Ok(config)
}

/// Apply TOML configuration values to the config struct
fn apply_toml_config(config: &mut Settings, toml: &ConfigToml) -> Result<(), ConfigError> {
    // Backend settings
    if let Some(ref provider) = toml.backend.provider {
        config.provider = provider.parse()?;
    }
    if toml.backend.model.is_some() {
        config.model = toml.backend.model.clone();
    }
    if toml.backend.api_key.is_some() {
        config.api_key = toml.backend.api_key.clone();
    }
    if let Some(ref url) = toml.backend.base_url {
        config.base_url = url.clone();
    }
    if let Some(ref host) = toml.backend.host {
        config.ollama_host = host.clone();
    }
    if let Some(port) = toml.backend.port {
        config.ollama_port = port;
    }
    if let Some(secs) = toml.backend.timeout_secs {
        config.request_timeout = Duration::from_secs(secs);
    }

    // Conductor settings
    if let Some(ref message) = toml.conductor.fallback_error_message {
        config.fallback_error_message = message.clone();
    }
    if let Some(length) = toml.conductor.id_length {
        config.id_length = length;
    }

    Ok(())
}

/// Apply environment variable overrides to the config
fn apply_env_config<F>(config: &mut Settings, env: F) -> Result<(), ConfigError>
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(key) = env("GEMINI_API_KEY").or_else(|| env("API_KEY")) {
        if !key.trim().is_empty() {
            config.api_key = Some(key);
            config.source = ConfigSource::Env;
        }
    }
    if let Some(provider) = env("DOI_FINDER_PROVIDER") {
        config.provider = provider.parse()?;
        config.source = ConfigSource::Env;
    }
    if let Some(model) = env("DOI_FINDER_MODEL") {
        config.model = Some(model);
        config.source = ConfigSource::Env;
    }
    if let Some(url) = env("DOI_FINDER_BASE_URL") {
        config.base_url = url;
        config.source = ConfigSource::Env;
    }
    if let Some(host) = env("OLLAMA_HOST") {
        config.ollama_host = host;
        config.source = ConfigSource::Env;
    }
    if let Some(port) = env("OLLAMA_PORT") {
        if let Ok(p) = port.parse::<u16>() {
            config.ollama_port = p;
            config.source = ConfigSource::Env;
        }
    }
    if let Some(timeout) = env("DOI_FINDER_TIMEOUT_SECS") {
        if let Ok(secs) = timeout.parse::<u64>() {
            config.request_timeout = Duration::from_secs(secs);
            config.source = ConfigSource::Env;
        }
    }
    if let Some(message) = env("DOI_FINDER_FALLBACK_MESSAGE") {
        config.fallback_error_message = message;
        config.source = ConfigSource::Env;
    }

    Ok(())
}

// =============================================================================
// CLI Override Support
// =============================================================================

/// Builder for applying CLI overrides to configuration
///
/// Use this after [`load_config`] to apply command-line argument overrides.
#[derive(Clone, Debug, Default)]
pub struct ConfigOverrides {
    /// Provider override
    pub provider: Option<Provider>,

    /// Model override
    pub model: Option<String>,

    /// Request timeout override (seconds)
    pub timeout_secs: Option<u64>,
}

impl ConfigOverrides {
    /// Create a new empty set of overrides
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set provider override
    #[must_use]
    pub fn with_provider(mut self, provider: Provider) -> Self {
        self.provider = Some(provider);
        self
    }

    /// Set model override
    #[must_use]
    pub fn with_model(mut self, model: String) -> Self {
        self.model = Some(model);
        self
    }

    /// Set timeout override
    #[must_use]
    pub fn with_timeout_secs(mut self, secs: u64) -> Self {
        self.timeout_secs = Some(secs);
        self
    }

    /// Apply overrides to a configuration
    pub fn apply(&self, config: &mut Settings) {
        if self.provider.is_some() || self.model.is_some() || self.timeout_secs.is_some() {
            config.source = ConfigSource::Cli;
        }

        if let Some(provider) = self.provider {
            config.provider = provider;
        }
        if let Some(ref model) = self.model {
            config.model = Some(model.clone());
        }
        if let Some(secs) = self.timeout_secs {
            // Zero would make every request fail instantly
            config.request_timeout = Duration::from_secs(secs.max(1));
        }
    }
}
