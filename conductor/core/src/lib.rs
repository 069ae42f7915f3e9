//! DOI Conductor - Headless Citation Resolution Orchestration
//!
//! This crate provides the orchestration logic for doi-finder, completely
//! independent of any UI. It turns a free-text bibliographic citation into a
//! DOI by delegating to a resolution backend, and keeps a newest-first
//! history of successful lookups. It can drive a CLI, a web UI, or run
//! headless for testing.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        UI Surfaces                               │
//! │  ┌──────────────┐  ┌──────────────┐  ┌───────────────────────┐  │
//! │  │  Input Form  │  │ Result/Error │  │     History List      │  │
//! │  └──────┬───────┘  └──────▲───────┘  └───────┬───────▲───────┘  │
//! │         │ submit          │ ResultView       │ select│entries   │
//! └─────────┼─────────────────┼──────────────────┼───────┼──────────┘
//!           │                 │                  │       │
//! ┌─────────┼─────────────────┼──────────────────┼───────┼──────────┐
//! │         ▼          CONDUCTOR CORE            ▼       │          │
//! │  ┌─────────────────────────────────────────────────────────────┐ │
//! │  │                       Conductor                             │ │
//! │  │   Idle ──► Loading ──► Succeeded / Failed                   │ │
//! │  │  ┌──────────────┐  ┌──────────────┐  ┌──────────────────┐   │ │
//! │  │  │ HistoryStore │  │ IdGenerator  │  │ ResolutionBackend│   │ │
//! │  │  └──────────────┘  └──────────────┘  └────────┬─────────┘   │ │
//! │  └───────────────────────────────────────────────┼─────────────┘ │
//! └──────────────────────────────────────────────────┼───────────────┘
//!                                                    ▼
//!                                   Gemini (search grounding) / Ollama
//! ```
//!
//! # Key Types
//!
//! - [`Conductor`]: The orchestrator owning state, history, and the backend
//! - [`OrchestratorState`]: `Idle`, `Loading`, `Succeeded` or `Failed`
//! - [`HistoryStore`]: Newest-first log of successful resolutions
//! - [`ResolutionBackend`]: Trait implemented by every resolution service
//! - [`ResultView`]: What a result/error surface should render
//!
//! # Quick Start
//!
//! ```ignore
//! use doi_conductor::{backend, config, Conductor};
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     let settings = config::load_config()?;
//!     let backend = backend::from_config(&settings.backend_config(), settings.request_timeout)?;
//!     let mut conductor = Conductor::new(backend, settings.conductor_config());
//!
//!     conductor.submit("Smith, J. (2020). Title. Journal, 1(1), 1-10.")?;
//!     conductor.wait_for_resolution().await;
//!
//!     println!("{:?}", conductor.view());
//!     Ok(())
//! }
//! ```
//!
//! # Module Overview
//!
//! - [`backend`]: Resolution backend abstraction (Gemini, Ollama, mock)
//! - [`conductor`]: Main Conductor struct
//! - [`config`]: TOML / environment configuration loading
//! - [`error`]: Submission and resolution errors
//! - [`history`]: Newest-first history store
//! - [`ids`]: Short random history identifiers
//! - [`messages`]: Domain types and messages from Conductor to UI surfaces
//! - [`surface`]: Read-only projection of state for result/error surfaces

#![deny(missing_docs)]
#![deny(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod backend;
pub mod conductor;
pub mod config;
pub mod error;
pub mod history;
pub mod ids;
pub mod messages;
pub mod surface;

// Re-exports for convenience
pub use backend::{
    BackendConfig, GeminiBackend, MockBackend, OllamaBackend, ResolutionBackend,
};
pub use conductor::{Conductor, ConductorConfig, DEFAULT_FALLBACK_ERROR_MESSAGE};
pub use error::{ResolutionError, SubmitError};
pub use history::HistoryStore;
pub use ids::{HistoryId, IdGenerator};
pub use messages::{
    ConductorMessage, HistoryEntry, OrchestratorState, ResolutionResult, Source,
};
pub use surface::ResultView;

// Config exports
pub use config::{
    default_config_path, load_config, load_config_from_path, ConfigError, ConfigOverrides,
    ConfigSource, Provider, Settings,
};
