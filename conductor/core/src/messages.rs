//! Conductor Messages
//!
//! The data model shared between the Conductor and whatever surface displays
//! it: resolution results, history entries, the orchestrator state, and the
//! notifications pushed to a connected surface.
//!
//! # Design Philosophy
//!
//! Surfaces are pure renderers. They read [`OrchestratorState`] and the
//! history store, or listen for [`ConductorMessage`]s, and never decide
//! anything about the resolution lifecycle themselves.

use serde::{Deserialize, Serialize};

use crate::ids::HistoryId;

/// Base URL used to turn a bare DOI into a resolvable link
pub const DOI_RESOLVER_BASE: &str = "https://doi.org/";

/// A grounding source returned alongside a resolution
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Source {
    /// Page title as reported by the service
    pub title: String,
    /// Link to the page
    pub uri: String,
}

impl Source {
    /// Create a new source
    pub fn new(title: impl Into<String>, uri: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            uri: uri.into(),
        }
    }
}

/// Outcome of resolving one citation
///
/// `doi: None` means "no DOI found" and is still a successful resolution.
/// `sources` keep the order the service returned them in (most relevant first).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResolutionResult {
    /// Resolved DOI, if any
    pub doi: Option<String>,
    /// Canonical title, if recovered
    pub title: Option<String>,
    /// Literal text returned by the service
    pub raw_text: String,
    /// Grounding evidence, best first
    #[serde(default)]
    pub sources: Vec<Source>,
}

impl ResolutionResult {
    /// Create a result with no sources
    pub fn new(doi: Option<String>, title: Option<String>, raw_text: impl Into<String>) -> Self {
        Self {
            doi,
            title,
            raw_text: raw_text.into(),
            sources: Vec::new(),
        }
    }

    /// Attach grounding sources
    #[must_use]
    pub fn with_sources(mut self, sources: Vec<Source>) -> Self {
        self.sources = sources;
        self
    }

    /// Whether the service found a DOI
    #[must_use]
    pub fn found_doi(&self) -> bool {
        self.doi.is_some()
    }

    /// `https://doi.org/...` link for the DOI, if one was found
    #[must_use]
    pub fn doi_url(&self) -> Option<String> {
        self.doi.as_ref().map(|doi| format!("{DOI_RESOLVER_BASE}{doi}"))
    }
}

/// A record of one past successful resolution
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Generated key, unique within the session
    pub id: HistoryId,
    /// The citation text exactly as submitted
    pub reference: String,
    /// DOI from the resolution (None if not found)
    pub doi: Option<String>,
    /// Completion time (Unix timestamp ms)
    pub timestamp: u64,
}

/// Orchestrator lifecycle state
///
/// Exactly one of these exists per Conductor.
#[derive(Clone, Debug, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum OrchestratorState {
    /// Nothing submitted yet
    #[default]
    Idle,
    /// A resolution is in flight
    Loading {
        /// The citation being resolved
        query: String,
    },
    /// The last resolution succeeded (possibly without a DOI)
    Succeeded {
        /// The resolution outcome
        result: ResolutionResult,
    },
    /// The last resolution failed
    Failed {
        /// Human-readable error message
        message: String,
    },
}

impl OrchestratorState {
    /// Whether a resolution is in flight
    #[must_use]
    pub fn is_loading(&self) -> bool {
        matches!(self, Self::Loading { .. })
    }

    /// The current result, if the last resolution succeeded
    #[must_use]
    pub fn result(&self) -> Option<&ResolutionResult> {
        match self {
            Self::Succeeded { result } => Some(result),
            _ => None,
        }
    }

    /// The current error message, if the last resolution failed
    #[must_use]
    pub fn error(&self) -> Option<&str> {
        match self {
            Self::Failed { message } => Some(message),
            _ => None,
        }
    }

    /// Human-readable description
    #[must_use]
    pub fn description(&self) -> &'static str {
        match self {
            Self::Idle => "Ready",
            Self::Loading { .. } => "Searching...",
            Self::Succeeded { .. } => "Resolved",
            Self::Failed { .. } => "Error",
        }
    }
}

/// Messages from Conductor to a connected surface
#[derive(Clone, Debug, Serialize, Deserialize)]
pub enum ConductorMessage {
    /// Orchestrator state changed
    State {
        /// The new state
        state: OrchestratorState,
    },

    /// A history entry was prepended
    HistoryAdded {
        /// The new entry
        entry: HistoryEntry,
    },

    /// The pending input text was replaced (e.g. by selecting history)
    InputChanged {
        /// The new pending input
        text: String,
    },
}

/// Get current timestamp in milliseconds
pub(crate) fn now_ms() -> u64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .unwrap_or_default()
        .as_millis() as u64
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_result_without_doi_is_not_an_error() {
        let result = ResolutionResult::new(None, None, "No DOI found");
        assert!(!result.found_doi());
        assert_eq!(result.doi_url(), None);
    }

    #[test]
    fn test_doi_url() {
        let result = ResolutionResult::new(Some("10.1000/xyz".to_string()), None, "...");
        assert_eq!(result.doi_url().as_deref(), Some("https://doi.org/10.1000/xyz"));
    }

    #[test]
    fn test_result_json_shape() {
        let result = ResolutionResult::new(
            Some("10.1000/xyz".to_string()),
            Some("Title".to_string()),
            "DOI: 10.1000/xyz",
        )
        .with_sources(vec![Source::new("Journal Page", "https://doi.org/10.1000/xyz")]);

        let json = serde_json::to_value(&result).unwrap();
        assert_eq!(json["doi"], "10.1000/xyz");
        assert_eq!(json["rawText"], "DOI: 10.1000/xyz");
        assert_eq!(json["sources"][0]["uri"], "https://doi.org/10.1000/xyz");

        let null_doi = ResolutionResult::new(None, None, "No DOI found");
        let json = serde_json::to_value(&null_doi).unwrap();
        assert!(json["doi"].is_null());
        assert!(json["title"].is_null());
    }

    #[test]
    fn test_state_accessors() {
        let state = OrchestratorState::Failed {
            message: "boom".to_string(),
        };
        assert_eq!(state.error(), Some("boom"));
        assert!(state.result().is_none());
        assert!(!state.is_loading());

        let state = OrchestratorState::Loading {
            query: "x".to_string(),
        };
        assert!(state.is_loading());
        assert_eq!(state.description(), "Searching...");
        assert_eq!(OrchestratorState::default(), OrchestratorState::Idle);
    }
}
