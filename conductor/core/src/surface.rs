//! Result/Error Surface
//!
//! Read-only projection of [`OrchestratorState`] for display. A surface
//! renders exactly one variant; since the projection is recomputed from
//! the current state, entering `Loading` hides the previous result or
//! error before the new outcome arrives.

use crate::messages::{OrchestratorState, ResolutionResult};

/// What a surface should show in its result area
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ResultView<'a> {
    /// Nothing submitted yet
    Empty,
    /// Show a loading indicator
    Loading {
        /// The citation being resolved
        query: &'a str,
    },
    /// Show a resolution result (possibly "no DOI found")
    Result(&'a ResolutionResult),
    /// Show an error message
    Error(&'a str),
}

impl<'a> ResultView<'a> {
    /// Project the orchestrator state
    #[must_use]
    pub fn from_state(state: &'a OrchestratorState) -> Self {
        match state {
            OrchestratorState::Idle => Self::Empty,
            OrchestratorState::Loading { query } => Self::Loading { query },
            OrchestratorState::Succeeded { result } => Self::Result(result),
            OrchestratorState::Failed { message } => Self::Error(message),
        }
    }

    /// Whether the view renders nothing
    #[must_use]
    pub fn is_empty(&self) -> bool {
        matches!(self, Self::Empty)
    }
}

impl<'a> From<&'a OrchestratorState> for ResultView<'a> {
    fn from(state: &'a OrchestratorState) -> Self {
        Self::from_state(state)
    }
}
