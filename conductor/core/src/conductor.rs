//! Conductor - The Resolution Orchestrator
//!
//! The Conductor owns the whole resolution lifecycle for one session:
//! - the single orchestrator state slot (`Idle` / `Loading` / `Succeeded` / `Failed`)
//! - the history store of successful resolutions
//! - the pending input text a surface edits
//!
//! # Lifecycle
//!
//! ```text
//! Idle ──submit──▶ Loading ──ok──▶ Succeeded ──submit──▶ Loading ...
//!                     │
//!                     └──err──▶ Failed ──submit──▶ Loading ...
//! ```
//!
//! `submit` is fire-and-forget: it spawns the backend call and returns.
//! The outcome is applied by [`Conductor::poll_resolution`] or
//! [`Conductor::wait_for_resolution`]. Only one resolution may be in flight;
//! submissions while `Loading` are dropped, so a stale response can never
//! overwrite a newer one.
//!
//! Every mutation goes through `&mut self`, so a reader never sees
//! `Succeeded` without the matching history entry (or the reverse).
//!
//! There is no cancellation and no orchestrator-level timeout. A backend
//! call that never settles keeps the Conductor in `Loading`; the HTTP
//! backends bound this with their own request timeout.

use std::sync::Arc;
use std::time::Instant;

use tokio::sync::{mpsc, oneshot};

use crate::backend::ResolutionBackend;
use crate::error::{ResolutionError, SubmitError};
use crate::history::HistoryStore;
use crate::ids::{HistoryId, IdGenerator, DEFAULT_ID_LENGTH};
use crate::messages::{
    now_ms, ConductorMessage, HistoryEntry, OrchestratorState, ResolutionResult,
};
use crate::surface::ResultView;

/// Shown when a failure carries no message of its own
pub const DEFAULT_FALLBACK_ERROR_MESSAGE: &str =
    "An error occurred while searching. Please try again.";

/// Conductor configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ConductorConfig {
    /// Message used for failures without a description
    pub fallback_error_message: String,
    /// Length of generated history ids
    pub id_length: usize,
}

impl Default for ConductorConfig {
    fn default() -> Self {
        Self {
            fallback_error_message: DEFAULT_FALLBACK_ERROR_MESSAGE.to_string(),
            id_length: DEFAULT_ID_LENGTH,
        }
    }
}

/// The resolution currently in flight
struct InFlight {
    query: String,
    started: Instant,
    rx: oneshot::Receiver<Result<ResolutionResult, ResolutionError>>,
}

/// The Conductor - headless resolution orchestrator
pub struct Conductor<B: ResolutionBackend> {
    /// Configuration
    config: ConductorConfig,
    /// Resolution backend
    backend: Arc<B>,
    /// Current lifecycle state
    state: OrchestratorState,
    /// Successful resolutions, newest first
    history: HistoryStore,
    /// Pending input text
    input: String,
    /// History id source
    ids: IdGenerator,
    /// Outstanding backend call
    in_flight: Option<InFlight>,
    /// Optional channel to a surface
    tx: Option<mpsc::Sender<ConductorMessage>>,
}

impl<B: ResolutionBackend + 'static> Conductor<B> {
    /// Create a new Conductor with the given backend
    pub fn new(backend: B, config: ConductorConfig) -> Self {
        let ids = IdGenerator::new().with_length(config.id_length);
        Self {
            config,
            backend: Arc::new(backend),
            state: OrchestratorState::Idle,
            history: HistoryStore::new(),
            input: String::new(),
            ids,
            in_flight: None,
            tx: None,
        }
    }

    /// Push state changes to a surface over `tx`
    #[must_use]
    pub fn with_surface(mut self, tx: mpsc::Sender<ConductorMessage>) -> Self {
        self.tx = Some(tx);
        self
    }

    /// Replace the id generator (e.g. with a seeded one)
    ///
    /// The configured `id_length` still applies to the new generator.
    #[must_use]
    pub fn with_id_generator(mut self, ids: IdGenerator) -> Self {
        self.ids = ids.with_length(self.config.id_length);
        self
    }

    /// Get current state
    pub fn state(&self) -> &OrchestratorState {
        &self.state
    }

    /// Get the history store
    pub fn history(&self) -> &HistoryStore {
        &self.history
    }

    /// Project the current state for display
    pub fn view(&self) -> ResultView<'_> {
        ResultView::from_state(&self.state)
    }

    /// Get the backend
    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Get configuration
    pub fn config(&self) -> &ConductorConfig {
        &self.config
    }

    /// Pending input text
    pub fn pending_input(&self) -> &str {
        &self.input
    }

    /// Replace the pending input text (a surface's input widget calls this)
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.input = text.into();
    }

    /// Whether a resolution is in flight
    pub fn is_loading(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Whether submitting the pending input would be accepted
    pub fn can_submit(&self) -> bool {
        !self.is_loading() && !self.input.trim().is_empty()
    }

    /// Check the backend and log a warning if it is unreachable
    pub async fn check_backend(&self) -> bool {
        let healthy = self.backend.health_check().await;
        if !healthy {
            tracing::warn!(
                backend = self.backend.name(),
                "Backend not reachable - resolutions may fail"
            );
        }
        healthy
    }

    /// Submit a citation for resolution
    ///
    /// Rejected without any state change if `text` is blank or a resolution
    /// is already in flight. The returned error only reports why; callers
    /// may ignore it.
    ///
    /// # Errors
    ///
    /// [`SubmitError::EmptyCitation`] or [`SubmitError::AlreadyLoading`].
    ///
    /// # Panics
    ///
    /// Panics if called outside a Tokio runtime.
    pub fn submit(&mut self, text: impl Into<String>) -> Result<(), SubmitError> {
        let query = text.into();

        if query.trim().is_empty() {
            tracing::debug!("Ignoring empty citation");
            return Err(SubmitError::EmptyCitation);
        }
        if self.is_loading() {
            tracing::debug!("Ignoring submission while a resolution is in flight");
            return Err(SubmitError::AlreadyLoading);
        }

        let (tx, rx) = oneshot::channel();
        let backend = Arc::clone(&self.backend);
        let citation = query.clone();
        tokio::spawn(async move {
            let outcome = backend.resolve(&citation).await;
            // Receiver is gone only if the Conductor was dropped
            let _ = tx.send(outcome);
        });

        tracing::info!(
            backend = self.backend.name(),
            chars = query.chars().count(),
            "Resolution started"
        );

        self.in_flight = Some(InFlight {
            query: query.clone(),
            started: Instant::now(),
            rx,
        });
        self.set_state(OrchestratorState::Loading { query });
        Ok(())
    }

    /// Submit the pending input text
    ///
    /// # Errors
    ///
    /// Same as [`Conductor::submit`].
    pub fn submit_pending(&mut self) -> Result<(), SubmitError> {
        let text = self.input.clone();
        self.submit(text)
    }

    /// Apply the in-flight outcome if it has arrived
    ///
    /// Call this regularly from a surface loop. Returns true if the
    /// resolution settled.
    pub fn poll_resolution(&mut self) -> bool {
        let outcome = {
            let Some(in_flight) = self.in_flight.as_mut() else {
                return false;
            };
            match in_flight.rx.try_recv() {
                Ok(outcome) => outcome,
                Err(oneshot::error::TryRecvError::Empty) => return false,
                Err(oneshot::error::TryRecvError::Closed) => Err(ResolutionError::Unknown),
            }
        };

        self.settle(outcome);
        true
    }

    /// Wait for the in-flight resolution and apply its outcome
    ///
    /// Returns false immediately if nothing is in flight.
    pub async fn wait_for_resolution(&mut self) -> bool {
        let outcome = {
            let Some(in_flight) = self.in_flight.as_mut() else {
                return false;
            };
            (&mut in_flight.rx)
                .await
                .unwrap_or(Err(ResolutionError::Unknown))
        };

        self.settle(outcome);
        true
    }

    /// Copy a history entry's citation into the pending input
    ///
    /// Does not submit and does not touch the orchestrator state.
    pub fn select_entry(&mut self, entry: &HistoryEntry) {
        self.input = entry.reference.clone();
        self.send(ConductorMessage::InputChanged {
            text: self.input.clone(),
        });
    }

    /// Select a history entry by id. Returns false if no such entry exists.
    pub fn select_history(&mut self, id: &HistoryId) -> bool {
        let Some(entry) = self.history.get(id).cloned() else {
            return false;
        };
        self.select_entry(&entry);
        true
    }

    /// Apply a backend outcome to state and history
    fn settle(&mut self, outcome: Result<ResolutionResult, ResolutionError>) {
        let Some(in_flight) = self.in_flight.take() else {
            return;
        };
        let elapsed_ms = in_flight.started.elapsed().as_millis() as u64;

        match outcome {
            Ok(result) => {
                let entry = HistoryEntry {
                    id: self.fresh_id(),
                    reference: in_flight.query,
                    doi: result.doi.clone(),
                    timestamp: now_ms(),
                };

                tracing::info!(
                    doi = entry.doi.as_deref().unwrap_or("<none>"),
                    sources = result.sources.len(),
                    elapsed_ms,
                    "Resolution succeeded"
                );

                self.history.prepend(entry.clone());
                self.state = OrchestratorState::Succeeded { result };

                self.send(ConductorMessage::HistoryAdded { entry });
                self.send(ConductorMessage::State {
                    state: self.state.clone(),
                });
            }
            Err(err) => {
                tracing::warn!(error = %err, elapsed_ms, "Resolution failed");
                let message = err
                    .user_message()
                    .unwrap_or_else(|| self.config.fallback_error_message.clone());
                self.set_state(OrchestratorState::Failed { message });
            }
        }
    }

    /// Generate an id not already used in this session
    fn fresh_id(&mut self) -> HistoryId {
        loop {
            let id = self.ids.next_id();
            if !self.history.contains(&id) {
                return id;
            }
            tracing::debug!(id = %id, "History id collision, regenerating");
        }
    }

    /// Set state and notify the surface
    fn set_state(&mut self, state: OrchestratorState) {
        self.state = state;
        self.send(ConductorMessage::State {
            state: self.state.clone(),
        });
    }

    /// Send a message to the surface, if one is attached
    fn send(&self, msg: ConductorMessage) {
        if let Some(tx) = &self.tx {
            if let Err(e) = tx.try_send(msg) {
                tracing::warn!("Failed to send message to surface: {}", e);
            }
        }
    }
}
