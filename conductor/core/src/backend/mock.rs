//! Scripted Mock Backend
//!
//! A resolution backend with no network access, for tests and demos.
//! Outcomes are queued up front and handed out in order; every citation
//! received is recorded. A gated mock holds each call until the test
//! releases it, which makes the `Loading` state observable.
//!
//! ```ignore
//! use doi_conductor::backend::MockBackend;
//!
//! let backend = MockBackend::gated();
//! backend.push_success(ResolutionResult::new(None, None, "No DOI found"));
//! // ... submit, inspect Loading ...
//! backend.release(1);
//! ```

use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;
use tokio::sync::Semaphore;

use super::traits::ResolutionBackend;
use crate::error::ResolutionError;
use crate::messages::ResolutionResult;

/// Scripted resolution backend
#[derive(Debug, Default)]
pub struct MockBackend {
    outcomes: Mutex<VecDeque<Result<ResolutionResult, ResolutionError>>>,
    requests: Mutex<Vec<String>>,
    gate: Option<Semaphore>,
    unhealthy: bool,
}

impl MockBackend {
    /// Mock that answers immediately
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mock that holds every call until [`MockBackend::release`] is called
    #[must_use]
    pub fn gated() -> Self {
        Self {
            gate: Some(Semaphore::new(0)),
            ..Self::default()
        }
    }

    /// Mock whose health check fails
    #[must_use]
    pub fn unhealthy() -> Self {
        Self {
            unhealthy: true,
            ..Self::default()
        }
    }

    /// Queue a successful outcome
    pub fn push_success(&self, result: ResolutionResult) {
        self.push(Ok(result));
    }

    /// Queue a failure
    pub fn push_failure(&self, error: ResolutionError) {
        self.push(Err(error));
    }

    /// Queue an outcome
    pub fn push(&self, outcome: Result<ResolutionResult, ResolutionError>) {
        if let Ok(mut outcomes) = self.outcomes.lock() {
            outcomes.push_back(outcome);
        }
    }

    /// Let `count` held calls proceed (no-op for ungated mocks)
    pub fn release(&self, count: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(count);
        }
    }

    /// Citations received so far, oldest first
    #[must_use]
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().map(|r| r.clone()).unwrap_or_default()
    }

    /// Number of resolve calls received
    #[must_use]
    pub fn request_count(&self) -> usize {
        self.requests.lock().map(|r| r.len()).unwrap_or_default()
    }

    /// Number of queued outcomes not yet handed out
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.outcomes.lock().map(|o| o.len()).unwrap_or_default()
    }
}

#[async_trait]
impl ResolutionBackend for MockBackend {
    fn name(&self) -> &str {
        "Mock"
    }

    async fn health_check(&self) -> bool {
        !self.unhealthy
    }

    async fn resolve(&self, citation: &str) -> Result<ResolutionResult, ResolutionError> {
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(citation.to_string());
        }

        if let Some(gate) = &self.gate {
            match gate.acquire().await {
                Ok(permit) => permit.forget(),
                Err(_) => return Err(ResolutionError::Unknown),
            }
        }

        self.outcomes
            .lock()
            .ok()
            .and_then(|mut outcomes| outcomes.pop_front())
            .unwrap_or_else(|| {
                Err(ResolutionError::Configuration(
                    "mock backend has no scripted outcome".to_string(),
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_outcomes_in_order() {
        let backend = MockBackend::new();
        backend.push_success(ResolutionResult::new(None, None, "first"));
        backend.push_failure(ResolutionError::Timeout);

        let first = backend.resolve("a").await.unwrap();
        assert_eq!(first.raw_text, "first");
        assert_eq!(backend.resolve("b").await, Err(ResolutionError::Timeout));
        assert!(matches!(
            backend.resolve("c").await,
            Err(ResolutionError::Configuration(_))
        ));
        assert_eq!(backend.requests(), vec!["a", "b", "c"]);
    }

    #[tokio::test]
    async fn test_gate_holds_until_released() {
        let backend = std::sync::Arc::new(MockBackend::gated());
        backend.push_success(ResolutionResult::new(None, None, "done"));

        let task = {
            let backend = std::sync::Arc::clone(&backend);
            tokio::spawn(async move { backend.resolve("held").await })
        };

        tokio::task::yield_now().await;
        assert!(!task.is_finished());
        assert_eq!(backend.remaining(), 1);

        backend.release(1);
        let result = task.await.unwrap().unwrap();
        assert_eq!(result.raw_text, "done");
    }

    #[tokio::test]
    async fn test_health() {
        assert!(MockBackend::new().health_check().await);
        assert!(!MockBackend::unhealthy().health_check().await);
    }
}
