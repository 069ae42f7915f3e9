//! Resolution lifecycle tests
//!
//! Drive a [`Conductor`] end to end against the scripted [`MockBackend`]:
//! - submission guards (blank input, single flight)
//! - success and failure transitions with their history effects
//! - history ordering and id uniqueness
//! - selecting history entries
//! - the message stream seen by a connected surface

use std::collections::HashSet;

use pretty_assertions::assert_eq;
use tokio::sync::mpsc;

use doi_conductor::{
    Conductor, ConductorConfig, ConductorMessage, IdGenerator, MockBackend, OrchestratorState,
    ResolutionError, ResolutionResult, ResultView, Source, SubmitError,
};

// =============================================================================
// Helpers
// =============================================================================

fn conductor_with(backend: MockBackend) -> Conductor<MockBackend> {
    Conductor::new(backend, ConductorConfig::default()).with_id_generator(IdGenerator::from_seed(7))
}

fn found(doi: &str) -> ResolutionResult {
    ResolutionResult::new(
        Some(doi.to_string()),
        None,
        format!("DOI: {doi}\nTitle: Something"),
    )
}

fn not_found() -> ResolutionResult {
    ResolutionResult::new(None, None, "NOT_FOUND")
}

/// Submit and wait for the outcome to be applied
async fn resolve(conductor: &mut Conductor<MockBackend>, citation: &str) {
    conductor.submit(citation).unwrap();
    assert!(conductor.wait_for_resolution().await);
}

// =============================================================================
// Submission Guards
// =============================================================================

#[tokio::test]
async fn test_blank_submissions_are_ignored() {
    let mut conductor = conductor_with(MockBackend::new());

    for text in ["", "   ", "\n\t "] {
        assert_eq!(conductor.submit(text), Err(SubmitError::EmptyCitation));
        assert_eq!(conductor.state(), &OrchestratorState::Idle);
        assert!(conductor.history().is_empty());
    }

    assert!(!conductor.wait_for_resolution().await);
    assert_eq!(conductor.backend().request_count(), 0);
}

#[tokio::test]
async fn test_blank_submission_after_success_keeps_result() {
    let mut conductor = conductor_with(MockBackend::new());
    conductor.backend().push_success(found("10.1/a"));
    resolve(&mut conductor, "first").await;

    let before = conductor.state().clone();
    assert_eq!(conductor.submit("  "), Err(SubmitError::EmptyCitation));
    assert_eq!(conductor.state(), &before);
    assert_eq!(conductor.history().len(), 1);
}

#[tokio::test]
async fn test_submission_while_loading_is_dropped() {
    let mut conductor = conductor_with(MockBackend::gated());
    conductor.backend().push_success(found("10.1/first"));
    conductor.backend().push_success(found("10.1/second"));

    conductor.submit("first citation").unwrap();
    assert_eq!(
        conductor.state(),
        &OrchestratorState::Loading {
            query: "first citation".to_string()
        }
    );
    assert!(conductor.view() == ResultView::Loading { query: "first citation" });

    assert_eq!(
        conductor.submit("second citation"),
        Err(SubmitError::AlreadyLoading)
    );
    assert_eq!(
        conductor.state(),
        &OrchestratorState::Loading {
            query: "first citation".to_string()
        }
    );

    conductor.backend().release(1);
    assert!(conductor.wait_for_resolution().await);

    assert_eq!(conductor.backend().requests(), vec!["first citation"]);
    assert_eq!(
        conductor.state().result().and_then(|r| r.doi.as_deref()),
        Some("10.1/first")
    );
    assert_eq!(conductor.history().len(), 1);
    assert_eq!(conductor.backend().remaining(), 1);
}

#[tokio::test]
async fn test_poll_is_pending_until_backend_answers() {
    let mut conductor = conductor_with(MockBackend::gated());
    conductor.backend().push_success(not_found());

    conductor.submit("held").unwrap();
    for _ in 0..5 {
        tokio::task::yield_now().await;
        assert!(!conductor.poll_resolution());
        assert!(conductor.is_loading());
    }

    conductor.backend().release(1);
    while !conductor.poll_resolution() {
        tokio::task::yield_now().await;
    }
    assert!(!conductor.is_loading());
}

// =============================================================================
// Success and Failure
// =============================================================================

#[tokio::test]
async fn test_success_records_history_entry() {
    let mut conductor = conductor_with(MockBackend::new());
    let citation = "Smith, J. (2020). Title. Journal, 1(1), 1-10.";
    let journal_page = Source::new("Journal Page", "https://doi.org/10.1000/xyz");
    conductor.backend().push_success(
        ResolutionResult::new(
            Some("10.1000/xyz".to_string()),
            Some("Title".to_string()),
            "DOI: 10.1000/xyz\nTitle: Title",
        )
        .with_sources(vec![journal_page.clone()]),
    );

    resolve(&mut conductor, citation).await;

    let result = conductor.state().result().unwrap();
    assert_eq!(result.doi.as_deref(), Some("10.1000/xyz"));
    assert_eq!(result.title.as_deref(), Some("Title"));
    assert_eq!(result.sources, vec![journal_page]);

    assert_eq!(conductor.history().len(), 1);
    let entry = conductor.history().latest().unwrap();
    assert_eq!(entry.reference, citation);
    assert_eq!(entry.doi.as_deref(), Some("10.1000/xyz"));
    assert!(entry.timestamp > 0);
    assert_eq!(entry.id.as_str().len(), ConductorConfig::default().id_length);
}

#[tokio::test]
async fn test_no_doi_is_still_a_success() {
    let mut conductor = conductor_with(MockBackend::new());
    conductor.backend().push_success(not_found());

    resolve(&mut conductor, "Unknown Author. Obscure Pamphlet.").await;

    let result = conductor.state().result().unwrap();
    assert!(result.doi.is_none());
    assert!(!result.found_doi());
    assert_eq!(conductor.history().len(), 1);
    assert_eq!(conductor.history().latest().unwrap().doi, None);
}

#[tokio::test]
async fn test_failure_leaves_history_untouched() {
    let mut conductor = conductor_with(MockBackend::new());
    conductor.backend().push_success(found("10.1/a"));
    conductor
        .backend()
        .push_failure(ResolutionError::Network("connection refused".to_string()));

    resolve(&mut conductor, "ok").await;
    let before = conductor.history().to_vec();

    resolve(&mut conductor, "broken").await;

    let message = conductor.state().error().unwrap();
    assert!(message.contains("connection refused"));
    assert_eq!(conductor.history().to_vec(), before);
    assert!(conductor.view() == ResultView::Error(message));
}

#[tokio::test]
async fn test_retry_after_failure_is_accepted() {
    let mut conductor = conductor_with(MockBackend::gated());
    conductor
        .backend()
        .push_failure(ResolutionError::Network("offline".to_string()));
    conductor.backend().push_success(found("10.1/retry"));

    conductor.submit("same citation").unwrap();
    conductor.backend().release(1);
    conductor.wait_for_resolution().await;
    assert!(conductor.state().error().is_some());
    assert!(conductor.history().is_empty());

    assert_eq!(conductor.submit("same citation"), Ok(()));
    assert!(conductor.state().is_loading());

    conductor.backend().release(1);
    conductor.wait_for_resolution().await;
    assert_eq!(conductor.history().len(), 1);
    assert_eq!(
        conductor.backend().requests(),
        vec!["same citation", "same citation"]
    );
}

#[tokio::test]
async fn test_undescribed_failure_uses_configured_fallback() {
    let config = ConductorConfig {
        fallback_error_message: "Search failed, please retry.".to_string(),
        ..ConductorConfig::default()
    };
    let mut conductor = Conductor::new(MockBackend::new(), config);
    conductor
        .backend()
        .push_failure(ResolutionError::Network("  ".to_string()));

    conductor.submit("cite").unwrap();
    conductor.wait_for_resolution().await;

    assert_eq!(conductor.state().error(), Some("Search failed, please retry."));
}

#[tokio::test]
async fn test_every_settled_state_matches_history() {
    let mut conductor = conductor_with(MockBackend::new());
    let outcomes = [
        Ok(found("10.1/a")),
        Err(ResolutionError::Timeout),
        Ok(not_found()),
        Err(ResolutionError::Quota("daily limit".to_string())),
        Ok(found("10.1/b")),
    ];

    let mut successes = 0;
    for (i, outcome) in outcomes.into_iter().enumerate() {
        let ok = outcome.is_ok();
        conductor.backend().push(outcome);
        resolve(&mut conductor, &format!("citation {i}")).await;

        if ok {
            successes += 1;
            let result = conductor.state().result().unwrap();
            let entry = conductor.history().latest().unwrap();
            assert_eq!(entry.reference, format!("citation {i}"));
            assert_eq!(entry.doi, result.doi);
        } else {
            assert!(conductor.state().error().is_some());
        }
        assert_eq!(conductor.history().len(), successes);
    }
}

// =============================================================================
// History Ordering and Ids
// =============================================================================

#[tokio::test]
async fn test_history_is_newest_first() {
    let mut conductor = conductor_with(MockBackend::new());
    for doi in ["10.1/one", "10.1/two", "10.1/three"] {
        conductor.backend().push_success(found(doi));
    }

    resolve(&mut conductor, "one").await;
    resolve(&mut conductor, "two").await;
    resolve(&mut conductor, "three").await;

    let references: Vec<&str> = conductor
        .history()
        .entries()
        .map(|e| e.reference.as_str())
        .collect();
    assert_eq!(references, vec!["three", "two", "one"]);

    let timestamps: Vec<u64> = conductor.history().entries().map(|e| e.timestamp).collect();
    assert!(timestamps.windows(2).all(|w| w[0] >= w[1]));
}

#[tokio::test]
async fn test_history_ids_are_unique() {
    let mut conductor = Conductor::new(
        MockBackend::new(),
        ConductorConfig {
            id_length: 6,
            ..ConductorConfig::default()
        },
    );

    for i in 0..200 {
        conductor.backend().push_success(found(&format!("10.1/{i}")));
        resolve(&mut conductor, &format!("citation {i}")).await;
    }

    let ids: HashSet<String> = conductor
        .history()
        .entries()
        .map(|e| e.id.to_string())
        .collect();
    assert_eq!(ids.len(), 200);
}

#[tokio::test]
async fn test_repeated_citation_gets_separate_entries() {
    let mut conductor = conductor_with(MockBackend::new());
    conductor.backend().push_success(found("10.1/a"));
    conductor.backend().push_success(found("10.1/a"));

    resolve(&mut conductor, "same").await;
    resolve(&mut conductor, "same").await;

    let entries = conductor.history().to_vec();
    assert_eq!(entries.len(), 2);
    assert_ne!(entries[0].id, entries[1].id);
}

// =============================================================================
// History Selection
// =============================================================================

#[tokio::test]
async fn test_select_history_fills_input_only() {
    let mut conductor = conductor_with(MockBackend::new());
    conductor.backend().push_success(found("10.1/old"));
    conductor.backend().push_success(found("10.1/new"));
    resolve(&mut conductor, "older citation").await;
    resolve(&mut conductor, "newer citation").await;

    let state_before = conductor.state().clone();
    let history_before = conductor.history().to_vec();
    let older = conductor.history().nth(1).unwrap().id.clone();

    assert!(conductor.select_history(&older));

    assert_eq!(conductor.pending_input(), "older citation");
    assert_eq!(conductor.state(), &state_before);
    assert_eq!(conductor.history().to_vec(), history_before);
    assert_eq!(conductor.backend().request_count(), 2);
}

#[tokio::test]
async fn test_select_unknown_id_is_rejected() {
    let mut conductor = conductor_with(MockBackend::new());
    conductor.set_input("typed");

    assert!(!conductor.select_history(&"nope123".into()));
    assert_eq!(conductor.pending_input(), "typed");
}

#[tokio::test]
async fn test_selected_entry_can_be_resubmitted() {
    let mut conductor = conductor_with(MockBackend::new());
    conductor.backend().push_success(found("10.1/a"));
    conductor.backend().push_success(found("10.1/a"));
    resolve(&mut conductor, "cite me").await;

    let entry = conductor.history().latest().unwrap().clone();
    conductor.select_entry(&entry);
    assert!(conductor.can_submit());

    conductor.submit_pending().unwrap();
    conductor.wait_for_resolution().await;
    assert_eq!(conductor.history().len(), 2);
    assert_eq!(conductor.backend().requests(), vec!["cite me", "cite me"]);
}

// =============================================================================
// Surface Messages
// =============================================================================

#[tokio::test]
async fn test_surface_sees_full_lifecycle() {
    let (tx, mut rx) = mpsc::channel(32);
    let mut conductor = conductor_with(MockBackend::new()).with_surface(tx);
    conductor.backend().push_success(found("10.1/a"));
    conductor
        .backend()
        .push_failure(ResolutionError::Timeout);

    resolve(&mut conductor, "one").await;
    resolve(&mut conductor, "two").await;
    let entry = conductor.history().latest().unwrap().clone();
    conductor.select_entry(&entry);
    drop(conductor);

    let mut kinds = Vec::new();
    while let Some(msg) = rx.recv().await {
        kinds.push(match msg {
            ConductorMessage::State { state } => state.description(),
            ConductorMessage::HistoryAdded { .. } => "history",
            ConductorMessage::InputChanged { .. } => "input",
        });
    }

    assert_eq!(
        kinds,
        vec![
            "Searching...",
            "history",
            "Resolved",
            "Searching...",
            "Error",
            "input"
        ]
    );
}

// =============================================================================
// Hung Backend Calls
// =============================================================================

#[tokio::test]
async fn test_hung_service_settles_as_failure() {
    use std::time::Duration;

    use doi_conductor::GeminiBackend;
    use tokio::net::TcpListener;

    // Accepts the connection and never answers
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        let (_socket, _) = listener.accept().await.unwrap();
        tokio::time::sleep(Duration::from_secs(30)).await;
    });

    let backend = GeminiBackend::new(
        "key",
        "gemini-test",
        format!("http://{addr}"),
        Duration::from_millis(200),
    )
    .unwrap();
    let mut conductor = Conductor::new(backend, ConductorConfig::default());

    conductor.submit("Smith, J. (2020). Title.").unwrap();
    assert!(conductor.is_loading());
    assert!(conductor.wait_for_resolution().await);

    assert_eq!(
        conductor.state().error(),
        ResolutionError::Timeout.user_message().as_deref()
    );
    assert!(conductor.history().is_empty());
    assert!(!conductor.is_loading());
}
