//! Run Log Integration Tests
//!
//! Runs are logged event by event and replayed into deck state.

mod common;

use std::sync::Arc;

use aippt::core::{list_runs, CancelHandle, RunLog};
use aippt::domain::{Deck, DeckState, Event};
use common::*;
use tempfile::TempDir;
use uuid::Uuid;

async fn logged_run(base: &std::path::Path, llm: &Arc<ScriptedLlm>, cancel: CancelHandle) -> (Uuid, Vec<Event>) {
    let mut stream = orchestrator(llm, aippt::domain::Provider::Gemini)
        .generate("The history of espresso", cancel);
    let log = RunLog::open(base, stream.run_id()).await.unwrap();

    let mut events = Vec::new();
    while let Some(event) = stream.next_event().await {
        log.append(&event).await.unwrap();
        events.push(event);
    }
    stream.finished().await;

    (log.run_id(), events)
}

#[tokio::test]
async fn test_completed_run_replays_to_deck() {
    let temp = TempDir::new().unwrap();
    let llm = Arc::new(ScriptedLlm::full_deck(6));
    let (run_id, emitted) = logged_run(temp.path(), &llm, CancelHandle::new()).await;

    let log = RunLog::open(temp.path(), run_id).await.unwrap();
    let replayed = log.replay().await.unwrap();
    assert_eq!(replayed, emitted);

    let deck = Deck::from_events(&replayed).unwrap();
    assert_eq!(deck.state, DeckState::Completed);
    assert_eq!(deck.title(), Some("Pressure & Crema"));
    assert_eq!(deck.slides.len(), 6);
    assert_eq!(deck.planned_slides(), 6);
    assert!(deck.slide_errors.is_empty());
}

#[tokio::test]
async fn test_partial_run_keeps_slide_errors() {
    let temp = TempDir::new().unwrap();
    let llm = ScriptedLlm::new()
        .reply(outline_json(6))
        .reply(design_json(0))
        .reply("not json at all");
    let llm = (2..6).fold(llm, |llm, i| llm.reply(design_json(i)));
    let llm = Arc::new(llm);

    let (run_id, _) = logged_run(temp.path(), &llm, CancelHandle::new()).await;
    let log = RunLog::open(temp.path(), run_id).await.unwrap();
    let deck = Deck::from_events(&log.replay().await.unwrap()).unwrap();

    assert_eq!(deck.state, DeckState::Completed);
    assert_eq!(deck.slides.len(), 5);
    assert_eq!(deck.slide_errors.len(), 1);
    assert_eq!(deck.slide_errors[0].slide_index, Some(1));
}

#[tokio::test]
async fn test_failed_and_cancelled_runs() {
    let temp = TempDir::new().unwrap();

    let failing = Arc::new(ScriptedLlm::new().reply_err(transport_error()));
    let (failed_id, _) = logged_run(temp.path(), &failing, CancelHandle::new()).await;

    let cancel = CancelHandle::new();
    let cancelling = Arc::new(ScriptedLlm::full_deck(6).cancel_on_image(1, cancel.clone()));
    let (cancelled_id, _) = logged_run(temp.path(), &cancelling, cancel).await;

    let failed = RunLog::open(temp.path(), failed_id).await.unwrap();
    let deck = Deck::from_events(&failed.replay().await.unwrap()).unwrap();
    assert!(matches!(deck.state, DeckState::Failed { ref error } if error.contains("connection reset")));
    assert!(deck.outline.is_none());

    let cancelled = RunLog::open(temp.path(), cancelled_id).await.unwrap();
    let deck = Deck::from_events(&cancelled.replay().await.unwrap()).unwrap();
    assert_eq!(deck.state, DeckState::Cancelled);
    assert_eq!(deck.slides.len(), 2);

    let mut runs = list_runs(temp.path()).await.unwrap();
    runs.sort();
    let mut expected = vec![failed_id, cancelled_id];
    expected.sort();
    assert_eq!(runs, expected);
}

#[test]
fn test_log_lines_are_json_objects() {
    tokio_test::block_on(async {
        let temp = TempDir::new().unwrap();
        let run_id = Uuid::new_v4();
        let log = RunLog::open(temp.path(), run_id).await.unwrap();
        log.append(&Event::planning()).await.unwrap();
        log.append(&Event::done(0, "Empty")).await.unwrap();

        let content = std::fs::read_to_string(log.events_path()).unwrap();
        let lines: Vec<serde_json::Value> = content
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0]["run_id"], run_id.to_string());
        assert_eq!(lines[0]["event"]["event"], "status");
        assert_eq!(lines[0]["event"]["data"]["status"], "planning");
        assert_eq!(lines[1]["event"]["data"]["totalSlides"], 0);
        assert!(lines[1]["timestamp"].is_string());
    });
}
