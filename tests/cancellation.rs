//! Cancellation Integration Tests
//!
//! Cooperative cancellation at stage boundaries and client disconnects.

mod common;

use std::sync::Arc;
use std::time::Duration;

use aippt::core::CancelHandle;
use aippt::domain::{ErrorKind, Event, StatusPhase, CANCELLED_MESSAGE};
use common::*;

fn assert_cancelled(event: &Event) {
    match event {
        Event::Error(report) => {
            assert_eq!(report.kind, ErrorKind::Cancelled);
            assert_eq!(report.message, CANCELLED_MESSAGE);
            assert_eq!(report.slide_index, None);
        }
        other => panic!("expected cancellation error, got {:?}", other),
    }
}

fn slide_indices(events: &[Event]) -> Vec<usize> {
    events
        .iter()
        .filter_map(|e| match e {
            Event::Slide(slide) => Some(slide.index),
            _ => None,
        })
        .collect()
}

#[tokio::test]
async fn test_cancel_before_start() {
    let cancel = CancelHandle::new();
    cancel.cancel();

    let llm = Arc::new(ScriptedLlm::full_deck(6));
    let events = run_to_end(&llm, "The history of espresso", cancel).await;

    assert_eq!(events.len(), 1);
    assert_cancelled(&events[0]);
    assert!(llm.chat_calls().is_empty());
}

#[tokio::test]
async fn test_cancel_during_planning_skips_outline() {
    let cancel = CancelHandle::new();
    let llm = Arc::new(ScriptedLlm::full_deck(6).cancel_on_chat(0, cancel.clone()));
    let events = run_to_end(&llm, "The history of espresso", cancel).await;

    assert_eq!(kinds(&events), vec!["status", "error"]);
    assert_cancelled(&events[1]);
    assert_eq!(llm.chat_calls().len(), 1);
}

#[tokio::test]
async fn test_cancel_between_slides() {
    // Cancel while slide 2's image is generated: slides 0..=2 complete,
    // nothing for slide 3 onwards
    let cancel = CancelHandle::new();
    let llm = Arc::new(ScriptedLlm::full_deck(6).cancel_on_image(2, cancel.clone()));
    let events = run_to_end(&llm, "The history of espresso", cancel).await;

    assert_eq!(slide_indices(&events), vec![0, 1, 2]);
    assert_cancelled(events.last().unwrap());
    assert!(!events.iter().any(|e| matches!(e, Event::Done(_))));

    let touched_later_slide = events.iter().any(|e| match e {
        Event::Status(s) => s.slide_index.map_or(false, |i| i > 2),
        _ => false,
    });
    assert!(!touched_later_slide);
    assert_eq!(llm.chat_calls().len(), 4);
}

#[tokio::test]
async fn test_cancel_after_design_skips_image() {
    // Chat call 2 designs slide 1
    let cancel = CancelHandle::new();
    let llm = Arc::new(ScriptedLlm::full_deck(6).cancel_on_chat(2, cancel.clone()));
    let events = run_to_end(&llm, "The history of espresso", cancel).await;

    assert_eq!(slide_indices(&events), vec![0]);
    assert_cancelled(events.last().unwrap());

    let image_status_for_slide_1 = events.iter().any(|e| {
        matches!(e, Event::Status(s) if s.status == StatusPhase::GeneratingImage && s.slide_index == Some(1))
    });
    assert!(!image_status_for_slide_1);
    assert_eq!(llm.image_calls().len(), 1);
}

#[tokio::test]
async fn test_exactly_one_terminal_event() {
    let cancel = CancelHandle::new();
    let llm = Arc::new(ScriptedLlm::full_deck(8).cancel_on_image(4, cancel.clone()));
    let events = run_to_end(&llm, "The history of espresso", cancel).await;

    let terminal: Vec<_> = events.iter().filter(|e| e.is_terminal()).collect();
    assert_eq!(terminal.len(), 1);
    assert!(events.last().unwrap().is_terminal());
}

#[tokio::test]
async fn test_dropped_stream_cancels_run() {
    let cancel = CancelHandle::new();
    let llm = Arc::new(ScriptedLlm::full_deck(8));

    let mut stream = orchestrator(&llm, aippt::domain::Provider::Gemini)
        .generate("The history of espresso", cancel.clone());
    let first = stream.next_event().await.unwrap();
    assert_eq!(first.kind(), "status");
    drop(stream);

    tokio::time::timeout(Duration::from_secs(5), async {
        while !cancel.is_cancelled() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await
    .expect("run should cancel itself after the consumer disconnects");

    // Give the worker a moment to reach its next boundary, then confirm it stopped
    tokio::time::sleep(Duration::from_millis(50)).await;
    let calls = llm.chat_calls().len();
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(llm.chat_calls().len(), calls);
    assert!(calls < 9);
}

#[tokio::test]
async fn test_finished_waits_for_worker() {
    let cancel = CancelHandle::new();
    let llm = Arc::new(ScriptedLlm::full_deck(6).with_chat_delay(Duration::from_millis(10)));

    let mut stream = orchestrator(&llm, aippt::domain::Provider::Gemini)
        .generate("The history of espresso", cancel.clone());
    assert_eq!(stream.next_event().await.map(|e| e.kind()), Some("status"));
    stream.finished().await;

    // Worker noticed the disconnect when emitting the outline
    assert!(cancel.is_cancelled());
    assert_eq!(llm.chat_calls().len(), 1);
}
