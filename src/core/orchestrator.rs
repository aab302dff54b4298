//! Main orchestrator for deck generation.
//!
//! Runs planner, designer and artist in sequence and reports progress as a
//! stream of [`Event`]s. The run executes on a spawned worker that feeds a
//! bounded channel; the caller drains it through [`EventStream`].
//!
//! Failure containment:
//! - Planner failure ends the run with one fatal `error` event
//! - Designer failure (or a panic inside a slide) yields a per-slide `error`
//!   event and the loop moves on
//! - Image failures never surface; the artist substitutes a placeholder
//!
//! Cancellation is polled before planning, after the outline, before each
//! slide and after each design.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use futures::{FutureExt, Stream};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{error, info, info_span, warn, Instrument};
use uuid::Uuid;

use crate::adapters::LlmClient;
use crate::domain::{DeckMetadata, Event, FinalSlide, SlideBrief};
use crate::prompts::PromptSet;

use super::artist::Artist;
use super::cancel::CancelHandle;
use super::designer::Designer;
use super::extract::preview;
use super::limits::GenerationLimits;
use super::planner::Planner;

/// Events buffered between the worker and a slow consumer
const EVENT_BUFFER: usize = 16;

/// Main deck generation orchestrator
#[derive(Clone)]
pub struct Orchestrator {
    planner: Planner,
    designer: Designer,
    artist: Artist,
    limits: GenerationLimits,
}

impl Orchestrator {
    /// Wire the three stages from a text client, an image client and a prompt bundle
    pub fn new(
        text_llm: Arc<dyn LlmClient>,
        image_llm: Arc<dyn LlmClient>,
        prompts: PromptSet,
        limits: GenerationLimits,
    ) -> Self {
        Self {
            planner: Planner::new(text_llm.clone(), prompts, limits.clone()),
            designer: Designer::new(text_llm, prompts),
            artist: Artist::new(image_llm, prompts.enhance_image),
            limits,
        }
    }

    pub fn from_stages(
        planner: Planner,
        designer: Designer,
        artist: Artist,
        limits: GenerationLimits,
    ) -> Self {
        Self {
            planner,
            designer,
            artist,
            limits,
        }
    }

    /// Start a run for `topic`, returning its event stream.
    ///
    /// Must be called inside a tokio runtime. Dropping the stream counts as
    /// a client disconnect: the run cancels itself at its next emission.
    pub fn generate(&self, topic: impl Into<String>, cancel: CancelHandle) -> EventStream {
        let topic = topic.into();
        let run_id = Uuid::new_v4();
        let (tx, rx) = mpsc::channel(EVENT_BUFFER);

        let span = info_span!("run", %run_id, topic = %preview(&topic, 60));
        let sink = EventSink {
            tx: tx.clone(),
            cancel: cancel.clone(),
        };

        let worker = tokio::spawn(
            self.clone()
                .run(topic, cancel, sink)
                .instrument(span.clone()),
        );

        // A panic outside the per-slide guard still ends with an event
        let supervisor = tokio::spawn(
            async move {
                if let Err(e) = worker.await {
                    if e.is_panic() {
                        let message = panic_message(e.into_panic().as_ref());
                        error!(%message, "Run worker panicked");
                        let _ = tx.send(Event::fatal(format!("Internal error: {}", message))).await;
                    }
                }
            }
            .instrument(span),
        );

        EventStream {
            run_id,
            rx,
            supervisor,
        }
    }

    async fn run(self, topic: String, cancel: CancelHandle, sink: EventSink) {
        let started = std::time::Instant::now();

        if cancel.is_cancelled() {
            info!("Run cancelled before start");
            sink.emit(Event::cancelled()).await;
            return;
        }

        let topic = match self.limits.validate_topic(&topic) {
            Ok(topic) => topic.to_string(),
            Err(violation) => {
                warn!(%violation, "Rejected topic");
                sink.emit(Event::fatal(violation.to_string())).await;
                return;
            }
        };

        if !sink.emit(Event::planning()).await {
            return;
        }

        let outline = match self.planner.generate_outline(&topic).await {
            Ok(outline) => outline,
            Err(e) => {
                error!(error = %e, "Planner failed");
                sink.emit(Event::fatal(format!("Outline generation failed: {}", e)))
                    .await;
                return;
            }
        };

        if cancel.is_cancelled() {
            info!("Run cancelled after planning");
            sink.emit(Event::cancelled()).await;
            return;
        }

        if !sink.emit(Event::Outline(outline.clone())).await {
            return;
        }

        let metadata = outline.metadata();
        let total = outline.slides.len();
        let mut produced = 0;

        for (index, brief) in outline.slides.iter().enumerate() {
            if cancel.is_cancelled() {
                info!(slide_index = index, "Run cancelled before slide");
                sink.emit(Event::cancelled()).await;
                return;
            }

            if !sink.emit(Event::designing(index, total, &brief.title)).await {
                return;
            }

            let attempt = self.build_slide(&metadata, brief, index, total, &cancel, &sink);
            let outcome = AssertUnwindSafe(attempt)
                .catch_unwind()
                .await
                .unwrap_or_else(|panic| SlideOutcome::Failed(panic_message(panic.as_ref())));

            match outcome {
                SlideOutcome::Ready(slide) => {
                    produced += 1;
                    if !sink.emit(Event::Slide(slide)).await {
                        return;
                    }
                }
                SlideOutcome::Failed(message) => {
                    error!(slide_index = index, error = %message, "Slide failed");
                    let event =
                        Event::slide_failed(index, format!("Slide {} generation failed: {}", index + 1, message));
                    if !sink.emit(event).await {
                        return;
                    }
                }
                SlideOutcome::Cancelled => {
                    info!(slide_index = index, "Run cancelled after design");
                    sink.emit(Event::cancelled()).await;
                    return;
                }
                SlideOutcome::Disconnected => return,
            }
        }

        info!(
            produced,
            total,
            elapsed_ms = started.elapsed().as_millis() as u64,
            "Run completed"
        );
        sink.emit(Event::done(produced, outline.title)).await;
    }

    /// Design + image for one slide
    async fn build_slide(
        &self,
        metadata: &DeckMetadata,
        brief: &SlideBrief,
        index: usize,
        total: usize,
        cancel: &CancelHandle,
        sink: &EventSink,
    ) -> SlideOutcome {
        let design = match self.designer.design_slide(metadata, brief, index).await {
            Ok(design) => design,
            Err(e) => return SlideOutcome::Failed(e.to_string()),
        };

        if cancel.is_cancelled() {
            return SlideOutcome::Cancelled;
        }

        if !sink.emit(Event::generating_image(index, total)).await {
            return SlideOutcome::Disconnected;
        }

        let location = self.artist.generate_image(&design.image_prompt).await;
        let image_url = public_image_url(&location);

        SlideOutcome::Ready(FinalSlide::new(index, brief.clone(), design, image_url))
    }
}

enum SlideOutcome {
    Ready(FinalSlide),
    Failed(String),
    Cancelled,
    Disconnected,
}

/// Sending half of a run; a failed send means the consumer went away
struct EventSink {
    tx: mpsc::Sender<Event>,
    cancel: CancelHandle,
}

impl EventSink {
    /// Deliver an event; on disconnect, request cancellation and return false
    async fn emit(&self, event: Event) -> bool {
        if self.tx.send(event).await.is_ok() {
            return true;
        }

        if !self.cancel.is_cancelled() {
            warn!("Event consumer disconnected, cancelling run");
            self.cancel.cancel();
        }
        false
    }
}

/// Map an image location to the URL clients load it from.
///
/// Remote (`http(s)`) and inline (`data:`) locations pass through; a local
/// file path becomes `/images/<filename>`.
pub fn public_image_url(location: &str) -> String {
    if location.starts_with("http://")
        || location.starts_with("https://")
        || location.starts_with("data:")
    {
        return location.to_string();
    }

    let file_name = location
        .rsplit(|c: char| c == '/' || c == '\\')
        .next()
        .unwrap_or(location);
    format!("/images/{}", file_name)
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}

/// Receiving half of a run
pub struct EventStream {
    run_id: Uuid,
    rx: mpsc::Receiver<Event>,
    supervisor: JoinHandle<()>,
}

impl EventStream {
    /// Identifier for this run (used for tracing and run logs)
    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    /// Next event, or None once the run has terminated
    pub async fn next_event(&mut self) -> Option<Event> {
        self.rx.recv().await
    }

    /// Drain the run to completion
    pub async fn collect_all(mut self) -> Vec<Event> {
        let mut events = Vec::new();
        while let Some(event) = self.rx.recv().await {
            events.push(event);
        }
        self.finished().await;
        events
    }

    /// Stop consuming and wait for the worker to exit
    pub async fn finished(self) {
        drop(self.rx);
        let _ = self.supervisor.await;
    }
}

impl Stream for EventStream {
    type Item = Event;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Event>> {
        self.get_mut().rx.poll_recv(cx)
    }
}
