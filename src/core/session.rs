//! One caller's control session.
//!
//! A session owns at most one active run. Starting a new run first cancels
//! the active one and waits for it to terminate, so two runs never write
//! to the same outbound channel at once.

use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tracing::{info, warn};

use crate::adapters::{create_client, LlmError};
use crate::config::{KeyStore, ResolvedConfig};
use crate::domain::{ControlMessage, Event, Provider};
use crate::prompts::PromptRegistry;

use super::cancel::CancelHandle;
use super::limits::GenerationLimits;
use super::orchestrator::{EventStream, Orchestrator};

/// Builds the orchestrator for one run
pub trait PipelineFactory: Send + Sync {
    /// `provider` None selects the default; `api_key` None uses the stored key
    fn build(&self, provider: Option<Provider>, api_key: Option<&str>) -> Result<Orchestrator, LlmError>;
}

impl<T: PipelineFactory + ?Sized> PipelineFactory for Arc<T> {
    fn build(&self, provider: Option<Provider>, api_key: Option<&str>) -> Result<Orchestrator, LlmError> {
        (**self).build(provider, api_key)
    }
}

/// Factory backed by the real provider clients
#[derive(Debug, Clone)]
pub struct ProviderPipelineFactory {
    config: ResolvedConfig,
    keys: KeyStore,
    registry: PromptRegistry,
}

impl ProviderPipelineFactory {
    pub fn new(config: ResolvedConfig, keys: KeyStore) -> Self {
        Self {
            config,
            keys,
            registry: PromptRegistry::builtin(),
        }
    }

    pub fn with_registry(mut self, registry: PromptRegistry) -> Self {
        self.registry = registry;
        self
    }
}

impl PipelineFactory for ProviderPipelineFactory {
    fn build(&self, provider: Option<Provider>, api_key: Option<&str>) -> Result<Orchestrator, LlmError> {
        let provider = provider
            .or_else(|| self.keys.active_provider())
            .unwrap_or(Provider::Gemini);

        let client = create_client(provider, api_key, &self.config, &self.keys)?;
        info!(%provider, "Pipeline built");

        Ok(Orchestrator::new(
            client.clone(),
            client,
            self.registry.resolve(provider),
            self.config.limits.clone(),
        ))
    }
}

/// Control session bound to an outbound event channel
pub struct Session<F: PipelineFactory> {
    factory: F,
    outbound: mpsc::Sender<Event>,
    cancel: CancelHandle,
    active: Option<JoinHandle<()>>,
    limits: GenerationLimits,
}

impl<F: PipelineFactory> Session<F> {
    pub fn new(factory: F, outbound: mpsc::Sender<Event>, limits: GenerationLimits) -> Self {
        Self {
            factory,
            outbound,
            cancel: CancelHandle::new(),
            active: None,
            limits,
        }
    }

    /// Dispatch an inbound control message
    pub async fn handle(&mut self, message: ControlMessage) {
        match message {
            ControlMessage::Generate {
                topic,
                provider,
                api_key,
            } => self.start(&topic, &provider, &api_key).await,
            ControlMessage::Cancel => self.cancel(),
        }
    }

    /// Start a run, superseding any active one.
    ///
    /// Invalid requests produce a single `error` event and start nothing.
    pub async fn start(&mut self, topic: &str, provider: &str, api_key: &str) {
        self.stop_active().await;

        let topic = match self.limits.validate_topic(topic) {
            Ok(topic) => topic,
            Err(violation) => {
                warn!(%violation, "Rejected generate request");
                self.reply(Event::fatal(violation.to_string())).await;
                return;
            }
        };

        let provider = match provider.trim() {
            "" => None,
            name => match name.parse::<Provider>() {
                Ok(provider) => Some(provider),
                Err(e) => {
                    warn!(error = %e, "Rejected generate request");
                    self.reply(Event::fatal(e.to_string())).await;
                    return;
                }
            },
        };

        let api_key = Some(api_key.trim()).filter(|k| !k.is_empty());

        let orchestrator = match self.factory.build(provider, api_key) {
            Ok(orchestrator) => orchestrator,
            Err(e) => {
                warn!(error = %e, "Failed to build pipeline");
                self.reply(Event::fatal(format!("Failed to initialize model client: {}", e)))
                    .await;
                return;
            }
        };

        let stream = orchestrator.generate(topic, self.cancel.clone());
        info!(run_id = %stream.run_id(), "Run started");

        let outbound = self.outbound.clone();
        let cancel = self.cancel.clone();
        self.active = Some(tokio::spawn(forward(stream, outbound, cancel)));
    }

    /// Request cancellation of the active run; no-op when idle
    pub fn cancel(&self) {
        if self.is_active() {
            info!("Cancelling active run");
            self.cancel.cancel();
        }
    }

    pub fn is_active(&self) -> bool {
        self.active.as_ref().is_some_and(|handle| !handle.is_finished())
    }

    /// Wait for the active run to finish on its own
    pub async fn wait(&mut self) {
        if let Some(handle) = self.active.take() {
            let _ = handle.await;
        }
        self.cancel.clear();
    }

    /// Connection closed: cancel and await the active run
    pub async fn shutdown(&mut self) {
        self.stop_active().await;
    }

    async fn stop_active(&mut self) {
        if let Some(handle) = self.active.take() {
            self.cancel.cancel();
            let _ = handle.await;
        }
        self.cancel.clear();
    }

    async fn reply(&self, event: Event) {
        if self.outbound.send(event).await.is_err() {
            warn!("Outbound channel closed");
        }
    }
}

/// Relay a run's events; a closed outbound channel cancels the run
async fn forward(mut stream: EventStream, outbound: mpsc::Sender<Event>, cancel: CancelHandle) {
    while let Some(event) = stream.next_event().await {
        if outbound.send(event).await.is_err() {
            warn!("Client disconnected, cancelling run");
            cancel.cancel();
            break;
        }
    }

    stream.finished().await;
}
