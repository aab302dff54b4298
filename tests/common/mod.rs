//! Shared fixtures: a scripted LLM client and canned stage payloads.

#![allow(dead_code)]

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use serde_json::json;

use aippt::adapters::{LlmClient, LlmError};
use aippt::core::{CancelHandle, GenerationLimits, Orchestrator};
use aippt::domain::{Event, Provider};
use aippt::prompts::PromptRegistry;

/// LLM stub replaying queued replies in call order
#[derive(Default)]
pub struct ScriptedLlm {
    chat_replies: Mutex<VecDeque<Result<String, LlmError>>>,
    image_replies: Mutex<VecDeque<Result<String, LlmError>>>,
    chat_calls: Mutex<Vec<(String, String)>>,
    image_calls: Mutex<Vec<(String, Option<String>)>>,
    chat_delay: Option<Duration>,
    cancel_on_chat: Option<(usize, CancelHandle)>,
    cancel_on_image: Option<(usize, CancelHandle)>,
    panic_on_chat: Option<usize>,
}

impl ScriptedLlm {
    pub fn new() -> Self {
        Self::default()
    }

    /// Outline followed by `slides` valid designs
    pub fn full_deck(slides: usize) -> Self {
        let llm = Self::new().reply(outline_json(slides));
        (0..slides).fold(llm, |llm, i| llm.reply(design_json(i)))
    }

    pub fn reply(self, text: impl Into<String>) -> Self {
        self.chat_replies.lock().unwrap().push_back(Ok(text.into()));
        self
    }

    pub fn reply_err(self, err: LlmError) -> Self {
        self.chat_replies.lock().unwrap().push_back(Err(err));
        self
    }

    /// Queue an image outcome; images default to `/tmp/images/slide_<n>.png`
    pub fn image(self, location: impl Into<String>) -> Self {
        self.image_replies.lock().unwrap().push_back(Ok(location.into()));
        self
    }

    pub fn image_err(self, err: LlmError) -> Self {
        self.image_replies.lock().unwrap().push_back(Err(err));
        self
    }

    pub fn with_chat_delay(mut self, delay: Duration) -> Self {
        self.chat_delay = Some(delay);
        self
    }

    /// Cancel `handle` when the nth (0-based) chat call starts
    pub fn cancel_on_chat(mut self, call: usize, handle: CancelHandle) -> Self {
        self.cancel_on_chat = Some((call, handle));
        self
    }

    /// Cancel `handle` when the nth (0-based) image call starts
    pub fn cancel_on_image(mut self, call: usize, handle: CancelHandle) -> Self {
        self.cancel_on_image = Some((call, handle));
        self
    }

    pub fn panic_on_chat(mut self, call: usize) -> Self {
        self.panic_on_chat = Some(call);
        self
    }

    pub fn chat_calls(&self) -> Vec<(String, String)> {
        self.chat_calls.lock().unwrap().clone()
    }

    pub fn image_calls(&self) -> Vec<(String, Option<String>)> {
        self.image_calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl LlmClient for ScriptedLlm {
    fn provider(&self) -> Provider {
        Provider::Gemini
    }

    async fn chat(&self, system_prompt: &str, user_prompt: &str) -> Result<String, LlmError> {
        let call = {
            let mut calls = self.chat_calls.lock().unwrap();
            calls.push((system_prompt.to_string(), user_prompt.to_string()));
            calls.len() - 1
        };

        let reply = self.chat_replies.lock().unwrap().pop_front();

        if let Some((at, handle)) = &self.cancel_on_chat {
            if *at == call {
                handle.cancel();
            }
        }
        if self.panic_on_chat == Some(call) {
            panic!("scripted panic on chat call {}", call);
        }
        if let Some(delay) = self.chat_delay {
            tokio::time::sleep(delay).await;
        }

        reply.unwrap_or_else(|| {
            Err(LlmError::MalformedResponse {
                provider: Provider::Gemini,
                detail: "script exhausted".to_string(),
            })
        })
    }

    async fn generate_image(
        &self,
        prompt: &str,
        _size: &str,
        negative_prompt: Option<&str>,
    ) -> Result<String, LlmError> {
        let call = {
            let mut calls = self.image_calls.lock().unwrap();
            calls.push((prompt.to_string(), negative_prompt.map(str::to_string)));
            calls.len() - 1
        };

        if let Some((at, handle)) = &self.cancel_on_image {
            if *at == call {
                handle.cancel();
            }
        }

        self.image_replies
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok(format!("/tmp/images/slide_{}.png", call)))
    }
}

pub fn transport_error() -> LlmError {
    LlmError::Transport {
        provider: Provider::Gemini,
        message: "connection reset".to_string(),
    }
}

pub fn outline_json(slides: usize) -> String {
    let briefs: Vec<_> = (0..slides)
        .map(|i| {
            json!({
                "title": format!("Slide {}", i),
                "purpose": format!("Explain point {}", i),
                "visualAdvice": "Full-bleed image with a bold headline",
            })
        })
        .collect();

    json!({
        "topic": "The history of espresso",
        "title": "Pressure & Crema",
        "subtitle": "A short history of espresso",
        "targetAudience": "Coffee enthusiasts",
        "presentationGoal": "Explain how espresso evolved",
        "tone": "warm",
        "visualTheme": "Warm Vintage",
        "accentColor": "#b45309",
        "researchContext": "Invented in Italy in the early 1900s.",
        "slides": briefs,
    })
    .to_string()
}

pub fn design_json(index: usize) -> String {
    json!({
        "title": format!("Slide {}", index),
        "subtitle": "",
        "content": ["First point", "Second point"],
        "imagePrompt": format!("Vintage espresso machine number {}", index),
        "htmlContent": format!(
            "<div style=\"background-image:url('__SLIDE_IMAGE__')\"><h1>Slide {}</h1></div>",
            index
        ),
        "designDirective": "Warm tones",
    })
    .to_string()
}

/// Orchestrator using one scripted client for text and images
pub fn orchestrator(llm: &Arc<ScriptedLlm>, provider: Provider) -> Orchestrator {
    let client: Arc<dyn LlmClient> = llm.clone();
    Orchestrator::new(
        client.clone(),
        client,
        PromptRegistry::builtin().resolve(provider),
        GenerationLimits::default(),
    )
}

pub async fn run_to_end(llm: &Arc<ScriptedLlm>, topic: &str, cancel: CancelHandle) -> Vec<Event> {
    orchestrator(llm, Provider::Gemini)
        .generate(topic, cancel)
        .collect_all()
        .await
}

pub fn kinds(events: &[Event]) -> Vec<&'static str> {
    events.iter().map(Event::kind).collect()
}
