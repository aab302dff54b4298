//! Command-line interface for aippt.
//!
//! Provides commands for generating decks, running a line-delimited
//! control session, inspecting logged runs, and managing API keys.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tracing::{error, warn};
use uuid::Uuid;

use crate::adapters::create_client;
use crate::config::{load_config, KeyStore, ResolvedConfig};
use crate::core::{list_runs, CancelHandle, PipelineFactory, ProviderPipelineFactory, RunLog, Session};
use crate::domain::{ControlMessage, Deck, DeckState, Event, Provider};

/// aippt - AI slide deck generation pipeline
#[derive(Parser, Debug)]
#[command(name = "aippt")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Generate a deck, streaming events to stdout as JSON lines
    Generate {
        /// Presentation topic
        topic: String,

        /// Model provider (qwen or gemini); defaults to the configured one
        #[arg(short, long)]
        provider: Option<String>,

        /// API key for this run only
        #[arg(long, env = "AIPPT_API_KEY", hide_env_values = true)]
        api_key: Option<String>,
    },

    /// Read control messages from stdin and write events to stdout
    Serve,

    /// Show the state of a logged run
    Status {
        /// Run ID (UUID)
        run_id: String,
    },

    /// List recent runs
    Runs {
        /// Maximum number of runs to show
        #[arg(short, long, default_value = "10")]
        limit: usize,
    },

    /// Show which providers have API keys
    Providers,

    /// Validate and store an API key
    SaveKey {
        /// Provider the key belongs to
        provider: String,

        /// The API key
        key: String,
    },

    /// Show the resolved configuration
    Config,
}

impl Cli {
    /// Execute the CLI command
    pub async fn execute(self) -> Result<()> {
        let config = load_config()?;
        let keys = KeyStore::from_env(config.env_file());

        match self.command {
            Commands::Generate {
                topic,
                provider,
                api_key,
            } => generate(&config, keys, topic, provider, api_key).await,
            Commands::Serve => serve(&config, keys).await,
            Commands::Status { run_id } => show_status(&config, &run_id).await,
            Commands::Runs { limit } => show_runs(&config, limit).await,
            Commands::Providers => show_providers(&keys),
            Commands::SaveKey { provider, key } => save_key(&config, &keys, &provider, &key).await,
            Commands::Config => show_config(&config, &keys),
        }
    }
}

fn print_event(event: &Event) {
    match serde_json::to_string(event) {
        Ok(line) => println!("{}", line),
        Err(e) => error!(error = %e, "Failed to serialize event"),
    }
}

/// Run one pipeline, logging every event
async fn generate(
    config: &ResolvedConfig,
    keys: KeyStore,
    topic: String,
    provider: Option<String>,
    api_key: Option<String>,
) -> Result<()> {
    let provider = provider
        .map(|p| p.parse::<Provider>())
        .transpose()?;

    let factory = ProviderPipelineFactory::new(config.clone(), keys);
    let orchestrator = factory
        .build(provider, api_key.as_deref())
        .context("Failed to initialize model client")?;

    let cancel = CancelHandle::new();
    let mut stream = orchestrator.generate(topic, cancel.clone());
    let log = RunLog::open(&config.runs_dir(), stream.run_id()).await?;
    eprintln!("[Run {} started]", stream.run_id());

    let interrupt = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, cancelling run");
            interrupt.cancel();
        }
    });

    let mut deck = Deck::default();
    while let Some(event) = stream.next_event().await {
        log.append(&event).await?;
        deck.apply_event(&event);
        print_event(&event);
    }
    stream.finished().await;

    match &deck.state {
        DeckState::Completed => {
            eprintln!(
                "\n[Run {} completed: {}/{} slides]",
                log.run_id(),
                deck.slides.len(),
                deck.planned_slides()
            );
        }
        DeckState::Cancelled => {
            eprintln!("\n[Run {} cancelled]", log.run_id());
            std::process::exit(130);
        }
        DeckState::Failed { error } => {
            eprintln!("\n[Run {} failed: {}]", log.run_id(), error);
            std::process::exit(1);
        }
        DeckState::Running => {
            eprintln!("\n[Run {} ended without a terminal event]", log.run_id());
            std::process::exit(1);
        }
    }

    Ok(())
}

/// Line-delimited control session over stdin/stdout.
///
/// EOF on stdin lets the active run finish; Ctrl-C cancels it.
async fn serve(config: &ResolvedConfig, keys: KeyStore) -> Result<()> {
    let (tx, mut rx) = mpsc::channel::<Event>(64);
    let writer = tokio::spawn(async move {
        while let Some(event) = rx.recv().await {
            print_event(&event);
        }
    });

    let replies = tx.clone();
    let factory = ProviderPipelineFactory::new(config.clone(), keys);
    let mut session = Session::new(factory, tx, config.limits.clone());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let interrupt = tokio::signal::ctrl_c();
    tokio::pin!(interrupt);

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line.context("Failed to read from stdin")? else {
                    session.wait().await;
                    break;
                };
                if line.trim().is_empty() {
                    continue;
                }

                match serde_json::from_str::<ControlMessage>(&line) {
                    Ok(message) => session.handle(message).await,
                    Err(e) => {
                        warn!(error = %e, "Invalid control message");
                        let _ = replies
                            .send(Event::fatal(format!("Invalid control message: {}", e)))
                            .await;
                    }
                }
            }
            _ = &mut interrupt => {
                warn!("Interrupt received, shutting down session");
                session.shutdown().await;
                break;
            }
        }
    }

    drop(session);
    drop(replies);
    let _ = writer.await;
    Ok(())
}

async fn load_deck(config: &ResolvedConfig, run_id: Uuid) -> Result<Option<Deck>> {
    let log = RunLog::open(&config.runs_dir(), run_id).await?;
    let events = log.replay().await?;
    Ok(Deck::from_events(&events))
}

fn state_label(state: &DeckState) -> &'static str {
    match state {
        DeckState::Running => "running",
        DeckState::Completed => "completed",
        DeckState::Cancelled => "cancelled",
        DeckState::Failed { .. } => "failed",
    }
}

/// Show the status of a run
async fn show_status(config: &ResolvedConfig, run_id_str: &str) -> Result<()> {
    let run_id = Uuid::parse_str(run_id_str)
        .with_context(|| format!("Invalid run ID: {}", run_id_str))?;

    if !config.runs_dir().join(run_id.to_string()).exists() {
        anyhow::bail!("No run found with ID {}", run_id);
    }

    let Some(deck) = load_deck(config, run_id).await? else {
        anyhow::bail!("No events found for run {}", run_id);
    };

    println!("Run ID: {}", run_id);
    println!("Title: {}", deck.title().unwrap_or("(no outline)"));
    println!("State: {}", state_label(&deck.state));
    if let DeckState::Failed { error } = &deck.state {
        println!("Error: {}", error);
    }
    println!("Slides: {}/{}", deck.slides.len(), deck.planned_slides());

    if !deck.slides.is_empty() {
        println!("\nSlides:");
        for slide in &deck.slides {
            println!("  {}. {} ({})", slide.index + 1, slide.design.title, slide.image_url);
        }
    }

    if !deck.slide_errors.is_empty() {
        println!("\nFailed slides:");
        for report in &deck.slide_errors {
            let index = report.slide_index.map(|i| (i + 1).to_string()).unwrap_or_default();
            println!("  {}. {}", index, report.message);
        }
    }

    Ok(())
}

/// List recent runs
async fn show_runs(config: &ResolvedConfig, limit: usize) -> Result<()> {
    let runs = list_runs(&config.runs_dir()).await?;

    if runs.is_empty() {
        println!("No runs found");
        return Ok(());
    }

    println!("{:<38} {:<12} {:<8} {}", "RUN ID", "STATE", "SLIDES", "TITLE");
    println!("{}", "-".repeat(80));

    for run_id in runs.into_iter().take(limit) {
        match load_deck(config, run_id).await? {
            Some(deck) => println!(
                "{:<38} {:<12} {:<8} {}",
                run_id,
                state_label(&deck.state),
                format!("{}/{}", deck.slides.len(), deck.planned_slides()),
                deck.title().unwrap_or("-")
            ),
            None => println!("{:<38} {:<12} {:<8} -", run_id, "empty", "0/0"),
        }
    }

    Ok(())
}

fn show_providers(keys: &KeyStore) -> Result<()> {
    println!("{:<10} {:<12} {}", "PROVIDER", "KEY", "ENV VAR");
    for provider in Provider::ALL {
        let key = keys.redacted(provider).unwrap_or_else(|| "(missing)".to_string());
        println!("{:<10} {:<12} {}", provider, key, provider.key_env_var());
    }

    match keys.active_provider() {
        Some(provider) => println!("\nActive provider: {}", provider),
        None => println!("\nNo provider configured. Use 'aippt save-key <provider> <key>'."),
    }

    Ok(())
}

/// Check a key with a minimal round trip, then persist it
async fn save_key(config: &ResolvedConfig, keys: &KeyStore, provider: &str, key: &str) -> Result<()> {
    let provider: Provider = provider.parse()?;

    let client = create_client(provider, Some(key), config, keys)?;
    eprintln!("Validating {} key...", provider);
    client
        .health_check()
        .await
        .with_context(|| format!("{} rejected the API key", provider))?;

    keys.update(provider, key)?;
    eprintln!("Saved {} key to {}", provider, config.env_file().display());
    Ok(())
}

/// Show the resolved configuration (for debugging)
fn show_config(config: &ResolvedConfig, keys: &KeyStore) -> Result<()> {
    println!("aippt configuration");
    println!();
    println!(
        "Config file: {}",
        config
            .config_file
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| "(none - using defaults)".to_string())
    );
    println!();
    println!("Paths:");
    println!("  Home:     {}", config.home.display());
    println!("  Images:   {}", config.images_dir.display());
    println!("  Runs:     {}", config.runs_dir().display());
    println!("  Keys:     {}", config.env_file().display());
    println!();
    println!("Models:");
    println!("  qwen text:    {}", config.models.qwen_text);
    println!("  qwen image:   {}", config.models.qwen_image);
    println!("  gemini text:  {}", config.models.gemini_text);
    println!("  gemini image: {}", config.models.gemini_image);
    println!();
    println!("Limits:");
    println!("  Max topic length: {} chars", config.limits.max_topic_chars);
    println!(
        "  Slides:           {}-{}",
        config.limits.min_slides, config.limits.max_slides
    );
    println!("  Chat timeout:     {}s", config.limits.chat_timeout_seconds);
    println!("  Image timeout:    {}s", config.limits.image_timeout_seconds);
    println!();
    println!("API keys:");
    for provider in Provider::ALL {
        println!(
            "  {}: {}",
            provider,
            keys.redacted(provider).unwrap_or_else(|| "(missing)".to_string())
        );
    }

    Ok(())
}
