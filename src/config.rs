//! Configuration for aippt paths, models, limits and API keys.
//!
//! Configuration sources (highest priority first):
//! 1. Environment variables (AIPPT_HOME, AIPPT_IMAGES_DIR, QWEN_API_KEY, GEMINI_API_KEY)
//! 2. Config file (.aippt/config.yaml)
//! 3. Defaults (~/.aippt)
//!
//! Config file discovery:
//! - Searches current directory and parents for .aippt/config.yaml
//! - `paths.home` is relative to the .aippt/ directory, `paths.images`
//!   to the project root (the parent of .aippt/)
//!
//! API keys are not part of `ResolvedConfig`. They live in a [`KeyStore`]
//! handle that is passed explicitly to whoever builds clients.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info};

use crate::core::limits::GenerationLimits;
use crate::domain::{Provider, UnknownProvider};

const CONFIG_DIR: &str = ".aippt";
const CONFIG_FILE: &str = "config.yaml";

/// Raw config file schema (matches YAML structure)
#[derive(Debug, Clone, Deserialize)]
pub struct ConfigFile {
    pub version: String,
    #[serde(default)]
    pub paths: PathsConfig,
    #[serde(default)]
    pub models: Option<ModelConfig>,
    #[serde(default)]
    pub limits: Option<GenerationLimits>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct PathsConfig {
    /// State directory (relative to .aippt/)
    pub home: Option<String>,
    /// Generated images directory (relative to the project root)
    pub images: Option<String>,
}

/// Model identifiers per provider and modality
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ModelConfig {
    #[serde(default = "default_qwen_text")]
    pub qwen_text: String,
    #[serde(default = "default_qwen_image")]
    pub qwen_image: String,
    #[serde(default = "default_gemini_text")]
    pub gemini_text: String,
    #[serde(default = "default_gemini_image")]
    pub gemini_image: String,
}

fn default_qwen_text() -> String {
    "qwen3-max".to_string()
}
fn default_qwen_image() -> String {
    "qwen-image-max".to_string()
}
fn default_gemini_text() -> String {
    "gemini-3-pro-preview".to_string()
}
fn default_gemini_image() -> String {
    "gemini-3-pro-image-preview".to_string()
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            qwen_text: default_qwen_text(),
            qwen_image: default_qwen_image(),
            gemini_text: default_gemini_text(),
            gemini_image: default_gemini_image(),
        }
    }
}

/// Resolved configuration with absolute paths
#[derive(Debug, Clone)]
pub struct ResolvedConfig {
    /// State directory (run logs, .env)
    pub home: PathBuf,
    /// Where generated images are written
    pub images_dir: PathBuf,
    /// Path to config file (if found)
    pub config_file: Option<PathBuf>,
    pub models: ModelConfig,
    pub limits: GenerationLimits,
}

impl ResolvedConfig {
    /// Defaults rooted at an explicit home directory
    pub fn with_home(home: PathBuf) -> Self {
        Self {
            images_dir: home.join("images"),
            home,
            config_file: None,
            models: ModelConfig::default(),
            limits: GenerationLimits::default(),
        }
    }

    /// Run logs directory (<home>/runs)
    pub fn runs_dir(&self) -> PathBuf {
        self.home.join("runs")
    }

    /// Persisted API keys (<home>/.env)
    pub fn env_file(&self) -> PathBuf {
        self.home.join(".env")
    }
}

/// Find config file by searching current directory and parents
fn find_config_file() -> Option<PathBuf> {
    let mut current = std::env::current_dir().ok()?;

    loop {
        let config_path = current.join(CONFIG_DIR).join(CONFIG_FILE);
        if config_path.exists() {
            return Some(config_path);
        }

        if !current.pop() {
            break;
        }
    }

    None
}

/// Load and parse config file
fn load_config_file(path: &Path) -> Result<ConfigFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    serde_yaml::from_str(&content)
        .with_context(|| format!("Failed to parse config file: {}", path.display()))
}

/// Resolve a path that may be relative to the config file's parent
fn resolve_path(base: &Path, path_str: &str) -> PathBuf {
    let path = PathBuf::from(path_str);
    if path.is_absolute() {
        path
    } else {
        base.join(path)
            .canonicalize()
            .unwrap_or_else(|_| base.join(path_str))
    }
}

/// Merge env, config file and defaults.
///
/// `env` is the environment lookup, injected so tests do not depend on
/// the process environment.
fn resolve(
    default_home: PathBuf,
    config_file: Option<PathBuf>,
    env: impl Fn(&str) -> Option<String>,
) -> Result<ResolvedConfig> {
    let file = config_file.as_deref().map(load_config_file).transpose()?;

    let aippt_dir = config_file
        .as_deref()
        .and_then(Path::parent)
        .unwrap_or(Path::new("."));
    let project_root = aippt_dir.parent().unwrap_or(Path::new("."));

    let home = match (env("AIPPT_HOME"), file.as_ref().and_then(|f| f.paths.home.as_deref())) {
        (Some(env_home), _) => PathBuf::from(env_home),
        (None, Some(home_path)) => resolve_path(aippt_dir, home_path),
        (None, None) => default_home,
    };

    let images_dir = match (
        env("AIPPT_IMAGES_DIR"),
        file.as_ref().and_then(|f| f.paths.images.as_deref()),
    ) {
        (Some(env_images), _) => PathBuf::from(env_images),
        (None, Some(images_path)) => resolve_path(project_root, images_path),
        (None, None) => home.join("images"),
    };

    let (models, limits) = match file {
        Some(f) => (f.models.unwrap_or_default(), f.limits.unwrap_or_default()),
        None => (ModelConfig::default(), GenerationLimits::default()),
    };

    Ok(ResolvedConfig {
        home,
        images_dir,
        config_file,
        models,
        limits,
    })
}

/// Load configuration from all sources
pub fn load_config() -> Result<ResolvedConfig> {
    let default_home = dirs::home_dir()
        .context("Failed to determine home directory")?
        .join(CONFIG_DIR);

    let config = resolve(default_home, find_config_file(), |name| std::env::var(name).ok())?;
    debug!(home = %config.home.display(), images = %config.images_dir.display(), "Configuration resolved");
    Ok(config)
}

// ============================================================================
// API keys
// ============================================================================

/// Errors from key management
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error(transparent)]
    UnknownProvider(#[from] UnknownProvider),

    #[error("API key for {provider} must not be empty")]
    EmptyKey { provider: Provider },

    #[error("Failed to persist API key to {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Shared, updatable view of provider API keys.
///
/// Cloning the handle shares the underlying map. Updates are visible to
/// every holder; clients already constructed keep the key they captured.
#[derive(Debug, Clone, Default)]
pub struct KeyStore {
    inner: Arc<RwLock<HashMap<Provider, String>>>,
    env_file: Option<PathBuf>,
}

impl KeyStore {
    /// Store without persistence
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load keys from the process environment, then from `env_file`.
    ///
    /// Environment variables win over lines in the file.
    pub fn from_env(env_file: PathBuf) -> Self {
        Self::load(env_file, |name| std::env::var(name).ok())
    }

    fn load(env_file: PathBuf, env: impl Fn(&str) -> Option<String>) -> Self {
        let file_values = std::fs::read_to_string(&env_file)
            .map(|content| parse_env_lines(&content))
            .unwrap_or_default();

        let mut keys = HashMap::new();
        for provider in Provider::ALL {
            let name = provider.key_env_var();
            let value = env(name)
                .filter(|v| !v.trim().is_empty())
                .or_else(|| file_values.get(name).cloned());

            if let Some(value) = value {
                keys.insert(provider, value.trim().to_string());
            }
        }

        Self {
            inner: Arc::new(RwLock::new(keys)),
            env_file: Some(env_file),
        }
    }

    pub fn get(&self, provider: Provider) -> Option<String> {
        self.inner
            .read()
            .unwrap_or_else(|e| e.into_inner())
            .get(&provider)
            .cloned()
    }

    pub fn is_configured(&self, provider: Provider) -> bool {
        self.get(provider).is_some()
    }

    /// Provider used when a request names none (Gemini preferred)
    pub fn active_provider(&self) -> Option<Provider> {
        Provider::ALL.into_iter().find(|p| self.is_configured(*p))
    }

    /// Key with all but the last four characters masked
    pub fn redacted(&self, provider: Provider) -> Option<String> {
        self.get(provider).map(|key| {
            let chars: Vec<char> = key.chars().collect();
            let visible: String = chars[chars.len().saturating_sub(4)..].iter().collect();
            format!("****{}", visible)
        })
    }

    /// Replace a provider's key in memory and persist it to the env file
    pub fn update(&self, provider: Provider, key: &str) -> Result<(), ConfigError> {
        let key = key.trim();
        if key.is_empty() {
            return Err(ConfigError::EmptyKey { provider });
        }

        if let Some(path) = &self.env_file {
            persist_key(path, provider.key_env_var(), key).map_err(|source| {
                ConfigError::Persist {
                    path: path.clone(),
                    source,
                }
            })?;
        }

        self.inner
            .write()
            .unwrap_or_else(|e| e.into_inner())
            .insert(provider, key.to_string());

        info!(%provider, "API key updated");
        Ok(())
    }
}

/// Parse `NAME=value` lines, skipping blanks and comments
fn parse_env_lines(content: &str) -> HashMap<String, String> {
    content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .filter_map(|line| line.split_once('='))
        .map(|(name, value)| {
            let value = value.trim().trim_matches('"').trim_matches('\'');
            (name.trim().to_string(), value.to_string())
        })
        .collect()
}

/// Replace the `NAME=` line in the env file, or append one
fn persist_key(path: &Path, name: &str, value: &str) -> std::io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let existing = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(e),
    };

    let prefix = format!("{}=", name);
    let entry = format!("{}={}", name, value);
    let mut replaced = false;

    let mut lines: Vec<String> = existing
        .lines()
        .map(|line| {
            if line.trim_start().starts_with(&prefix) {
                replaced = true;
                entry.clone()
            } else {
                line.to_string()
            }
        })
        .collect();

    if !replaced {
        lines.push(entry);
    }

    let mut content = lines.join("\n");
    content.push('\n');
    std::fs::write(path, content)
}
