//! Provider tags for the text/image generation backends.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A generation backend selectable per run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Provider {
    /// Alibaba DashScope (qwen text + qwen-image)
    Qwen,

    /// Google Gemini (text + native image generation)
    Gemini,
}

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("Unknown provider: {0}")]
pub struct UnknownProvider(pub String);

impl Provider {
    /// Every supported provider, in auto-selection priority order
    pub const ALL: [Provider; 2] = [Provider::Gemini, Provider::Qwen];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Qwen => "qwen",
            Provider::Gemini => "gemini",
        }
    }

    /// Environment variable holding this provider's API key
    pub fn key_env_var(&self) -> &'static str {
        match self {
            Provider::Qwen => "QWEN_API_KEY",
            Provider::Gemini => "GEMINI_API_KEY",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = UnknownProvider;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "qwen" => Ok(Provider::Qwen),
            "gemini" => Ok(Provider::Gemini),
            other => Err(UnknownProvider(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_provider() {
        assert_eq!("qwen".parse::<Provider>().unwrap(), Provider::Qwen);
        assert_eq!(" Gemini ".parse::<Provider>().unwrap(), Provider::Gemini);
        assert_eq!(
            "openai".parse::<Provider>(),
            Err(UnknownProvider("openai".to_string()))
        );
    }

    #[test]
    fn test_priority_prefers_gemini() {
        assert_eq!(Provider::ALL[0], Provider::Gemini);
    }
}
