//! Local persistence for generated images.
//!
//! Providers return either a remote URL (downloaded here) or inline base64
//! data (decoded here). Files land in the images directory as
//! `slide_<timestamp>_<hash>.png`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use chrono::Utc;
use sha2::{Digest, Sha256};
use tokio::fs;
use tracing::info;

use crate::domain::Provider;

use super::{ensure_success, request_error, LlmError};

const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Directory-backed image store
#[derive(Debug, Clone)]
pub struct ImageStore {
    dir: PathBuf,
    client: reqwest::Client,
}

impl ImageStore {
    pub fn new(dir: PathBuf) -> Self {
        Self {
            dir,
            client: reqwest::Client::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Download an image and store it locally
    pub async fn save_from_url(&self, provider: Provider, url: &str) -> Result<PathBuf, LlmError> {
        let response = self
            .client
            .get(url)
            .timeout(DOWNLOAD_TIMEOUT)
            .send()
            .await
            .map_err(|e| request_error(provider, DOWNLOAD_TIMEOUT, e))?;
        let response = ensure_success(provider, response).await?;

        let bytes = response
            .bytes()
            .await
            .map_err(|e| request_error(provider, DOWNLOAD_TIMEOUT, e))?;

        self.write(&bytes).await
    }

    /// Decode base64 image data (optionally `data:...;base64,` prefixed) and store it
    pub async fn save_base64(&self, provider: Provider, data: &str) -> Result<PathBuf, LlmError> {
        let payload = match data.split_once("base64,") {
            Some((_, rest)) => rest,
            None => data,
        };

        let bytes = STANDARD
            .decode(payload.trim())
            .map_err(|e| LlmError::MalformedResponse {
                provider,
                detail: format!("invalid base64 image data: {}", e),
            })?;

        self.write(&bytes).await
    }

    async fn write(&self, bytes: &[u8]) -> Result<PathBuf, LlmError> {
        fs::create_dir_all(&self.dir).await?;

        let path = self.dir.join(image_file_name(bytes));
        fs::write(&path, bytes).await?;

        info!(path = %path.display(), size = bytes.len(), "Image saved");
        Ok(path)
    }
}

/// `slide_<YYYYmmdd_HHMMSS_micros>_<hash8>.png`
fn image_file_name(bytes: &[u8]) -> String {
    let digest = Sha256::digest(bytes);
    format!(
        "slide_{}_{}.png",
        Utc::now().format("%Y%m%d_%H%M%S_%6f"),
        hex::encode(&digest[..4])
    )
}
