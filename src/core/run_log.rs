//! Append-only run log with file-based persistence.
//!
//! Every event a run emits is stored as newline-delimited JSON (JSONL) in
//! `<runs_dir>/<run_id>/events.jsonl`. Replaying the log through
//! [`Deck::from_events`](crate::domain::Deck::from_events) rebuilds the deck.

use std::path::{Path, PathBuf};
use std::time::SystemTime;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::fs::{self, File, OpenOptions};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use uuid::Uuid;

use crate::domain::Event;

const EVENTS_FILE: &str = "events.jsonl";

/// One logged line
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    pub timestamp: DateTime<Utc>,
    pub run_id: Uuid,
    pub event: Event,
}

/// File-based log for a single run
pub struct RunLog {
    run_id: Uuid,
    run_dir: PathBuf,
    events_path: PathBuf,
}

impl RunLog {
    /// Create or open the log for a run under `base_dir`
    pub async fn open(base_dir: &Path, run_id: Uuid) -> Result<Self> {
        let run_dir = base_dir.join(run_id.to_string());

        fs::create_dir_all(&run_dir)
            .await
            .with_context(|| format!("Failed to create run directory: {}", run_dir.display()))?;

        Ok(Self {
            run_id,
            events_path: run_dir.join(EVENTS_FILE),
            run_dir,
        })
    }

    pub fn run_id(&self) -> Uuid {
        self.run_id
    }

    pub fn run_dir(&self) -> &Path {
        &self.run_dir
    }

    pub fn events_path(&self) -> &Path {
        &self.events_path
    }

    /// Append an event to the log
    pub async fn append(&self, event: &Event) -> Result<()> {
        let entry = LogEntry {
            timestamp: Utc::now(),
            run_id: self.run_id,
            event: event.clone(),
        };

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.events_path)
            .await
            .with_context(|| format!("Failed to open events file: {}", self.events_path.display()))?;

        let json = serde_json::to_string(&entry).context("Failed to serialize event")?;
        file.write_all(format!("{}\n", json).as_bytes())
            .await
            .context("Failed to write event")?;
        file.flush().await.context("Failed to flush event")?;

        Ok(())
    }

    /// Replay all entries in order
    pub async fn entries(&self) -> Result<Vec<LogEntry>> {
        if !self.events_path.exists() {
            return Ok(Vec::new());
        }

        let file = File::open(&self.events_path)
            .await
            .with_context(|| format!("Failed to open events file: {}", self.events_path.display()))?;

        let reader = BufReader::new(file);
        let mut lines = reader.lines();
        let mut entries = Vec::new();

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }
            let entry: LogEntry = serde_json::from_str(&line)
                .with_context(|| format!("Failed to parse event: {}", line))?;
            entries.push(entry);
        }

        Ok(entries)
    }

    /// Replay all events in order
    pub async fn replay(&self) -> Result<Vec<Event>> {
        Ok(self.entries().await?.into_iter().map(|e| e.event).collect())
    }
}

/// List run IDs under `base_dir`, most recently modified first
pub async fn list_runs(base_dir: &Path) -> Result<Vec<Uuid>> {
    if !base_dir.exists() {
        return Ok(Vec::new());
    }

    let mut runs: Vec<(SystemTime, Uuid)> = Vec::new();
    let mut entries = fs::read_dir(base_dir)
        .await
        .with_context(|| format!("Failed to read runs directory: {}", base_dir.display()))?;

    while let Some(entry) = entries.next_entry().await? {
        let metadata = entry.metadata().await?;
        if !metadata.is_dir() {
            continue;
        }

        if let Some(uuid) = entry.file_name().to_str().and_then(|n| Uuid::parse_str(n).ok()) {
            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            runs.push((modified, uuid));
        }
    }

    runs.sort_by(|a, b| b.0.cmp(&a.0));
    Ok(runs.into_iter().map(|(_, uuid)| uuid).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::Deck;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_event_append_and_replay() {
        let temp = TempDir::new().unwrap();
        let run_id = Uuid::new_v4();
        let log = RunLog::open(temp.path(), run_id).await.unwrap();

        log.append(&Event::planning()).await.unwrap();
        log.append(&Event::slide_failed(2, "bad json")).await.unwrap();
        log.append(&Event::done(5, "Deck")).await.unwrap();

        let events = log.replay().await.unwrap();
        assert_eq!(events.len(), 3);
        assert_eq!(events[0].kind(), "status");
        assert_eq!(events[1], Event::slide_failed(2, "bad json"));
        assert!(events[2].is_terminal());

        let entries = log.entries().await.unwrap();
        assert!(entries.iter().all(|e| e.run_id == run_id));
    }

    #[tokio::test]
    async fn test_reopen_appends() {
        let temp = TempDir::new().unwrap();
        let run_id = Uuid::new_v4();

        RunLog::open(temp.path(), run_id)
            .await
            .unwrap()
            .append(&Event::planning())
            .await
            .unwrap();

        let log = RunLog::open(temp.path(), run_id).await.unwrap();
        log.append(&Event::cancelled()).await.unwrap();

        let deck = Deck::from_events(&log.replay().await.unwrap()).unwrap();
        assert!(!deck.is_running());
    }

    #[tokio::test]
    async fn test_replay_missing_log_is_empty() {
        let temp = TempDir::new().unwrap();
        let log = RunLog::open(temp.path(), Uuid::new_v4()).await.unwrap();
        assert!(log.replay().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_list_runs_ignores_foreign_entries() {
        let temp = TempDir::new().unwrap();
        let a = Uuid::new_v4();
        let b = Uuid::new_v4();

        RunLog::open(temp.path(), a).await.unwrap();
        RunLog::open(temp.path(), b).await.unwrap();
        std::fs::create_dir_all(temp.path().join("not-a-run")).unwrap();
        std::fs::write(temp.path().join("stray.txt"), "x").unwrap();

        let mut runs = list_runs(temp.path()).await.unwrap();
        runs.sort();
        let mut expected = vec![a, b];
        expected.sort();
        assert_eq!(runs, expected);

        assert!(list_runs(&temp.path().join("missing")).await.unwrap().is_empty());
    }
}
