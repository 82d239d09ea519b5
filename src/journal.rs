//! Lifecycle journal
//!
//! Appends one JSON line per lifecycle event to
//! `~/.local/state/swcache/journal.log`:
//!
//! ```text
//! {"at":"2026-01-01T00:00:00Z","event":"activate.completed","version":"v1.0.0",...}
//! ```

use crate::config::{schema::Config, ConfigManager};
use crate::engine::lifecycle::WorkerState;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tokio::fs::OpenOptions;
use tokio::io::AsyncWriteExt;
use tracing::{debug, warn};

/// Something the worker did that outlives the invocation
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "event")]
pub enum JournalEvent {
    #[serde(rename = "install.completed")]
    InstallCompleted {
        version: String,
        /// Entries stored per partition name
        partitions: Vec<(String, usize)>,
    },

    #[serde(rename = "install.failed")]
    InstallFailed {
        version: String,
        reason: String,
        /// State the worker was left in
        state: WorkerState,
    },

    #[serde(rename = "activate.completed")]
    Activated {
        version: String,
        claimed: bool,
        deleted: Vec<String>,
    },

    #[serde(rename = "message.skip_waiting")]
    SkipWaiting { state: WorkerState },
}

impl JournalEvent {
    /// Dotted event name as written to the journal
    pub fn name(&self) -> &'static str {
        match self {
            Self::InstallCompleted { .. } => "install.completed",
            Self::InstallFailed { .. } => "install.failed",
            Self::Activated { .. } => "activate.completed",
            Self::SkipWaiting { .. } => "message.skip_waiting",
        }
    }
}

/// One journal line
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct JournalRecord {
    pub at: DateTime<Utc>,
    #[serde(flatten)]
    pub event: JournalEvent,
}

/// Append-only JSON-lines journal
#[derive(Debug, Clone)]
pub struct Journal {
    enabled: bool,
    path: PathBuf,
}

impl Journal {
    pub fn new(config: &Config) -> Self {
        Self::at(ConfigManager::journal_path(), config.general.journal)
    }

    /// Journal writing to an explicit path
    pub fn at(path: impl Into<PathBuf>, enabled: bool) -> Self {
        Self {
            enabled,
            path: path.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Record an event. IO failures are logged and dropped.
    pub async fn record(&self, event: JournalEvent) {
        if !self.enabled {
            return;
        }

        let name = event.name();
        let record = JournalRecord {
            at: Utc::now(),
            event,
        };
        let mut line = match serde_json::to_string(&record) {
            Ok(line) => line,
            Err(e) => {
                warn!("Failed to serialize journal event {}: {}", name, e);
                return;
            }
        };
        line.push('\n');

        match self.append(&line).await {
            Ok(()) => debug!("Journaled {}", name),
            Err(e) => warn!("Failed to write journal {}: {}", self.path.display(), e),
        }
    }

    /// Read back every well-formed record; unreadable lines are skipped
    pub async fn records(&self) -> Vec<JournalRecord> {
        let Ok(content) = tokio::fs::read_to_string(&self.path).await else {
            return vec![];
        };

        content
            .lines()
            .filter_map(|line| serde_json::from_str(line).ok())
            .collect()
    }

    async fn append(&self, line: &str) -> std::io::Result<()> {
        if let Some(parent) = self.path.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .await?;

        file.write_all(line.as_bytes()).await?;
        file.flush().await
    }
}
