//! Persisted worker registration
//!
//! One JSON record in the storage root describes the worker that owns the
//! partitions: its version, lifecycle state and timestamps. It lets separate
//! invocations pick the engine up where the last one left it.

use crate::engine::lifecycle::WorkerState;
use crate::error::{SwError, SwResult};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use uuid::Uuid;

/// File name of the record inside the storage root
pub const REGISTRATION_FILE: &str = "registration.json";

/// Registration record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Registration {
    /// Unique worker ID (new for every fresh worker)
    pub worker_id: Uuid,

    /// Cache version this worker serves
    pub version: String,

    /// Lifecycle state
    pub state: WorkerState,

    /// Skip-waiting was requested
    #[serde(default)]
    pub skip_waiting: bool,

    /// Clients were claimed on activation
    #[serde(default)]
    pub claimed: bool,

    pub installed_at: Option<DateTime<Utc>>,
    pub activated_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

impl Registration {
    /// Fresh record for a newly parsed worker
    pub fn new(version: impl Into<String>) -> Self {
        Self {
            worker_id: Uuid::new_v4(),
            version: version.into(),
            state: WorkerState::Parsed,
            skip_waiting: false,
            claimed: false,
            installed_at: None,
            activated_at: None,
            updated_at: Utc::now(),
        }
    }

    /// Record path for a storage root
    pub fn file_path(root: &Path) -> PathBuf {
        root.join(REGISTRATION_FILE)
    }

    /// Load the record from a storage root
    pub async fn load(root: &Path) -> SwResult<Option<Self>> {
        let path = Self::file_path(root);

        let content = match fs::read_to_string(&path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => {
                return Err(SwError::io(
                    format!("reading registration {}", path.display()),
                    e,
                ))
            }
        };

        let registration: Registration = serde_json::from_str(&content)?;
        Ok(Some(registration))
    }

    /// Save the record into a storage root
    pub async fn save(&self, root: &Path) -> SwResult<()> {
        fs::create_dir_all(root)
            .await
            .map_err(|e| SwError::io("creating storage root", e))?;

        let path = Self::file_path(root);
        let content = serde_json::to_string_pretty(self)?;
        fs::write(&path, content)
            .await
            .map_err(|e| SwError::io(format!("writing registration {}", path.display()), e))?;

        Ok(())
    }

    /// Remove the record
    pub async fn delete(root: &Path) -> SwResult<()> {
        let path = Self::file_path(root);
        match fs::remove_file(&path).await {
            Ok(()) => Ok(()),
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
            Err(e) => Err(SwError::io(
                format!("deleting registration {}", path.display()),
                e,
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn registration_new() {
        let reg = Registration::new("v1.0.0");
        assert_eq!(reg.version, "v1.0.0");
        assert_eq!(reg.state, WorkerState::Parsed);
        assert!(reg.activated_at.is_none());
    }

    #[tokio::test]
    async fn save_and_load() {
        let temp = TempDir::new().unwrap();
        assert!(Registration::load(temp.path()).await.unwrap().is_none());

        let mut reg = Registration::new("v1.0.0");
        reg.state = WorkerState::Activated;
        reg.save(temp.path()).await.unwrap();

        let content = std::fs::read_to_string(Registration::file_path(temp.path())).unwrap();
        assert!(content.contains("activated"));

        let loaded = Registration::load(temp.path()).await.unwrap().unwrap();
        assert_eq!(loaded.worker_id, reg.worker_id);
        assert_eq!(loaded.state, WorkerState::Activated);

        Registration::delete(temp.path()).await.unwrap();
        assert!(Registration::load(temp.path()).await.unwrap().is_none());
    }
}
