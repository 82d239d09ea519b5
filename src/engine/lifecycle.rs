//! Install, activate and control messages

use crate::config::schema::InstallPolicy;
use crate::engine::partition::PartitionKind;
use crate::engine::Engine;
use crate::error::{SwError, SwResult};
use crate::http::{Method, Request, Response};
use crate::journal::JournalEvent;
use chrono::Utc;
use futures_util::future::{join_all, try_join_all};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, info, warn};
use url::Url;

/// Worker lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum WorkerState {
    Parsed,
    Installing,
    Installed,
    Activating,
    Activated,
    Redundant,
}

impl fmt::Display for WorkerState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Parsed => "parsed",
            Self::Installing => "installing",
            Self::Installed => "installed",
            Self::Activating => "activating",
            Self::Activated => "activated",
            Self::Redundant => "redundant",
        };
        write!(f, "{}", name)
    }
}

/// Control message accepted by the message hook
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Message {
    /// Activate now instead of waiting
    SkipWaiting,
}

impl Message {
    /// Parse a message payload. Only the literal `skipWaiting` is recognized.
    pub fn parse(payload: &str) -> Option<Self> {
        match payload {
            "skipWaiting" => Some(Self::SkipWaiting),
            _ => None,
        }
    }
}

/// Result of filling one partition at install time
#[derive(Debug, Clone, Serialize)]
pub struct PartitionFill {
    pub kind: PartitionKind,
    pub name: String,
    /// Entries written
    pub stored: usize,
    /// Assets skipped under the best-effort policy
    pub failed: Vec<String>,
}

/// Result of an activation sweep
#[derive(Debug, Clone, Default, Serialize)]
pub struct SweepReport {
    pub deleted: Vec<String>,
    pub kept: Vec<String>,
}

/// Result of an install
#[derive(Debug, Clone, Serialize)]
pub struct InstallReport {
    pub version: String,
    pub partitions: Vec<PartitionFill>,
    /// Present when install went straight on to activation
    pub activation: Option<SweepReport>,
}

impl Engine {
    /// Move to `to` if the current state is one of `from`
    fn transition(
        &self,
        action: &'static str,
        from: &[WorkerState],
        to: WorkerState,
    ) -> SwResult<WorkerState> {
        let mut registration = self.lock_registration();
        let current = registration.state;
        if !from.contains(&current) {
            return Err(SwError::InvalidState {
                action,
                state: current.to_string(),
            });
        }
        registration.state = to;
        registration.updated_at = Utc::now();
        debug!("Worker {} -> {}", current, to);
        Ok(current)
    }

    fn set_state(&self, to: WorkerState) {
        let mut registration = self.lock_registration();
        registration.state = to;
        registration.updated_at = Utc::now();
    }

    /// Persist the registration; failures are reported, not returned
    async fn persist(&self) {
        let record = self.registration();
        if let Err(e) = record.save(self.storage.root()).await {
            self.report_error(format!("saving registration: {}", e));
        }
    }

    /// Install hook: pre-cache the asset lists into `static`, `images` and
    /// `fonts` concurrently.
    ///
    /// Succeeds only if every partition fills. On success skip-waiting is
    /// requested when configured, which activates the worker immediately. On
    /// failure a fresh worker becomes redundant; an installed or activated
    /// worker keeps its previous state and goes on serving.
    pub async fn install(&self) -> SwResult<InstallReport> {
        let previous = self.transition(
            "install",
            &[
                WorkerState::Parsed,
                WorkerState::Installed,
                WorkerState::Activated,
                WorkerState::Redundant,
            ],
            WorkerState::Installing,
        )?;
        info!("Installing cache version {}", self.names().version());

        let fills = try_join_all(
            PartitionKind::precached()
                .iter()
                .map(|kind| self.populate(*kind)),
        )
        .await;

        let partitions = match fills {
            Ok(partitions) => partitions,
            Err(e) => {
                let fallback = match previous {
                    WorkerState::Installed | WorkerState::Activated => previous,
                    _ => WorkerState::Redundant,
                };
                self.set_state(fallback);
                self.persist().await;
                self.journal(JournalEvent::InstallFailed {
                    version: self.names().version().to_string(),
                    reason: e.to_string(),
                    state: fallback,
                })
                .await;
                warn!("Install failed: {}", e);
                return Err(e);
            }
        };

        let skip_waiting = {
            let mut registration = self.lock_registration();
            registration.state = WorkerState::Installed;
            registration.installed_at = Some(Utc::now());
            registration.updated_at = Utc::now();
            registration.skip_waiting
        };
        self.persist().await;

        let stored: usize = partitions.iter().map(|p| p.stored).sum();
        info!("Installed {} ({} entries)", self.names().version(), stored);
        self.journal(JournalEvent::InstallCompleted {
            version: self.names().version().to_string(),
            partitions: partitions
                .iter()
                .map(|fill| (fill.name.clone(), fill.stored))
                .collect(),
        })
        .await;

        let activation = if self.settings.skip_waiting || skip_waiting {
            self.skip_waiting().await?
        } else {
            info!("Installed worker is waiting for activation");
            None
        };

        Ok(InstallReport {
            version: self.names().version().to_string(),
            partitions,
            activation,
        })
    }

    async fn fetch_asset(&self, url: &Url) -> SwResult<(Request, Response)> {
        let request = Request::new(Method::Get, url.clone());
        let response = self.fetcher.fetch(&request).await?;
        if !response.is_success() {
            return Err(SwError::AssetStatus {
                url: url.to_string(),
                status: response.status,
            });
        }
        Ok((request, response))
    }

    /// Bulk-add one partition's asset list
    async fn populate(&self, kind: PartitionKind) -> SwResult<PartitionFill> {
        let name = self.names().name(kind);
        let partition = self.storage.open(&name).await?;
        let urls = self.settings.manifest.assets(kind);
        let mut fill = PartitionFill {
            kind,
            name: name.clone(),
            stored: 0,
            failed: vec![],
        };

        match self.settings.install_policy {
            InstallPolicy::AllOrNothing => {
                let fetched = try_join_all(urls.iter().map(|url| self.fetch_asset(url)))
                    .await
                    .map_err(|e| SwError::InstallFailed {
                        partition: name.clone(),
                        reason: e.to_string(),
                    })?;

                for (request, response) in &fetched {
                    partition
                        .put(request, response)
                        .await
                        .map_err(|e| SwError::InstallFailed {
                            partition: name.clone(),
                            reason: e.to_string(),
                        })?;
                }
                fill.stored = fetched.len();
            }
            InstallPolicy::BestEffort => {
                let results = join_all(
                    urls.iter()
                        .map(|url| async move { (url, self.fetch_asset(url).await) }),
                )
                .await;

                for (url, result) in results {
                    let stored = match result {
                        Ok((request, response)) => partition.put(&request, &response).await,
                        Err(e) => Err(e),
                    };
                    match stored {
                        Ok(()) => fill.stored += 1,
                        Err(e) => {
                            warn!("Skipping {} for {}: {}", url, name, e);
                            fill.failed.push(url.to_string());
                        }
                    }
                }
            }
        }

        debug!("Filled {} with {} entries", name, fill.stored);
        Ok(fill)
    }

    /// Activate hook: claim clients and delete every partition that is not
    /// one of the four current-version names.
    pub async fn activate(&self) -> SwResult<SweepReport> {
        let previous = self.transition(
            "activate",
            &[WorkerState::Installed, WorkerState::Activated],
            WorkerState::Activating,
        )?;

        let report = match self.sweep().await {
            Ok(report) => report,
            Err(e) => {
                self.set_state(previous);
                return Err(e);
            }
        };

        {
            let mut registration = self.lock_registration();
            registration.state = WorkerState::Activated;
            registration.claimed = self.settings.claim_clients;
            registration.activated_at = Some(Utc::now());
            registration.updated_at = Utc::now();
        }
        self.persist().await;

        info!(
            "Activated {} (deleted {} stale partition(s))",
            self.names().version(),
            report.deleted.len()
        );
        self.journal(JournalEvent::Activated {
            version: self.names().version().to_string(),
            claimed: self.settings.claim_clients,
            deleted: report.deleted.clone(),
        })
        .await;

        Ok(report)
    }

    async fn sweep(&self) -> SwResult<SweepReport> {
        let mut report = SweepReport::default();

        for name in self.storage.keys().await? {
            if self.names().is_current(&name) {
                report.kept.push(name);
            } else {
                self.storage.delete(&name).await?;
                debug!("Deleted stale partition {}", name);
                report.deleted.push(name);
            }
        }

        Ok(report)
    }

    /// Request skip-waiting. A waiting (installed) worker activates now; in
    /// any other state the request is recorded for the next install.
    pub async fn skip_waiting(&self) -> SwResult<Option<SweepReport>> {
        let state = {
            let mut registration = self.lock_registration();
            registration.skip_waiting = true;
            registration.state
        };

        if state == WorkerState::Installed {
            return self.activate().await.map(Some);
        }

        debug!("Skip-waiting recorded while {}", state);
        self.persist().await;
        Ok(None)
    }

    /// Message hook. Unrecognized payloads are ignored.
    pub async fn handle_message(&self, payload: &str) -> SwResult<Option<SweepReport>> {
        match Message::parse(payload) {
            Some(Message::SkipWaiting) => {
                self.journal(JournalEvent::SkipWaiting {
                    state: self.state(),
                })
                .await;
                self.skip_waiting().await
            }
            None => {
                debug!("Ignoring unrecognized message {:?}", payload);
                Ok(None)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_parse_is_literal() {
        assert_eq!(Message::parse("skipWaiting"), Some(Message::SkipWaiting));
        assert_eq!(Message::parse("skipwaiting"), None);
        assert_eq!(Message::parse(" skipWaiting"), None);
        assert_eq!(Message::parse("{\"type\":\"SKIP_WAITING\"}"), None);
    }

    #[test]
    fn worker_state_serializes_lowercase() {
        let json = serde_json::to_string(&WorkerState::Redundant).unwrap();
        assert_eq!(json, "\"redundant\"");
        assert_eq!(WorkerState::Activated.to_string(), "activated");
    }
}
