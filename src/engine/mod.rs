//! Cache strategy engine
//!
//! The engine intercepts requests, routes each one through the rule table and
//! answers it from cache, from the network, or with the synthesized 408
//! response. It owns no global state: everything it touches (settings,
//! storage, network, journal) is handed to it at construction.
//!
//! # Lifecycle
//!
//! | State | Serves requests | Next |
//! |-------|-----------------|------|
//! | parsed | no | installing |
//! | installing | no | installed, redundant |
//! | installed | no (waiting) | activating |
//! | activating | no | activated |
//! | activated | yes | installing (re-install) |
//! | redundant | no | installing (retry) |

pub mod lifecycle;
pub mod partition;
pub mod rules;
pub mod settings;
mod strategy;

pub use lifecycle::{InstallReport, Message, PartitionFill, SweepReport, WorkerState};
pub use partition::{PartitionKind, PartitionNames};
pub use rules::{Classification, Route, RuleSet, Strategy};
pub use settings::{AssetManifest, EngineSettings};

use crate::error::SwResult;
use crate::fetch::Fetcher;
use crate::http::{Request, Response};
use crate::journal::{Journal, JournalEvent};
use crate::registration::Registration;
use crate::storage::CacheStorage;
use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard};
use tokio::task::JoinSet;
use tracing::{debug, error, info};

/// Where a served response came from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Source {
    /// A stored entry in the named partition
    Cache(String),
    /// A live network response
    Network,
    /// The locally built 408 response
    Synthesized,
}

impl fmt::Display for Source {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Cache(partition) => write!(f, "cache ({})", partition),
            Self::Network => write!(f, "network"),
            Self::Synthesized => write!(f, "synthesized"),
        }
    }
}

/// A response produced for an intercepted request
#[derive(Debug, Clone)]
pub struct Served {
    pub response: Response,
    pub source: Source,
    /// Strategy that produced it, `None` when the request was not intercepted
    pub strategy: Option<Strategy>,
}

/// The cache strategy engine
pub struct Engine {
    settings: EngineSettings,
    storage: CacheStorage,
    fetcher: Arc<dyn Fetcher>,
    registration: Mutex<Registration>,
    journal: Option<Journal>,
    revalidations: Mutex<JoinSet<()>>,
}

impl Engine {
    /// Create a freshly parsed engine
    pub fn new(settings: EngineSettings, storage: CacheStorage, fetcher: Arc<dyn Fetcher>) -> Self {
        let registration = Registration::new(settings.names.version());
        Self {
            settings,
            storage,
            fetcher,
            registration: Mutex::new(registration),
            journal: None,
            revalidations: Mutex::new(JoinSet::new()),
        }
    }

    /// Create an engine resuming the registration persisted in storage.
    ///
    /// A record for a different version is ignored: that worker is replaced
    /// by a freshly parsed one.
    pub async fn restore(
        settings: EngineSettings,
        storage: CacheStorage,
        fetcher: Arc<dyn Fetcher>,
    ) -> SwResult<Self> {
        let engine = Self::new(settings, storage, fetcher);

        match Registration::load(engine.storage.root()).await? {
            Some(record) if record.version == engine.settings.names.version() => {
                debug!(
                    "Restored worker {} ({}, {})",
                    record.worker_id, record.version, record.state
                );
                *engine.lock_registration() = record;
            }
            Some(record) => {
                info!(
                    "Registered worker serves {}, configured version is {}",
                    record.version,
                    engine.settings.names.version()
                );
            }
            None => debug!("No registration found"),
        }

        Ok(engine)
    }

    /// Attach a lifecycle journal
    pub fn with_journal(mut self, journal: Journal) -> Self {
        self.journal = Some(journal);
        self
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn names(&self) -> &PartitionNames {
        &self.settings.names
    }

    pub fn storage(&self) -> &CacheStorage {
        &self.storage
    }

    /// Current lifecycle state
    pub fn state(&self) -> WorkerState {
        self.lock_registration().state
    }

    /// Snapshot of the registration record
    pub fn registration(&self) -> Registration {
        self.lock_registration().clone()
    }

    fn lock_registration(&self) -> MutexGuard<'_, Registration> {
        self.registration
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    fn lock_revalidations(&self) -> MutexGuard<'_, JoinSet<()>> {
        self.revalidations
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Route a request without serving it
    pub fn classify(&self, request: &Request) -> Classification {
        self.settings.rules.classify(request)
    }

    fn strategy_context(&self) -> strategy::Context {
        strategy::Context {
            storage: self.storage.clone(),
            fetcher: Arc::clone(&self.fetcher),
            names: self.settings.names.clone(),
        }
    }

    /// Interception hook.
    ///
    /// Returns `None` when the engine declines the request: it is not
    /// activated, or the request is routed pass-through. A declined request
    /// is the caller's to send to the network.
    pub async fn handle_fetch(&self, request: &Request) -> Option<Served> {
        let state = self.state();
        if state != WorkerState::Activated {
            debug!("Worker is {}, not intercepting {}", state, request.url);
            return None;
        }

        let classification = self.classify(request);
        debug!(
            "{} {} -> {} (rule: {})",
            request.method,
            request.url,
            classification.route,
            classification.rule.unwrap_or(rules::FALLBACK_RULE)
        );

        let Route::Strategy(chosen) = classification.route else {
            return None;
        };

        let ctx = self.strategy_context();
        let served = match chosen {
            Strategy::CacheFirst => strategy::cache_first(&ctx, request).await,
            Strategy::NetworkFirst => strategy::network_first(&ctx, request).await,
            Strategy::StaleWhileRevalidate => {
                let (served, revalidation) = strategy::stale_while_revalidate(ctx, request).await;
                if let Some(task) = revalidation {
                    self.track(task);
                }
                served
            }
        };
        Some(served)
    }

    /// Serve a request end to end: intercepted requests go through
    /// `handle_fetch`, declined ones straight to the network with no caching.
    pub async fn respond(&self, request: &Request) -> SwResult<Served> {
        if let Some(served) = self.handle_fetch(request).await {
            return Ok(served);
        }

        let response = self.fetcher.fetch(request).await?;
        Ok(Served {
            response,
            source: Source::Network,
            strategy: None,
        })
    }

    fn track(&self, task: strategy::Revalidation) {
        let mut set = self.lock_revalidations();
        while let Some(finished) = set.try_join_next() {
            if let Err(e) = finished {
                self.report_rejection(format!("revalidation task: {}", e));
            }
        }
        set.spawn(task);
    }

    /// Number of background revalidations not yet collected
    pub fn pending_revalidations(&self) -> usize {
        self.lock_revalidations().len()
    }

    /// Wait for every background revalidation to finish
    pub async fn settle(&self) {
        let mut set = std::mem::take(&mut *self.lock_revalidations());
        while let Some(finished) = set.join_next().await {
            if let Err(e) = finished {
                self.report_rejection(format!("revalidation task: {}", e));
            }
        }
    }

    /// Error hook: log only
    #[track_caller]
    pub fn report_error(&self, message: impl fmt::Display) {
        let location = std::panic::Location::caller();
        error!(
            "Worker error: {}:{} {}",
            location.file(),
            location.line(),
            message
        );
    }

    /// Unhandled-rejection hook: log only
    pub fn report_rejection(&self, reason: impl fmt::Display) {
        error!("Worker unhandled rejection: {}", reason);
    }

    async fn journal(&self, event: JournalEvent) {
        if let Some(journal) = &self.journal {
            journal.record(event).await;
        }
    }
}
