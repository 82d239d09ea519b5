//! CLI command implementations

pub mod activate;
pub mod cache;
pub mod classify;
pub mod config;
pub mod fetch;
pub mod install;
pub mod message;
pub mod status;

pub use activate::execute as activate;
pub use cache::execute as cache;
pub use classify::execute as classify;
pub use config::execute as config;
pub use fetch::execute as fetch;
pub use install::execute as install;
pub use message::execute as message;
pub use status::execute as status;

use crate::cli::args::RequestArgs;
use crate::config::{Config, ConfigManager};
use crate::engine::{Engine, EngineSettings};
use crate::error::SwResult;
use crate::fetch::HttpFetcher;
use crate::http::{normalize_url, resolve_url, Request};
use crate::journal::Journal;
use crate::storage::CacheStorage;
use std::sync::Arc;

/// Build the engine for this invocation, resuming the persisted registration
pub(crate) async fn open_engine(config: &Config) -> SwResult<Engine> {
    let settings = EngineSettings::from_config(config)?;
    ConfigManager::ensure_state_dirs().await?;
    let storage = CacheStorage::new(ConfigManager::storage_dir(config));
    let fetcher = Arc::new(HttpFetcher::new(&config.network));

    let engine = Engine::restore(settings, storage, fetcher).await?;
    Ok(engine.with_journal(Journal::new(config)))
}

/// Build a request from CLI arguments; relative URLs resolve against the origin
pub(crate) fn build_request(config: &Config, args: &RequestArgs) -> SwResult<Request> {
    let origin = normalize_url(&config.cache.origin)?;
    let url = resolve_url(&origin, &args.url)?;
    Ok(Request::new(args.method, url).with_destination(args.destination))
}
