//! swcache - offline-first cache strategy engine
//!
//! Pre-caches a site's assets into versioned partitions, routes requests
//! through cache-first, network-first or stale-while-revalidate, and sweeps
//! partitions left behind by older versions.

pub mod cli;
pub mod config;
pub mod engine;
pub mod error;
pub mod fetch;
pub mod http;
pub mod journal;
pub mod registration;
pub mod storage;
pub mod ui;

pub use error::{SwError, SwResult};
