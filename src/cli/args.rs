//! CLI argument definitions using clap derive

use crate::http::{Destination, Method};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

/// swcache - Offline-first cache strategy engine
///
/// Pre-caches a site's assets, routes requests through cache-first,
/// network-first or stale-while-revalidate, and keeps one versioned set of
/// cache partitions on disk.
#[derive(Parser, Debug)]
#[command(name = "swcache")]
#[command(author, version, about = "Offline-first cache strategy engine", long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity (-v info, -vv debug)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    pub verbose: u8,

    /// Configuration file path
    #[arg(short, long, global = true, env = "SWCACHE_CONFIG")]
    pub config: Option<PathBuf>,

    /// Skip local .swcache.toml discovery
    #[arg(long, global = true)]
    pub no_local: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Pre-cache the asset lists (activates too when skip-waiting applies)
    Install,

    /// Activate the installed worker and delete stale partitions
    Activate,

    /// Route one request through the engine
    Fetch(FetchArgs),

    /// Show which rule and strategy a request would get
    Classify(ClassifyArgs),

    /// Deliver a control message to the worker
    Message(MessageArgs),

    /// Show worker registration and partition summary
    Status,

    /// Inspect or clear cache partitions
    Cache(CacheArgs),

    /// Show or initialize configuration
    Config(ConfigArgs),
}

/// Request line shared by fetch and classify
#[derive(Parser, Debug)]
pub struct RequestArgs {
    /// Request URL (relative URLs resolve against cache.origin)
    pub url: String,

    /// Declared destination (image, font, style, script, document, ...)
    #[arg(short, long, default_value = "empty")]
    pub destination: Destination,

    /// Request method
    #[arg(short, long, default_value = "GET")]
    pub method: Method,
}

/// Arguments for the fetch command
#[derive(Parser, Debug)]
pub struct FetchArgs {
    #[command(flatten)]
    pub request: RequestArgs,

    /// Write the response body to a file instead of stdout
    #[arg(short, long)]
    pub output: Option<PathBuf>,
}

/// Arguments for the classify command
#[derive(Parser, Debug)]
pub struct ClassifyArgs {
    #[command(flatten)]
    pub request: RequestArgs,
}

/// Arguments for the message command
#[derive(Parser, Debug)]
pub struct MessageArgs {
    /// Message payload (only "skipWaiting" is recognized)
    pub payload: String,
}

/// Arguments for the config command
#[derive(Parser, Debug)]
pub struct ConfigArgs {
    /// Subcommand for config
    #[command(subcommand)]
    pub action: Option<ConfigAction>,
}

/// Config subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigAction {
    /// Show current configuration
    Show,

    /// Show configuration file path
    Path,

    /// Initialize default configuration
    Init {
        /// Overwrite existing configuration
        #[arg(short, long)]
        force: bool,
    },
}

/// Output format for list commands
#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum OutputFormat {
    /// Human-readable table
    Table,
    /// JSON output
    Json,
    /// Simple text (one per line)
    Plain,
}

/// Arguments for the cache command
#[derive(Parser, Debug)]
pub struct CacheArgs {
    /// Subcommand for cache
    #[command(subcommand)]
    pub action: CacheAction,
}

/// Cache subcommands
#[derive(Subcommand, Debug)]
pub enum CacheAction {
    /// List all partitions in the storage root
    List {
        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// List the entries of one partition
    Entries {
        /// Partition name (e.g. static-v1.0.0)
        partition: String,

        /// Output format
        #[arg(short, long, default_value = "table")]
        format: OutputFormat,
    },

    /// Delete every partition and the worker registration
    Clear {
        /// Skip confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}
