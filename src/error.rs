//! Error types for swcache
//!
//! All modules use `SwResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for swcache operations
pub type SwResult<T> = Result<T, SwError>;

/// All errors that can occur in swcache
#[derive(Error, Debug)]
pub enum SwError {
    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Invalid URL '{url}': {reason}")]
    InvalidUrl { url: String, reason: String },

    #[error("Invalid cache version '{0}': use letters, digits, '.', '-' or '_'")]
    InvalidVersion(String),

    // Network errors
    #[error("Network request to {url} failed: {reason}")]
    Network { url: String, reason: String },

    #[error("Asset {url} returned status {status}")]
    AssetStatus { url: String, status: u16 },

    // Storage errors
    #[error("Invalid partition name: {0}")]
    PartitionName(String),

    #[error("Partition not found: {0}")]
    PartitionNotFound(String),

    #[error("Corrupt cache entry {path}: {reason}")]
    CorruptEntry { path: PathBuf, reason: String },

    // Lifecycle errors
    #[error("Install failed for partition {partition}: {reason}")]
    InstallFailed { partition: String, reason: String },

    #[error("Cannot {action} while worker is {state}")]
    InvalidState { action: &'static str, state: String },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl SwError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a network error for a URL
    pub fn network(url: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Network {
            url: url.into(),
            reason: reason.into(),
        }
    }

    /// Whether the error came from the network rather than local state
    pub fn is_network(&self) -> bool {
        matches!(self, Self::Network { .. } | Self::AssetStatus { .. })
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::InvalidState { .. } => Some("Run: swcache status"),
            Self::InstallFailed { .. } => {
                Some("Check the asset lists, or set cache.install_policy = \"best-effort\"")
            }
            Self::ConfigInvalid { .. } => Some("Run: swcache config show"),
            Self::PartitionNotFound(_) => Some("Run: swcache cache list"),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_display() {
        let err = SwError::network("https://example.com/a.css", "connection refused");
        assert!(err.to_string().contains("https://example.com/a.css"));
        assert!(err.to_string().contains("connection refused"));
    }

    #[test]
    fn error_hint() {
        let err = SwError::InvalidState {
            action: "activate",
            state: "parsed".to_string(),
        };
        assert_eq!(err.hint(), Some("Run: swcache status"));
        assert_eq!(SwError::Internal("x".to_string()).hint(), None);
    }

    #[test]
    fn error_is_network() {
        assert!(SwError::network("u", "r").is_network());
        assert!(SwError::AssetStatus {
            url: "u".to_string(),
            status: 404
        }
        .is_network());
        assert!(!SwError::PartitionName("../x".to_string()).is_network());
    }
}
