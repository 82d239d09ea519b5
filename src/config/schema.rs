//! Configuration schema for swcache
//!
//! Configuration is stored at `~/.config/swcache/config.toml`. Defaults
//! reproduce the site's original worker: its version tag, asset lists and
//! routing patterns.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Cache versioning and storage
    pub cache: CacheConfig,

    /// Pre-cached asset lists
    pub assets: AssetsConfig,

    /// Request routing patterns
    pub routing: RoutingConfig,

    /// Network settings
    pub network: NetworkConfig,

    /// Install/activate behavior
    pub lifecycle: LifecycleConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Enable verbose logging
    pub verbose: bool,

    /// Log format: "text" or "json"
    pub log_format: String,

    /// Append lifecycle events to the journal
    pub journal: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            verbose: false,
            log_format: "text".to_string(),
            journal: true,
        }
    }
}

/// What install does when a single asset cannot be fetched
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InstallPolicy {
    /// Any failed asset fails the whole install
    #[default]
    AllOrNothing,
    /// Failed assets are logged and skipped
    BestEffort,
}

/// Cache configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Version tag appended to every partition name
    pub version: String,

    /// Site origin that relative asset paths resolve against
    pub origin: String,

    /// Storage root (default: state dir)
    pub storage_dir: Option<PathBuf>,

    /// Install failure policy
    pub install_policy: InstallPolicy,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            version: "v1.0.0".to_string(),
            origin: "http://localhost:8080".to_string(),
            storage_dir: None,
            install_policy: InstallPolicy::AllOrNothing,
        }
    }
}

/// Asset lists fetched into their partitions at install time
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AssetsConfig {
    /// App shell files and CDN libraries (`static` partition)
    #[serde(rename = "static")]
    pub static_assets: Vec<String>,

    /// Images (`images` partition)
    pub images: Vec<String>,

    /// Font stylesheets (`fonts` partition)
    pub fonts: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for AssetsConfig {
    fn default() -> Self {
        Self {
            static_assets: strings(&[
                "/",
                "/index.html",
                "/css/main.css",
                "/css/base.css",
                "/css/components/carousel.css",
                "/css/components/gallery.css",
                "/css/components/popup.css",
                "/css/components/services.css",
                "/js/main.js",
                "/js/modules/services.js",
                "/js/modules/carousel.js",
                "/js/modules/gallery.js",
                "/js/modules/popup.js",
                "/js/modules/packages.js",
                "/js/modules/experiences.js",
                "/js/modules/animation.js",
                "/js/utils/dom.js",
                "/js/utils/events.js",
                "/js/utils/image.js",
                "/js/utils/logger.js",
                "/js/utils/performance.js",
                "/js/utils/common.js",
                "/favicon.ico",
                "/manifest.json",
                "https://cdn.jsdelivr.net/npm/bootstrap@5.3.3/dist/css/bootstrap.min.css",
                "https://cdnjs.cloudflare.com/ajax/libs/font-awesome/5.15.3/css/all.min.css",
                "https://cdnjs.cloudflare.com/ajax/libs/gsap/3.11.5/gsap.min.js",
                "https://cdnjs.cloudflare.com/ajax/libs/gsap/3.11.5/ScrollTrigger.min.js",
            ]),
            images: strings(&[
                "https://raw.githubusercontent.com/elitemassagemx/Home/main/IMG/logo.webp",
                "https://raw.githubusercontent.com/elitemassagemx/Home/main/IMG/fallback-logo.webp",
                "https://raw.githubusercontent.com/elitemassagemx/Home/main/IMG/error.webp",
            ]),
            fonts: strings(&[
                "https://fonts.googleapis.com/css2?family=Tenor+Sans&display=swap",
                "https://fonts.googleapis.com/css2?family=Quattrocento:wght@400;700&display=swap",
            ]),
        }
    }
}

/// Routing patterns used by the classifier
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RoutingConfig {
    /// URL substrings that are never intercepted
    pub ignored_hosts: Vec<String>,

    /// URL path suffixes served cache-first
    pub cache_first_suffixes: Vec<String>,

    /// URL substrings served network-first
    pub network_first_patterns: Vec<String>,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            ignored_hosts: strings(&["google-analytics.com", "analytics", "doubleclick.net"]),
            cache_first_suffixes: strings(&[".css", ".js"]),
            network_first_patterns: strings(&["/api/", "data.json", "/data/"]),
        }
    }
}

/// Largest response body read from the network (64 MiB)
pub const DEFAULT_MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;

/// Network settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct NetworkConfig {
    /// Per-request timeout in seconds (unset = wait indefinitely)
    pub timeout_secs: Option<u64>,

    /// Response bodies larger than this fail as network errors
    pub max_body_bytes: u64,
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            timeout_secs: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
        }
    }
}

/// Install/activate behavior
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LifecycleConfig {
    /// Activate as soon as install succeeds
    pub skip_waiting: bool,

    /// Take control of clients on activation
    pub claim_clients: bool,
}

impl Default for LifecycleConfig {
    fn default() -> Self {
        Self {
            skip_waiting: true,
            claim_clients: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_serializes() {
        let config = Config::default();
        let toml = toml::to_string_pretty(&config).unwrap();
        assert!(toml.contains("[general]"));
        assert!(toml.contains("[cache]"));
        assert!(toml.contains("install_policy = \"all-or-nothing\""));
    }

    #[test]
    fn config_deserializes_empty() {
        let config: Config = toml::from_str("").unwrap();
        assert_eq!(config.cache.version, "v1.0.0");
        assert_eq!(config.assets.static_assets.len(), 28);
        assert_eq!(config.assets.images.len(), 3);
        assert_eq!(config.assets.fonts.len(), 2);
    }

    #[test]
    fn config_deserializes_partial() {
        let toml = r#"
            [cache]
            version = "v1.0.1"
            install_policy = "best-effort"

            [assets]
            static = ["/", "/app.js"]
        "#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.cache.version, "v1.0.1");
        assert_eq!(config.cache.install_policy, InstallPolicy::BestEffort);
        assert_eq!(config.assets.static_assets, vec!["/", "/app.js"]);
        assert_eq!(config.assets.images.len(), 3); // default preserved
        assert!(config.lifecycle.skip_waiting);
    }
}
