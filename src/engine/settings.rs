//! Engine settings resolved from configuration

use crate::config::schema::InstallPolicy;
use crate::config::Config;
use crate::engine::partition::{PartitionKind, PartitionNames};
use crate::engine::rules::{RuleInputs, RuleSet};
use crate::error::{SwError, SwResult};
use crate::http::{normalize_url, resolve_url};
use std::collections::HashSet;
use url::Url;

/// Asset lists with every entry resolved to an absolute URL
#[derive(Debug, Clone, Default)]
pub struct AssetManifest {
    pub static_assets: Vec<Url>,
    pub images: Vec<Url>,
    pub fonts: Vec<Url>,
}

impl AssetManifest {
    /// Resolve raw list entries against `origin`. Duplicates are dropped.
    pub fn resolve(
        origin: &Url,
        static_assets: &[String],
        images: &[String],
        fonts: &[String],
    ) -> SwResult<Self> {
        Ok(Self {
            static_assets: resolve_list(origin, static_assets)?,
            images: resolve_list(origin, images)?,
            fonts: resolve_list(origin, fonts)?,
        })
    }

    /// URLs pre-cached into a partition (empty for `dynamic`)
    pub fn assets(&self, kind: PartitionKind) -> &[Url] {
        match kind {
            PartitionKind::Static => &self.static_assets,
            PartitionKind::Images => &self.images,
            PartitionKind::Fonts => &self.fonts,
            PartitionKind::Dynamic => &[],
        }
    }

    fn url_set(urls: &[Url]) -> HashSet<String> {
        urls.iter().map(|u| u.to_string()).collect()
    }
}

fn resolve_list(origin: &Url, raw: &[String]) -> SwResult<Vec<Url>> {
    let mut seen = HashSet::new();
    let mut urls = Vec::with_capacity(raw.len());
    for entry in raw {
        let url = resolve_url(origin, entry)?;
        if seen.insert(url.to_string()) {
            urls.push(url);
        }
    }
    Ok(urls)
}

/// Everything the engine needs besides storage and network
#[derive(Debug, Clone)]
pub struct EngineSettings {
    pub names: PartitionNames,
    pub manifest: AssetManifest,
    pub rules: RuleSet,
    pub install_policy: InstallPolicy,
    /// Activate as soon as install succeeds
    pub skip_waiting: bool,
    /// Claim clients on activation
    pub claim_clients: bool,
}

impl EngineSettings {
    /// Resolve settings from configuration
    pub fn from_config(config: &Config) -> SwResult<Self> {
        let origin = normalize_url(&config.cache.origin)?;
        if origin.cannot_be_a_base() {
            return Err(SwError::InvalidUrl {
                url: config.cache.origin.clone(),
                reason: "origin cannot be used as a base URL".to_string(),
            });
        }

        let manifest = AssetManifest::resolve(
            &origin,
            &config.assets.static_assets,
            &config.assets.images,
            &config.assets.fonts,
        )?;

        let rules = RuleSet::standard(RuleInputs {
            ignored_hosts: config.routing.ignored_hosts.clone(),
            static_assets: AssetManifest::url_set(&manifest.static_assets),
            image_assets: AssetManifest::url_set(&manifest.images),
            font_assets: AssetManifest::url_set(&manifest.fonts),
            cache_first_suffixes: config.routing.cache_first_suffixes.clone(),
            network_first_patterns: config.routing.network_first_patterns.clone(),
        });

        Ok(Self {
            names: PartitionNames::new(config.cache.version.clone())?,
            manifest,
            rules,
            install_policy: config.cache.install_policy,
            skip_waiting: config.lifecycle.skip_waiting,
            claim_clients: config.lifecycle.claim_clients,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_resolves() {
        let settings = EngineSettings::from_config(&Config::default()).unwrap();
        assert_eq!(settings.names.version(), "v1.0.0");
        assert_eq!(settings.manifest.static_assets.len(), 28);
        assert_eq!(
            settings.manifest.static_assets[1].as_str(),
            "http://localhost:8080/index.html"
        );
        assert!(settings.manifest.assets(PartitionKind::Dynamic).is_empty());
    }

    #[test]
    fn duplicates_collapse() {
        let origin = Url::parse("https://site.test").unwrap();
        let manifest = AssetManifest::resolve(
            &origin,
            &[
                "/".to_string(),
                "https://site.test/".to_string(),
                "/index.html#x".to_string(),
                "/index.html".to_string(),
            ],
            &[],
            &[],
        )
        .unwrap();
        assert_eq!(manifest.static_assets.len(), 2);
    }

    #[test]
    fn bad_origin_rejected() {
        let mut config = Config::default();
        config.cache.origin = "not a url".to_string();
        assert!(EngineSettings::from_config(&config).is_err());

        let mut config = Config::default();
        config.cache.origin = "mailto:someone@site.test".to_string();
        assert!(EngineSettings::from_config(&config).is_err());
    }

    #[test]
    fn bad_version_rejected() {
        let mut config = Config::default();
        config.cache.version = "v1/../../etc".to_string();
        assert!(matches!(
            EngineSettings::from_config(&config),
            Err(SwError::InvalidVersion(_))
        ));
    }
}
