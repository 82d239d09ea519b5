//! Logical partitions and their versioned names

use crate::error::{SwError, SwResult};
use serde::{Deserialize, Serialize};
use std::fmt;

/// The four logical partitions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PartitionKind {
    /// App shell and anything stored by cache-first
    Static,
    /// Pre-cached images
    Images,
    /// Pre-cached font stylesheets
    Fonts,
    /// Network-first and stale-while-revalidate results
    Dynamic,
}

impl PartitionKind {
    /// All partitions in global lookup order
    pub fn all() -> &'static [Self] {
        &[Self::Static, Self::Images, Self::Fonts, Self::Dynamic]
    }

    /// Partitions filled from asset lists at install time
    pub fn precached() -> &'static [Self] {
        &[Self::Static, Self::Images, Self::Fonts]
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Static => "static",
            Self::Images => "images",
            Self::Fonts => "fonts",
            Self::Dynamic => "dynamic",
        }
    }
}

impl fmt::Display for PartitionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Partition names for one cache version (`static-v1.0.0`, ...)
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionNames {
    version: String,
}

impl PartitionNames {
    /// Build names for a version tag
    pub fn new(version: impl Into<String>) -> SwResult<Self> {
        let version = version.into();
        let valid = !version.is_empty()
            && version
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
        if !valid {
            return Err(SwError::InvalidVersion(version));
        }
        Ok(Self { version })
    }

    pub fn version(&self) -> &str {
        &self.version
    }

    /// Name of one partition for this version
    pub fn name(&self, kind: PartitionKind) -> String {
        format!("{}-{}", kind, self.version)
    }

    /// All four names, in global lookup order
    pub fn lookup_order(&self) -> Vec<String> {
        PartitionKind::all().iter().map(|k| self.name(*k)).collect()
    }

    /// Whether `name` is one of the live partitions
    pub fn is_current(&self, name: &str) -> bool {
        PartitionKind::all().iter().any(|k| self.name(*k) == name)
    }

    /// Which live partition `name` is, if any
    pub fn kind_of(&self, name: &str) -> Option<PartitionKind> {
        PartitionKind::all()
            .iter()
            .copied()
            .find(|k| self.name(*k) == name)
    }
}
