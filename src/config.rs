use serde::{Deserialize, Serialize};
use std::path::Path;

use crate::error::{QuintetError, Result};
use crate::models::StoreKind;

/// Default bucket count of the hash store (2^10)
pub const DEFAULT_BUCKET_COUNT: usize = 1024;

/// How the sparse stores walk their keys when enumerating and tearing down
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProbeMode {
    /// Probe key 1, 2, 3, ... and stop at the first absent key
    #[default]
    DenseRun,
    /// Visit every present key in ascending order
    Ordered,
}

impl ProbeMode {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "dense" | "dense-run" | "dense_run" => Some(ProbeMode::DenseRun),
            "ordered" | "sorted" => Some(ProbeMode::Ordered),
            _ => None,
        }
    }
}

/// What a sparse store does when a key is inserted twice
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DuplicateKeyPolicy {
    /// Replace the stored payload, releasing the old one
    #[default]
    Overwrite,
    /// Keep the first payload and report `KeyAlreadyPresent`
    Reject,
}

impl DuplicateKeyPolicy {
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_lowercase().as_str() {
            "overwrite" => Some(DuplicateKeyPolicy::Overwrite),
            "reject" => Some(DuplicateKeyPolicy::Reject),
            _ => None,
        }
    }
}

/// How the tree store releases its nodes
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeTeardown {
    /// Post-order walk without rebalancing
    #[default]
    Structural,
    /// Repeatedly erase the maximum node, rebalancing each time
    ByPredecessor,
}

/// Per-store node capacity. `None` means unbounded.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreLimits {
    pub sequence: Option<usize>,
    pub hash_bucket: Option<usize>,
    pub tree: Option<usize>,
    pub radix: Option<usize>,
    pub paged: Option<usize>,
}

impl StoreLimits {
    pub fn get(&self, kind: StoreKind) -> Option<usize> {
        match kind {
            StoreKind::Sequence => self.sequence,
            StoreKind::HashBucket => self.hash_bucket,
            StoreKind::Tree => self.tree,
            StoreKind::Radix => self.radix,
            StoreKind::Paged => self.paged,
        }
    }

    pub fn set(&mut self, kind: StoreKind, limit: Option<usize>) {
        match kind {
            StoreKind::Sequence => self.sequence = limit,
            StoreKind::HashBucket => self.hash_bucket = limit,
            StoreKind::Tree => self.tree = limit,
            StoreKind::Radix => self.radix = limit,
            StoreKind::Paged => self.paged = limit,
        }
    }
}

/// Store configuration shared by all five engines
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreSettings {
    pub bucket_count: usize,
    pub node_limits: StoreLimits,
    pub duplicate_policy: DuplicateKeyPolicy,
    pub probe_mode: ProbeMode,
    pub tree_teardown: TreeTeardown,
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            bucket_count: DEFAULT_BUCKET_COUNT,
            node_limits: StoreLimits::default(),
            duplicate_policy: DuplicateKeyPolicy::Overwrite,
            probe_mode: ProbeMode::DenseRun,
            tree_teardown: TreeTeardown::Structural,
        }
    }
}

impl StoreSettings {
    /// Load settings from a JSON file
    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let settings: StoreSettings = serde_json::from_slice(&bytes)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<()> {
        if self.bucket_count == 0 {
            return Err(QuintetError::InvalidConfig(
                "bucket_count must be positive".to_string(),
            ));
        }
        Ok(())
    }

    pub fn with_bucket_count(mut self, bucket_count: usize) -> Self {
        self.bucket_count = bucket_count;
        self
    }

    /// Cap the number of nodes one store may hold
    pub fn with_node_limit(mut self, kind: StoreKind, limit: usize) -> Self {
        self.node_limits.set(kind, Some(limit));
        self
    }

    pub fn with_duplicate_policy(mut self, policy: DuplicateKeyPolicy) -> Self {
        self.duplicate_policy = policy;
        self
    }

    pub fn with_probe_mode(mut self, mode: ProbeMode) -> Self {
        self.probe_mode = mode;
        self
    }

    pub fn with_tree_teardown(mut self, teardown: TreeTeardown) -> Self {
        self.tree_teardown = teardown;
        self
    }

    pub fn node_limit(&self, kind: StoreKind) -> Option<usize> {
        self.node_limits.get(kind)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_settings() {
        let settings = StoreSettings::default();
        assert_eq!(settings.bucket_count, 1024);
        assert_eq!(settings.probe_mode, ProbeMode::DenseRun);
        assert_eq!(settings.duplicate_policy, DuplicateKeyPolicy::Overwrite);
        assert_eq!(settings.node_limit(StoreKind::Tree), None);
        assert!(settings.validate().is_ok());
    }

    #[test]
    fn test_settings_builder() {
        let settings = StoreSettings::default()
            .with_bucket_count(8)
            .with_node_limit(StoreKind::HashBucket, 2)
            .with_probe_mode(ProbeMode::Ordered)
            .with_duplicate_policy(DuplicateKeyPolicy::Reject)
            .with_tree_teardown(TreeTeardown::ByPredecessor);

        assert_eq!(settings.bucket_count, 8);
        assert_eq!(settings.node_limit(StoreKind::HashBucket), Some(2));
        assert_eq!(settings.node_limit(StoreKind::Sequence), None);
        assert_eq!(settings.probe_mode, ProbeMode::Ordered);
        assert_eq!(settings.tree_teardown, TreeTeardown::ByPredecessor);
    }

    #[test]
    fn test_zero_buckets_rejected() {
        let settings = StoreSettings::default().with_bucket_count(0);
        assert!(matches!(
            settings.validate(),
            Err(QuintetError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_mode_parsing() {
        assert_eq!(ProbeMode::parse("dense"), Some(ProbeMode::DenseRun));
        assert_eq!(ProbeMode::parse("Ordered"), Some(ProbeMode::Ordered));
        assert_eq!(ProbeMode::parse("zigzag"), None);
        assert_eq!(
            DuplicateKeyPolicy::parse("REJECT"),
            Some(DuplicateKeyPolicy::Reject)
        );
    }

    #[test]
    fn test_load_partial_json() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"bucket_count": 16, "probe_mode": "ordered", "node_limits": {{"tree": 4}}}}"#
        )
        .unwrap();

        let settings = StoreSettings::from_json_file(file.path()).unwrap();
        assert_eq!(settings.bucket_count, 16);
        assert_eq!(settings.probe_mode, ProbeMode::Ordered);
        assert_eq!(settings.node_limit(StoreKind::Tree), Some(4));
        assert_eq!(settings.duplicate_policy, DuplicateKeyPolicy::Overwrite);
    }
}
