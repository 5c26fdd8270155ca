use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifies one of the five index engines.
///
/// Variants are declared in fan-out order.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StoreKind {
    Sequence,
    HashBucket,
    Tree,
    Radix,
    Paged,
}

impl StoreKind {
    /// All stores in the order values are fanned out to them
    pub const ALL: [StoreKind; 5] = [
        StoreKind::Sequence,
        StoreKind::HashBucket,
        StoreKind::Tree,
        StoreKind::Radix,
        StoreKind::Paged,
    ];

    /// Label printed at the start of a report line
    pub fn label(&self) -> &'static str {
        match self {
            StoreKind::Sequence => "Linked list",
            StoreKind::HashBucket => "Hash table",
            StoreKind::Tree => "Red-black tree",
            StoreKind::Radix => "Radix tree",
            StoreKind::Paged => "XArray",
        }
    }

    /// Short name used for metric labels
    pub fn metric_name(&self) -> &'static str {
        match self {
            StoreKind::Sequence => "sequence",
            StoreKind::HashBucket => "hash_bucket",
            StoreKind::Tree => "tree",
            StoreKind::Radix => "radix",
            StoreKind::Paged => "paged",
        }
    }
}

impl fmt::Display for StoreKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fan_out_order() {
        assert_eq!(StoreKind::ALL[0], StoreKind::Sequence);
        assert_eq!(StoreKind::ALL[4], StoreKind::Paged);
    }

    #[test]
    fn test_labels() {
        assert_eq!(StoreKind::Tree.to_string(), "Red-black tree");
        assert_eq!(StoreKind::Paged.label(), "XArray");
        assert_eq!(StoreKind::HashBucket.metric_name(), "hash_bucket");
    }

    #[test]
    fn test_serde_names() {
        let json = serde_json::to_string(&StoreKind::HashBucket).unwrap();
        assert_eq!(json, "\"hash_bucket\"");
    }
}
