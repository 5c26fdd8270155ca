//! Invariant checking framework for correctness verification
//!
//! Invariants inspect a populated [`StoreSet`] together with the values that
//! were ingested into it.

use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap};
use std::fmt;

use crate::config::ProbeMode;
use crate::models::{StoreKind, Value};
use crate::pipeline::StoreSet;
use crate::stores::IndexStore;

/// A violation of an invariant
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Violation {
    pub invariant: String,
    pub description: String,
    pub store: Option<StoreKind>,
    pub context: HashMap<String, String>,
}

impl Violation {
    fn new(invariant: &str, store: StoreKind, description: impl Into<String>) -> Self {
        Self {
            invariant: invariant.to_string(),
            description: description.into(),
            store: Some(store),
            context: HashMap::new(),
        }
    }

    fn with_context(mut self, key: &str, value: impl fmt::Debug) -> Self {
        self.context.insert(key.to_string(), format!("{:?}", value));
        self
    }
}

impl fmt::Display for Violation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "INVARIANT VIOLATION: {}", self.invariant)?;
        writeln!(f, "  Description: {}", self.description)?;
        if let Some(store) = self.store {
            writeln!(f, "  Store: {}", store)?;
        }
        if !self.context.is_empty() {
            writeln!(f, "  Context:")?;
            for (key, value) in &self.context {
                writeln!(f, "    {}: {}", key, value)?;
            }
        }
        Ok(())
    }
}

/// Trait for invariant checkers
pub trait Invariant: Send + Sync {
    /// Name of the invariant
    fn name(&self) -> &str;

    /// Check the stores against the values ingested into them
    fn check(&self, stores: &StoreSet, input: &[Value]) -> Result<(), Violation>;

    /// Human-readable description
    fn description(&self) -> &str {
        "No description provided"
    }
}

/// Check all invariants and return violations
pub fn check_all_invariants(
    stores: &StoreSet,
    input: &[Value],
    invariants: &[Box<dyn Invariant>],
) -> Vec<Violation> {
    invariants
        .iter()
        .filter_map(|invariant| invariant.check(stores, input).err())
        .collect()
}

/// Invariants that hold for a populated store set
pub fn default_invariants() -> Vec<Box<dyn Invariant>> {
    vec![
        Box::new(SequenceEchoesInput),
        Box::new(HashMultisetMatches),
        Box::new(TreeSortedAscending),
        Box::new(SparseDenseRun),
    ]
}

/// Invariants that hold once teardown has run
pub fn teardown_invariants() -> Vec<Box<dyn Invariant>> {
    vec![Box::new(EmptyAfterTeardown)]
}

fn multiset(values: &[Value]) -> BTreeMap<Value, usize> {
    let mut counts = BTreeMap::new();
    for value in values {
        *counts.entry(*value).or_insert(0) += 1;
    }
    counts
}

/// The sequence store enumerates exactly the input, in input order
pub struct SequenceEchoesInput;

impl Invariant for SequenceEchoesInput {
    fn name(&self) -> &str {
        "SequenceEchoesInput"
    }

    fn description(&self) -> &str {
        "Sequence store enumeration equals the input in arrival order"
    }

    fn check(&self, stores: &StoreSet, input: &[Value]) -> Result<(), Violation> {
        let observed = stores.sequence.enumerate();
        if observed != input {
            return Err(Violation::new(
                self.name(),
                StoreKind::Sequence,
                "Enumeration diverges from input order",
            )
            .with_context("expected", input)
            .with_context("observed", observed));
        }
        Ok(())
    }
}

/// Every value lands in the bucket it hashes to, and nothing else is held
pub struct HashMultisetMatches;

impl Invariant for HashMultisetMatches {
    fn name(&self) -> &str {
        "HashMultisetMatches"
    }

    fn description(&self) -> &str {
        "Hash store holds the input multiset, each value in its own bucket"
    }

    fn check(&self, stores: &StoreSet, input: &[Value]) -> Result<(), Violation> {
        let hash = &stores.hash;
        let observed = hash.enumerate();
        if multiset(&observed) != multiset(input) {
            return Err(Violation::new(
                self.name(),
                StoreKind::HashBucket,
                "Stored multiset differs from input",
            )
            .with_context("expected", input)
            .with_context("observed", observed));
        }

        for index in 0..hash.bucket_count() {
            if let Some(stray) = hash
                .bucket_values(index)
                .into_iter()
                .find(|value| hash.bucket_of(*value) != index)
            {
                return Err(Violation::new(
                    self.name(),
                    StoreKind::HashBucket,
                    "Value chained into the wrong bucket",
                )
                .with_context("value", stray)
                .with_context("bucket", index));
            }
        }
        Ok(())
    }
}

/// The tree is balanced and enumerates the sorted input
pub struct TreeSortedAscending;

impl Invariant for TreeSortedAscending {
    fn name(&self) -> &str {
        "TreeSortedAscending"
    }

    fn description(&self) -> &str {
        "Tree enumeration is the input sorted ascending, duplicates kept"
    }

    fn check(&self, stores: &StoreSet, input: &[Value]) -> Result<(), Violation> {
        if let Err(reason) = stores.tree.check_invariants() {
            return Err(Violation::new(self.name(), StoreKind::Tree, reason));
        }

        let mut expected = input.to_vec();
        expected.sort_unstable();
        let observed = stores.tree.enumerate();
        if observed != expected {
            return Err(Violation::new(
                self.name(),
                StoreKind::Tree,
                "Enumeration is not the sorted input",
            )
            .with_context("expected", expected)
            .with_context("observed", observed));
        }
        Ok(())
    }
}

/// Sparse enumeration is the run 1, 2, .. k present in the input
///
/// Under [`ProbeMode::Ordered`] it is every distinct input value in key
/// order instead.
pub struct SparseDenseRun;

impl SparseDenseRun {
    fn expected(stores: &StoreSet, input: &[Value]) -> Vec<Value> {
        match stores.settings().probe_mode {
            ProbeMode::DenseRun => (1..)
                .take_while(|value| input.contains(value))
                .collect(),
            ProbeMode::Ordered => {
                let mut values: Vec<Value> = multiset(input).into_keys().collect();
                values.sort_by_key(|value| crate::models::sparse_key(*value));
                values
            }
        }
    }
}

impl Invariant for SparseDenseRun {
    fn name(&self) -> &str {
        "SparseDenseRun"
    }

    fn description(&self) -> &str {
        "Sparse stores enumerate the dense run of keys starting at 1"
    }

    fn check(&self, stores: &StoreSet, input: &[Value]) -> Result<(), Violation> {
        let expected = Self::expected(stores, input);
        let sparse: [&dyn IndexStore; 2] = [&stores.radix, &stores.paged];

        for store in sparse {
            let observed = store.enumerate();
            if observed != expected {
                return Err(Violation::new(
                    self.name(),
                    store.kind(),
                    "Probe enumeration differs from the expected run",
                )
                .with_context("expected", &expected)
                .with_context("observed", observed));
            }
        }
        Ok(())
    }
}

/// No store holds anything
pub struct EmptyAfterTeardown;

impl Invariant for EmptyAfterTeardown {
    fn name(&self) -> &str {
        "EmptyAfterTeardown"
    }

    fn description(&self) -> &str {
        "Every store is empty after teardown"
    }

    fn check(&self, stores: &StoreSet, _input: &[Value]) -> Result<(), Violation> {
        match stores.stores().into_iter().find(|store| !store.is_empty()) {
            Some(store) => Err(Violation::new(
                self.name(),
                store.kind(),
                "Store still holds entries",
            )
            .with_context("len", store.len())),
            None => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreSettings;
    use crate::pipeline::{IngestionPipeline, TeardownCoordinator};

    fn populated(settings: StoreSettings, input: &[Value]) -> StoreSet {
        let mut set = StoreSet::new(settings).unwrap();
        IngestionPipeline::new()
            .ingest_values(&mut set, input)
            .unwrap();
        set
    }

    #[test]
    fn test_clean_cycle_has_no_violations() {
        let input = [5, 3, 5, -2, 1, 2];
        let set = populated(StoreSettings::default(), &input);
        let violations = check_all_invariants(&set, &input, &default_invariants());
        assert!(violations.is_empty(), "{:?}", violations);
    }

    #[test]
    fn test_ordered_mode_has_no_violations() {
        let input = [4, -1, 2, 4, 0];
        let set = populated(
            StoreSettings::default().with_probe_mode(ProbeMode::Ordered),
            &input,
        );
        assert!(check_all_invariants(&set, &input, &default_invariants()).is_empty());
    }

    #[test]
    fn test_divergent_input_is_caught() {
        let set = populated(StoreSettings::default(), &[1, 2, 3]);
        let violations = check_all_invariants(&set, &[1, 2], &default_invariants());

        let names: Vec<&str> = violations.iter().map(|v| v.invariant.as_str()).collect();
        assert_eq!(
            names,
            vec![
                "SequenceEchoesInput",
                "HashMultisetMatches",
                "TreeSortedAscending",
                "SparseDenseRun"
            ]
        );
        assert!(violations[0].to_string().contains("INVARIANT VIOLATION"));
    }

    #[test]
    fn test_teardown_invariants() {
        let mut set = populated(StoreSettings::default(), &[1, 7]);
        let before = check_all_invariants(&set, &[], &teardown_invariants());
        assert_eq!(before.len(), 1);
        assert_eq!(before[0].store, Some(StoreKind::Sequence));

        TeardownCoordinator::new().teardown(&mut set);
        assert!(check_all_invariants(&set, &[], &teardown_invariants()).is_empty());
    }
}
