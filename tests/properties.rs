//! Property tests over arbitrary integer streams

use proptest::prelude::*;
use quintet::config::{DuplicateKeyPolicy, ProbeMode, StoreSettings};
use quintet::stores::{HashBucketStore, IndexStore, TreeStore};
use quintet::testing::prelude::*;
use quintet::{run_cycle, StoreKind, Value};

fn arb_values(max_len: usize) -> impl Strategy<Value = Vec<Value>> {
    prop_oneof![
        proptest::collection::vec(any::<Value>(), 0..max_len),
        // Small values so the sparse dense run actually gets exercised
        proptest::collection::vec(-4..24i32, 0..max_len),
    ]
}

fn arb_settings() -> impl Strategy<Value = StoreSettings> {
    (
        1usize..64,
        prop_oneof![Just(ProbeMode::DenseRun), Just(ProbeMode::Ordered)],
        prop_oneof![
            Just(DuplicateKeyPolicy::Overwrite),
            Just(DuplicateKeyPolicy::Reject)
        ],
    )
        .prop_map(|(buckets, mode, policy)| {
            StoreSettings::default()
                .with_bucket_count(buckets)
                .with_probe_mode(mode)
                .with_duplicate_policy(policy)
        })
}

proptest! {
    /// Populated stores satisfy every content invariant.
    #[test]
    fn prop_invariants_hold(values in arb_values(200), settings in arb_settings()) {
        let mut stores = StoreSet::new(settings).unwrap();
        IngestionPipeline::new().ingest_values(&mut stores, &values).unwrap();

        let violations = check_all_invariants(&stores, &values, &default_invariants());
        prop_assert!(violations.is_empty(), "{:?}", violations);

        TeardownCoordinator::new().teardown(&mut stores);
        prop_assert!(stores.is_empty());
    }

    /// The tree stays balanced through interleaved removals.
    #[test]
    fn prop_tree_balanced_under_removal(
        values in proptest::collection::vec(-50..50i32, 1..150),
        removals in proptest::collection::vec(-50..50i32, 0..100),
    ) {
        let mut tree = TreeStore::new();
        let mut model = values.clone();
        for value in &values {
            tree.insert(*value).unwrap();
        }

        for value in &removals {
            let removed = tree.remove(*value);
            let position = model.iter().position(|v| v == value);
            prop_assert_eq!(removed, position.is_some());
            if let Some(index) = position {
                model.swap_remove(index);
            }
            prop_assert!(tree.check_invariants().is_ok());
        }

        model.sort_unstable();
        prop_assert_eq!(tree.enumerate(), model);
        prop_assert!(tree.height() <= 2 * (usize::BITS - tree.len().leading_zeros()) as usize + 1);
    }

    /// Bucket placement is a pure function of value and bucket count.
    #[test]
    fn prop_bucket_in_range(value in any::<Value>(), buckets in 1usize..4096) {
        let store = HashBucketStore::new(buckets).unwrap();
        let bucket = store.bucket_of(value);
        prop_assert!(bucket < buckets);
        prop_assert_eq!(bucket as i64, (value as i64).rem_euclid(buckets as i64));
    }

    /// A cycle reports the input faithfully and always ends empty.
    #[test]
    fn prop_cycle_reports_and_empties(values in arb_values(100)) {
        let input = values
            .iter()
            .map(|v| v.to_string())
            .collect::<Vec<_>>()
            .join(",");
        let mut stores = StoreSet::new(StoreSettings::default()).unwrap();

        let report = run_cycle(&mut stores, quintet::parse::tokens(&input)).unwrap();
        prop_assert_eq!(report.values(StoreKind::Sequence), values.as_slice());
        prop_assert_eq!(report.lines.len(), 5);
        prop_assert!(stores.is_empty());
    }
}
