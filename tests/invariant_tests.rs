//! Integration tests for the invariant checking infrastructure

use quintet::config::{ProbeMode, TreeTeardown};
use quintet::testing::prelude::*;
use quintet::testing::{SparseDenseRun, TreeSortedAscending};
use quintet::{parse, CycleRunner, IndexStore, StoreKind, Value};

fn populated(settings: StoreSettings, input: &[Value]) -> StoreSet {
    let mut stores = StoreSet::new(settings).unwrap();
    IngestionPipeline::new()
        .ingest_values(&mut stores, input)
        .unwrap();
    stores
}

#[test]
fn test_basic_invariants() {
    let input = parse::parse_values("5,3,5,-2,1,2,3,0").unwrap();
    let stores = populated(StoreSettings::default(), &input);

    let violations = check_all_invariants(&stores, &input, &default_invariants());
    for violation in &violations {
        eprintln!("{}", violation);
    }
    assert!(violations.is_empty());
}

#[test]
fn test_invariants_across_settings() {
    let input: Vec<Value> = (-40..40).rev().chain(1..20).collect();
    let variants = [
        StoreSettings::default().with_bucket_count(1),
        StoreSettings::default().with_bucket_count(7),
        StoreSettings::default().with_probe_mode(ProbeMode::Ordered),
        StoreSettings::default().with_tree_teardown(TreeTeardown::ByPredecessor),
    ];

    for settings in variants {
        let mut stores = populated(settings, &input);
        assert!(check_all_invariants(&stores, &input, &default_invariants()).is_empty());

        TeardownCoordinator::new().teardown(&mut stores);
        assert!(check_all_invariants(&stores, &input, &teardown_invariants()).is_empty());
    }
}

#[test]
fn test_gap_input_satisfies_dense_run() {
    let input = [1, 2, 4, 5];
    let stores = populated(StoreSettings::default(), &input);
    assert!(SparseDenseRun.check(&stores, &input).is_ok());
    assert_eq!(stores.radix.len(), 4);
}

#[test]
fn test_wrong_expectation_names_store() {
    let stores = populated(StoreSettings::default(), &[3, 1, 2]);
    let violation = TreeSortedAscending.check(&stores, &[3, 1]).unwrap_err();

    assert_eq!(violation.invariant, "TreeSortedAscending");
    assert_eq!(violation.store, Some(StoreKind::Tree));
    assert!(violation.context.contains_key("observed"));
}

#[test]
fn test_cycle_leaves_stores_empty() {
    let runner = CycleRunner::new();
    let mut stores = StoreSet::new(StoreSettings::default()).unwrap();

    for input in ["1,2,3", "1,3", "", "-5,0,0x7fffffff"] {
        let _ = runner.run(&mut stores, parse::tokens(input)).unwrap();
        assert!(check_all_invariants(&stores, &[], &teardown_invariants()).is_empty());
    }
}

#[test]
fn test_invariant_descriptions() {
    for invariant in default_invariants()
        .into_iter()
        .chain(teardown_invariants())
    {
        assert!(!invariant.name().is_empty());
        assert_ne!(invariant.description(), "No description provided");
    }
}
