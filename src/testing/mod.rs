//! Testing infrastructure for correctness verification
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use quintet::testing::prelude::*;
//!
//! let input = [5, 3, 5, -2];
//! let mut stores = StoreSet::new(StoreSettings::default())?;
//! IngestionPipeline::new().ingest_values(&mut stores, &input)?;
//!
//! let violations = check_all_invariants(&stores, &input, &default_invariants());
//! assert!(violations.is_empty());
//! ```
//!
//! # Invariants
//!
//! - **SequenceEchoesInput**: the sequence store replays the input verbatim
//! - **HashMultisetMatches**: the hash store holds the input multiset
//! - **TreeSortedAscending**: the tree is balanced and sorted
//! - **SparseDenseRun**: sparse stores enumerate the dense key run from 1
//! - **EmptyAfterTeardown**: nothing survives teardown

pub mod invariants;

pub use invariants::{
    check_all_invariants, default_invariants, teardown_invariants, EmptyAfterTeardown,
    HashMultisetMatches, Invariant, SequenceEchoesInput, SparseDenseRun, TreeSortedAscending,
    Violation,
};

/// Prelude for easy imports
pub mod prelude {
    pub use super::invariants::{
        check_all_invariants, default_invariants, teardown_invariants, Invariant, Violation,
    };
    pub use crate::config::StoreSettings;
    pub use crate::pipeline::{IngestionPipeline, StoreSet, TeardownCoordinator};
}
