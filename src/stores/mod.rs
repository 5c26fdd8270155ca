//! The five index engines
//!
//! Every store owns its own copy of each ingested value. None of them is
//! internally synchronized; see [`crate::pipeline::SharedStores`] for
//! whole-cycle locking.
//!
//! # Engines
//!
//! - `SequenceStore`: doubly-linked list in insertion order
//! - `HashBucketStore`: fixed bucket array with chained collisions
//! - `TreeStore`: red-black tree, ascending enumeration
//! - `RadixStore`: 64-way radix tree keyed by the value
//! - `PagedStore`: flat directory of 64-slot pages keyed by the value

mod arena;
mod hash_bucket;
mod sequence;
mod sparse;
mod tree;

pub use arena::{Arena, NodeId};
pub use hash_bucket::*;
pub use sequence::*;
pub use sparse::*;
pub use tree::*;

use serde::Serialize;

use crate::models::{StoreKind, Value};
use crate::Result;

/// What a teardown released
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Released {
    /// Entries freed by the store's own traversal
    pub released: usize,
    /// Entries the traversal could not reach, freed afterwards
    pub stranded: usize,
}

impl Released {
    pub fn new(released: usize) -> Self {
        Self {
            released,
            stranded: 0,
        }
    }

    pub fn total(&self) -> usize {
        self.released + self.stranded
    }
}

impl std::ops::AddAssign for Released {
    fn add_assign(&mut self, other: Released) {
        self.released += other.released;
        self.stranded += other.stranded;
    }
}

/// Contract shared by all five engines
pub trait IndexStore {
    fn kind(&self) -> StoreKind;

    /// Insert one value. On error the store is left unchanged.
    fn insert(&mut self, value: Value) -> Result<()>;

    /// Every value in the store's own traversal order
    fn enumerate(&self) -> Vec<Value>;

    /// Release everything. Calling it on an empty store is a no-op.
    fn destroy_all(&mut self) -> Released;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
