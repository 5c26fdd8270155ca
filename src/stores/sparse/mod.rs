//! Sparse maps keyed by the value itself
//!
//! Both maps box each payload and store it under `sparse_key(value)`. They
//! share traversal: under [`ProbeMode::DenseRun`] enumeration and teardown
//! probe key 1, 2, 3, ... and stop at the first absent key, so anything past
//! a gap (and key 0) is never reported. Teardown still frees those entries
//! afterwards and counts them as stranded.

mod paged;
mod radix;

pub use paged::PagedStore;
pub use radix::RadixStore;

use tracing::warn;

use super::Released;
use crate::config::{DuplicateKeyPolicy, ProbeMode, StoreSettings};
use crate::models::{SparseKey, StoreKind, Value, FIRST_PROBE_KEY};
use crate::Result;

/// Behaviour knobs shared by both sparse maps
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SparseOptions {
    pub duplicate_policy: DuplicateKeyPolicy,
    pub probe_mode: ProbeMode,
    pub limit: Option<usize>,
}

impl SparseOptions {
    pub fn from_settings(settings: &StoreSettings, kind: StoreKind) -> Self {
        Self {
            duplicate_policy: settings.duplicate_policy,
            probe_mode: settings.probe_mode,
            limit: settings.node_limit(kind),
        }
    }
}

/// Key -> boxed payload map operations
pub trait SparseMap {
    fn options(&self) -> &SparseOptions;

    /// Store `payload` under `key`, honouring the duplicate policy
    fn insert_entry(&mut self, key: SparseKey, payload: Value) -> Result<()>;

    fn lookup(&self, key: SparseKey) -> Option<&Value>;

    fn remove_and_return(&mut self, key: SparseKey) -> Option<Value>;

    /// Present entries in ascending key order
    fn entries(&self) -> Vec<(SparseKey, Value)>;

    /// Drop every entry, returning how many there were
    fn clear(&mut self) -> usize;

    fn entry_count(&self) -> usize;

    fn contains_key(&self, key: SparseKey) -> bool {
        self.lookup(key).is_some()
    }

    fn keys(&self) -> Vec<SparseKey> {
        self.entries().into_iter().map(|(key, _)| key).collect()
    }
}

/// Payloads found by probing from key 1 until the first miss
pub fn dense_run<M: SparseMap + ?Sized>(map: &M) -> Vec<Value> {
    let mut values = Vec::new();
    let mut key = FIRST_PROBE_KEY;
    while let Some(value) = map.lookup(key) {
        values.push(*value);
        match key.checked_add(1) {
            Some(next) => key = next,
            None => break,
        }
    }
    values
}

pub(crate) fn enumerate_with<M: SparseMap + ?Sized>(map: &M) -> Vec<Value> {
    match map.options().probe_mode {
        ProbeMode::DenseRun => dense_run(map),
        ProbeMode::Ordered => map.entries().into_iter().map(|(_, v)| v).collect(),
    }
}

pub(crate) fn teardown_with<M: SparseMap + ?Sized>(map: &mut M, kind: StoreKind) -> Released {
    match map.options().probe_mode {
        ProbeMode::DenseRun => {
            let mut released = 0;
            let mut key = FIRST_PROBE_KEY;
            while map.remove_and_return(key).is_some() {
                released += 1;
                match key.checked_add(1) {
                    Some(next) => key = next,
                    None => break,
                }
            }

            let stranded = map.clear();
            if stranded > 0 {
                warn!(
                    store = %kind,
                    stranded,
                    "Dense-run teardown stopped at key {}, freeing unreachable entries",
                    key
                );
            }
            Released { released, stranded }
        }
        ProbeMode::Ordered => Released::new(map.clear()),
    }
}
