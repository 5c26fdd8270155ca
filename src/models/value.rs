//! Values flowing through the pipeline and the keys they map to.

/// A signed integer delivered by the input stream
pub type Value = i32;

/// Key space of the sparse stores
pub type SparseKey = u64;

/// Key at which dense-run probing starts. Key 0 is storable but never probed.
pub const FIRST_PROBE_KEY: SparseKey = 1;

/// Map a value to its sparse-store key.
///
/// Sign-extends then reinterprets, so `-1` becomes `u64::MAX`.
pub fn sparse_key(value: Value) -> SparseKey {
    value as i64 as u64
}
