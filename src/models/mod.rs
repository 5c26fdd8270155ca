pub mod store_kind;
pub mod value;

pub use store_kind::StoreKind;
pub use value::{sparse_key, SparseKey, Value, FIRST_PROBE_KEY};
