//! Orchestration over the five stores
//!
//! One cycle is ingest -> report -> teardown:
//!
//! - `IngestionPipeline`: fans each value out to every store in order
//! - `ReportGenerator`: one formatted line per store
//! - `TeardownCoordinator`: releases everything, safe to repeat
//! - `CycleRunner` / `SharedStores`: run whole cycles, optionally behind a lock

mod cycle;
mod ingest;
mod report;
mod store_set;
mod teardown;

pub use cycle::*;
pub use ingest::*;
pub use report::*;
pub use store_set::*;
pub use teardown::*;
