pub mod config;
pub mod error;
pub mod metrics;
pub mod models;
pub mod parse;
pub mod pipeline;
pub mod stores;
pub mod testing;

pub use config::{DuplicateKeyPolicy, ProbeMode, StoreLimits, StoreSettings, TreeTeardown};
pub use error::{QuintetError, Result};
pub use metrics::StoreMetrics;
pub use models::*;
pub use pipeline::{
    run_cycle, CycleRunner, IngestSummary, IngestionPipeline, Report, ReportGenerator, ReportLine,
    SharedStores, StoreSet, TeardownCoordinator, TeardownSummary,
};
pub use stores::{IndexStore, Released};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
