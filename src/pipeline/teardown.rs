use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, info};

use super::StoreSet;
use crate::metrics::StoreMetrics;
use crate::models::StoreKind;
use crate::stores::Released;

/// What one teardown pass freed, per store
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct TeardownSummary {
    pub stores: Vec<(StoreKind, Released)>,
}

impl TeardownSummary {
    pub fn total(&self) -> Released {
        let mut total = Released::default();
        for (_, released) in &self.stores {
            total += *released;
        }
        total
    }

    pub fn for_store(&self, kind: StoreKind) -> Released {
        self.stores
            .iter()
            .find(|(store, _)| *store == kind)
            .map(|(_, released)| *released)
            .unwrap_or_default()
    }
}

/// Releases every store. Safe to run on already-empty stores.
#[derive(Clone, Default)]
pub struct TeardownCoordinator {
    metrics: Option<Arc<StoreMetrics>>,
}

impl TeardownCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metrics(mut self, metrics: Arc<StoreMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn teardown(&self, stores: &mut StoreSet) -> TeardownSummary {
        info!("Cleaning up...");
        let mut summary = TeardownSummary::default();

        for store in stores.stores_mut() {
            let released = store.destroy_all();
            debug!(
                store = %store.kind(),
                released = released.released,
                stranded = released.stranded,
                "Store released"
            );
            summary.stores.push((store.kind(), released));
        }

        if let Some(metrics) = &self.metrics {
            let total = summary.total();
            metrics.record_teardown(total.released, total.stranded);
        }
        summary
    }
}
