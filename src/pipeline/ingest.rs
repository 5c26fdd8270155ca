use std::sync::Arc;

use serde::Serialize;
use tracing::{debug, warn};

use super::StoreSet;
use crate::error::QuintetError;
use crate::metrics::StoreMetrics;
use crate::models::Value;
use crate::Result;

/// Outcome of a completed ingestion pass
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct IngestSummary {
    /// Values fanned out to every store
    pub values: usize,
    /// Sparse-store inserts skipped because the key was already present
    pub rejected_duplicates: usize,
}

/// Fans each input value out to all five stores
///
/// The first fatal error stops the pass. Stores that already took the
/// failing value (or earlier ones) keep them; the caller is expected to
/// tear down afterwards.
#[derive(Clone, Default)]
pub struct IngestionPipeline {
    metrics: Option<Arc<StoreMetrics>>,
}

impl IngestionPipeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metrics(mut self, metrics: Arc<StoreMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn ingest<I>(&self, stores: &mut StoreSet, input: I) -> Result<IngestSummary>
    where
        I: IntoIterator<Item = Result<Value>>,
    {
        let mut summary = IngestSummary::default();

        for item in input {
            let outcome = item.and_then(|value| self.fan_out(stores, value, &mut summary));
            if let Err(err) = outcome {
                warn!(
                    ingested = summary.values,
                    "Ingestion aborted: {}", err
                );
                if let Some(metrics) = &self.metrics {
                    metrics.record_failure(&err);
                }
                return Err(err);
            }

            summary.values += 1;
            if let Some(metrics) = &self.metrics {
                metrics.record_value();
            }
        }

        debug!(
            values = summary.values,
            rejected_duplicates = summary.rejected_duplicates,
            "Ingestion complete"
        );
        Ok(summary)
    }

    /// Convenience for already-parsed input
    pub fn ingest_values(&self, stores: &mut StoreSet, values: &[Value]) -> Result<IngestSummary> {
        self.ingest(stores, values.iter().copied().map(Ok))
    }

    fn fan_out(&self, stores: &mut StoreSet, value: Value, summary: &mut IngestSummary) -> Result<()> {
        for store in stores.stores_mut() {
            match store.insert(value) {
                Ok(()) => {}
                Err(QuintetError::KeyAlreadyPresent(key)) => {
                    warn!(store = %store.kind(), key, "Key already present, insert skipped");
                    summary.rejected_duplicates += 1;
                    if let Some(metrics) = &self.metrics {
                        metrics.record_duplicate();
                    }
                }
                Err(err) => return Err(err),
            }
        }
        debug!(value, "Fanned out");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{DuplicateKeyPolicy, StoreSettings};
    use crate::models::StoreKind;
    use crate::parse;
    use crate::stores::IndexStore;

    fn stores() -> StoreSet {
        StoreSet::new(StoreSettings::default()).unwrap()
    }

    #[test]
    fn test_every_store_gets_every_value() {
        let mut set = stores();
        let summary = IngestionPipeline::new()
            .ingest_values(&mut set, &[5, 3, 5, -2])
            .unwrap();

        assert_eq!(summary.values, 4);
        assert_eq!(set.sequence.len(), 4);
        assert_eq!(set.hash.len(), 4);
        assert_eq!(set.tree.len(), 4);
        // 5 overwrites itself in the sparse stores
        assert_eq!(set.radix.len(), 3);
        assert_eq!(set.paged.len(), 3);
    }

    #[test]
    fn test_empty_input_is_legal() {
        let mut set = stores();
        let summary = IngestionPipeline::new().ingest_values(&mut set, &[]).unwrap();
        assert_eq!(summary, IngestSummary::default());
        assert!(set.is_empty());
    }

    #[test]
    fn test_invalid_token_stops_pass() {
        let mut set = stores();
        let err = IngestionPipeline::new()
            .ingest(&mut set, parse::tokens("1,2,zz,4"))
            .unwrap_err();

        assert!(matches!(err, QuintetError::InvalidInput(_)));
        assert_eq!(set.sequence.enumerate(), vec![1, 2]);
        assert_eq!(set.tree.enumerate(), vec![1, 2]);
    }

    #[test]
    fn test_out_of_memory_leaves_partial_state() {
        let settings = StoreSettings::default().with_node_limit(StoreKind::Tree, 1);
        let mut set = StoreSet::new(settings).unwrap();
        let err = IngestionPipeline::new()
            .ingest_values(&mut set, &[10, 20, 30])
            .unwrap_err();

        assert!(matches!(
            err,
            QuintetError::OutOfMemory {
                store: StoreKind::Tree
            }
        ));
        // 20 reached the stores ahead of the tree, nothing after it
        assert_eq!(set.sequence.enumerate(), vec![10, 20]);
        assert_eq!(set.hash.len(), 2);
        assert_eq!(set.tree.enumerate(), vec![10]);
        assert_eq!(set.radix.len(), 1);
        assert_eq!(set.paged.len(), 1);
    }

    #[test]
    fn test_rejected_duplicates_do_not_abort() {
        let settings = StoreSettings::default().with_duplicate_policy(DuplicateKeyPolicy::Reject);
        let mut set = StoreSet::new(settings).unwrap();
        let metrics = Arc::new(StoreMetrics::new().unwrap());

        let summary = IngestionPipeline::new()
            .with_metrics(metrics.clone())
            .ingest_values(&mut set, &[1, 1, 2])
            .unwrap();

        assert_eq!(summary.values, 3);
        assert_eq!(summary.rejected_duplicates, 2);
        assert_eq!(set.tree.enumerate(), vec![1, 1, 2]);
        assert_eq!(set.radix.enumerate(), vec![1, 2]);
        assert_eq!(metrics.duplicate_keys.get(), 2.0);
        assert_eq!(metrics.values_ingested.get(), 3.0);
    }
}
