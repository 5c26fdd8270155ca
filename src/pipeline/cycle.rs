use std::sync::Arc;
use std::time::Instant;

use parking_lot::Mutex;
use tracing::error;

use super::{
    IngestionPipeline, Report, ReportGenerator, StoreSet, TeardownCoordinator, TeardownSummary,
};
use crate::config::StoreSettings;
use crate::metrics::StoreMetrics;
use crate::models::Value;
use crate::Result;

/// Runs ingest -> report -> teardown over a [`StoreSet`]
#[derive(Clone, Default)]
pub struct CycleRunner {
    pipeline: IngestionPipeline,
    reporter: ReportGenerator,
    teardown: TeardownCoordinator,
    metrics: Option<Arc<StoreMetrics>>,
}

impl CycleRunner {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_metrics(metrics: Arc<StoreMetrics>) -> Self {
        Self {
            pipeline: IngestionPipeline::new().with_metrics(metrics.clone()),
            reporter: ReportGenerator::new(),
            teardown: TeardownCoordinator::new().with_metrics(metrics.clone()),
            metrics: Some(metrics),
        }
    }

    /// One full cycle. The report is skipped when ingestion fails, but
    /// teardown always runs.
    pub fn run<I>(&self, stores: &mut StoreSet, input: I) -> Result<Report>
    where
        I: IntoIterator<Item = Result<Value>>,
    {
        let started = Instant::now();

        let outcome = self
            .pipeline
            .ingest(stores, input)
            .map(|_| self.reporter.generate(stores));
        if let Err(err) = &outcome {
            error!("Cycle failed ({}): {}", err.errno(), err);
        }
        self.teardown.teardown(stores);

        if let Some(metrics) = &self.metrics {
            metrics.record_cycle(started.elapsed().as_secs_f64());
        }
        outcome
    }

    /// Release whatever the stores still hold
    pub fn shutdown(&self, stores: &mut StoreSet) -> TeardownSummary {
        self.teardown.teardown(stores)
    }
}

/// One cycle with default components
pub fn run_cycle<I>(stores: &mut StoreSet, input: I) -> Result<Report>
where
    I: IntoIterator<Item = Result<Value>>,
{
    CycleRunner::new().run(stores, input)
}

/// A store context shared between callers
///
/// None of the stores is internally synchronized, so the whole cycle runs
/// under one lock.
#[derive(Clone)]
pub struct SharedStores {
    stores: Arc<Mutex<StoreSet>>,
    runner: CycleRunner,
}

impl SharedStores {
    pub fn new(settings: StoreSettings) -> Result<Self> {
        Ok(Self {
            stores: Arc::new(Mutex::new(StoreSet::new(settings)?)),
            runner: CycleRunner::new(),
        })
    }

    pub fn with_runner(mut self, runner: CycleRunner) -> Self {
        self.runner = runner;
        self
    }

    pub fn run_cycle<I>(&self, input: I) -> Result<Report>
    where
        I: IntoIterator<Item = Result<Value>>,
    {
        let mut stores = self.stores.lock();
        self.runner.run(&mut stores, input)
    }

    pub fn shutdown(&self) -> TeardownSummary {
        let mut stores = self.stores.lock();
        self.runner.shutdown(&mut stores)
    }

    pub fn is_empty(&self) -> bool {
        self.stores.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::QuintetError;
    use crate::models::StoreKind;
    use crate::parse;
    use std::thread;

    #[test]
    fn test_cycle_reports_then_empties() {
        let mut set = StoreSet::new(StoreSettings::default()).unwrap();
        let report = run_cycle(&mut set, parse::tokens("5,3,5,-2")).unwrap();

        assert_eq!(report.values(StoreKind::Sequence), &[5, 3, 5, -2]);
        assert_eq!(report.values(StoreKind::Tree), &[-2, 3, 5, 5]);
        assert!(set.is_empty());
    }

    #[test]
    fn test_failed_cycle_still_tears_down() {
        let mut set = StoreSet::new(StoreSettings::default()).unwrap();
        let err = run_cycle(&mut set, parse::tokens("1,2,nope")).unwrap_err();
        assert!(matches!(err, QuintetError::InvalidInput(_)));
        assert!(set.is_empty());
    }

    #[test]
    fn test_metrics_observe_cycles() {
        let metrics = Arc::new(StoreMetrics::new().unwrap());
        let runner = CycleRunner::with_metrics(metrics.clone());
        let mut set = StoreSet::new(StoreSettings::default()).unwrap();

        runner.run(&mut set, parse::tokens("1,2")).unwrap();
        runner.run(&mut set, parse::tokens("1,x")).unwrap_err();

        assert_eq!(metrics.cycle_latency.get_sample_count(), 2);
        assert_eq!(metrics.values_ingested.get(), 3.0);
        assert_eq!(metrics.nodes_released.get(), 15.0);
    }

    #[test]
    fn test_shared_stores_serialize_cycles() {
        let shared = SharedStores::new(StoreSettings::default()).unwrap();

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let shared = shared.clone();
                thread::spawn(move || {
                    let input = format!("{},{},{}", i + 1, i + 2, i + 3);
                    shared.run_cycle(parse::tokens(&input)).unwrap()
                })
            })
            .collect();

        for (i, handle) in handles.into_iter().enumerate() {
            let report = handle.join().unwrap();
            let base = i as Value;
            assert_eq!(
                report.values(StoreKind::Sequence),
                &[base + 1, base + 2, base + 3]
            );
        }
        assert!(shared.is_empty());
        assert_eq!(shared.shutdown().total().total(), 0);
    }
}
