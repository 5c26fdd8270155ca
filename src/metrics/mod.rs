use prometheus::{Counter, CounterVec, Histogram, HistogramOpts, Opts, Registry};
use std::sync::Arc;

use crate::error::QuintetError;

/// Prometheus metrics for ingest/report/teardown cycles
#[derive(Clone)]
pub struct StoreMetrics {
    // Counters
    pub values_ingested: Counter,
    pub ingest_failures: CounterVec,
    pub duplicate_keys: Counter,
    pub nodes_released: Counter,
    pub entries_stranded: Counter,

    // Histograms
    pub cycle_latency: Histogram,

    // Registry
    registry: Arc<Registry>,
}

impl StoreMetrics {
    /// Create a new StoreMetrics instance
    pub fn new() -> Result<Self, prometheus::Error> {
        let registry = Registry::new();

        let values_ingested = Counter::with_opts(Opts::new(
            "quintet_values_ingested_total",
            "Values fanned out to all five stores",
        ))?;
        registry.register(Box::new(values_ingested.clone()))?;

        let ingest_failures = CounterVec::new(
            Opts::new(
                "quintet_ingest_failures_total",
                "Ingestion passes aborted, by error kind",
            ),
            &["kind"],
        )?;
        registry.register(Box::new(ingest_failures.clone()))?;

        let duplicate_keys = Counter::with_opts(Opts::new(
            "quintet_duplicate_keys_total",
            "Sparse-store inserts rejected because the key was present",
        ))?;
        registry.register(Box::new(duplicate_keys.clone()))?;

        let nodes_released = Counter::with_opts(Opts::new(
            "quintet_nodes_released_total",
            "Nodes and payloads freed by teardown",
        ))?;
        registry.register(Box::new(nodes_released.clone()))?;

        let entries_stranded = Counter::with_opts(Opts::new(
            "quintet_entries_stranded_total",
            "Sparse entries the dense-run probe could not reach",
        ))?;
        registry.register(Box::new(entries_stranded.clone()))?;

        let cycle_latency = Histogram::with_opts(
            HistogramOpts::new(
                "quintet_cycle_latency_seconds",
                "Ingest, report and teardown cycle latency",
            )
            .buckets(vec![0.0001, 0.0005, 0.001, 0.005, 0.01, 0.05, 0.1, 0.5, 1.0]),
        )?;
        registry.register(Box::new(cycle_latency.clone()))?;

        Ok(Self {
            values_ingested,
            ingest_failures,
            duplicate_keys,
            nodes_released,
            entries_stranded,
            cycle_latency,
            registry: Arc::new(registry),
        })
    }

    /// Get the Prometheus registry
    pub fn registry(&self) -> Arc<Registry> {
        self.registry.clone()
    }

    pub fn record_value(&self) {
        self.values_ingested.inc();
    }

    pub fn record_failure(&self, err: &QuintetError) {
        let kind = match err {
            QuintetError::OutOfMemory { .. } => "out_of_memory",
            QuintetError::InvalidInput(_) => "invalid_input",
            QuintetError::KeyAlreadyPresent(_) => "key_already_present",
            _ => "other",
        };
        self.ingest_failures.with_label_values(&[kind]).inc();
    }

    pub fn record_duplicate(&self) {
        self.duplicate_keys.inc();
    }

    pub fn record_teardown(&self, released: usize, stranded: usize) {
        self.nodes_released.inc_by((released + stranded) as f64);
        self.entries_stranded.inc_by(stranded as f64);
    }

    pub fn record_cycle(&self, duration_secs: f64) {
        self.cycle_latency.observe(duration_secs);
    }
}
