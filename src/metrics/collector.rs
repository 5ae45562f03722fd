//! Metrics collection and registry.

use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// Point-in-time copy of the device counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    /// Whether the device node is registered.
    pub loaded: bool,
    /// Reads that completed in full.
    pub reads: u64,
    /// Bytes handed to callers, including partial reads.
    pub bytes_delivered: u64,
    /// Reads ended by a hardware failure.
    pub read_failures: u64,
    /// Reads refused by policy before touching the hardware.
    pub rejected_requests: u64,
}

/// Prometheus metrics registry for the rdrand device.
///
/// Counters are atomic; one registry can be shared by every reader of
/// the device.
#[derive(Clone)]
pub struct MetricsRegistry {
    registry: Registry,

    loaded: IntGauge,
    reads_total: IntCounter,
    bytes_delivered_total: IntCounter,
    read_failures_total: IntCounter,
    rejected_requests_total: IntCounter,
}

impl MetricsRegistry {
    /// Creates a new metrics registry with all device metrics registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let loaded = IntGauge::new(
            "rdrand_device_loaded",
            "Whether the device node is registered (1=loaded, 0=unloaded)",
        )?;
        let reads_total = IntCounter::new(
            "rdrand_reads_total",
            "Total number of reads completed in full",
        )?;
        let bytes_delivered_total = IntCounter::new(
            "rdrand_bytes_delivered_total",
            "Total bytes of hardware randomness delivered to callers",
        )?;
        let read_failures_total = IntCounter::new(
            "rdrand_read_failures_total",
            "Total reads terminated by a hardware failure",
        )?;
        let rejected_requests_total = IntCounter::new(
            "rdrand_rejected_requests_total",
            "Total reads rejected for exceeding the transfer limit",
        )?;

        registry.register(Box::new(loaded.clone()))?;
        registry.register(Box::new(reads_total.clone()))?;
        registry.register(Box::new(bytes_delivered_total.clone()))?;
        registry.register(Box::new(read_failures_total.clone()))?;
        registry.register(Box::new(rejected_requests_total.clone()))?;

        Ok(Self {
            registry,
            loaded,
            reads_total,
            bytes_delivered_total,
            read_failures_total,
            rejected_requests_total,
        })
    }

    /// Records a read that delivered every requested byte.
    pub fn record_read(&self, bytes: usize) {
        self.reads_total.inc();
        self.bytes_delivered_total.inc_by(bytes as u64);
    }

    /// Records a read ended by the hardware after `delivered` bytes.
    pub fn record_failure(&self, delivered: usize) {
        self.read_failures_total.inc();
        self.bytes_delivered_total.inc_by(delivered as u64);
    }

    /// Records a read refused by policy.
    pub fn record_rejected(&self) {
        self.rejected_requests_total.inc();
    }

    /// Sets the device registration gauge.
    pub fn set_loaded(&self, loaded: bool) {
        self.loaded.set(if loaded { 1 } else { 0 });
    }

    /// Returns the current counter values.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            loaded: self.loaded.get() == 1,
            reads: self.reads_total.get(),
            bytes_delivered: self.bytes_delivered_total.get(),
            read_failures: self.read_failures_total.get(),
            rejected_requests: self.rejected_requests_total.get(),
        }
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

impl std::fmt::Debug for MetricsRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MetricsRegistry")
            .field("snapshot", &self.snapshot())
            .finish()
    }
}
