//! Prometheus metrics for the rdrand device.
//!
//! Counters are fed by the device layer; the stream reader and entropy
//! source underneath stay free of shared state.
//!
//! # Metrics Exposed
//!
//! - `rdrand_device_loaded` - Whether the device node is registered
//! - `rdrand_reads_total` - Reads completed in full
//! - `rdrand_bytes_delivered_total` - Bytes delivered, including partial reads
//! - `rdrand_read_failures_total` - Reads ended by a hardware failure
//! - `rdrand_rejected_requests_total` - Reads over the transfer limit
//!
//! # Example
//!
//! ```no_run
//! use rdrand_device::metrics::MetricsRegistry;
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//! registry.record_read(64);
//! println!("{}", registry.encode().unwrap());
//! ```

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
#[cfg(feature = "metrics")]
pub use server::{MetricsServer, MetricsServerConfig, ServerError};
