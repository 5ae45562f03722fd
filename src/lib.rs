//! RDRAND Device Library
//!
//! Exposes the CPU's on-die random number instruction as a byte stream
//! through a character-device style interface.
//!
//! # Architecture
//!
//! ```text
//! device (policy, lifecycle) → reader (byte stream) → source (words)
//!     ↓
//! metrics
//! ```
//!
//! # Design Principles
//!
//! - **Raw hardware output**: No conditioning, pooling or reseeding
//! - **Bounded retry**: Each word gets a fixed number of attempts, then fails
//! - **Explicit fallback**: Without the instruction every read fails, never zero-fills
//! - **Host byte order**: Words are copied in native order
//!
//! # Example
//!
//! ```no_run
//! use rdrand_device::{
//!     device::{DeviceConfig, DeviceModule, ModuleEvent},
//!     source::RdRand,
//! };
//!
//! let mut module = DeviceModule::new(DeviceConfig::default(), RdRand::detect());
//! module.handle(ModuleEvent::Load).unwrap();
//!
//! let device = module.device().unwrap();
//! let mut buf = [0u8; 32];
//! device.read(&mut buf).unwrap();
//!
//! module.handle(ModuleEvent::Unload).unwrap();
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod device;
pub mod metrics;
pub mod reader;
pub mod source;

// Re-export commonly used types at crate root
pub use device::{ControlRequest, DeviceConfig, DeviceError, DeviceModule, ModuleEvent, RdRandDevice};
pub use metrics::MetricsRegistry;
pub use reader::{Delivery, HardwareRng, ReadError, ReadRequest, StreamReader};
pub use source::{
    Attempt, EntropyError, EntropySource, HardwareInstruction, RdRand, RetryBudget, Word,
    WORD_BYTES,
};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
