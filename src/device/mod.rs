//! Character-device layer over the stream reader.
//!
//! This is the OS-integration side: transfer-size policy, control
//! requests, and load/unload of the device node. It only reaches the
//! hardware through [`StreamReader`](crate::reader::StreamReader).

mod config;
mod control;
mod module;
mod node;

pub use config::{ConfigError, DeviceConfig, FileConfig, MetricsConfig, DEFAULT_MAX_TRANSFER};
pub use control::ControlRequest;
pub use module::{DeviceModule, LifecycleError, ModuleEvent, ModuleStatus, MODULE_VERSION};
pub use node::{DeviceError, RdRandDevice};
