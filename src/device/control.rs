//! Control requests accepted by the device node.

use serde::{Deserialize, Serialize};

/// A control request issued against an open device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ControlRequest {
    /// Toggle non-blocking mode. Reads never block, so this is accepted
    /// and ignored.
    NonBlocking(bool),
    /// Toggle asynchronous notification. Only disabling is supported.
    Async(bool),
    /// Any other request code.
    Other(u64),
}
