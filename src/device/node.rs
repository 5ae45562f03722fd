//! The rdrand device node.

use super::config::DeviceConfig;
use super::control::ControlRequest;
use crate::metrics::MetricsRegistry;
use crate::reader::{ReadError, ReadRequest, StreamReader};
use crate::source::{EntropySource, HardwareInstruction};
use std::io;
use thiserror::Error;

/// Errors reported by device operations.
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("transfer of {requested} bytes exceeds limit of {limit}")]
    TransferTooLarge { requested: usize, limit: usize },
    #[error(transparent)]
    Read(#[from] ReadError),
    #[error("invalid argument to control request {0:?}")]
    InvalidArgument(ControlRequest),
    #[error("unsupported control request {0:#x}")]
    UnsupportedControl(u64),
}

impl From<DeviceError> for io::Error {
    fn from(err: DeviceError) -> Self {
        let kind = match err {
            DeviceError::TransferTooLarge { .. } | DeviceError::InvalidArgument(_) => {
                io::ErrorKind::InvalidInput
            }
            DeviceError::Read(_) => io::ErrorKind::Other,
            DeviceError::UnsupportedControl(_) => io::ErrorKind::Unsupported,
        };
        io::Error::new(kind, err)
    }
}

/// A readable device node backed by a hardware instruction.
///
/// Reads are validated against the configured transfer limit, then
/// handed to a [`StreamReader`]. Writes are discarded.
#[derive(Debug)]
pub struct RdRandDevice<I> {
    config: DeviceConfig,
    reader: StreamReader<I>,
    metrics: Option<MetricsRegistry>,
}

impl<I: HardwareInstruction> RdRandDevice<I> {
    /// Creates a device from validated configuration.
    pub fn new(config: DeviceConfig, instruction: I) -> Self {
        let source = EntropySource::with_budget(instruction, config.retry_budget);
        let reader = StreamReader::with_delivery(source, config.delivery);
        Self {
            config,
            reader,
            metrics: None,
        }
    }

    /// Attaches a metrics registry.
    pub fn with_metrics(mut self, metrics: MetricsRegistry) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Returns the device configuration.
    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    /// Returns the stream reader serving this device.
    pub fn reader(&self) -> &StreamReader<I> {
        &self.reader
    }

    /// Fills `buf` with hardware random bytes.
    ///
    /// On a hardware failure the error carries the number of bytes
    /// already written to `buf` by this call.
    pub fn read(&self, buf: &mut [u8]) -> Result<usize, DeviceError> {
        if buf.len() > self.config.max_transfer {
            if let Some(metrics) = &self.metrics {
                metrics.record_rejected();
            }
            return Err(DeviceError::TransferTooLarge {
                requested: buf.len(),
                limit: self.config.max_transfer,
            });
        }

        let mut request = ReadRequest::new(buf);
        match self.reader.fill(&mut request) {
            Ok(()) => {
                if let Some(metrics) = &self.metrics {
                    metrics.record_read(request.cursor());
                }
                Ok(request.cursor())
            }
            Err(err) => {
                if let Some(metrics) = &self.metrics {
                    metrics.record_failure(err.delivered);
                }
                Err(err.into())
            }
        }
    }

    /// Accepts and discards `buf`.
    pub fn write(&self, buf: &[u8]) -> Result<usize, DeviceError> {
        Ok(buf.len())
    }

    /// Applies a control request.
    pub fn control(&self, request: ControlRequest) -> Result<(), DeviceError> {
        match request {
            ControlRequest::NonBlocking(_) => Ok(()),
            ControlRequest::Async(false) => Ok(()),
            ControlRequest::Async(true) => Err(DeviceError::InvalidArgument(request)),
            ControlRequest::Other(code) => Err(DeviceError::UnsupportedControl(code)),
        }
    }
}
