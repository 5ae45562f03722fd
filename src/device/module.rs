//! Device registration lifecycle.
//!
//! The module owns at most one registered node. Load and unload are
//! explicit events driven by the caller; nothing here is global.

use super::config::DeviceConfig;
use super::node::RdRandDevice;
use crate::metrics::MetricsRegistry;
use crate::source::HardwareInstruction;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::sync::Arc;
use thiserror::Error;

/// Module interface version.
pub const MODULE_VERSION: u32 = 1;

/// Lifecycle events delivered to the module.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModuleEvent {
    /// Register the device node.
    Load,
    /// Destroy the device node.
    Unload,
    /// System shutdown; the node stays registered.
    Shutdown,
    /// Any other event code.
    Other(u32),
}

/// Errors from lifecycle transitions.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LifecycleError {
    #[error("device {0:?} is already loaded")]
    AlreadyLoaded(String),
    #[error("device {0:?} is not loaded")]
    NotLoaded(String),
    #[error("unsupported module event {0}")]
    Unsupported(u32),
}

/// Serializable view of the module state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ModuleStatus {
    /// Device node name.
    pub name: String,
    /// Permission bits of the node.
    pub mode: u32,
    /// Module interface version.
    pub version: u32,
    /// When the node was registered, if loaded.
    pub loaded_at: Option<DateTime<Utc>>,
}

struct Registration<I> {
    device: Arc<RdRandDevice<I>>,
    loaded_at: DateTime<Utc>,
}

/// Owns the registration of one rdrand device node.
pub struct DeviceModule<I> {
    config: DeviceConfig,
    instruction: I,
    metrics: Option<MetricsRegistry>,
    registration: Option<Registration<I>>,
}

impl<I: HardwareInstruction + Clone> DeviceModule<I> {
    /// Creates an unloaded module.
    pub fn new(config: DeviceConfig, instruction: I) -> Self {
        Self {
            config,
            instruction,
            metrics: None,
            registration: None,
        }
    }

    /// Attaches a metrics registry handed to every registered node.
    pub fn with_metrics(mut self, metrics: MetricsRegistry) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Applies a lifecycle event.
    pub fn handle(&mut self, event: ModuleEvent) -> Result<(), LifecycleError> {
        match event {
            ModuleEvent::Load => self.load(),
            ModuleEvent::Unload => self.unload(),
            ModuleEvent::Shutdown => Ok(()),
            ModuleEvent::Other(code) => Err(LifecycleError::Unsupported(code)),
        }
    }

    fn load(&mut self) -> Result<(), LifecycleError> {
        if self.registration.is_some() {
            return Err(LifecycleError::AlreadyLoaded(self.config.name.clone()));
        }

        let mut device = RdRandDevice::new(self.config.clone(), self.instruction.clone());
        if let Some(metrics) = &self.metrics {
            metrics.set_loaded(true);
            device = device.with_metrics(metrics.clone());
        }

        if self.config.verbose {
            tracing::info!("{}: <Intel rdrand device>", self.config.name);
        }
        tracing::info!(
            name = %self.config.name,
            mode = format_args!("{:o}", self.config.mode),
            max_transfer = self.config.max_transfer,
            "Device registered"
        );

        self.registration = Some(Registration {
            device: Arc::new(device),
            loaded_at: Utc::now(),
        });
        Ok(())
    }

    fn unload(&mut self) -> Result<(), LifecycleError> {
        if self.registration.take().is_none() {
            return Err(LifecycleError::NotLoaded(self.config.name.clone()));
        }
        if let Some(metrics) = &self.metrics {
            metrics.set_loaded(false);
        }
        tracing::info!(name = %self.config.name, "Device destroyed");
        Ok(())
    }

    /// Returns true if the device node is registered.
    pub fn is_loaded(&self) -> bool {
        self.registration.is_some()
    }

    /// Returns the registered device, if loaded.
    ///
    /// Handles stay usable after unload; the module only drops its own
    /// reference.
    pub fn device(&self) -> Option<Arc<RdRandDevice<I>>> {
        self.registration.as_ref().map(|r| Arc::clone(&r.device))
    }

    /// Returns the current module status.
    pub fn status(&self) -> ModuleStatus {
        ModuleStatus {
            name: self.config.name.clone(),
            mode: self.config.mode,
            version: MODULE_VERSION,
            loaded_at: self.registration.as_ref().map(|r| r.loaded_at),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::MockInstruction;

    fn module() -> DeviceModule<Arc<MockInstruction>> {
        DeviceModule::new(DeviceConfig::default(), Arc::new(MockInstruction::counting()))
    }

    #[test]
    fn test_module_lifecycle() {
        let mut module = module();
        assert!(!module.is_loaded());
        assert!(module.device().is_none());

        module.handle(ModuleEvent::Load).unwrap();
        assert!(module.is_loaded());

        let device = module.device().unwrap();
        let mut buf = [0u8; 16];
        assert_eq!(device.read(&mut buf).unwrap(), 16);

        module.handle(ModuleEvent::Shutdown).unwrap();
        assert!(module.is_loaded());

        module.handle(ModuleEvent::Unload).unwrap();
        assert!(!module.is_loaded());
        assert!(module.device().is_none());
    }

    #[test]
    fn test_double_load_rejected() {
        let mut module = module();
        module.handle(ModuleEvent::Load).unwrap();

        assert_eq!(
            module.handle(ModuleEvent::Load),
            Err(LifecycleError::AlreadyLoaded("rdrand".to_string()))
        );
    }

    #[test]
    fn test_unload_without_load_rejected() {
        let mut module = module();
        assert!(matches!(
            module.handle(ModuleEvent::Unload),
            Err(LifecycleError::NotLoaded(_))
        ));
    }

    #[test]
    fn test_unknown_event_unsupported() {
        let mut module = module();
        assert_eq!(
            module.handle(ModuleEvent::Other(42)),
            Err(LifecycleError::Unsupported(42))
        );
    }

    #[test]
    fn test_reload_after_unload() {
        let mut module = module();
        module.handle(ModuleEvent::Load).unwrap();
        module.handle(ModuleEvent::Unload).unwrap();
        module.handle(ModuleEvent::Load).unwrap();

        assert!(module.is_loaded());
    }

    #[test]
    fn test_status_and_metrics_track_load() {
        let metrics = MetricsRegistry::new().unwrap();
        let mut module = module().with_metrics(metrics.clone());

        let status = module.status();
        assert_eq!(status.name, "rdrand");
        assert_eq!(status.mode, 0o666);
        assert_eq!(status.version, MODULE_VERSION);
        assert!(status.loaded_at.is_none());

        module.handle(ModuleEvent::Load).unwrap();
        assert!(module.status().loaded_at.is_some());
        assert!(metrics.snapshot().loaded);

        let mut buf = [0u8; 10];
        module.device().unwrap().read(&mut buf).unwrap();
        assert_eq!(metrics.snapshot().bytes_delivered, 10);

        module.handle(ModuleEvent::Unload).unwrap();
        assert!(!metrics.snapshot().loaded);
    }
}
