//! The emulated device: capabilities, global memory, and compute units.

use gridstl_core::config::DeviceConfig;

use crate::error::{Error, Result};
use crate::memory::GlobalMemory;

/// A compute device. Share it between queues with `Arc`.
pub struct Device {
    config: DeviceConfig,
    memory: GlobalMemory,
    pool: rayon::ThreadPool,
}

impl Device {
    pub fn new(config: DeviceConfig) -> Result<Self> {
        config.validate()?;

        let pool = rayon::ThreadPoolBuilder::new()
            .num_threads(config.compute_units)
            .thread_name(|i| format!("gridstl-cu-{i}"))
            .build()
            .map_err(|e| Error::ThreadPool(e.to_string()))?;

        #[cfg(feature = "tracing")]
        tracing::debug!(
            device = %config.name,
            max_work_group_size = config.max_work_group_size,
            compute_units = config.compute_units,
            global_mem_bytes = config.global_mem_bytes,
            "device ready"
        );

        Ok(Self {
            memory: GlobalMemory::new(config.global_mem_bytes),
            config,
            pool,
        })
    }

    /// A device with the default host configuration.
    pub fn host() -> Result<Self> {
        Self::new(DeviceConfig::default())
    }

    /// A device configured from `GRIDSTL_*` environment variables.
    pub fn from_env() -> Result<Self> {
        Self::new(DeviceConfig::from_env())
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn max_work_group_size(&self) -> usize {
        self.config.max_work_group_size
    }

    pub fn compute_units(&self) -> usize {
        self.config.compute_units
    }

    pub fn local_mem_bytes(&self) -> usize {
        self.config.local_mem_bytes
    }

    pub fn config(&self) -> &DeviceConfig {
        &self.config
    }

    pub fn memory(&self) -> &GlobalMemory {
        &self.memory
    }

    pub(crate) fn pool(&self) -> &rayon::ThreadPool {
        &self.pool
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reports_configured_capabilities() {
        let device = Device::new(DeviceConfig {
            name: "test".into(),
            max_work_group_size: 32,
            compute_units: 2,
            global_mem_bytes: 4096,
            local_mem_bytes: 512,
        })
        .unwrap();
        assert_eq!(device.name(), "test");
        assert_eq!(device.max_work_group_size(), 32);
        assert_eq!(device.compute_units(), 2);
        assert_eq!(device.local_mem_bytes(), 512);
        assert_eq!(device.memory().peak_bytes(), 0);
    }

    #[test]
    fn invalid_config_is_rejected() {
        let cfg = DeviceConfig {
            compute_units: 0,
            ..DeviceConfig::default()
        };
        assert!(matches!(Device::new(cfg), Err(Error::Core(_))));
    }
}
