//! Device and policy configuration that downstream crates can serialize/deserialize.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceConfig {
    /// Human-readable device name reported in logs and metrics.
    pub name: String,

    /// Largest work-group the device accepts. Primitives never launch more
    /// items per group than this.
    pub max_work_group_size: usize,

    /// Number of compute units; work-groups run concurrently on this many workers.
    pub compute_units: usize,

    /// Hard cap on global (buffer) memory, in bytes.
    pub global_mem_bytes: usize,

    /// Per-work-group scratch memory, in bytes.
    pub local_mem_bytes: usize,
}

impl Default for DeviceConfig {
    fn default() -> Self {
        Self {
            name: "host".to_string(),
            max_work_group_size: 256,
            compute_units: std::thread::available_parallelism()
                .map(|n| n.get())
                .unwrap_or(4),
            global_mem_bytes: 1024 * 1024 * 1024, // 1 GiB default
            local_mem_bytes: 64 * 1024,
        }
    }
}

impl DeviceConfig {
    /// Create a config from environment variables, falling back to defaults.
    ///
    /// Environment variables:
    /// - `GRIDSTL_DEVICE_NAME`: device name
    /// - `GRIDSTL_MAX_WORK_GROUP_SIZE`: maximum work-group size
    /// - `GRIDSTL_COMPUTE_UNITS`: number of compute units
    /// - `GRIDSTL_GLOBAL_MEM_BYTES`: global memory cap in bytes
    /// - `GRIDSTL_LOCAL_MEM_BYTES`: per-group scratch memory in bytes
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Ok(s) = std::env::var("GRIDSTL_DEVICE_NAME") {
            if !s.trim().is_empty() {
                cfg.name = s.trim().to_string();
            }
        }

        if let Some(v) = env_usize("GRIDSTL_MAX_WORK_GROUP_SIZE") {
            cfg.max_work_group_size = v;
        }

        if let Some(v) = env_usize("GRIDSTL_COMPUTE_UNITS") {
            cfg.compute_units = v;
        }

        if let Some(v) = env_usize("GRIDSTL_GLOBAL_MEM_BYTES") {
            cfg.global_mem_bytes = v;
        }

        if let Some(v) = env_usize("GRIDSTL_LOCAL_MEM_BYTES") {
            cfg.local_mem_bytes = v;
        }

        cfg
    }

    /// Parse a JSON document; missing fields take their defaults.
    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_work_group_size == 0 {
            return Err(Error::Config("max_work_group_size must be > 0".into()));
        }
        if self.compute_units == 0 {
            return Err(Error::Config("compute_units must be > 0".into()));
        }
        Ok(())
    }
}

/// Grid-sizing knobs for an execution policy.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicyConfig {
    /// Upper bound on work-groups per launch. `None` launches one item per
    /// logical element; `Some(n)` caps the grid and the grid mapper makes
    /// each item visit several elements.
    pub max_groups: Option<usize>,

    /// Work-groups per compute unit for granular (coarse) launches.
    pub groups_per_compute_unit: usize,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            max_groups: None,
            groups_per_compute_unit: 4,
        }
    }
}

impl PolicyConfig {
    /// Environment variables:
    /// - `GRIDSTL_MAX_GROUPS`: cap on work-groups per launch
    /// - `GRIDSTL_GROUPS_PER_CU`: groups per compute unit for granular launches
    pub fn from_env() -> Self {
        let mut cfg = Self::default();

        if let Some(v) = env_usize("GRIDSTL_MAX_GROUPS") {
            cfg.max_groups = Some(v);
        }

        if let Some(v) = env_usize("GRIDSTL_GROUPS_PER_CU") {
            cfg.groups_per_compute_unit = v;
        }

        cfg
    }

    pub fn from_json_str(s: &str) -> Result<Self> {
        let cfg: Self = serde_json::from_str(s)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_groups == Some(0) {
            return Err(Error::Config("max_groups must be > 0 when set".into()));
        }
        if self.groups_per_compute_unit == 0 {
            return Err(Error::Config("groups_per_compute_unit must be > 0".into()));
        }
        Ok(())
    }
}

fn env_usize(key: &str) -> Option<usize> {
    std::env::var(key).ok()?.trim().parse::<usize>().ok()
}
