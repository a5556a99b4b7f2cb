//! Execution policies: which queue runs the work, how large the physical grid
//! is, and what the launched kernels are called.

use std::borrow::Cow;

use gridstl_core::config::PolicyConfig;
use gridstl_core::range::round_up;
use gridstl_device::{KernelName, NdRange, Queue, Result};

/// Binds algorithms to a queue, a grid-sizing strategy, and a kernel identity.
pub trait ExecutionPolicy {
    fn queue(&self) -> &Queue;

    /// Family name shared by every kernel this policy launches.
    fn kernel_family(&self) -> &str;

    /// Physical global size for `logical` elements in groups of `local`.
    fn global_size(&self, logical: usize, local: usize) -> usize;

    /// Coarse launch shape for `logical` elements, used when each item is
    /// expected to visit many elements.
    fn granular_range(&self, logical: usize) -> Result<NdRange>;

    fn max_work_group_size(&self) -> usize {
        self.queue().device().max_work_group_size()
    }

    fn kernel_name(&self, stage: u32, tag: &'static str) -> KernelName {
        KernelName::new(self.kernel_family().to_owned(), stage, tag)
    }

    /// Launch shape for `logical` elements: `local = min(max work-group size,
    /// logical)`, grid of `max(global, local)` items.
    fn launch_range(&self, logical: usize) -> Result<NdRange> {
        let local = self.max_work_group_size().min(logical).max(1);
        let global = self.global_size(logical, local);
        Ok(NdRange::padded(global, local)?)
    }
}

/// The stock policy.
pub struct DevicePolicy<'q> {
    queue: &'q Queue,
    family: Cow<'static, str>,
    config: PolicyConfig,
}

impl<'q> DevicePolicy<'q> {
    pub fn new(queue: &'q Queue, family: impl Into<Cow<'static, str>>) -> Self {
        Self {
            queue,
            family: family.into(),
            config: PolicyConfig::default(),
        }
    }

    /// Policy whose kernel identity is the marker type `K`.
    pub fn for_kernel<K: ?Sized + 'static>(queue: &'q Queue) -> Self {
        Self::new(queue, std::any::type_name::<K>())
    }

    /// Policy whose grid-sizing knobs come from `GRIDSTL_*` variables.
    pub fn from_env(queue: &'q Queue, family: impl Into<Cow<'static, str>>) -> Result<Self> {
        let config = PolicyConfig::from_env();
        config.validate()?;
        Ok(Self::new(queue, family).with_config(config))
    }

    pub fn with_config(mut self, config: PolicyConfig) -> Self {
        self.config = config;
        self
    }

    pub fn config(&self) -> &PolicyConfig {
        &self.config
    }
}

impl<'q> ExecutionPolicy for DevicePolicy<'q> {
    fn queue(&self) -> &Queue {
        self.queue
    }

    fn kernel_family(&self) -> &str {
        &self.family
    }

    fn global_size(&self, logical: usize, local: usize) -> usize {
        let global = round_up(logical, local);
        match self.config.max_groups {
            Some(groups) => global.min(groups.saturating_mul(local)),
            None => global,
        }
    }

    fn granular_range(&self, logical: usize) -> Result<NdRange> {
        let local = self.max_work_group_size();
        let cap = self
            .queue
            .device()
            .compute_units()
            .saturating_mul(self.config.groups_per_compute_unit)
            .saturating_mul(local);
        let global = round_up(logical, local).min(cap);
        Ok(NdRange::padded(global, local)?)
    }
}
