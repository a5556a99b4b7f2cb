//! In-order command queue: kernel submission, program cache, synchronisation.

use std::any::Any;
use std::collections::HashMap;
use std::mem::size_of;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex};

use rayon::prelude::*;

use gridstl_core::prelude::{DeviceCopy, KernelName, NdItem, NdRange, ProgramId, QueueId};

use crate::buffer::Buffer;
use crate::device::Device;
use crate::error::{Error, Result};
use crate::kernel::{GroupSlice, WorkGroup};
use crate::metrics::{QueueCounters, QueueMetrics};

static NEXT_QUEUE_ID: AtomicU64 = AtomicU64::new(1);

/// A command queue bound to one device.
///
/// Launches run to completion before `parallel_for*` returns, in submission
/// order. Buffers borrowed by a launch are therefore never touched by two
/// in-flight kernels at once.
pub struct Queue {
    id: QueueId,
    device: Arc<Device>,
    counters: Arc<QueueCounters>,
    programs: Mutex<HashMap<KernelName, ProgramId>>,
}

impl Queue {
    pub fn new(device: Arc<Device>) -> Self {
        Self {
            id: QueueId::new(NEXT_QUEUE_ID.fetch_add(1, Ordering::Relaxed)),
            device,
            counters: Arc::new(QueueCounters::default()),
            programs: Mutex::new(HashMap::new()),
        }
    }

    /// Queue on a fresh device with the default host configuration.
    pub fn host() -> Result<Self> {
        Ok(Self::new(Arc::new(Device::host()?)))
    }

    pub fn id(&self) -> QueueId {
        self.id
    }

    pub fn device(&self) -> &Device {
        &self.device
    }

    pub fn metrics(&self) -> QueueMetrics {
        self.counters.snapshot()
    }

    pub(crate) fn counters(&self) -> &Arc<QueueCounters> {
        &self.counters
    }

    /// Record an explicit synchronisation point. Launches already run to
    /// completion before `parallel_for*` returns, so there is nothing to wait on.
    pub fn wait(&self) {
        self.counters.record_host_sync();
    }

    /// Whether a program with this identity has been built on this queue.
    ///
    /// The identity is the kernel name alone; launches that share a name share
    /// one cache entry whatever operator they run.
    pub fn is_compiled(&self, name: &KernelName) -> bool {
        self.programs
            .lock()
            .map(|p| p.contains_key(name))
            .unwrap_or(false)
    }

    /// Launch a per-item kernel that may write `out`.
    ///
    /// Each work-group receives the part of `out` it owns (see
    /// [`GroupSlice`]); items of a group run in local-id order. If the launch
    /// fails, `out` is poisoned and keeps its host slice unchanged.
    pub fn parallel_for<T, F>(
        &self,
        name: &KernelName,
        range: NdRange,
        out: &mut Buffer<'_, T>,
        kernel: F,
    ) -> Result<()>
    where
        T: DeviceCopy,
        F: Fn(NdItem, &mut GroupSlice<'_, T>) + Sync,
    {
        self.prepare(name, range)?;
        let launched = {
            let data = out.write_access(name)?;
            let slices = GroupSlice::partition(data, range);

            #[cfg(feature = "tracing")]
            tracing::trace!(queue = %self.id, kernel = %name, global = range.global(), local = range.local(), "parallel_for");

            self.execute(name, || {
                slices.into_par_iter().for_each(|mut slice| {
                    let group_id = slice.group_id();
                    for local_id in 0..range.local() {
                        kernel(range.item(group_id, local_id), &mut slice);
                    }
                })
            })
        };
        if let Err(err) = launched {
            // partial writes must not reach the host
            out.poison();
            return Err(err);
        }

        self.counters.record_launch(range.groups(), 0);
        Ok(())
    }

    /// Launch a work-group kernel with `scratch_len` elements of local memory.
    ///
    /// The kernel reads `buf` and may return one value per group. After every
    /// group has finished, the value of group `g` is stored at `buf[g]`.
    /// Returns the number of groups that produced a value. A failed launch
    /// stores nothing.
    pub fn parallel_for_work_group<T, S, F>(
        &self,
        name: &KernelName,
        range: NdRange,
        scratch_len: usize,
        buf: &mut Buffer<'_, T>,
        kernel: F,
    ) -> Result<usize>
    where
        T: DeviceCopy,
        S: DeviceCopy,
        F: Fn(&mut WorkGroup<S>, &[T]) -> Option<T> + Sync,
    {
        self.prepare(name, range)?;
        let requested = scratch_len.saturating_mul(size_of::<S>());
        let capacity = self.device.local_mem_bytes();
        if requested > capacity {
            return Err(Error::LocalMemoryExceeded {
                requested,
                capacity,
            });
        }

        let data = buf.write_access(name)?;

        #[cfg(feature = "tracing")]
        tracing::trace!(queue = %self.id, kernel = %name, global = range.global(), local = range.local(), scratch_len, "parallel_for_work_group");

        let input: &[T] = data;
        let outputs: Vec<(Option<T>, usize)> = self.execute(name, || {
            (0..range.groups())
                .into_par_iter()
                .map(|group_id| {
                    let mut group = WorkGroup::new(range, group_id, scratch_len);
                    let value = kernel(&mut group, input);
                    (value, group.barriers())
                })
                .collect()
        })?;

        let barriers = outputs.iter().map(|(_, b)| b).sum();
        let mut written = 0;
        for (group_id, (value, _)) in outputs.into_iter().enumerate() {
            if let Some(v) = value {
                let len = data.len();
                let slot = data.get_mut(group_id).ok_or_else(|| Error::OutOfBounds {
                    kernel: name.to_string(),
                    index: group_id,
                    len,
                })?;
                *slot = v;
                written += 1;
            }
        }

        self.counters.record_launch(range.groups(), barriers);
        Ok(written)
    }

    fn prepare(&self, name: &KernelName, range: NdRange) -> Result<()> {
        let max = self.device.max_work_group_size();
        if range.local() > max {
            return Err(Error::WorkGroupTooLarge {
                local: range.local(),
                max,
            });
        }
        self.program(name);
        Ok(())
    }

    /// Look up (or build) the program for `name`.
    fn program(&self, name: &KernelName) -> ProgramId {
        let mut programs = match self.programs.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(id) = programs.get(name) {
            self.counters.record_cache_hit();
            return *id;
        }
        let id = ProgramId::new(programs.len() as u64 + 1);
        programs.insert(name.clone(), id);
        self.counters.record_compile();

        #[cfg(feature = "tracing")]
        tracing::debug!(queue = %self.id, kernel = %name, program = %id, "compiled program");

        id
    }

    /// Run a launch on the device's compute units, turning a panic in a user
    /// operator into a device execution error.
    fn execute<R, F>(&self, name: &KernelName, launch: F) -> Result<R>
    where
        R: Send,
        F: FnOnce() -> R + Send,
    {
        let pool = self.device.pool();
        catch_unwind(AssertUnwindSafe(|| pool.install(launch))).map_err(|payload| {
            let message = panic_message(payload.as_ref());

            #[cfg(feature = "tracing")]
            tracing::warn!(queue = %self.id, kernel = %name, %message, "kernel failed");

            Error::KernelFailed {
                kernel: name.to_string(),
                message,
            }
        })
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "kernel panicked".to_string()
    }
}
