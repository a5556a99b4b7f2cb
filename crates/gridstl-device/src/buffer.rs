//! Device buffers: device-resident mirrors of host ranges.
//!
//! A buffer's logical length is fixed at creation. Read-only buffers are never
//! copied back; read-write buffers created over a host slice copy their
//! contents back into it when dropped.

use std::fmt;
use std::mem::size_of;
use std::ops::Deref;
use std::sync::Arc;

use gridstl_core::budget::DeviceMemory;
use gridstl_core::prelude::{DeviceCopy, KernelName};

use crate::error::{Error, Result};
use crate::memory::{Allocation, GlobalMemory};
use crate::metrics::QueueCounters;
use crate::queue::Queue;

/// Access discipline declared when a buffer is created.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessMode {
    Read,
    ReadWrite,
}

impl fmt::Display for AccessMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AccessMode::Read => f.write_str("read-only"),
            AccessMode::ReadWrite => f.write_str("read-write"),
        }
    }
}

pub struct Buffer<'h, T: DeviceCopy> {
    data: Vec<T>,
    mode: AccessMode,
    write_back: Option<&'h mut [T]>,
    poisoned: bool,
    counters: Arc<QueueCounters>,
    _allocation: Allocation,
}

impl<'h, T: DeviceCopy> Buffer<'h, T> {
    /// Read-only mirror of `host`. Never synchronised back.
    pub fn from_slice(queue: &Queue, host: &[T]) -> Result<Self> {
        Self::from_vec(queue, host.to_vec(), AccessMode::Read)
    }

    /// Read-write mirror of `host`; device contents are copied back on drop.
    pub fn from_slice_mut(queue: &Queue, host: &'h mut [T]) -> Result<Self> {
        let mut buf = Self::from_vec(queue, host.to_vec(), AccessMode::ReadWrite)?;
        buf.write_back = Some(host);
        Ok(buf)
    }

    /// Device-only temporary of `len` elements, each set to `placeholder`.
    pub fn filled(queue: &Queue, len: usize, placeholder: T) -> Result<Self> {
        Self::from_vec(queue, vec![placeholder; len], AccessMode::ReadWrite)
    }

    /// Device-only buffer that takes ownership of `data`.
    pub fn from_vec(queue: &Queue, data: Vec<T>, mode: AccessMode) -> Result<Self> {
        let allocation = reserve::<T>(queue.device().memory(), data.len(), tag_for(mode))?;
        Ok(Self {
            data,
            mode,
            write_back: None,
            poisoned: false,
            counters: Arc::clone(queue.counters()),
            _allocation: allocation,
        })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    pub fn access_mode(&self) -> AccessMode {
        self.mode
    }

    /// Device-side read accessor for kernel bodies.
    pub fn read_access(&self) -> &[T] {
        &self.data
    }

    pub(crate) fn write_access(&mut self, kernel: &KernelName) -> Result<&mut [T]> {
        if self.mode == AccessMode::Read {
            return Err(Error::AccessMode {
                kernel: kernel.to_string(),
                required: AccessMode::ReadWrite,
                actual: self.mode,
            });
        }
        Ok(&mut self.data)
    }

    /// Whether a launch that wrote this buffer failed. A poisoned buffer is
    /// never copied back to its host slice.
    pub fn is_poisoned(&self) -> bool {
        self.poisoned
    }

    pub(crate) fn poison(&mut self) {
        self.poisoned = true;
    }

    /// Blocks until device work on this buffer is done and exposes its
    /// contents to the host.
    pub fn host_read(&self) -> HostAccessor<'_, T> {
        self.counters.record_host_sync();
        HostAccessor { data: &self.data }
    }

    pub fn to_vec(&self) -> Vec<T> {
        self.host_read().to_vec()
    }
}

impl<'h, T: DeviceCopy> Drop for Buffer<'h, T> {
    fn drop(&mut self) {
        if let Some(host) = self.write_back.take() {
            if !self.poisoned {
                host.copy_from_slice(&self.data);
            }
        }
    }
}

impl<'h, T: DeviceCopy> fmt::Debug for Buffer<'h, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Buffer")
            .field("len", &self.data.len())
            .field("mode", &self.mode)
            .field("write_back", &self.write_back.is_some())
            .field("poisoned", &self.poisoned)
            .finish()
    }
}

/// Host-visible view of a buffer.
pub struct HostAccessor<'a, T> {
    data: &'a [T],
}

impl<'a, T> Deref for HostAccessor<'a, T> {
    type Target = [T];
    fn deref(&self) -> &Self::Target {
        self.data
    }
}

fn tag_for(mode: AccessMode) -> &'static str {
    match mode {
        AccessMode::Read => "buffer.read",
        AccessMode::ReadWrite => "buffer.read_write",
    }
}

fn reserve<T>(memory: &GlobalMemory, len: usize, tag: &'static str) -> Result<Allocation> {
    let bytes = len
        .checked_mul(size_of::<T>())
        .ok_or(Error::OutOfDeviceMemory {
            tag,
            requested: usize::MAX,
            capacity: memory.capacity_bytes(),
            used: memory.used_bytes(),
        })?;
    memory.allocate(bytes, tag)
}
