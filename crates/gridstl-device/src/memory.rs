//! Device global memory: a hard byte budget plus RAII allocations.
//!
//! Every buffer reserves its bytes here before it materialises. Dropping the
//! allocation returns the bytes (panic-safe).

use std::fmt;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use gridstl_core::budget::{DeviceMemory, MemoryReservation};

use crate::error::{Error, Result};

struct MemoryInner {
    capacity: usize,
    used: AtomicUsize,
    peak: AtomicUsize,
}

impl MemoryInner {
    fn try_reserve(&self, bytes: usize) -> bool {
        let reserved = self
            .used
            .fetch_update(Ordering::AcqRel, Ordering::Relaxed, |cur| {
                cur.checked_add(bytes).filter(|next| *next <= self.capacity)
            });
        match reserved {
            Ok(prev) => {
                self.peak.fetch_max(prev + bytes, Ordering::Relaxed);
                true
            }
            Err(_) => false,
        }
    }

    fn release(&self, bytes: usize) {
        self.used.fetch_sub(bytes, Ordering::AcqRel);
    }
}

/// Global memory of one device.
#[derive(Clone)]
pub struct GlobalMemory {
    inner: Arc<MemoryInner>,
}

impl GlobalMemory {
    pub fn new(capacity_bytes: usize) -> Self {
        Self {
            inner: Arc::new(MemoryInner {
                capacity: capacity_bytes,
                used: AtomicUsize::new(0),
                peak: AtomicUsize::new(0),
            }),
        }
    }

    /// Reserve `bytes` or fail with `Error::OutOfDeviceMemory`.
    pub fn allocate(&self, bytes: usize, tag: &'static str) -> Result<Allocation> {
        self.try_reserve(bytes, tag)
            .ok_or_else(|| Error::OutOfDeviceMemory {
                tag,
                requested: bytes,
                capacity: self.capacity_bytes(),
                used: self.used_bytes(),
            })
    }

    /// Highest number of bytes reserved at once since creation.
    pub fn peak_bytes(&self) -> usize {
        self.inner.peak.load(Ordering::Relaxed)
    }
}

impl DeviceMemory for GlobalMemory {
    type Reservation = Allocation;

    fn try_reserve(&self, bytes: usize, tag: &'static str) -> Option<Allocation> {
        if bytes > 0 && !self.inner.try_reserve(bytes) {
            return None;
        }

        #[cfg(feature = "tracing")]
        tracing::trace!(
            bytes,
            tag,
            used = self.used_bytes(),
            peak = self.peak_bytes(),
            "device alloc"
        );

        Some(Allocation {
            inner: Arc::clone(&self.inner),
            bytes,
            tag,
        })
    }

    fn capacity_bytes(&self) -> usize {
        self.inner.capacity
    }

    fn used_bytes(&self) -> usize {
        self.inner.used.load(Ordering::Relaxed)
    }
}

/// Bytes held on behalf of one buffer. Dropping it returns them to the device.
pub struct Allocation {
    inner: Arc<MemoryInner>,
    bytes: usize,
    tag: &'static str,
}

impl Drop for Allocation {
    fn drop(&mut self) {
        if self.bytes > 0 {
            self.inner.release(self.bytes);
            self.bytes = 0;
        }
    }
}

impl fmt::Debug for Allocation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Allocation")
            .field("bytes", &self.bytes)
            .field("tag", &self.tag)
            .finish()
    }
}

impl MemoryReservation for Allocation {
    fn bytes(&self) -> usize {
        self.bytes
    }
    fn tag(&self) -> &'static str {
        self.tag
    }
}
