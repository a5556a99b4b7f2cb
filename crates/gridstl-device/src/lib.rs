#![forbid(unsafe_code)]
//! gridstl-device: the device/runtime layer the algorithms run on.
//!
//! The device here is emulated on the host. Work-groups are scheduled on a
//! rayon pool sized by the configured compute units, items inside a group run
//! on one worker in local-id order, and barriers separate the phases of a
//! work-group kernel. Global memory is a hard budget: every buffer holds an
//! RAII allocation that returns its bytes on drop.
//!
//! The queue is in-order and executes eagerly, so a launch always observes the
//! writes of every earlier launch on the same queue.

pub mod buffer;
pub mod device;
pub mod error;
pub mod kernel;
pub mod memory;
pub mod metrics;
pub mod queue;

pub use buffer::{AccessMode, Buffer, HostAccessor};
pub use device::Device;
pub use error::{Error, Result};
pub use kernel::{GroupSlice, LocalMemory, WorkGroup};
pub use memory::{Allocation, GlobalMemory};
pub use metrics::QueueMetrics;
pub use queue::Queue;

pub use gridstl_core::prelude::{DeviceCopy, KernelName, NdItem, NdRange};
