#![forbid(unsafe_code)]
//! gridstl: data-parallel algorithms over a work-group device model.
//!
//! ```
//! use gridstl::prelude::*;
//!
//! let queue = Queue::host()?;
//! let policy = DevicePolicy::new(&queue, "doc");
//! let mut out = [0; 4];
//! transform(&policy, &[1, 2, 3, 4], &mut out, |x| x * 2)?;
//! assert_eq!(out, [2, 4, 6, 8]);
//! assert_eq!(find(&policy, &out, |x| x > 4)?, 2);
//! # Ok::<(), gridstl::Error>(())
//! ```

pub use gridstl_algorithms as algorithms;
pub use gridstl_device as device;

pub use gridstl_algorithms::{
    find, find_iter, for_each, position, reduce, transform, transform2, transform_buffers,
    transform_reduce, DevicePolicy, ExecutionPolicy, SearchResult,
};
pub use gridstl_core::budget::DeviceMemory;
pub use gridstl_core::config::{DeviceConfig, PolicyConfig};
pub use gridstl_device::{
    AccessMode, Buffer, Device, DeviceCopy, Error, KernelName, NdRange, Queue, QueueMetrics, Result,
};

pub mod prelude {
    pub use crate::{
        find, find_iter, for_each, position, reduce, transform, transform2, transform_buffers,
        transform_reduce, AccessMode, Buffer, Device, DeviceConfig, DeviceMemory, DevicePolicy,
        Error, ExecutionPolicy, PolicyConfig, Queue, Result,
    };
}
