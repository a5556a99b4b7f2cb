use thiserror::Error;

use crate::buffer::AccessMode;

/// Result type local to gridstl-device. This is the failure signal every
/// algorithm call propagates unchanged.
pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] gridstl_core::error::Error),

    #[error("device out of memory for tag '{tag}': requested {requested} bytes, capacity {capacity}, used {used}")]
    OutOfDeviceMemory {
        tag: &'static str,
        requested: usize,
        capacity: usize,
        used: usize,
    },

    #[error("work-group size {local} exceeds device maximum {max}")]
    WorkGroupTooLarge { local: usize, max: usize },

    #[error("local memory request of {requested} bytes exceeds {capacity} bytes per work-group")]
    LocalMemoryExceeded { requested: usize, capacity: usize },

    #[error("kernel {kernel} needs {required} access but buffer is {actual}")]
    AccessMode {
        kernel: String,
        required: AccessMode,
        actual: AccessMode,
    },

    #[error("kernel {kernel} wrote group result {index} past buffer length {len}")]
    OutOfBounds {
        kernel: String,
        index: usize,
        len: usize,
    },

    #[error("length mismatch: expected at least {expected} elements, got {actual}")]
    LengthMismatch { expected: usize, actual: usize },

    #[error("{0} launched over an empty buffer")]
    EmptyRange(&'static str),

    #[error("kernel {kernel} failed: {message}")]
    KernelFailed { kernel: String, message: String },

    #[error("device thread pool: {0}")]
    ThreadPool(String),
}
