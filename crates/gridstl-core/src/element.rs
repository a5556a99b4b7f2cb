//! Element bound for anything that may live in device memory.

/// Values that can be mirrored into a device buffer and handed to kernels.
///
/// Device memory is copied bytewise between host and device and read from many
/// work-items at once, so elements must be plain `Copy` data that is safe to
/// share across the worker threads executing work-groups.
pub trait DeviceCopy: Copy + Send + Sync {}

impl<T: Copy + Send + Sync> DeviceCopy for T {}
