//! Abstract device-memory budget interfaces.
//!
//! The concrete implementation lives in `gridstl-device`. Only traits live
//! here so policies and tests can talk about device memory without pulling the
//! runtime in.

/// A reservation of device memory, returned when bytes are acquired.
///
/// Must be RAII (releases on Drop) and `Send`.
pub trait MemoryReservation: Send {
    /// Number of bytes held by this reservation.
    fn bytes(&self) -> usize;
    /// Debug tag naming what the bytes back (e.g. "buffer", "temp").
    fn tag(&self) -> &'static str {
        "reservation"
    }
}

/// Global memory of a compute device with a hard capacity.
///
/// Buffers call `try_reserve` before they materialise on the device. `None`
/// means the device is out of memory and the allocation must fail.
pub trait DeviceMemory: Send + Sync + 'static {
    type Reservation: MemoryReservation;

    /// Attempt to reserve `bytes`. Returns a reservation on success.
    fn try_reserve(&self, bytes: usize, tag: &'static str) -> Option<Self::Reservation>;

    /// Total configured capacity (bytes).
    fn capacity_bytes(&self) -> usize;

    /// Currently reserved bytes (advisory).
    fn used_bytes(&self) -> usize;
}
