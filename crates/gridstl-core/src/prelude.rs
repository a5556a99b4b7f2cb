//! Convenient re-exports for downstream crates.

pub use crate::budget::{DeviceMemory, MemoryReservation};
pub use crate::config::{DeviceConfig, PolicyConfig};
pub use crate::element::DeviceCopy;
pub use crate::error::{Error, Result};
pub use crate::id::{KernelName, ProgramId, QueueId};
pub use crate::range::{NdItem, NdRange};
