//! Physical launch grids.
//!
//! Only one-dimensional grids exist: a global item count split into
//! work-groups of `local` items each.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Round `value` up to the next multiple of `multiple`.
#[inline]
pub fn round_up(value: usize, multiple: usize) -> usize {
    if multiple == 0 {
        return value;
    }
    let remainder = value % multiple;
    if remainder == 0 {
        value
    } else {
        value + multiple - remainder
    }
}

/// Shape of a kernel launch: `global` items in groups of `local`.
///
/// Invariants: `local > 0`, `global >= local`, `global % local == 0`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NdRange {
    global: usize,
    local: usize,
}

impl NdRange {
    pub fn new(global: usize, local: usize) -> Result<Self> {
        if local == 0 || global < local || global % local != 0 {
            return Err(Error::InvalidNdRange { global, local });
        }
        Ok(Self { global, local })
    }

    /// The launch shape used by every primitive: a grid of
    /// `max(global, local)` items in groups of `local`, with `global` rounded
    /// up to a whole number of groups.
    pub fn padded(global: usize, local: usize) -> Result<Self> {
        Self::new(round_up(global.max(local), local), local)
    }

    pub fn global(&self) -> usize {
        self.global
    }

    pub fn local(&self) -> usize {
        self.local
    }

    pub fn groups(&self) -> usize {
        self.global / self.local
    }

    /// Item descriptor for local id `local_id` of group `group_id`.
    pub fn item(&self, group_id: usize, local_id: usize) -> NdItem {
        NdItem {
            global_id: group_id * self.local + local_id,
            local_id,
            group_id,
            global_range: self.global,
            local_range: self.local,
        }
    }
}

/// Position of one work-item within a launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NdItem {
    pub global_id: usize,
    pub local_id: usize,
    pub group_id: usize,
    pub global_range: usize,
    pub local_range: usize,
}
