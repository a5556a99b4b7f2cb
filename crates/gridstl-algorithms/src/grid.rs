//! Virtualised parallel-for.
//!
//! A launch has a physical grid of `G` items, possibly far fewer than the
//! logical size `L`. Item `t` visits `t, t + G, t + 2G, ...` while below `L`,
//! so every logical index is visited exactly once and no item does more than
//! one iteration more than any other. With `G >= L` this is a bounds-checked
//! one-to-one map.

use gridstl_device::{Buffer, DeviceCopy, GroupSlice, KernelName, NdItem, NdRange, Queue, Result};

use crate::policy::ExecutionPolicy;

/// Logical indices in `[0, logical)` that `item` is responsible for.
pub fn logical_indices(item: NdItem, logical: usize) -> impl Iterator<Item = usize> {
    (item.global_id.min(logical)..logical).step_by(item.global_range.max(1))
}

/// Launch `range` and call `f` once per logical index in `[0, logical)`,
/// with write access to the elements of `out` the visiting work-group owns.
pub fn parallel_for<T, F>(
    queue: &Queue,
    name: &KernelName,
    range: NdRange,
    logical: usize,
    out: &mut Buffer<'_, T>,
    f: F,
) -> Result<()>
where
    T: DeviceCopy,
    F: Fn(usize, &mut GroupSlice<'_, T>) + Sync,
{
    queue.parallel_for(name, range, out, |item, slice| {
        for id in logical_indices(item, logical) {
            f(id, slice);
        }
    })
}

/// [`parallel_for`] with the coarse launch shape suggested by the policy.
pub fn granular_parallel_for<P, T, F>(
    policy: &P,
    name: &KernelName,
    logical: usize,
    out: &mut Buffer<'_, T>,
    f: F,
) -> Result<()>
where
    P: ExecutionPolicy,
    T: DeviceCopy,
    F: Fn(usize, &mut GroupSlice<'_, T>) + Sync,
{
    let range = policy.granular_range(logical)?;
    parallel_for(policy.queue(), name, range, logical, out, f)
}
