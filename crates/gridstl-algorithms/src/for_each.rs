//! In-place elementwise mutation with a coarse, granular launch.

use gridstl_device::{Buffer, DeviceCopy, Result};

use crate::grid::granular_parallel_for;
use crate::policy::ExecutionPolicy;

/// Apply `op` to every element of `data` in place.
///
/// The launch is sized by [`ExecutionPolicy::granular_range`], so each item
/// usually visits many elements.
pub fn for_each<P, T, F>(policy: &P, data: &mut [T], op: F) -> Result<()>
where
    P: ExecutionPolicy,
    T: DeviceCopy,
    F: Fn(&mut T) + Sync,
{
    let n = data.len();
    if n == 0 {
        return Ok(());
    }
    let mut buf = Buffer::from_slice_mut(policy.queue(), data)?;
    let name = policy.kernel_name(0, "for_each");
    granular_parallel_for(policy, &name, n, &mut buf, |id, slice| op(&mut slice[id]))
}
