//! Map followed by reduction, with the caller's initial value folded in on
//! the host.

use gridstl_device::{AccessMode, Buffer, DeviceCopy, Result};

use crate::map::transform_impl;
use crate::policy::ExecutionPolicy;
use crate::reduce::reduce_impl;

/// `binary_op(reduce(map(unary_op, input)), init)`.
///
/// An empty `input` returns `init` without touching the device. `init` is
/// combined last and as the right operand.
pub fn transform_reduce<P, T, R, U, B>(
    policy: &P,
    input: &[T],
    unary_op: U,
    init: R,
    binary_op: B,
) -> Result<R>
where
    P: ExecutionPolicy,
    T: DeviceCopy,
    R: DeviceCopy,
    U: Fn(T) -> R + Sync,
    B: Fn(R, R) -> R + Sync,
{
    if input.is_empty() {
        #[cfg(feature = "tracing")]
        tracing::trace!(family = policy.kernel_family(), "transform_reduce over empty range");
        return Ok(init);
    }

    let queue = policy.queue();
    let src = Buffer::from_slice(queue, input)?;
    // placeholder only; every element is overwritten by the map
    let mut mapped = Buffer::filled(queue, input.len(), init)?;
    transform_impl(policy, &src, &mut mapped, unary_op)?;
    let reduced = reduce_impl(policy, &mut mapped, &binary_op)?;
    Ok(binary_op(reduced, init))
}

/// `bop(reduce(input), init)`; `init` for an empty input.
pub fn reduce<P, T, F>(policy: &P, input: &[T], init: T, bop: F) -> Result<T>
where
    P: ExecutionPolicy,
    T: DeviceCopy,
    F: Fn(T, T) -> T + Sync,
{
    if input.is_empty() {
        return Ok(init);
    }
    let mut buf = Buffer::from_vec(policy.queue(), input.to_vec(), AccessMode::ReadWrite)?;
    let reduced = reduce_impl(policy, &mut buf, &bop)?;
    Ok(bop(reduced, init))
}
