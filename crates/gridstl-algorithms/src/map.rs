//! Map engine: one launch applying an operator elementwise into an output
//! buffer of the same length.
//!
//! Each item handles the logical indices the grid mapper gives it. With the
//! default policy the grid has at least one item per element and that is a
//! single bounds-checked write; a capped policy makes items loop.
//! Operators must not depend on the order in which elements are visited.

use gridstl_device::{Buffer, DeviceCopy, Error, Result};

use crate::grid;
use crate::policy::ExecutionPolicy;

/// `output[i] = op(input[i])` for every `i < input.len()`.
pub fn transform_impl<P, T, U, F>(
    policy: &P,
    input: &Buffer<'_, T>,
    output: &mut Buffer<'_, U>,
    op: F,
) -> Result<()>
where
    P: ExecutionPolicy,
    T: DeviceCopy,
    U: DeviceCopy,
    F: Fn(T) -> U + Sync,
{
    let n = input.len();
    check_len(n, output.len())?;
    if n == 0 {
        return Ok(());
    }

    let range = policy.launch_range(n)?;
    let name = policy.kernel_name(0, "transform");
    let src = input.read_access();
    grid::parallel_for(policy.queue(), &name, range, n, output, |id, out| {
        out[id] = op(src[id]);
    })
}

/// `output[i] = op(input1[i], input2[i])` for every `i < input1.len()`.
pub fn binary_transform_impl<P, T, U, F>(
    policy: &P,
    input1: &Buffer<'_, T>,
    input2: &Buffer<'_, T>,
    output: &mut Buffer<'_, U>,
    op: F,
) -> Result<()>
where
    P: ExecutionPolicy,
    T: DeviceCopy,
    U: DeviceCopy,
    F: Fn(T, T) -> U + Sync,
{
    let n = input1.len();
    check_len(n, input2.len())?;
    check_len(n, output.len())?;
    if n == 0 {
        return Ok(());
    }

    let range = policy.launch_range(n)?;
    let name = policy.kernel_name(0, "binary_transform");
    let (a, b) = (input1.read_access(), input2.read_access());
    grid::parallel_for(policy.queue(), &name, range, n, output, |id, out| {
        out[id] = op(a[id], b[id]);
    })
}

/// `output[i] = op(input[i], i)`: the element together with its position.
pub fn zip_transform_impl<P, T, U, F>(
    policy: &P,
    input: &Buffer<'_, T>,
    output: &mut Buffer<'_, U>,
    op: F,
) -> Result<()>
where
    P: ExecutionPolicy,
    T: DeviceCopy,
    U: DeviceCopy,
    F: Fn(T, usize) -> U + Sync,
{
    let n = input.len();
    check_len(n, output.len())?;
    if n == 0 {
        return Ok(());
    }

    let range = policy.launch_range(n)?;
    let name = policy.kernel_name(0, "zip_transform");
    let src = input.read_access();
    grid::parallel_for(policy.queue(), &name, range, n, output, |id, out| {
        out[id] = op(src[id], id);
    })
}

fn check_len(expected: usize, actual: usize) -> Result<()> {
    if actual < expected {
        return Err(Error::LengthMismatch { expected, actual });
    }
    Ok(())
}
