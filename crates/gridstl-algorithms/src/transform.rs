//! Elementwise transform over host slices and device buffers.

use gridstl_device::{Buffer, DeviceCopy, Error, Result};

use crate::map::{binary_transform_impl, transform_impl};
use crate::policy::ExecutionPolicy;

/// `output[i] = op(input[i])` for every `i < input.len()`.
///
/// Returns the end position written in `output`, i.e. `input.len()`. Elements
/// of `output` past that position are left untouched.
pub fn transform<P, T, U, F>(policy: &P, input: &[T], output: &mut [U], op: F) -> Result<usize>
where
    P: ExecutionPolicy,
    T: DeviceCopy,
    U: DeviceCopy,
    F: Fn(T) -> U + Sync,
{
    let n = input.len();
    let out = prefix_mut(output, n)?;
    let queue = policy.queue();
    let src = Buffer::from_slice(queue, input)?;
    let mut dst = Buffer::from_slice_mut(queue, out)?;
    transform_impl(policy, &src, &mut dst, op)?;
    Ok(n)
}

/// `output[i] = op(input1[i], input2[i])` for every `i < input1.len()`.
///
/// Returns the position in `input2` that pairs with the end of `input1`.
pub fn transform2<P, T, U, F>(
    policy: &P,
    input1: &[T],
    input2: &[T],
    output: &mut [U],
    op: F,
) -> Result<usize>
where
    P: ExecutionPolicy,
    T: DeviceCopy,
    U: DeviceCopy,
    F: Fn(T, T) -> U + Sync,
{
    let n = input1.len();
    let second = input2.get(..n).ok_or(Error::LengthMismatch {
        expected: n,
        actual: input2.len(),
    })?;
    let out = prefix_mut(output, n)?;
    let queue = policy.queue();
    let a = Buffer::from_slice(queue, input1)?;
    let b = Buffer::from_slice(queue, second)?;
    let mut dst = Buffer::from_slice_mut(queue, out)?;
    binary_transform_impl(policy, &a, &b, &mut dst, op)?;
    Ok(n)
}

/// Binary transform over buffers that already live on the device.
pub fn transform_buffers<P, T, U, F>(
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
    binary_transform_impl(policy, input1, input2, output, op)
}

fn prefix_mut<U>(output: &mut [U], n: usize) -> Result<&mut [U]> {
    let actual = output.len();
    output.get_mut(..n).ok_or(Error::LengthMismatch {
        expected: n,
        actual,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::DevicePolicy;
    use crate::testing;
    use gridstl_device::AccessMode;

    #[test]
    fn doubles_in_order() {
        let queue = testing::queue(4);
        let policy = DevicePolicy::new(&queue, "transform");
        let mut out = [0; 4];
        let end = transform(&policy, &[1, 2, 3, 4], &mut out, |x| x * 2).unwrap();
        assert_eq!(end, 4);
        assert_eq!(out, [2, 4, 6, 8]);
    }

    #[test]
    fn longer_output_keeps_its_tail() {
        let queue = testing::queue(4);
        let policy = DevicePolicy::new(&queue, "transform");
        let mut out = [9u8; 6];
        let end = transform(&policy, &[1u8, 2, 3], &mut out, |x| x + 1).unwrap();
        assert_eq!(end, 3);
        assert_eq!(out, [2, 3, 4, 9, 9, 9]);
    }

    #[test]
    fn empty_input_writes_nothing() {
        let queue = testing::queue(4);
        let policy = DevicePolicy::new(&queue, "transform");
        let mut out = [7u32; 2];
        assert_eq!(transform(&policy, &[] as &[u32], &mut out, |x| x).unwrap(), 0);
        assert_eq!(out, [7, 7]);
        assert_eq!(queue.metrics().kernels_launched, 0);
    }

    #[test]
    fn converts_element_types() {
        let queue = testing::queue(2);
        let policy = DevicePolicy::new(&queue, "transform");
        let mut out = [false; 5];
        transform(&policy, &[1i32, -2, 3, -4, 5], &mut out, |x| x > 0).unwrap();
        assert_eq!(out, [true, false, true, false, true]);
    }

    #[test]
    fn binary_adds_pairs_and_reports_second_end() {
        let queue = testing::queue(4);
        let policy = DevicePolicy::new(&queue, "transform2");
        let mut out = [0; 3];
        let end = transform2(&policy, &[1, 2, 3], &[10, 20, 30, 40], &mut out, |a, b| a + b).unwrap();
        assert_eq!(end, 3);
        assert_eq!(out, [11, 22, 33]);
    }

    #[test]
    fn short_second_input_is_rejected() {
        let queue = testing::queue(4);
        let policy = DevicePolicy::new(&queue, "transform2");
        let mut out = [0; 3];
        let err = transform2(&policy, &[1, 2, 3], &[1], &mut out, |a, b| a + b).unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { expected: 3, actual: 1 }));
    }

    #[test]
    fn short_output_is_rejected() {
        let queue = testing::queue(4);
        let policy = DevicePolicy::new(&queue, "transform");
        let mut out = [0; 1];
        let err = transform(&policy, &[1, 2], &mut out, |x| x).unwrap_err();
        assert!(matches!(err, Error::LengthMismatch { expected: 2, actual: 1 }));
    }

    #[test]
    fn buffer_level_transform() {
        let queue = testing::queue(4);
        let policy = DevicePolicy::new(&queue, "transform_buffers");
        let a = Buffer::from_slice(&queue, &[2u32, 3, 4]).unwrap();
        let b = Buffer::from_slice(&queue, &[5u32, 6, 7]).unwrap();
        let mut out = Buffer::from_vec(&queue, vec![0u32; 3], AccessMode::ReadWrite).unwrap();
        transform_buffers(&policy, &a, &b, &mut out, |x, y| x * y).unwrap();
        assert_eq!(out.to_vec(), vec![10, 18, 28]);
    }
}
