//! Reduction engine: multi-pass work-group tree reduction.
//!
//! Every pass launches one kernel over the first `remaining` elements of the
//! buffer. Each item folds its grid-strided share into local memory, the group
//! combines its slots pairwise with a barrier after every round, and the
//! group's value lands at `buf[group_id]`. The next pass works on the prefix of
//! group values, until one element is left at `buf[0]`.
//!
//! The grouping depends on the work-group size and the grid, so `bop` has to be
//! associative and commutative.

use std::mem::size_of;

use gridstl_device::{Buffer, DeviceCopy, Error, KernelName, NdRange, Queue, Result, WorkGroup};

use crate::grid::logical_indices;
use crate::policy::ExecutionPolicy;

/// Reduce `buf` in place with `bop` and return the result.
///
/// `buf` must be read-write once it holds more than one element. Work-groups
/// shrink below the device maximum when their scratch would not fit in local
/// memory. The buffer's
/// contents are scratch afterwards; only `buf[0]` is meaningful.
pub fn reduce_impl<P, T, F>(policy: &P, buf: &mut Buffer<'_, T>, bop: F) -> Result<T>
where
    P: ExecutionPolicy,
    T: DeviceCopy,
    F: Fn(T, T) -> T + Sync,
{
    if buf.is_empty() {
        return Err(Error::EmptyRange("reduction"));
    }

    let name = policy.kernel_name(1, "reduce");
    let mut remaining = buf.len();
    let mut pass = 0usize;
    while remaining > 1 {
        let range = pass_range::<P, T>(policy, remaining)?;
        let written = reduce_pass(policy.queue(), &name, range, remaining, buf, &bop)?;

        #[cfg(feature = "tracing")]
        tracing::trace!(kernel = %name, pass, remaining, written, global = range.global(), local = range.local(), "reduction pass");

        if written == 0 || written >= remaining {
            return Err(gridstl_core::error::Error::Invariant(format!(
                "reduction pass {pass} over {remaining} elements left {written}"
            ))
            .into());
        }
        remaining = written;
        pass += 1;
    }

    let host = buf.host_read();
    match host.first() {
        Some(v) => Ok(*v),
        None => Err(Error::EmptyRange("reduction")),
    }
}

/// Launch shape of one pass.
///
/// The work-group is also bounded by how many `T` fit in the device's local
/// memory, since every item keeps one slot of scratch. With single-item groups
/// a grid as large as the input would produce one value per element, so the
/// grid is halved instead.
fn pass_range<P: ExecutionPolicy, T>(policy: &P, remaining: usize) -> Result<NdRange> {
    let mut range = policy.launch_range(remaining)?;
    let fits = (policy.queue().device().local_mem_bytes() / size_of::<T>().max(1)).max(1);
    if range.local() > fits {
        let global = policy.global_size(remaining, fits);
        range = NdRange::padded(global, fits)?;
    }
    if range.local() == 1 && range.global() >= remaining {
        return Ok(NdRange::new(remaining.div_ceil(2), 1)?);
    }
    Ok(range)
}

fn reduce_pass<T, F>(
    queue: &Queue,
    name: &KernelName,
    range: NdRange,
    remaining: usize,
    buf: &mut Buffer<'_, T>,
    bop: &F,
) -> Result<usize>
where
    T: DeviceCopy,
    F: Fn(T, T) -> T + Sync,
{
    let local = range.local();
    queue.parallel_for_work_group(name, range, local, buf, |group: &mut WorkGroup<T>, input| {
        group.for_each_item(|item, scratch| {
            let folded = logical_indices(item, remaining)
                .map(|id| input[id])
                .reduce(bop);
            if let Some(v) = folded {
                scratch.store(item.local_id, v);
            }
        });
        group.barrier();

        let mut stride = 1;
        while stride < local {
            group.for_each_item(|item, scratch| {
                let l = item.local_id;
                if l % (2 * stride) != 0 {
                    return;
                }
                match (scratch.load(l), scratch.load(l + stride)) {
                    (Some(a), Some(b)) => scratch.store(l, bop(a, b)),
                    (None, Some(b)) => scratch.store(l, b),
                    _ => {}
                }
            });
            group.barrier();
            stride *= 2;
        }

        group.local_memory().load(0)
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::DevicePolicy;
    use crate::testing;
    use gridstl_device::AccessMode;

    fn reduce_vec(max_wg: usize, data: Vec<i64>, bop: impl Fn(i64, i64) -> i64 + Sync) -> i64 {
        let queue = testing::queue(max_wg);
        let policy = DevicePolicy::new(&queue, "reduce");
        let mut buf = Buffer::from_vec(&queue, data, AccessMode::ReadWrite).unwrap();
        reduce_impl(&policy, &mut buf, bop).unwrap()
    }

    #[test]
    fn single_element_needs_no_pass() {
        let queue = testing::queue(4);
        let policy = DevicePolicy::new(&queue, "reduce");
        let mut buf = Buffer::from_vec(&queue, vec![42u32], AccessMode::ReadWrite).unwrap();
        assert_eq!(reduce_impl(&policy, &mut buf, |a, b| a + b).unwrap(), 42);
        assert_eq!(queue.metrics().kernels_launched, 0);
    }

    #[test]
    fn max_is_independent_of_work_group_size() {
        let data = vec![3, -7, 19, 4];
        for wg in [1, 2, 4, 256] {
            assert_eq!(reduce_vec(wg, data.clone(), i64::max), 19, "wg={wg}");
        }
    }

    #[test]
    fn sums_lengths_that_do_not_divide_the_group() {
        for n in [2usize, 3, 5, 17, 63, 64, 65, 1000, 4097] {
            let data: Vec<i64> = (1..=n as i64).collect();
            let expected = (n as i64) * (n as i64 + 1) / 2;
            assert_eq!(reduce_vec(8, data, |a, b| a + b), expected, "n={n}");
        }
    }

    #[test]
    fn pass_count_follows_group_size() {
        let queue = testing::queue(4);
        let policy = DevicePolicy::new(&queue, "reduce");
        let mut buf = Buffer::from_vec(&queue, vec![1u64; 64], AccessMode::ReadWrite).unwrap();
        assert_eq!(reduce_impl(&policy, &mut buf, |a, b| a + b).unwrap(), 64);
        // 64 -> 16 -> 4 -> 1
        let m = queue.metrics();
        assert_eq!(m.kernels_launched, 3);
        assert_eq!(m.programs_compiled, 1);
        assert_eq!(m.cache_hits, 2);
    }

    #[test]
    fn capped_grid_folds_before_combining() {
        let queue = testing::queue(4);
        let policy = DevicePolicy::new(&queue, "reduce").with_config(testing::capped(2));
        let data: Vec<u64> = (0..1000).collect();
        let mut buf = Buffer::from_vec(&queue, data, AccessMode::ReadWrite).unwrap();
        assert_eq!(reduce_impl(&policy, &mut buf, |a, b| a + b).unwrap(), 499_500);
        // 1000 -> 2 -> 1
        assert_eq!(queue.metrics().kernels_launched, 2);
    }

    #[test]
    fn random_grids_agree_with_sequential_sum() {
        use rand::rngs::StdRng;
        use rand::{Rng, SeedableRng};

        let mut rng = StdRng::seed_from_u64(11);
        for _ in 0..30 {
            let queue = testing::queue(rng.gen_range(1..=32));
            let policy = DevicePolicy::new(&queue, "reduce")
                .with_config(testing::capped(rng.gen_range(1..=6)));
            let data: Vec<i64> = (0..rng.gen_range(1..3000)).map(|_| rng.gen_range(-50..50)).collect();
            let expected: i64 = data.iter().sum();
            let mut buf = Buffer::from_vec(&queue, data, AccessMode::ReadWrite).unwrap();
            assert_eq!(reduce_impl(&policy, &mut buf, |a, b| a + b).unwrap(), expected);
        }
    }

    #[test]
    fn wide_elements_shrink_the_work_group_to_local_memory() {
        // 64 KiB of local memory holds 128 elements of 512 bytes, half the device maximum
        let queue = testing::queue(256);
        let policy = DevicePolicy::new(&queue, "reduce");
        let data = vec![[1u64; 64]; 1000];
        let mut buf = Buffer::from_vec(&queue, data, AccessMode::ReadWrite).unwrap();
        let total = reduce_impl(&policy, &mut buf, |a: [u64; 64], b: [u64; 64]| {
            let mut c = a;
            for (x, y) in c.iter_mut().zip(b) {
                *x += y;
            }
            c
        })
        .unwrap();
        assert!(total.iter().all(|&v| v == 1000));
        // 1000 -> 8 -> 1
        assert_eq!(queue.metrics().kernels_launched, 2);
    }

    #[test]
    fn single_item_groups_halve_each_pass() {
        assert_eq!(reduce_vec(1, (1..=9).collect(), |a, b| a + b), 45);
    }

    #[test]
    fn barriers_separate_every_round() {
        let queue = testing::queue(8);
        let policy = DevicePolicy::new(&queue, "reduce");
        let mut buf = Buffer::from_vec(&queue, vec![1u32; 8], AccessMode::ReadWrite).unwrap();
        reduce_impl(&policy, &mut buf, |a, b| a + b).unwrap();
        // one group: load barrier + log2(8) combine rounds
        assert_eq!(queue.metrics().barriers, 4);
    }

    #[test]
    fn empty_buffer_is_rejected() {
        let queue = testing::queue(4);
        let policy = DevicePolicy::new(&queue, "reduce");
        let mut buf = Buffer::from_vec(&queue, Vec::<u32>::new(), AccessMode::ReadWrite).unwrap();
        let err = reduce_impl(&policy, &mut buf, |a, b| a + b).unwrap_err();
        assert!(matches!(err, Error::EmptyRange(_)));
    }

    #[test]
    fn read_only_buffer_cannot_be_reduced() {
        let queue = testing::queue(4);
        let policy = DevicePolicy::new(&queue, "reduce");
        let mut buf = Buffer::from_slice(&queue, &[1u32, 2, 3]).unwrap();
        let err = reduce_impl(&policy, &mut buf, |a, b| a + b).unwrap_err();
        assert!(matches!(err, Error::AccessMode { .. }));
    }
}
