//! Search for the first element satisfying a predicate.
//!
//! Every element is tagged with `(pred(x), index)` by the map engine and the
//! tags are reduced with [`SearchResult::merge`], which keeps the lowest
//! matching index whatever the grouping.

use gridstl_device::{AccessMode, Buffer, DeviceCopy, Result};

use crate::map::zip_transform_impl;
use crate::policy::ExecutionPolicy;
use crate::reduce::reduce_impl;

/// Outcome of testing one element, or the merge of several.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SearchResult {
    pub matched: bool,
    pub index: usize,
}

impl SearchResult {
    pub fn new(matched: bool, index: usize) -> Self {
        Self { matched, index }
    }

    /// A match beats a non-match; between two matches the lower index wins.
    /// Between two non-matches the higher index is kept, which callers never
    /// read as a position.
    pub fn merge(a: Self, b: Self) -> Self {
        match (a.matched, b.matched) {
            (true, true) => Self::new(true, a.index.min(b.index)),
            (true, false) => a,
            (false, true) => b,
            (false, false) => Self::new(false, a.index.max(b.index)),
        }
    }
}

/// Index of the first element of `input` for which `pred` holds.
pub fn position<P, T, F>(policy: &P, input: &[T], pred: F) -> Result<Option<usize>>
where
    P: ExecutionPolicy,
    T: DeviceCopy,
    F: Fn(T) -> bool + Sync,
{
    if input.is_empty() {
        return Ok(None);
    }
    let buf = Buffer::from_slice(policy.queue(), input)?;
    search_buffer(policy, &buf, pred)
}

/// Index of the first element of `input` for which `pred` holds, or
/// `input.len()` when there is none.
pub fn find<P, T, F>(policy: &P, input: &[T], pred: F) -> Result<usize>
where
    P: ExecutionPolicy,
    T: DeviceCopy,
    F: Fn(T) -> bool + Sync,
{
    Ok(position(policy, input, pred)?.unwrap_or(input.len()))
}

/// Find over any cloneable iterator.
///
/// Returns `iter` advanced to the first matching element, so its next item is
/// the match. Without a match the returned iterator is exhausted.
pub fn find_iter<P, I, F>(policy: &P, iter: I, pred: F) -> Result<I>
where
    P: ExecutionPolicy,
    I: Iterator + Clone,
    I::Item: DeviceCopy,
    F: Fn(I::Item) -> bool + Sync,
{
    let values: Vec<I::Item> = iter.clone().collect();
    let buf = Buffer::from_vec(policy.queue(), values, AccessMode::Read)?;
    let mut pos = iter;
    match search_buffer(policy, &buf, pred)? {
        Some(0) => {}
        Some(index) => {
            pos.nth(index - 1);
        }
        None => pos.by_ref().for_each(drop),
    }
    Ok(pos)
}

fn search_buffer<P, T, F>(policy: &P, input: &Buffer<'_, T>, pred: F) -> Result<Option<usize>>
where
    P: ExecutionPolicy,
    T: DeviceCopy,
    F: Fn(T) -> bool + Sync,
{
    let n = input.len();
    if n == 0 {
        #[cfg(feature = "tracing")]
        tracing::trace!(family = policy.kernel_family(), "find over empty range");
        return Ok(None);
    }

    let mut results = Buffer::filled(policy.queue(), n, SearchResult::new(false, 0))?;
    zip_transform_impl(policy, input, &mut results, |v, i| SearchResult::new(pred(v), i))?;
    let best = reduce_impl(policy, &mut results, SearchResult::merge)?;
    Ok(best.matched.then_some(best.index))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::DevicePolicy;
    use crate::testing;

    #[test]
    fn merge_prefers_the_earliest_match() {
        let hit = |i| SearchResult::new(true, i);
        let miss = |i| SearchResult::new(false, i);
        assert_eq!(SearchResult::merge(hit(5), hit(2)), hit(2));
        assert_eq!(SearchResult::merge(miss(1), hit(7)), hit(7));
        assert_eq!(SearchResult::merge(hit(7), miss(1)), hit(7));
        assert_eq!(SearchResult::merge(miss(3), miss(8)), miss(8));
    }

    #[test]
    fn first_of_several_matches() {
        let queue = testing::queue(4);
        let policy = DevicePolicy::new(&queue, "find");
        let data = [0, 0, 1, 0, 0, 1, 0, 0, 0, 0];
        assert_eq!(find(&policy, &data, |x| x == 1).unwrap(), 2);
    }

    #[test]
    fn no_match_is_the_end_position() {
        let queue = testing::queue(4);
        let policy = DevicePolicy::new(&queue, "find");
        let data = [1u32, 2, 3, 4, 5];
        assert_eq!(find(&policy, &data, |x| x > 10).unwrap(), 5);
        assert_eq!(position(&policy, &data, |x| x > 10).unwrap(), None);
    }

    #[test]
    fn match_at_the_last_element() {
        let queue = testing::queue(2);
        let policy = DevicePolicy::new(&queue, "find");
        let data: Vec<u32> = (0..33).collect();
        assert_eq!(find(&policy, &data, |x| x == 32).unwrap(), 32);
    }

    #[test]
    fn empty_input_launches_nothing() {
        let queue = testing::queue(4);
        let policy = DevicePolicy::new(&queue, "find");
        assert_eq!(find(&policy, &[] as &[i32], |_| true).unwrap(), 0);
        assert_eq!(queue.metrics().kernels_launched, 0);
    }

    #[test]
    fn capped_grid_finds_the_same_index() {
        let queue = testing::queue(4);
        let policy = DevicePolicy::new(&queue, "find").with_config(testing::capped(1));
        let data: Vec<i32> = (0..500).map(|i| if i % 97 == 96 { -1 } else { i }).collect();
        assert_eq!(find(&policy, &data, |x| x < 0).unwrap(), 96);
    }

    #[test]
    fn iterator_is_advanced_to_the_match() {
        let queue = testing::queue(4);
        let policy = DevicePolicy::new(&queue, "find_iter");
        let data = [4u16, 8, 15, 16, 23, 42];
        let mut it = find_iter(&policy, data.iter().copied(), |x| x % 2 == 1).unwrap();
        assert_eq!(it.next(), Some(15));
        assert_eq!(it.next(), Some(16));

        let mut first = find_iter(&policy, data.iter().copied(), |x| x == 4).unwrap();
        assert_eq!(first.next(), Some(4));

        let mut none = find_iter(&policy, data.iter().copied(), |x| x > 100).unwrap();
        assert_eq!(none.next(), None);
    }
}
