//! Kernel-side views: work-group scratch memory, barriers, and the slice of
//! global memory a work-group may write.

use std::ops::{Index, IndexMut};

use gridstl_core::prelude::{DeviceCopy, NdItem, NdRange};

/// Per-work-group scratch ("local") memory.
///
/// Slots start out unwritten; `load` of an unwritten slot yields `None`.
pub struct LocalMemory<S> {
    slots: Vec<Option<S>>,
}

impl<S: DeviceCopy> LocalMemory<S> {
    pub(crate) fn new(len: usize) -> Self {
        Self {
            slots: vec![None; len],
        }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    pub fn load(&self, index: usize) -> Option<S> {
        self.slots.get(index).copied().flatten()
    }

    /// Panics when `index` is outside the allocation, like a device fault.
    pub fn store(&mut self, index: usize, value: S) {
        let len = self.slots.len();
        match self.slots.get_mut(index) {
            Some(slot) => *slot = Some(value),
            None => panic!("local memory store at {index} outside allocation of {len}"),
        }
    }
}

/// One work-group of a launch, handed to work-group kernels.
///
/// The body of a work-group kernel is a sequence of phases. Each phase runs a
/// closure once per item in local-id order; consecutive phases must be
/// separated by `barrier()`, which is the point where every item's writes to
/// local memory become visible to every other item.
pub struct WorkGroup<S> {
    range: NdRange,
    group_id: usize,
    local: LocalMemory<S>,
    fenced: bool,
    barriers: usize,
}

impl<S: DeviceCopy> WorkGroup<S> {
    pub(crate) fn new(range: NdRange, group_id: usize, scratch_len: usize) -> Self {
        Self {
            range,
            group_id,
            local: LocalMemory::new(scratch_len),
            fenced: true,
            barriers: 0,
        }
    }

    pub fn group_id(&self) -> usize {
        self.group_id
    }

    pub fn range(&self) -> NdRange {
        self.range
    }

    pub fn local_range(&self) -> usize {
        self.range.local()
    }

    /// Run one phase: `f` once per item of the group.
    ///
    /// Panics if the previous phase was not closed by a barrier.
    pub fn for_each_item<F>(&mut self, mut f: F)
    where
        F: FnMut(NdItem, &mut LocalMemory<S>),
    {
        assert!(
            self.fenced,
            "work-group {} started a phase without a barrier after the previous one",
            self.group_id
        );
        for local_id in 0..self.range.local() {
            f(self.range.item(self.group_id, local_id), &mut self.local);
        }
        self.fenced = false;
    }

    pub fn barrier(&mut self) {
        self.fenced = true;
        self.barriers += 1;
    }

    /// Local memory as seen after the last barrier.
    pub fn local_memory(&self) -> &LocalMemory<S> {
        &self.local
    }

    pub(crate) fn barriers(&self) -> usize {
        self.barriers
    }
}

/// The elements of a global buffer one work-group may write.
///
/// With `G` items in groups of `W`, global memory is split into blocks of `W`
/// elements and block `b` belongs to group `b % (G / W)`. An item with global
/// id `t` therefore owns exactly the indices `t, t + G, t + 2G, ...`, which is
/// the access pattern of a grid-strided loop.
pub struct GroupSlice<'a, T> {
    group_id: usize,
    local: usize,
    groups: usize,
    blocks: Vec<&'a mut [T]>,
}

impl<'a, T: DeviceCopy> GroupSlice<'a, T> {
    /// Hand out the blocks of `data` to the groups of `range`, one
    /// `GroupSlice` per group in group order.
    pub(crate) fn partition(data: &'a mut [T], range: NdRange) -> Vec<GroupSlice<'a, T>> {
        let groups = range.groups();
        let mut slices: Vec<GroupSlice<'a, T>> = (0..groups)
            .map(|group_id| GroupSlice {
                group_id,
                local: range.local(),
                groups,
                blocks: Vec::new(),
            })
            .collect();
        for (block, chunk) in data.chunks_mut(range.local()).enumerate() {
            slices[block % groups].blocks.push(chunk);
        }
        slices
    }

    pub fn group_id(&self) -> usize {
        self.group_id
    }

    fn locate(&self, index: usize) -> Option<(usize, usize)> {
        let block = index / self.local;
        if block % self.groups != self.group_id {
            return None;
        }
        let k = block / self.groups;
        let offset = index % self.local;
        match self.blocks.get(k) {
            Some(chunk) if offset < chunk.len() => Some((k, offset)),
            _ => None,
        }
    }

    pub fn get(&self, index: usize) -> Option<&T> {
        let (k, offset) = self.locate(index)?;
        Some(&self.blocks[k][offset])
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut T> {
        let (k, offset) = self.locate(index)?;
        Some(&mut self.blocks[k][offset])
    }
}

impl<'a, T: DeviceCopy> Index<usize> for GroupSlice<'a, T> {
    type Output = T;

    fn index(&self, index: usize) -> &T {
        match self.get(index) {
            Some(v) => v,
            None => panic!(
                "work-group {} does not own global element {index}",
                self.group_id
            ),
        }
    }
}

impl<'a, T: DeviceCopy> IndexMut<usize> for GroupSlice<'a, T> {
    fn index_mut(&mut self, index: usize) -> &mut T {
        let group_id = self.group_id;
        match self.get_mut(index) {
            Some(v) => v,
            None => panic!("work-group {group_id} does not own global element {index}"),
        }
    }
}
