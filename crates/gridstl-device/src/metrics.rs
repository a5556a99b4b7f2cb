//! Queue counters and the snapshot exposed to callers.
//!
//! Counters are plain atomics; wire them to a telemetry stack in the binary
//! layer if needed.

use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

#[derive(Default)]
pub(crate) struct QueueCounters {
    kernels_launched: AtomicU64,
    work_groups: AtomicU64,
    barriers: AtomicU64,
    host_syncs: AtomicU64,
    programs_compiled: AtomicU64,
    cache_hits: AtomicU64,
}

impl QueueCounters {
    pub(crate) fn record_launch(&self, groups: usize, barriers: usize) {
        self.kernels_launched.fetch_add(1, Ordering::Relaxed);
        self.work_groups.fetch_add(groups as u64, Ordering::Relaxed);
        self.barriers.fetch_add(barriers as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_host_sync(&self) {
        self.host_syncs.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_compile(&self) {
        self.programs_compiled.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_cache_hit(&self) {
        self.cache_hits.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn snapshot(&self) -> QueueMetrics {
        QueueMetrics {
            kernels_launched: self.kernels_launched.load(Ordering::Relaxed),
            work_groups: self.work_groups.load(Ordering::Relaxed),
            barriers: self.barriers.load(Ordering::Relaxed),
            host_syncs: self.host_syncs.load(Ordering::Relaxed),
            programs_compiled: self.programs_compiled.load(Ordering::Relaxed),
            cache_hits: self.cache_hits.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time view of what a queue has done.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueueMetrics {
    /// Kernel launches that ran to completion.
    pub kernels_launched: u64,
    /// Work-groups executed across all launches.
    pub work_groups: u64,
    /// Work-group barriers executed across all launches.
    pub barriers: u64,
    /// Blocking host synchronisations (`wait` and host accessors).
    pub host_syncs: u64,
    /// Distinct kernel identities compiled on this queue.
    pub programs_compiled: u64,
    /// Launches that reused an already compiled program.
    pub cache_hits: u64,
}

impl QueueMetrics {
    /// Counters accumulated between `earlier` and `self`. Counters that went
    /// backwards (snapshots passed in the wrong order) read as zero.
    pub fn since(&self, earlier: &QueueMetrics) -> QueueMetrics {
        QueueMetrics {
            kernels_launched: self.kernels_launched.saturating_sub(earlier.kernels_launched),
            work_groups: self.work_groups.saturating_sub(earlier.work_groups),
            barriers: self.barriers.saturating_sub(earlier.barriers),
            host_syncs: self.host_syncs.saturating_sub(earlier.host_syncs),
            programs_compiled: self.programs_compiled.saturating_sub(earlier.programs_compiled),
            cache_hits: self.cache_hits.saturating_sub(earlier.cache_hits),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_and_delta() {
        let c = QueueCounters::default();
        c.record_launch(4, 2);
        let first = c.snapshot();
        c.record_launch(1, 0);
        c.record_host_sync();
        c.record_compile();
        c.record_cache_hit();
        let delta = c.snapshot().since(&first);
        assert_eq!(delta.kernels_launched, 1);
        assert_eq!(delta.work_groups, 1);
        assert_eq!(delta.barriers, 0);
        assert_eq!(delta.host_syncs, 1);
        assert_eq!(delta.programs_compiled, 1);
        assert_eq!(delta.cache_hits, 1);
    }

    #[test]
    fn delta_against_newer_snapshot_is_zero() {
        let c = QueueCounters::default();
        c.record_launch(3, 1);
        c.record_host_sync();
        let newer = c.snapshot();
        assert_eq!(QueueMetrics::default().since(&newer), QueueMetrics::default());
    }

    #[test]
    fn metrics_serialize_as_json() {
        let m = QueueMetrics {
            kernels_launched: 2,
            ..QueueMetrics::default()
        };
        let json = serde_json::to_string(&m).unwrap();
        assert!(json.contains("\"kernels_launched\":2"));
    }
}
