//! `StealingQueue<Inner>`, a per-thread instance of an `Inner` chunk
//! container with a steal policy across peer threads that respects package
//! (NUMA) locality.

use std::ptr::NonNull;

use crate::loom::sync::atomic::{AtomicU32, Ordering};
use crate::runtime::chunk::ChunkHeader;
use crate::runtime::container::ChunkContainer;
use crate::runtime::pool::{PerThreadStorage, ThreadPool};
use crate::runtime::stats::WorkerStats;

struct Slot<Inner> {
    inner: Inner,
    /// Rotates across leader-to-leader cross-package steal attempts. An
    /// unsigned counter with defined wraparound, per the distilled
    /// specification's resolution of the "cursor never resets" open
    /// question.
    victim_cursor: AtomicU32,
    stats: WorkerStats,
}

impl<Inner: Default> Default for Slot<Inner> {
    fn default() -> Self {
        Slot {
            inner: Inner::default(),
            victim_cursor: AtomicU32::new(0),
            stats: WorkerStats::default(),
        }
    }
}

pub(crate) struct StealingQueue<Inner> {
    storage: PerThreadStorage<Slot<Inner>>,
}

impl<Inner: ChunkContainer> StealingQueue<Inner> {
    pub(crate) fn new(active_threads: usize) -> Self {
        StealingQueue {
            storage: PerThreadStorage::new_with(active_threads, |_| Slot::default()),
        }
    }

    pub(crate) fn push(&self, pool: &dyn ThreadPool, chunk: NonNull<ChunkHeader>) {
        self.storage.get_local(pool).inner.push(chunk);
    }

    pub(crate) fn pop(&self, pool: &dyn ThreadPool) -> Option<NonNull<ChunkHeader>> {
        let tid = pool.current_tid();
        let local = self.storage.get_remote(tid);
        if let Some(c) = local.inner.pop() {
            return Some(c);
        }
        self.do_steal(pool, tid)
    }

    pub(crate) fn worker_stats(&self, tid: usize) -> &WorkerStats {
        &self.storage.get_remote(tid).stats
    }

    /// Whether every worker's shared container is empty. Used only by
    /// [`crate::runtime::master::AltChunkedMaster`]'s `Drop` to check the
    /// quiescence invariant; racy under concurrent pushers, which is fine
    /// since it is only ever consulted as the worklist itself is being torn
    /// down.
    pub(crate) fn all_inner_empty(&self) -> bool {
        (0..self.storage.len()).all(|tid| self.storage.get_remote(tid).inner.is_empty())
    }

    #[inline(never)]
    fn do_steal(&self, pool: &dyn ThreadPool, id: usize) -> Option<NonNull<ChunkHeader>> {
        let me = self.storage.get_remote(id);
        let num = pool.active_threads();
        let pkg = pool.package_of(id);

        // Same-package peers first: id+1..num, then 0..id.
        for eid in (id + 1..num).chain(0..id) {
            if pool.package_of(eid) == pkg {
                let peer = self.storage.get_remote(eid);
                if let Some(c) = me.inner.steal_half_and_pop(&peer.inner) {
                    me.stats.incr_stolen_chunks(id, eid);
                    peer.stats.incr_chunks_stolen_from(eid, id);
                    return Some(c);
                }
            }
        }

        // Leaders may additionally steal everything from another package's
        // leader, rotating which leader they probe across calls.
        if pool.is_leader(id) {
            let cursor = me.victim_cursor.fetch_add(1, Ordering::Relaxed);
            let eid = (id + cursor as usize) % num;
            if id != eid && pool.is_leader(eid) {
                let peer = self.storage.get_remote(eid);
                if let Some(c) = me.inner.steal_all_and_pop(&peer.inner) {
                    me.stats.incr_stolen_chunks(id, eid);
                    peer.stats.incr_chunks_stolen_from(eid, id);
                    return Some(c);
                }
            }
        }

        None
    }
}
