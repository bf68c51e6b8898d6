//! Lightweight per-worker instrumentation, in the spirit of
//! `tokio::runtime::stats::WorkerStatsBatcher`: counters a worker updates
//! locally without contention, paired with `tracing` events at the points
//! other workers' behavior is affected (a chunk handed off to the shared
//! container, a steal attempt, an allocator exhaustion).
//!
//! A dedicated statistics/timers subsystem is out of scope for this crate;
//! this module exists only to give operators the same "what is the
//! scheduler doing" visibility tokio gives them, not to replace a dedicated
//! metrics pipeline.

use std::sync::atomic::{AtomicU64, Ordering};

/// Cumulative counters for one worker thread's worklist activity.
#[derive(Debug, Default)]
pub(crate) struct WorkerStats {
    /// Chunks handed off from this worker's push slot to the shared
    /// container because it filled up.
    overflowed_chunks: AtomicU64,
    /// Chunks this worker successfully stole from a peer.
    stolen_chunks: AtomicU64,
    /// Chunks a peer successfully stole from this worker.
    chunks_stolen_from: AtomicU64,
    /// Chunks allocated by this worker.
    chunks_allocated: AtomicU64,
    /// Chunks freed by this worker.
    chunks_freed: AtomicU64,
}

impl WorkerStats {
    pub(crate) fn incr_overflowed_chunks(&self, tid: usize) {
        self.overflowed_chunks.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(tid, "push chunk full; handed off to shared container");
    }

    pub(crate) fn incr_stolen_chunks(&self, tid: usize, victim_tid: usize) {
        self.stolen_chunks.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(tid, victim_tid, "stole a chunk");
    }

    pub(crate) fn incr_chunks_stolen_from(&self, tid: usize, thief_tid: usize) {
        self.chunks_stolen_from.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(tid, thief_tid, "was stolen from");
    }

    pub(crate) fn incr_chunks_allocated(&self, tid: usize) {
        self.chunks_allocated.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(tid, "allocated a chunk");
    }

    pub(crate) fn incr_chunks_freed(&self, tid: usize) {
        self.chunks_freed.fetch_add(1, Ordering::Relaxed);
        tracing::trace!(tid, "freed a chunk");
    }

    pub(crate) fn snapshot(&self) -> WorkerStatsSnapshot {
        WorkerStatsSnapshot {
            overflowed_chunks: self.overflowed_chunks.load(Ordering::Relaxed),
            stolen_chunks: self.stolen_chunks.load(Ordering::Relaxed),
            chunks_stolen_from: self.chunks_stolen_from.load(Ordering::Relaxed),
            chunks_allocated: self.chunks_allocated.load(Ordering::Relaxed),
            chunks_freed: self.chunks_freed.load(Ordering::Relaxed),
        }
    }
}

/// A point-in-time copy of a worker's counters, safe to log or export
/// without holding onto the live atomics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct WorkerStatsSnapshot {
    pub overflowed_chunks: u64,
    pub stolen_chunks: u64,
    pub chunks_stolen_from: u64,
    pub chunks_allocated: u64,
    pub chunks_freed: u64,
}
