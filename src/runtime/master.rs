//! `AltChunkedMaster<T, N, L, C>`, the user-facing worklist. Owns chunk
//! allocation, keeps one push/pop chunk pair per thread, and funnels
//! overflow/underflow through a [`StealingQueue`].

use std::marker::PhantomData;
use std::ptr::NonNull;

use crate::error::AmorphousError;
use crate::loom::cell::UnsafeCell;
use crate::runtime::alloc::{FixedSizeAllocator, HeapChunkAllocator};
use crate::runtime::chunk::Chunk;
use crate::runtime::container::ChunkContainer;
use crate::runtime::locality::{ChunkSlots, Locality};
use crate::runtime::pool::{PerThreadStorage, ThreadPool};
use crate::runtime::stats::WorkerStatsSnapshot;
use crate::runtime::stealing::StealingQueue;

/// A driver-supplied view of the work this thread should seed the worklist
/// with before a parallel phase begins. Mirrors Galois's
/// `range.local_pair()`; the driver that partitions a graph/range across
/// threads is a separate collaborator this crate does not implement, so
/// this trait is the entire surface this crate needs from it.
pub trait PerThreadRange {
    type Item;
    type Iter: Iterator<Item = Self::Item>;

    fn local_pair(self) -> Self::Iter;
}

impl<I: IntoIterator> PerThreadRange for I {
    type Item = I::Item;
    type Iter = I::IntoIter;

    fn local_pair(self) -> Self::Iter {
        self.into_iter()
    }
}

/// Per-thread chunk slots, behind a cell so `&self` methods on the master
/// can mutate them without the master itself needing `&mut`. Only ever
/// touched by the owning thread (via its own `tid`), never by a stealer:
/// stealing only ever touches the shared `Inner` container, never another
/// thread's push/pop slot, so a plain (non-atomic) cell suffices; it is
/// marked `Sync` by hand, the same way `tokio::runtime::queue::Inner` is.
struct SlotCell<T, const N: usize>(UnsafeCell<ChunkSlots<T, N>>);

unsafe impl<T, const N: usize> Send for SlotCell<T, N> {}
unsafe impl<T, const N: usize> Sync for SlotCell<T, N> {}

impl<T, const N: usize> Default for SlotCell<T, N> {
    fn default() -> Self {
        SlotCell(UnsafeCell::new(ChunkSlots::default()))
    }
}

impl<T, const N: usize> SlotCell<T, N> {
    fn with_mut<R>(&self, f: impl FnOnce(&mut ChunkSlots<T, N>) -> R) -> R {
        self.0.with_mut(|p| f(unsafe { &mut *p }))
    }
}

/// The chunked, work-stealing worklist. `T` is the task type, `N` the
/// per-chunk capacity, `L` the push/pop locality discipline (`Fifo` or
/// `Lifo`), and `C` the shared container's ordering discipline
/// (`AltChunkedQueue` or `AltChunkedStack`).
pub struct AltChunkedMaster<T, const N: usize, L: Locality, C: ChunkContainer> {
    alloc: HeapChunkAllocator,
    slots: PerThreadStorage<SlotCell<T, N>>,
    stealing: StealingQueue<C>,
    _locality: PhantomData<L>,
}

unsafe impl<T: Send, const N: usize, L: Locality, C: ChunkContainer> Send
    for AltChunkedMaster<T, N, L, C>
{
}
unsafe impl<T: Send, const N: usize, L: Locality, C: ChunkContainer> Sync
    for AltChunkedMaster<T, N, L, C>
{
}

impl<T, const N: usize, L: Locality, C: ChunkContainer> AltChunkedMaster<T, N, L, C> {
    /// Builds a worklist sized for `active_threads` worker threads. Chunk
    /// capacity `N` and element type `T` are fixed by the type parameters,
    /// compile-time knobs rather than runtime configuration.
    pub fn new(active_threads: usize) -> Self {
        AltChunkedMaster {
            alloc: HeapChunkAllocator,
            slots: PerThreadStorage::new_with(active_threads, |_| SlotCell::default()),
            stealing: StealingQueue::new(active_threads),
            _locality: PhantomData,
        }
    }

    /// Enqueues one task on the calling thread's push slot.
    pub fn push(&self, pool: &dyn ThreadPool, value: T) -> Result<(), AmorphousError> {
        let slot = self.slots.get_local(pool);
        slot.with_mut(|slots| self.push_internal(pool, slots, value))
    }

    /// Enqueues a range of tasks on the calling thread's push slot.
    pub fn push_range(
        &self,
        pool: &dyn ThreadPool,
        values: impl IntoIterator<Item = T>,
    ) -> Result<(), AmorphousError> {
        let slot = self.slots.get_local(pool);
        slot.with_mut(|slots| {
            for value in values {
                self.push_internal(pool, slots, value)?;
            }
            Ok(())
        })
    }

    /// Seeds the worklist from a driver-partitioned per-thread range, ahead
    /// of a parallel phase.
    pub fn push_initial(
        &self,
        pool: &dyn ThreadPool,
        range: impl PerThreadRange<Item = T>,
    ) -> Result<(), AmorphousError> {
        self.push_range(pool, range.local_pair())
    }

    fn push_internal(
        &self,
        pool: &dyn ThreadPool,
        slots: &mut ChunkSlots<T, N>,
        value: T,
    ) -> Result<(), AmorphousError> {
        let mut value = value;
        if let Some(mut ptr) = *L::push_slot(slots) {
            match unsafe { ptr.as_mut() }.push_back(value) {
                Ok(()) => return Ok(()),
                Err(v) => value = v,
            }
            self.stealing.push(pool, Chunk::<T, N>::header_ptr(ptr));
            self.stealing
                .worker_stats(pool.current_tid())
                .incr_overflowed_chunks(pool.current_tid());
        }

        let mut fresh = self.alloc_chunk(pool)?;
        unsafe { fresh.as_mut() }
            .push_back(value)
            .ok()
            .expect("a freshly allocated chunk has room for at least one element");
        *L::push_slot(slots) = Some(fresh);
        Ok(())
    }

    /// Dequeues one task from the calling thread's pop slot, falling back to
    /// a steal from a peer thread and finally to the push slot (FIFO
    /// locality only, see [`Locality::swap_in_push`]) before giving up.
    pub fn pop(&self, pool: &dyn ThreadPool) -> Option<T> {
        let slot = self.slots.get_local(pool);
        slot.with_mut(|slots| self.pop_internal(pool, slots))
    }

    fn pop_internal(&self, pool: &dyn ThreadPool, slots: &mut ChunkSlots<T, N>) -> Option<T> {
        if let Some(mut ptr) = *L::pop_slot(slots) {
            if let Some(value) = L::extract(unsafe { ptr.as_mut() }) {
                return Some(value);
            }
            *L::pop_slot(slots) = None;
            self.free_chunk(pool, ptr);
        }

        if let Some(header) = self.stealing.pop(pool) {
            let mut ptr = unsafe { Chunk::<T, N>::from_header_ptr(header) };
            if let Some(value) = L::extract(unsafe { ptr.as_mut() }) {
                *L::pop_slot(slots) = Some(ptr);
                return Some(value);
            }
            // A stolen chunk is never empty (§4 invariants guarantee chunks
            // only leave a container non-empty), but degrade gracefully
            // instead of leaking if that ever changes.
            self.free_chunk(pool, ptr);
        }

        L::swap_in_push(slots);
        if let Some(mut ptr) = *L::pop_slot(slots) {
            if let Some(value) = L::extract(unsafe { ptr.as_mut() }) {
                return Some(value);
            }
            *L::pop_slot(slots) = None;
            self.free_chunk(pool, ptr);
        }

        None
    }

    /// A point-in-time snapshot of worker `tid`'s push/steal/allocation
    /// counters, for operators wiring this worklist's activity into their
    /// own `tracing` subscriber or metrics exporter.
    pub fn worker_stats(&self, tid: usize) -> WorkerStatsSnapshot {
        self.stealing.worker_stats(tid).snapshot()
    }

    fn alloc_chunk(&self, pool: &dyn ThreadPool) -> Result<NonNull<Chunk<T, N>>, AmorphousError> {
        match FixedSizeAllocator::<Chunk<T, N>>::allocate(&self.alloc) {
            Ok(ptr) => {
                self.stealing
                    .worker_stats(pool.current_tid())
                    .incr_chunks_allocated(pool.current_tid());
                Ok(ptr)
            }
            Err(err) => {
                tracing::error!(tid = pool.current_tid(), "chunk allocator exhausted");
                Err(err)
            }
        }
    }

    fn free_chunk(&self, pool: &dyn ThreadPool, ptr: NonNull<Chunk<T, N>>) {
        unsafe { FixedSizeAllocator::<Chunk<T, N>>::deallocate(&self.alloc, ptr) };
        self.stealing
            .worker_stats(pool.current_tid())
            .incr_chunks_freed(pool.current_tid());
    }
}

impl<T, const N: usize, L: Locality, C: ChunkContainer> Drop for AltChunkedMaster<T, N, L, C> {
    fn drop(&mut self) {
        let mut residue = false;
        for tid in 0..self.slots.len() {
            self.slots.get_remote(tid).with_mut(|slots| {
                if slots.first.is_some() || slots.second.is_some() {
                    residue = true;
                }
            });
        }
        residue |= !self.stealing.all_inner_empty();

        if residue && !std::thread::panicking() {
            debug_assert!(
                false,
                "worklist dropped with outstanding chunks; this leaks them in release builds"
            );
            tracing::error!("worklist dropped non-empty; leaking outstanding chunks");
        }
    }
}
