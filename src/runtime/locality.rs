//! The LIFO/FIFO locality discipline applied to a single producer/consumer
//! thread's current chunks, expressed as a sealed marker trait so the
//! choice is monomorphized away rather than branched on at every push/pop.

use crate::runtime::chunk::Chunk;

/// Per-thread push/pop chunk slots. For [`Fifo`] locality the producer uses
/// `second` and the consumer uses `first`; for [`Lifo`] locality both sides
/// use `first` and `second` is unused.
pub(crate) struct ChunkSlots<T, const N: usize> {
    pub(crate) first: Option<std::ptr::NonNull<Chunk<T, N>>>,
    pub(crate) second: Option<std::ptr::NonNull<Chunk<T, N>>>,
}

impl<T, const N: usize> Default for ChunkSlots<T, N> {
    fn default() -> Self {
        ChunkSlots {
            first: None,
            second: None,
        }
    }
}

mod sealed {
    pub trait Sealed {}
}

/// Selects how an [`crate::runtime::master::AltChunkedMaster`]'s per-thread
/// push/pop chunk slots behave. Implemented only by [`Fifo`] and [`Lifo`].
pub trait Locality: sealed::Sealed + Send + Sync + 'static {
    #[doc(hidden)]
    fn push_slot<T, const N: usize>(
        slots: &mut ChunkSlots<T, N>,
    ) -> &mut Option<std::ptr::NonNull<Chunk<T, N>>>;

    #[doc(hidden)]
    fn pop_slot<T, const N: usize>(
        slots: &mut ChunkSlots<T, N>,
    ) -> &mut Option<std::ptr::NonNull<Chunk<T, N>>>;

    #[doc(hidden)]
    fn extract<T, const N: usize>(chunk: &mut Chunk<T, N>) -> Option<T>;

    #[doc(hidden)]
    fn swap_in_push<T, const N: usize>(slots: &mut ChunkSlots<T, N>);
}

/// Producer and consumer share one chunk; within it, tasks come back out in
/// the reverse of push order.
pub struct Lifo;

impl sealed::Sealed for Lifo {}

impl Locality for Lifo {
    fn push_slot<T, const N: usize>(
        slots: &mut ChunkSlots<T, N>,
    ) -> &mut Option<std::ptr::NonNull<Chunk<T, N>>> {
        &mut slots.first
    }

    fn pop_slot<T, const N: usize>(
        slots: &mut ChunkSlots<T, N>,
    ) -> &mut Option<std::ptr::NonNull<Chunk<T, N>>> {
        &mut slots.first
    }

    fn extract<T, const N: usize>(chunk: &mut Chunk<T, N>) -> Option<T> {
        chunk.extract_back()
    }

    fn swap_in_push<T, const N: usize>(_slots: &mut ChunkSlots<T, N>) {
        // Producer and consumer already share a slot; nothing to swap.
    }
}

/// Producer and consumer use distinct chunks; tasks come back out in push
/// order, with the consumer allowed to steal the producer's in-progress
/// chunk once the shared container is also empty.
pub struct Fifo;

impl sealed::Sealed for Fifo {}

impl Locality for Fifo {
    fn push_slot<T, const N: usize>(
        slots: &mut ChunkSlots<T, N>,
    ) -> &mut Option<std::ptr::NonNull<Chunk<T, N>>> {
        &mut slots.second
    }

    fn pop_slot<T, const N: usize>(
        slots: &mut ChunkSlots<T, N>,
    ) -> &mut Option<std::ptr::NonNull<Chunk<T, N>>> {
        &mut slots.first
    }

    fn extract<T, const N: usize>(chunk: &mut Chunk<T, N>) -> Option<T> {
        chunk.extract_front()
    }

    fn swap_in_push<T, const N: usize>(slots: &mut ChunkSlots<T, N>) {
        std::mem::swap(&mut slots.first, &mut slots.second);
    }
}
