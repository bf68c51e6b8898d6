//! The common contract `AltChunkedQueue` and `AltChunkedStack` both satisfy,
//! so `StealingQueue<Inner>` and `AltChunkedMaster` can be generic over
//! "some intrusive chunk container" without caring which ordering discipline
//! it implements across chunks.

use std::ptr::NonNull;

use crate::runtime::chunk::ChunkHeader;
use crate::runtime::queue::AltChunkedQueue;
use crate::runtime::stack::AltChunkedStack;

mod sealed {
    pub trait Sealed {}
}

/// A thread-shared intrusive container of chunks reachable through `head`.
/// Sealed: [`AltChunkedQueue`] and [`AltChunkedStack`] are the only two
/// chunk orderings this crate defines.
pub trait ChunkContainer: sealed::Sealed + Default + Send + Sync + 'static {
    fn is_empty(&self) -> bool;
    fn push(&self, chunk: NonNull<ChunkHeader>);
    fn pop(&self) -> Option<NonNull<ChunkHeader>>;
    fn steal_all_and_pop(&self, victim: &Self) -> Option<NonNull<ChunkHeader>>;
    fn steal_half_and_pop(&self, victim: &Self) -> Option<NonNull<ChunkHeader>>;
}

impl sealed::Sealed for AltChunkedQueue {}

impl ChunkContainer for AltChunkedQueue {
    fn is_empty(&self) -> bool {
        AltChunkedQueue::is_empty(self)
    }

    fn push(&self, chunk: NonNull<ChunkHeader>) {
        AltChunkedQueue::push(self, chunk)
    }

    fn pop(&self) -> Option<NonNull<ChunkHeader>> {
        AltChunkedQueue::pop(self)
    }

    fn steal_all_and_pop(&self, victim: &Self) -> Option<NonNull<ChunkHeader>> {
        AltChunkedQueue::steal_all_and_pop(self, victim)
    }

    fn steal_half_and_pop(&self, victim: &Self) -> Option<NonNull<ChunkHeader>> {
        AltChunkedQueue::steal_half_and_pop(self, victim)
    }
}

impl sealed::Sealed for AltChunkedStack {}

impl ChunkContainer for AltChunkedStack {
    fn is_empty(&self) -> bool {
        AltChunkedStack::is_empty(self)
    }

    fn push(&self, chunk: NonNull<ChunkHeader>) {
        AltChunkedStack::push(self, chunk)
    }

    fn pop(&self) -> Option<NonNull<ChunkHeader>> {
        AltChunkedStack::pop(self)
    }

    fn steal_all_and_pop(&self, victim: &Self) -> Option<NonNull<ChunkHeader>> {
        AltChunkedStack::steal_all_and_pop(self, victim)
    }

    fn steal_half_and_pop(&self, victim: &Self) -> Option<NonNull<ChunkHeader>> {
        AltChunkedStack::steal_half_and_pop(self, victim)
    }
}
