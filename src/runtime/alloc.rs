//! The fixed-size chunk allocator collaborator.
//!
//! `AltChunkedMaster` never deallocates a chunk while it, or any chunk
//! reachable from the same container, could still be observed mid-CAS by a
//! concurrent stealer: a chunk only ever leaves a per-thread slot via
//! `pop_internal`'s "chunk drained, free it" step, at which point it has
//! already been fully unlinked from every container. That is sufficient to
//! avoid the stack's ABA hazard without hazard pointers or epochs, as long
//! as allocator implementations don't themselves reuse freed storage while
//! the instant of the free is still racing a push (the default allocator
//! below defers entirely to the global allocator, which already guarantees
//! this).

use std::ptr::NonNull;

use crate::error::AmorphousError;

/// `allocate` returns storage for one chunk, constructed and ready to use;
/// `deallocate` returns it. Implementations must be thread-safe: workers
/// allocate and free concurrently with no coordination beyond this trait.
pub(crate) trait FixedSizeAllocator<T>: Send + Sync {
    fn allocate(&self) -> Result<NonNull<T>, AmorphousError>;

    /// # Safety
    /// `ptr` must have been produced by `allocate` on `self` and not already
    /// freed.
    unsafe fn deallocate(&self, ptr: NonNull<T>);
}

/// The simplest correct implementation of [`FixedSizeAllocator`]: delegates
/// directly to the global allocator via `Box`. Galois's own allocator is a
/// per-thread slab with a freelist, which is a throughput optimization, not
/// a correctness requirement (see `DESIGN.md` for why this crate doesn't
/// reimplement that optimization).
#[derive(Default)]
pub(crate) struct HeapChunkAllocator;

impl<T: Default> FixedSizeAllocator<T> for HeapChunkAllocator {
    fn allocate(&self) -> Result<NonNull<T>, AmorphousError> {
        let boxed = Box::new(T::default());
        Ok(NonNull::new(Box::into_raw(boxed)).expect("Box::into_raw is never null"))
    }

    unsafe fn deallocate(&self, ptr: NonNull<T>) {
        drop(Box::from_raw(ptr.as_ptr()));
    }
}
