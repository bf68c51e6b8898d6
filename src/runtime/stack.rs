//! `AltChunkedStack`, a LIFO intrusive list of chunks with a lock-free CAS
//! push, lock-based pop, and lock-based steal operations.
//!
//! The ABA hazard on the CAS push is avoided because a popped chunk is
//! either immediately returned to a per-thread slot and reused there, or
//! freed only once the surrounding parallel phase has quiesced: see
//! `runtime::alloc` for the reclamation invariant this crate relies on
//! instead of hazard pointers or epoch-based reclamation.

use std::ptr::NonNull;

use crate::runtime::chunk::ChunkHeader;
use crate::runtime::ptr_lock::PtrLock;

/// Holds `head: PtrLock<ChunkHeader>`. Invariant: a singly-linked chain from
/// `head` via `next` terminates in `None`.
pub struct AltChunkedStack {
    head: PtrLock<ChunkHeader>,
}

unsafe impl Send for AltChunkedStack {}
unsafe impl Sync for AltChunkedStack {}

impl AltChunkedStack {
    pub(crate) fn new() -> Self {
        AltChunkedStack {
            head: PtrLock::new(),
        }
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.head.get_value().is_none()
    }

    /// Lock-free: repeatedly read the unlocked head, link `obj` in front of
    /// it, and CAS it into place. A concurrent locker (pop/steal) blocks the
    /// CAS until it unlocks, since the lock bit makes the unlocked word
    /// never match `obj`'s expected previous value while held.
    pub(crate) fn push(&self, obj: NonNull<ChunkHeader>) {
        let mut old_head = self.head.get_value();
        loop {
            unsafe { ChunkHeader::set_next(obj, old_head) };
            match self.head.compare_exchange(old_head, Some(obj)) {
                Ok(()) => return,
                Err(actual) => old_head = actual,
            }
        }
    }

    pub(crate) fn pop(&self) -> Option<NonNull<ChunkHeader>> {
        if self.is_empty() {
            return None;
        }

        self.head.lock();
        let retval = self.head.get_value();
        let next = retval.and_then(|r| unsafe { ChunkHeader::next(r) });
        if let Some(r) = retval {
            unsafe { ChunkHeader::set_next(r, None) };
        }
        self.head.unlock_and_set(next);
        retval
    }

    pub(crate) fn steal_all_and_pop(&self, victim: &Self) -> Option<NonNull<ChunkHeader>> {
        if victim.is_empty() {
            return None;
        }

        victim.head.lock();
        let chain = victim.head.get_value();
        victim.head.unlock_and_clear();

        let chain = chain?;
        self.detach_first_and_prepend_rest(chain)
    }

    pub(crate) fn steal_half_and_pop(&self, victim: &Self) -> Option<NonNull<ChunkHeader>> {
        if victim.is_empty() {
            return None;
        }

        victim.head.lock();
        let mut fast = victim.head.get_value();
        let mut slow = fast;
        let mut advance_slow = false;
        while let Some(cursor) = fast {
            fast = unsafe { ChunkHeader::next(cursor) };
            if advance_slow {
                slow = slow.and_then(|s| unsafe { ChunkHeader::next(s) });
            }
            advance_slow = !advance_slow;
        }

        let stolen_chain = if let Some(ntail) = slow {
            let stolen = unsafe { ChunkHeader::next(ntail) };
            unsafe { ChunkHeader::set_next(ntail, None) };
            stolen
        } else {
            None
        };
        victim.head.unlock();

        let chain = stolen_chain?;
        self.detach_first_and_prepend_rest(chain)
    }

    fn detach_first_and_prepend_rest(
        &self,
        chain: NonNull<ChunkHeader>,
    ) -> Option<NonNull<ChunkHeader>> {
        let rest = unsafe { ChunkHeader::next(chain) };
        unsafe { ChunkHeader::set_next(chain, None) };
        if let Some(rest) = rest {
            self.prepend(rest);
        }
        Some(chain)
    }

    fn prepend(&self, chain: NonNull<ChunkHeader>) {
        let mut tail_of_chain = chain;
        while let Some(next) = unsafe { ChunkHeader::next(tail_of_chain) } {
            tail_of_chain = next;
        }

        self.head.lock();
        let old_head = self.head.get_value();
        unsafe { ChunkHeader::set_next(tail_of_chain, old_head) };
        self.head.unlock_and_set(Some(chain));
    }
}

impl Default for AltChunkedStack {
    fn default() -> Self {
        Self::new()
    }
}

/// `loom`-model-checked interleavings, in the style of
/// `tokio::runtime::queue`'s own loom suite. Run with
/// `RUSTFLAGS="--cfg loom" cargo test --release --lib stack::loom_tests`.
#[cfg(all(test, loom))]
mod loom_tests {
    use super::*;
    use crate::runtime::chunk::Chunk;
    use loom::sync::Arc;
    use loom::thread;

    fn new_chunk() -> NonNull<ChunkHeader> {
        let chunk = Chunk::<i32, 2>::new_boxed();
        let raw = NonNull::new(Box::into_raw(chunk)).unwrap();
        Chunk::<i32, 2>::header_ptr(raw)
    }

    unsafe fn free(ptr: NonNull<ChunkHeader>) {
        drop(Box::from_raw(Chunk::<i32, 2>::from_header_ptr(ptr).as_ptr()));
    }

    #[test]
    fn two_concurrent_pushers_lose_nothing() {
        loom::model(|| {
            let stack = Arc::new(AltChunkedStack::new());
            let a = new_chunk();
            let b = new_chunk();

            let s1 = stack.clone();
            let t1 = thread::spawn(move || s1.push(a));
            let s2 = stack.clone();
            let t2 = thread::spawn(move || s2.push(b));
            t1.join().unwrap();
            t2.join().unwrap();

            let mut popped = Vec::new();
            while let Some(c) = stack.pop() {
                popped.push(c);
            }
            assert_eq!(popped.len(), 2);
            assert!(popped.contains(&a));
            assert!(popped.contains(&b));
            for c in popped {
                unsafe { free(c) };
            }
        });
    }

    #[test]
    fn push_concurrent_with_steal_all_accounts_for_every_chunk() {
        loom::model(|| {
            let victim = Arc::new(AltChunkedStack::new());
            let thief = AltChunkedStack::new();
            let a = new_chunk();
            victim.push(a);

            let b = new_chunk();
            let v = victim.clone();
            let pusher = thread::spawn(move || v.push(b));

            let stolen = thief.steal_all_and_pop(&victim);
            pusher.join().unwrap();

            let mut all = Vec::new();
            if let Some(c) = stolen {
                all.push(c);
            }
            while let Some(c) = thief.pop() {
                all.push(c);
            }
            while let Some(c) = victim.pop() {
                all.push(c);
            }

            assert_eq!(all.len(), 2);
            assert!(all.contains(&a));
            assert!(all.contains(&b));
            for c in all {
                unsafe { free(c) };
            }
        });
    }
}
