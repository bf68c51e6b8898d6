//! `AltChunkedQueue`, a FIFO intrusive list of chunks with lock-based
//! push/pop plus lock-based steal operations.
//!
//! All mutating operations take `head`'s lock except the empty check, which
//! is a racy lock-free read of `tail` allowed to return stale-but-monotone
//! results: if it returns `true`, the queue was empty at some point in the
//! recent past; callers must retry under the lock for correctness.

use std::ptr::NonNull;

use crate::loom::sync::atomic::{AtomicUsize, Ordering};
use crate::runtime::chunk::ChunkHeader;
use crate::runtime::ptr_lock::PtrLock;

/// Holds `head: PtrLock<ChunkHeader>` and `tail`, a tagged-pointer atomic
/// word (0 encodes `None`) so the racy fast-path empty check in `is_empty`
/// can read it without taking `head`'s lock and without racing the writes
/// `push`/`pop`/the steal operations make to it under that lock. Invariant:
/// `tail == None ⇔ head.get_value() == None ⇔ empty`. When non-empty,
/// `tail.next == None`, and following `next` from `head` reaches `tail` in
/// finite steps. Every *mutation* of `tail` still happens under the head
/// lock; only the read in `is_empty` is lock-free.
pub struct AltChunkedQueue {
    head: PtrLock<ChunkHeader>,
    tail: AtomicUsize,
}

// `head`'s lock guards every mutation of `tail`; the container is safe to
// share across threads.
unsafe impl Send for AltChunkedQueue {}
unsafe impl Sync for AltChunkedQueue {}

impl AltChunkedQueue {
    pub(crate) fn new() -> Self {
        AltChunkedQueue {
            head: PtrLock::new(),
            tail: AtomicUsize::new(0),
        }
    }

    /// Racy lock-free emptiness check. A `true` result means the queue was
    /// empty at some recent instant; a `false` result is reliable the moment
    /// it is observed (only the lock holder can clear a non-null `tail`).
    pub(crate) fn is_empty(&self) -> bool {
        self.tail.load(Ordering::Acquire) == 0
    }

    fn get_tail(&self) -> Option<NonNull<ChunkHeader>> {
        NonNull::new(self.tail.load(Ordering::Acquire) as *mut ChunkHeader)
    }

    fn set_tail(&self, value: Option<NonNull<ChunkHeader>>) {
        let word = value.map_or(0, |p| p.as_ptr() as usize);
        self.tail.store(word, Ordering::Release);
    }

    pub(crate) fn push(&self, obj: NonNull<ChunkHeader>) {
        self.head.lock();
        unsafe { ChunkHeader::set_next(obj, None) };
        if let Some(tail) = self.get_tail() {
            unsafe { ChunkHeader::set_next(tail, Some(obj)) };
            self.set_tail(Some(obj));
            self.head.unlock();
        } else {
            debug_assert!(self.head.get_value().is_none());
            self.set_tail(Some(obj));
            self.head.unlock_and_set(Some(obj));
        }
    }

    pub(crate) fn pop(&self) -> Option<NonNull<ChunkHeader>> {
        // Lock-free fast path.
        if self.is_empty() {
            return None;
        }

        self.head.lock();
        let h = match self.head.get_value() {
            Some(h) => h,
            None => {
                self.head.unlock();
                return None;
            }
        };
        if self.get_tail() == Some(h) {
            self.set_tail(None);
            debug_assert!(unsafe { ChunkHeader::next(h) }.is_none());
            self.head.unlock_and_clear();
        } else {
            let next = unsafe { ChunkHeader::next(h) };
            self.head.unlock_and_set(next);
        }
        unsafe { ChunkHeader::set_next(h, None) };
        Some(h)
    }

    /// Steals everything `victim` currently holds and returns the first
    /// stolen chunk, prepending any remainder onto `self`.
    pub(crate) fn steal_all_and_pop(&self, victim: &Self) -> Option<NonNull<ChunkHeader>> {
        if victim.is_empty() {
            return None;
        }

        victim.head.lock();
        let chain = victim.head.get_value();
        if chain.is_some() {
            victim.set_tail(None);
        }
        victim.head.unlock_and_clear();

        let chain = chain?;
        self.detach_first_and_prepend_rest(chain)
    }

    /// Steals roughly half of `victim`'s chunk chain, located by walking two
    /// cursors at speeds 1 and 1/2 to find the midpoint, without keeping a
    /// separate length counter.
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
            victim.set_tail(Some(ntail));
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

    /// Prepends the chain starting at `chain` onto the front of `self`.
    fn prepend(&self, chain: NonNull<ChunkHeader>) {
        let mut tail_of_chain = chain;
        while let Some(next) = unsafe { ChunkHeader::next(tail_of_chain) } {
            tail_of_chain = next;
        }

        self.head.lock();
        let old_head = self.head.get_value();
        unsafe { ChunkHeader::set_next(tail_of_chain, old_head) };
        if old_head.is_none() {
            self.set_tail(Some(tail_of_chain));
        }
        self.head.unlock_and_set(Some(chain));
    }
}

impl Default for AltChunkedQueue {
    fn default() -> Self {
        Self::new()
    }
}

/// `loom`-model-checked interleavings, in the style of
/// `tokio::runtime::queue`'s own loom suite. Run with
/// `RUSTFLAGS="--cfg loom" cargo test --release --lib queue::loom_tests`.
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
    fn two_concurrent_pushers_preserve_both_chunks() {
        loom::model(|| {
            let queue = Arc::new(AltChunkedQueue::new());
            let a = new_chunk();
            let b = new_chunk();

            let q1 = queue.clone();
            let t1 = thread::spawn(move || q1.push(a));
            let q2 = queue.clone();
            let t2 = thread::spawn(move || q2.push(b));
            t1.join().unwrap();
            t2.join().unwrap();

            let mut popped = Vec::new();
            while let Some(c) = queue.pop() {
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
    fn push_concurrent_with_steal_half_accounts_for_every_chunk() {
        loom::model(|| {
            let victim = Arc::new(AltChunkedQueue::new());
            let thief = AltChunkedQueue::new();
            let a = new_chunk();
            victim.push(a);

            let b = new_chunk();
            let v = victim.clone();
            let pusher = thread::spawn(move || v.push(b));

            let stolen = thief.steal_half_and_pop(&victim);
            pusher.join().unwrap();

            let mut all: Vec<_> = stolen.into_iter().collect();
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
