//! `std`-backed implementation of the loom shim, used by every build that
//! does not set `--cfg loom`.

pub(crate) mod cell {
    /// A bare wrapper around `std::cell::UnsafeCell` with the same `with`/
    /// `with_mut` access pattern `loom::cell::UnsafeCell` exposes, so that
    /// callers don't need to know which backend they're compiled against.
    #[derive(Debug)]
    pub(crate) struct UnsafeCell<T>(std::cell::UnsafeCell<T>);

    impl<T> UnsafeCell<T> {
        pub(crate) fn new(data: T) -> UnsafeCell<T> {
            UnsafeCell(std::cell::UnsafeCell::new(data))
        }

        #[inline]
        pub(crate) fn with<R>(&self, f: impl FnOnce(*const T) -> R) -> R {
            f(self.0.get())
        }

        #[inline]
        pub(crate) fn with_mut<R>(&self, f: impl FnOnce(*mut T) -> R) -> R {
            f(self.0.get())
        }
    }
}

pub(crate) mod sync {
    pub(crate) use std::sync::Arc;

    pub(crate) mod atomic {
        pub(crate) use std::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
    }
}

pub(crate) mod thread {
    #[inline]
    pub(crate) fn yield_now() {
        std::thread::yield_now();
    }
}
