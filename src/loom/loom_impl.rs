//! `loom`-backed implementation of the shim, used by the `loom_tests`
//! modules inside `src/runtime/queue.rs` and `src/runtime/stack.rs` when
//! built with `--cfg loom`.

pub(crate) mod cell {
    #[derive(Debug)]
    pub(crate) struct UnsafeCell<T>(loom::cell::UnsafeCell<T>);

    impl<T> UnsafeCell<T> {
        pub(crate) fn new(data: T) -> UnsafeCell<T> {
            UnsafeCell(loom::cell::UnsafeCell::new(data))
        }

        #[inline]
        pub(crate) fn with<R>(&self, f: impl FnOnce(*const T) -> R) -> R {
            self.0.with(f)
        }

        #[inline]
        pub(crate) fn with_mut<R>(&self, f: impl FnOnce(*mut T) -> R) -> R {
            self.0.with_mut(f)
        }
    }
}

pub(crate) mod sync {
    pub(crate) use loom::sync::Arc;

    pub(crate) mod atomic {
        pub(crate) use loom::sync::atomic::{AtomicU32, AtomicUsize, Ordering};
    }
}

pub(crate) mod thread {
    #[inline]
    pub(crate) fn yield_now() {
        loom::thread::yield_now();
    }
}
