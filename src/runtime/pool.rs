//! The external collaborators the worklist needs from its surrounding
//! runtime: thread identity / package (NUMA) topology, and a place to park
//! one value per worker thread.
//!
//! Neither is implemented "for real" here (a production deployment plugs in
//! whatever thread pool it already has), but a minimal, independently
//! testable implementation of each ships so this crate's own test suite
//! doesn't need an external runtime.

/// Thread identity and package (NUMA domain / socket) topology, as seen by
/// the stealing policy in [`crate::runtime::stealing::StealingQueue`].
pub trait ThreadPool: Send + Sync {
    /// The calling thread's id in `0..active_threads()`.
    fn current_tid(&self) -> usize;

    /// Number of worker threads participating in this worklist.
    fn active_threads(&self) -> usize;

    /// Which package (NUMA domain / socket) a given thread belongs to.
    fn package_of(&self, tid: usize) -> usize;

    /// Whether `tid` is the designated cross-package stealer for its
    /// package.
    fn is_leader(&self, tid: usize) -> bool;

    /// Shorthand for `is_leader(current_tid())`.
    fn is_leader_self(&self) -> bool {
        self.is_leader(self.current_tid())
    }
}

/// One slot of `X` per worker thread, indexed by [`ThreadPool::current_tid`].
///
/// This is the array-backed stand-in for a true thread-local store: rather
/// than keying off the OS thread itself, callers pass the [`ThreadPool`]
/// that told them their own `tid` in the first place, and storage looks that
/// index up directly. `get_remote` needs no such collaborator since any
/// thread is free to look at any other thread's slot's contents provided the
/// contents are internally synchronized for that (`ChunkContainer`s are;
/// `AltChunkedMaster`'s own per-thread chunk slots are not, and are never
/// looked up this way).
pub(crate) struct PerThreadStorage<X> {
    slots: Box<[X]>,
}

impl<X> PerThreadStorage<X> {
    pub(crate) fn new_with(count: usize, mut make: impl FnMut(usize) -> X) -> Self {
        let slots: Vec<X> = (0..count).map(&mut make).collect();
        PerThreadStorage {
            slots: slots.into_boxed_slice(),
        }
    }

    pub(crate) fn get_local(&self, pool: &dyn ThreadPool) -> &X {
        &self.slots[pool.current_tid()]
    }

    pub(crate) fn get_remote(&self, tid: usize) -> &X {
        &self.slots[tid]
    }

    pub(crate) fn len(&self) -> usize {
        self.slots.len()
    }
}

/// A [`ThreadPool`] described entirely by a flat `tid -> package` table and
/// a fixed leader per package, useful for tests and for simple deployments
/// that don't have their own thread pool abstraction to plug in.
///
/// `current_tid` here is supplied explicitly rather than read off a TLS key,
/// since this crate makes no assumption about how (or whether) the
/// surrounding runtime pins work to OS threads; callers that do have a real
/// thread pool should implement [`ThreadPool`] directly against it instead
/// of going through this type.
thread_local! {
    static FLAT_POOL_TID: std::cell::Cell<usize> = const { std::cell::Cell::new(usize::MAX) };
}

pub struct FlatThreadPool {
    packages: Vec<usize>,
}

impl FlatThreadPool {
    /// `packages[tid]` gives the package id of worker `tid`. The lowest-`tid`
    /// thread in each package is that package's leader.
    pub fn new(packages: Vec<usize>) -> std::sync::Arc<Self> {
        std::sync::Arc::new(FlatThreadPool { packages })
    }

    /// Registers the calling thread as worker `tid` for the duration of
    /// `f`. Only one [`FlatThreadPool`] should be in active use per OS
    /// thread at a time; this is a test/bring-up harness, not a general
    /// thread-pool implementation.
    pub fn scoped<R>(&self, tid: usize, f: impl FnOnce() -> R) -> R {
        let prev = FLAT_POOL_TID.with(|c| c.replace(tid));
        let result = f();
        FLAT_POOL_TID.with(|c| c.set(prev));
        result
    }
}

impl ThreadPool for FlatThreadPool {
    fn current_tid(&self) -> usize {
        let tid = FLAT_POOL_TID.with(|c| c.get());
        debug_assert_ne!(tid, usize::MAX, "current thread is not registered; call within FlatThreadPool::scoped");
        tid
    }

    fn active_threads(&self) -> usize {
        self.packages.len()
    }

    fn package_of(&self, tid: usize) -> usize {
        self.packages[tid]
    }

    fn is_leader(&self, tid: usize) -> bool {
        let pkg = self.packages[tid];
        self.packages[..tid].iter().all(|&p| p != pkg)
    }
}
