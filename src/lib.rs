//! A chunked, work-stealing worklist for fine-grained, irregular
//! data-parallel scheduling: the worklist core of a Galois-style parallel
//! runtime, without the graph algorithms, drivers, or CLI built on top of
//! it.
//!
//! Tasks are grouped into fixed-capacity chunks rather than scheduled one at
//! a time; chunks move between a per-thread push/pop pair and a shared
//! [`AltChunkedQueue`]/[`AltChunkedStack`] container only when the
//! per-thread slot overflows or empties, and an idle thread steals whole or
//! half chunks from a peer before falling back to its own push slot.
//!
//! ```
//! use amorphous::{AltChunkedMaster, Fifo, AltChunkedQueue, FlatThreadPool};
//!
//! let pool = FlatThreadPool::new(vec![0]);
//! let worklist: AltChunkedMaster<u32, 32, Fifo, AltChunkedQueue> = AltChunkedMaster::new(1);
//! pool.scoped(0, || {
//!     worklist.push(&*pool, 1).unwrap();
//!     worklist.push(&*pool, 2).unwrap();
//!     assert_eq!(worklist.pop(&*pool), Some(1));
//!     assert_eq!(worklist.pop(&*pool), Some(2));
//! });
//! ```

mod error;
mod loom;
mod runtime;

pub use error::AmorphousError;
pub use runtime::pool::{FlatThreadPool, ThreadPool};
pub use runtime::{
    AltChunkedMaster, AltChunkedQueue, AltChunkedStack, Fifo, Lifo, Locality, PerThreadRange,
    WorkerStatsSnapshot,
};
