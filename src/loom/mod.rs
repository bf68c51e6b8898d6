//! A small indirection layer so the concurrent data structures in
//! `crate::runtime` can be exercised under `loom`'s model checker without
//! changing a single call site.
//!
//! Every interior-mutable field and atomic that participates in the
//! model-checked containers (`PtrLock`, `AltChunkedQueue`, `AltChunkedStack`,
//! and the stealing front-end's victim cursor) is reached through this
//! module rather than through `std::cell`/`std::sync::atomic` directly.
//! Under a normal build this is a zero-cost pass-through to `std`; under
//! `cfg(loom)` it routes through `loom`'s instrumented equivalents.
//! Ambient, non-concurrency-critical counters (`runtime::stats`) use
//! `std::sync::atomic` directly, the same way tokio's own worker metrics sit
//! outside its loom shim.

cfg_if::cfg_if! {
    if #[cfg(loom)] {
        mod loom_impl;
        pub(crate) use loom_impl::*;
    } else {
        mod std_impl;
        pub(crate) use std_impl::*;
    }
}
