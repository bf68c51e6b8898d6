//! Error types for the few genuinely recoverable failure modes the worklist
//! has. Everything else (contract violations such as unlocking a lock you
//! don't hold, or popping a chunk your thread doesn't own) is a programming
//! bug and stays a `debug_assert!`, per the crate's error handling design.

/// Failures that can surface from the public `push`/`push_range`/
/// `push_initial` API.
#[derive(Debug, thiserror::Error)]
pub enum AmorphousError {
    /// The configured [`crate::runtime::alloc::FixedSizeAllocator`] could not
    /// produce a new chunk. Fatal for the enclosing parallel phase; the
    /// caller should treat this the same as an out-of-memory condition.
    #[error("chunk allocator exhausted")]
    AllocExhausted,
}
