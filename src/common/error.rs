//! Error types for blocktree.

use thiserror::Error;

use crate::common::BlockId;

/// Convenient Result type alias.
///
/// Instead of writing `Result<T, Error>` everywhere, we can write
/// `Result<T>`, as `std::io` does.
pub type Result<T> = std::result::Result<T, Error>;

/// All possible errors in blocktree.
///
/// `InvalidKey`, `DuplicateKey` and `KeyNotFound` are expected outcomes:
/// they are returned to the caller with no side effects. The remaining
/// variants abort the current operation and propagate; a multi-level
/// split aborted halfway is not rolled back.
#[derive(Debug, Error)]
pub enum Error {
    /// I/O error from the data file (read/write/sync).
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Key 0 is reserved as the free-slot sentinel and cannot be stored.
    #[error("key 0 is reserved as the free-slot sentinel")]
    InvalidKey,

    /// Insert of a key that already exists. The stored record is untouched.
    #[error("key {0} already exists")]
    DuplicateKey(u64),

    /// Lookup or update of a key that was never inserted.
    #[error("key {0} not found")]
    KeyNotFound(u64),

    /// The metadata table has no unused descriptors left.
    #[error("no unused blocks left in the data file")]
    OutOfBlocks,

    /// Metadata operation on a block that was never allocated.
    #[error("{0} is not allocated")]
    InvalidBlock(BlockId),

    /// A block failed its structural checks when loaded from disk.
    #[error("{0} is corrupt: {1}")]
    CorruptBlock(BlockId, &'static str),

    /// Eviction was required but every resident frame is pinned by the
    /// in-flight operation. This indicates a bug or a pool far too small
    /// for the tree height.
    #[error("every resident frame is pinned; cannot evict")]
    PinningViolation,

    /// An imported snapshot failed validation.
    #[error("bad snapshot: {0}")]
    BadSnapshot(&'static str),
}
