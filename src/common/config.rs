//! Configuration constants for blocktree.

/// Size of a block in bytes (4KB).
///
/// Every block - leaf, branch or record - occupies exactly this many bytes
/// on disk, at byte offset `block_number * BLOCK_SIZE` in the data file.
pub const BLOCK_SIZE: usize = 4096;

/// Total number of blocks in a data file.
///
/// The metadata table carries one descriptor per block; blocks are never
/// reclaimed, so this is also the allocation ceiling.
pub const BLOCK_COUNT: usize = 8192;

/// Exact size of the data file in bytes (32MB).
pub const DATA_FILE_SIZE: u64 = (BLOCK_COUNT * BLOCK_SIZE) as u64;

/// Default number of frames in the buffer pool.
///
/// [`BufferPool::new`](crate::buffer::BufferPool::new) takes the capacity
/// as a parameter, so tests can run with tiny pools; this is the value the
/// engine uses.
pub const POOL_CAPACITY: usize = 256;

/// On-disk size of one leaf slot: 8-byte key + 2-byte record block number
/// + 2-byte record slot offset.
pub const LEAF_SLOT_SIZE: usize = 12;

/// Maximum number of `(key, record pointer)` entries in a leaf block.
pub const LEAF_CAPACITY: usize = 330;

/// On-disk size of one branch slot: 8-byte separator key + 2-byte left
/// child + 2-byte right child.
pub const BRANCH_SLOT_SIZE: usize = 12;

/// Maximum number of separator keys in a branch block.
///
/// This is the largest slot count that fits a block: 341 * 12 = 4092.
/// A full branch always holds one more child pointer than keys.
pub const BRANCH_CAPACITY: usize = BLOCK_SIZE / BRANCH_SLOT_SIZE;

/// On-disk size of one record slot: 8-byte key + 56-byte description.
pub const RECORD_SLOT_SIZE: usize = 64;

/// Number of record slots in a record block. 64 * 64 fills the block
/// exactly.
pub const RECORD_CAPACITY: usize = 64;

/// Maximum length of a record description in bytes (NUL-padded on disk).
pub const DESC_SIZE: usize = 56;
