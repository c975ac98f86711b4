//! Buffer pool management.
//!
//! The buffer pool is the in-memory cache layer between the B+Tree engine
//! and the data file. It wires at most a fixed number of blocks at a time,
//! evicting the least-recently-touched unpinned frame (flush, then drop)
//! when it needs room.
//!
//! # Components
//! - [`BufferPool`] - The block cache itself
//! - [`Frame`] - A resident, deserialized block plus its pin count
//! - [`LruReplacer`] - Victim selection by smallest access tick
//! - [`PoolStats`] - Performance counters

mod frame;
mod pool;
mod replacer;
mod stats;

pub use frame::Frame;
pub use pool::BufferPool;
pub use replacer::LruReplacer;
pub use stats::PoolStats;
