//! Buffer pool statistics tracking.

use std::fmt;

/// Counters tracked by the buffer pool.
///
/// The pool is single-threaded, so these are plain integers; a copy of
/// the struct is its own snapshot.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct PoolStats {
    /// Number of times a requested block was already wired.
    pub hits: u64,

    /// Number of times a requested block had to be wired in.
    pub misses: u64,

    /// Number of frames evicted to make room.
    pub evictions: u64,

    /// Number of blocks read from the data file.
    pub blocks_read: u64,

    /// Number of blocks written to the data file.
    pub blocks_written: u64,
}

impl PoolStats {
    /// Create a stats tracker with all counters at zero.
    pub fn new() -> Self {
        Self::default()
    }

    /// Cache hit rate (0.0 to 1.0).
    pub fn hit_rate(&self) -> f64 {
        let total = self.hits + self.misses;
        if total == 0 {
            0.0
        } else {
            self.hits as f64 / total as f64
        }
    }

    /// Reset all counters to zero.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

impl fmt::Display for PoolStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Stats {{ hits: {}, misses: {}, evictions: {}, hit_rate: {:.2}% }}",
            self.hits,
            self.misses,
            self.evictions,
            self.hit_rate() * 100.0
        )
    }
}
