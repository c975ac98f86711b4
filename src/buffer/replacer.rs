//! LRU (Least-Recently-Used) replacement policy.

use std::collections::{HashMap, HashSet};

use crate::common::BlockId;

/// Selects eviction victims by least-recent access.
///
/// A monotone logical clock stands in for wall-clock timestamps: every
/// access stamps the block with the next tick, and the victim is the
/// evictable block with the smallest tick - the globally oldest touch.
/// Pinned blocks are withheld from eviction entirely.
#[derive(Debug, Default)]
pub struct LruReplacer {
    /// Last-touch tick per tracked block.
    ticks: HashMap<BlockId, u64>,

    /// Blocks that may be evicted (pin count is zero).
    evictable: HashSet<BlockId>,

    /// Monotone access counter.
    clock: u64,
}

impl LruReplacer {
    /// Create a new LRU replacer.
    pub fn new() -> Self {
        Self::default()
    }

    /// Record that a block was accessed, refreshing its tick.
    pub fn record_access(&mut self, id: BlockId) {
        self.clock += 1;
        self.ticks.insert(id, self.clock);
    }

    /// Mark a block as evictable (pin count dropped to 0) or not.
    pub fn set_evictable(&mut self, id: BlockId, evictable: bool) {
        if evictable {
            self.evictable.insert(id);
        } else {
            self.evictable.remove(&id);
        }
    }

    /// Select and remove the victim: the evictable block with the oldest
    /// tick. None if every tracked block is pinned.
    pub fn evict(&mut self) -> Option<BlockId> {
        let victim = self
            .ticks
            .iter()
            .filter(|(id, _)| self.evictable.contains(id))
            .min_by_key(|(_, &tick)| tick)
            .map(|(&id, _)| id)?;

        self.remove(victim);
        Some(victim)
    }

    /// Stop tracking a block entirely.
    pub fn remove(&mut self, id: BlockId) {
        self.ticks.remove(&id);
        self.evictable.remove(&id);
    }

    /// Forget everything (pool shutdown/reset).
    pub fn clear(&mut self) {
        self.ticks.clear();
        self.evictable.clear();
    }

    /// Number of evictable blocks.
    pub fn len(&self) -> usize {
        self.evictable.len()
    }

    pub fn is_empty(&self) -> bool {
        self.evictable.is_empty()
    }
}
