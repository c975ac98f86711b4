//! Buffer Pool - the block caching layer.
//!
//! The [`BufferPool`] provides:
//! - Block caching between the data file and memory
//! - LRU eviction with flush-then-drop write-back
//! - Pinning for blocks an in-flight operation is still mutating
//! - Fullness/parent bookkeeping against the metadata table

use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

use tracing::{debug, trace};

use crate::buffer::{Frame, LruReplacer, PoolStats};
use crate::common::config::BLOCK_SIZE;
use crate::common::{BlockId, Error, Result};
use crate::meta::{BlockDescriptor, BlockKind, MetaTable};
use crate::storage::block::Block;
use crate::storage::BlockFile;

/// Caches a bounded number of wired (in-memory, deserialized) blocks.
///
/// # Architecture
/// ```text
/// ┌────────────────────────────────────────────────────────────┐
/// │                        BufferPool                          │
/// │  ┌────────────────────────┐  ┌─────────────────────────┐   │
/// │  │ frames                 │  │ replacer (LruReplacer)  │   │
/// │  │ BlockId → Frame        │  │ ticks + evictable set   │   │
/// │  └────────────────────────┘  └─────────────────────────┘   │
/// │  ┌────────────────────────┐  ┌─────────────────────────┐   │
/// │  │ meta (MetaTable)       │  │ file (BlockFile)        │   │
/// │  │ kind / full / parent   │  │ flat 32MB data file     │   │
/// │  └────────────────────────┘  └─────────────────────────┘   │
/// └────────────────────────────────────────────────────────────┘
/// ```
///
/// On a miss the pool consults the metadata table for the block's kind,
/// constructs the matching [`Block`] variant, and loads its bytes from
/// the data file - unless the block was freshly allocated, whose content
/// starts empty. When the pool is at capacity the resident frame with
/// the globally smallest last-touch tick is flushed (serialize + write +
/// sync) and dropped first; pinned frames are never chosen.
pub struct BufferPool {
    /// Resident frames, keyed by block number.
    frames: HashMap<BlockId, Frame>,

    /// Victim selection.
    replacer: LruReplacer,

    /// The authoritative per-block metadata.
    meta: MetaTable,

    /// Handles all data-file I/O.
    file: BlockFile,

    /// Performance counters.
    stats: PoolStats,

    /// Maximum number of resident frames.
    capacity: usize,
}

impl BufferPool {
    /// Create a buffer pool over `file` with a fresh metadata table.
    ///
    /// # Panics
    /// Panics if `capacity` is 0.
    pub fn new(capacity: usize, file: BlockFile) -> Self {
        assert!(capacity > 0, "capacity must be > 0");

        Self {
            frames: HashMap::new(),
            replacer: LruReplacer::new(),
            meta: MetaTable::new(),
            file,
            stats: PoolStats::new(),
            capacity,
        }
    }

    // ========================================================================
    // Public API: Fetch and allocate blocks
    // ========================================================================

    /// Get the block `id`, wiring it in from the data file if needed.
    ///
    /// # Errors
    /// - `Error::InvalidBlock` if `id` was never allocated
    /// - `Error::PinningViolation` if room is needed but every resident
    ///   frame is pinned
    /// - `Error::CorruptBlock` / I/O errors from the load
    pub fn get(&mut self, id: BlockId) -> Result<Rc<RefCell<Block>>> {
        if let Some(frame) = self.frames.get(&id) {
            // Cache hit: refresh the access tick.
            let block = frame.block();
            self.replacer.record_access(id);
            self.stats.hits += 1;
            return Ok(block);
        }

        self.stats.misses += 1;
        self.wire(id, true)
    }

    /// Allocate a new block of `kind` and wire it with empty content.
    ///
    /// No disk load happens - a freshly allocated block starts empty.
    pub fn alloc(&mut self, kind: BlockKind) -> Result<(BlockId, Rc<RefCell<Block>>)> {
        let id = self.meta.allocate(kind)?;
        debug!(block = %id, ?kind, "allocated block");

        let block = self.wire(id, false)?;
        Ok((id, block))
    }

    /// Get any not-full block of `kind`, allocating a fresh one when every
    /// existing block of that kind is full.
    pub fn get_not_full(&mut self, kind: BlockKind) -> Result<(BlockId, Rc<RefCell<Block>>)> {
        match self.meta.find_not_full(kind) {
            Some(id) => Ok((id, self.get(id)?)),
            None => self.alloc(kind),
        }
    }

    // ========================================================================
    // Public API: Pinning
    // ========================================================================

    /// Pin a resident block against eviction.
    ///
    /// Used by the engine around in-flight splits: a pinned frame is never
    /// selected as victim until it is unpinned again.
    pub fn pin(&mut self, id: BlockId) -> Result<()> {
        let frame = self.frames.get_mut(&id).ok_or(Error::InvalidBlock(id))?;
        frame.pin();
        self.replacer.set_evictable(id, false);
        Ok(())
    }

    /// Drop one pin on a resident block.
    pub fn unpin(&mut self, id: BlockId) -> Result<()> {
        let frame = self.frames.get_mut(&id).ok_or(Error::InvalidBlock(id))?;
        if frame.unpin() == 0 {
            self.replacer.set_evictable(id, true);
        }
        Ok(())
    }

    // ========================================================================
    // Public API: Metadata bookkeeping
    // ========================================================================

    /// Read-only view of the metadata table.
    #[inline]
    pub fn meta(&self) -> &MetaTable {
        &self.meta
    }

    /// Recompute and record the fullness of `id` from its content.
    ///
    /// Called immediately after every entry mutation so the table's
    /// fullness flags are never stale.
    pub fn refresh_fullness(&mut self, id: BlockId) -> Result<()> {
        let block = self.get(id)?;
        let full = block.borrow().is_full();
        self.meta.set_fullness(id, full)
    }

    /// Record `id`'s parent branch in the metadata table.
    pub fn set_parent(&mut self, id: BlockId, parent: Option<BlockId>) -> Result<()> {
        self.meta.set_parent(id, parent)
    }

    // ========================================================================
    // Public API: Flush and reset
    // ========================================================================

    /// Flush every resident frame (serialize + write + sync), then clear
    /// the pool. Used at orderly shutdown.
    pub fn flush_all(&mut self) -> Result<()> {
        let mut ids: Vec<BlockId> = self.frames.keys().copied().collect();
        ids.sort_unstable();

        for id in ids {
            self.flush_frame(id)?;
        }

        self.frames.clear();
        self.replacer.clear();
        Ok(())
    }

    /// Replace the metadata table wholesale from a snapshot, discarding
    /// any resident frames. The snapshot is authoritative; whatever the
    /// pool held before it is imported no longer describes the file.
    pub fn restore_meta(&mut self, descriptors: Vec<BlockDescriptor>) -> Result<()> {
        self.meta.restore(descriptors)?;
        self.frames.clear();
        self.replacer.clear();
        Ok(())
    }

    // ========================================================================
    // Public API: Stats and info
    // ========================================================================

    /// Get the pool's performance counters.
    pub fn stats(&self) -> PoolStats {
        self.stats
    }

    /// Number of resident frames.
    pub fn resident_count(&self) -> usize {
        self.frames.len()
    }

    /// Maximum number of resident frames.
    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Pin count of a resident frame (0 if not resident). Test hook.
    pub fn pin_count(&self, id: BlockId) -> u32 {
        self.frames.get(&id).map_or(0, Frame::pin_count)
    }

    // ========================================================================
    // Internal: Wiring and eviction
    // ========================================================================

    /// Materialize block `id` into a new frame, evicting first if the
    /// pool is at capacity. `load` is false only for freshly allocated
    /// blocks, whose content starts empty.
    fn wire(&mut self, id: BlockId, load: bool) -> Result<Rc<RefCell<Block>>> {
        // Reject before making room, so a bad id never costs a victim.
        let kind = self.meta.kind(id);
        if kind == BlockKind::Unused {
            return Err(Error::InvalidBlock(id));
        }

        if self.frames.len() == self.capacity {
            self.evict()?;
        }

        let block = if load {
            let buf = self.file.read_block(id)?;
            self.stats.blocks_read += 1;
            Block::load(kind, id, &buf)?
        } else {
            Block::empty(kind)
        };
        trace!(block = %id, ?kind, load, "wired block");

        let frame = Frame::new(block);
        let handle = frame.block();
        self.frames.insert(id, frame);
        self.replacer.record_access(id);
        self.replacer.set_evictable(id, true);

        Ok(handle)
    }

    /// Evict the least-recently-touched unpinned frame: flush, then drop.
    fn evict(&mut self) -> Result<()> {
        let victim = self.replacer.evict().ok_or(Error::PinningViolation)?;
        debug!(block = %victim, "evicting");

        self.flush_frame(victim)?;
        self.frames.remove(&victim);
        self.stats.evictions += 1;
        Ok(())
    }

    /// Serialize a resident frame into a zeroed buffer and write it out
    /// with the durability barrier.
    fn flush_frame(&mut self, id: BlockId) -> Result<()> {
        let frame = self.frames.get(&id).ok_or(Error::InvalidBlock(id))?;

        let mut buf = [0u8; BLOCK_SIZE];
        frame.block().borrow().serialize(&mut buf);
        self.file.write_block(id, &buf)?;
        self.stats.blocks_written += 1;
        Ok(())
    }
}
