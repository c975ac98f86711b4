//! B+Tree engine - the top-level key/value API.
//!
//! The [`BPlusTree`] ties the layers together: it descends from the root
//! through branch blocks to the right leaf, resolves leaf entries to
//! record slots through the buffer pool, and drives split propagation
//! when an insert lands in a full leaf.
//!
//! # Split propagation
//! A split works bottom-up, one level at a time. The full leaf gets a
//! new right sibling, the entries are rebalanced, and the sibling's
//! first key becomes the separator handed to the parent. A full parent
//! absorbs the separator anyway (transiently exceeding capacity), splits
//! around its middle key, and hands the promoted key one level further
//! up. When the propagation runs off the top, a fresh branch becomes the
//! new root. Every block a still-running insert will mutate again is
//! pinned in the pool until the insert completes, so eviction can never
//! flush a half-updated level. Each level adds at most one sibling, plus
//! at most one new root.
//!
//! Errors abort the insert where it stands; there is no rollback. An
//! aborted insert may leave an allocated record slot or sibling behind,
//! but never a tree that violates the search invariants.

use std::path::Path;

use tracing::{debug, info};

use crate::buffer::{BufferPool, PoolStats};
use crate::common::config::POOL_CAPACITY;
use crate::common::{BlockId, Error, Result};
use crate::meta::BlockKind;
use crate::snapshot::Snapshot;
use crate::storage::block::{Block, Record, RecordPtr};
use crate::storage::BlockFile;

/// A disk-backed B+Tree mapping `u64` keys to short descriptions.
pub struct BPlusTree {
    pool: BufferPool,
    root: BlockId,
}

impl BPlusTree {
    /// Open a fresh tree over the data file at `path`, creating the file
    /// if needed. The tree starts as a single empty root leaf.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::open_with_pool(path, POOL_CAPACITY)
    }

    /// Like [`open`](Self::open) with an explicit pool capacity.
    pub fn open_with_pool<P: AsRef<Path>>(path: P, capacity: usize) -> Result<Self> {
        let file = BlockFile::open_or_create(&path)?;
        let mut pool = BufferPool::new(capacity, file);
        let (root, _) = pool.alloc(BlockKind::Leaf)?;

        info!(path = %path.as_ref().display(), capacity, root = %root, "opened fresh tree");
        Ok(Self { pool, root })
    }

    /// Reopen a tree from an existing data file and the snapshot taken
    /// when it was last closed.
    pub fn restore<P: AsRef<Path>>(path: P, snapshot: Snapshot) -> Result<Self> {
        let file = BlockFile::open(&path)?;
        let pool = BufferPool::new(POOL_CAPACITY, file);

        // Placeholder root until the snapshot is imported.
        let mut tree = Self {
            pool,
            root: BlockId::new(0),
        };
        tree.import_snapshot(snapshot)?;

        info!(path = %path.as_ref().display(), root = %tree.root, "restored tree");
        Ok(tree)
    }

    /// Flush everything to disk and hand back the snapshot needed to
    /// [`restore`](Self::restore) the tree later.
    pub fn close(mut self) -> Result<Snapshot> {
        let snapshot = self.export_snapshot();
        self.pool.flush_all()?;
        Ok(snapshot)
    }

    // ========================================================================
    // Lookup and update
    // ========================================================================

    /// Look up the record stored under `key`.
    ///
    /// Key 0 is never stored (it is the free-slot sentinel), so looking
    /// it up misses like any other absent key.
    ///
    /// # Errors
    /// `Error::KeyNotFound` when no entry exists.
    pub fn lookup(&mut self, key: u64) -> Result<Record> {
        let leaf_id = self.search_leaf(key)?;
        let ptr = self
            .leaf_find(leaf_id, key)?
            .ok_or(Error::KeyNotFound(key))?;
        self.read_record(key, ptr)
    }

    /// Overwrite the description stored under `key`; the key and its
    /// position in the tree are untouched. Misses (key 0 included) fail
    /// with `KeyNotFound`.
    pub fn update(&mut self, key: u64, desc: &str) -> Result<()> {
        let leaf_id = self.search_leaf(key)?;
        let ptr = self
            .leaf_find(leaf_id, key)?
            .ok_or(Error::KeyNotFound(key))?;

        let block = self.pool.get(ptr.block)?;
        let updated = block
            .borrow_mut()
            .as_record_mut()
            .ok_or(Error::CorruptBlock(ptr.block, "pointer into non-record block"))?
            .set_desc(ptr.slot, desc);
        if !updated {
            return Err(Error::CorruptBlock(ptr.block, "pointer at free record slot"));
        }
        Ok(())
    }

    // ========================================================================
    // Insert
    // ========================================================================

    /// Insert `(key, desc)`.
    ///
    /// The duplicate probe runs before any allocation, so a rejected
    /// duplicate leaves no trace. Over-long descriptions are truncated
    /// to the on-disk slot size.
    ///
    /// # Errors
    /// - `Error::InvalidKey` for key 0
    /// - `Error::DuplicateKey` when the key already exists
    /// - `Error::OutOfBlocks` / `Error::PinningViolation` from the layers
    ///   below; these abort the insert without rollback
    pub fn insert(&mut self, key: u64, desc: &str) -> Result<()> {
        if key == 0 {
            return Err(Error::InvalidKey);
        }

        let leaf_id = self.search_leaf(key)?;
        if self.leaf_find(leaf_id, key)?.is_some() {
            return Err(Error::DuplicateKey(key));
        }

        let ptr = self.make_record(key, desc)?;

        let mut pinned = Vec::new();
        let result = self.insert_entry(leaf_id, key, ptr, &mut pinned);

        // Unpin everything whether the insert succeeded or not. Pinned
        // frames are always resident, so these cannot fail in practice.
        let unpinned: Result<()> = pinned.into_iter().try_for_each(|id| self.pool.unpin(id));
        result.and(unpinned)
    }

    /// Claim a record slot for `(key, desc)` in any not-full record
    /// block, allocating a new one when every existing block is full.
    fn make_record(&mut self, key: u64, desc: &str) -> Result<RecordPtr> {
        let (block_id, block) = self.pool.get_not_full(BlockKind::Record)?;

        let slot = block
            .borrow_mut()
            .as_record_mut()
            .ok_or(Error::CorruptBlock(block_id, "expected a record block"))?
            .alloc(key, desc)
            .ok_or(Error::CorruptBlock(block_id, "full block marked not full"))?;
        self.pool.refresh_fullness(block_id)?;

        Ok(RecordPtr {
            block: block_id,
            slot,
        })
    }

    /// Put `(key, ptr)` into the target leaf, splitting it (and the
    /// ancestors the split cascades into) when full.
    fn insert_entry(
        &mut self,
        leaf_id: BlockId,
        key: u64,
        ptr: RecordPtr,
        pinned: &mut Vec<BlockId>,
    ) -> Result<()> {
        let leaf = self.pool.get(leaf_id)?;

        if !leaf.borrow().is_full() {
            leaf.borrow_mut()
                .as_leaf_mut()
                .ok_or(Error::CorruptBlock(leaf_id, "expected a leaf"))?
                .insert(key, ptr);
            self.pool.refresh_fullness(leaf_id)?;
            return Ok(());
        }

        // Split: keep the leaf resident until the whole cascade is done.
        self.pool.pin(leaf_id)?;
        pinned.push(leaf_id);

        let (right_id, right) = self.pool.alloc(BlockKind::Leaf)?;
        self.pool.pin(right_id)?;
        pinned.push(right_id);

        let separator = {
            let mut left = leaf.borrow_mut();
            let mut right = right.borrow_mut();
            let left = left
                .as_leaf_mut()
                .ok_or(Error::CorruptBlock(leaf_id, "expected a leaf"))?;
            let right = right
                .as_leaf_mut()
                .ok_or(Error::CorruptBlock(right_id, "expected a leaf"))?;
            left.insert_split(key, ptr, right)
        };
        debug!(left = %leaf_id, right = %right_id, separator, "leaf split");

        self.pool.refresh_fullness(leaf_id)?;
        self.pool.refresh_fullness(right_id)?;
        let parent = self.pool.meta().parent(leaf_id)?;
        self.pool.set_parent(right_id, parent)?;

        self.propagate_split(leaf_id, separator, right_id, pinned)
    }

    /// Carry a `(left, separator, right)` triple up the tree, splitting
    /// each full ancestor in turn, until some branch absorbs it or a new
    /// root is grown.
    fn propagate_split(
        &mut self,
        mut left_id: BlockId,
        mut separator: u64,
        mut right_id: BlockId,
        pinned: &mut Vec<BlockId>,
    ) -> Result<()> {
        loop {
            let Some(parent_id) = self.pool.meta().parent(left_id)? else {
                // Ran off the top: grow the tree by one level.
                let (root_id, root) = self.pool.alloc(BlockKind::Branch)?;
                root.borrow_mut()
                    .as_branch_mut()
                    .ok_or(Error::CorruptBlock(root_id, "expected a branch"))?
                    .insert(left_id, separator, right_id);

                self.pool.refresh_fullness(root_id)?;
                self.pool.set_parent(left_id, Some(root_id))?;
                self.pool.set_parent(right_id, Some(root_id))?;
                self.root = root_id;
                debug!(root = %root_id, "grew new root");
                return Ok(());
            };

            let parent = self.pool.get(parent_id)?;
            self.pool.pin(parent_id)?;
            pinned.push(parent_id);

            let was_full = parent.borrow().is_full();
            parent
                .borrow_mut()
                .as_branch_mut()
                .ok_or(Error::CorruptBlock(parent_id, "expected a branch"))?
                .insert(left_id, separator, right_id);
            self.pool.set_parent(right_id, Some(parent_id))?;

            if !was_full {
                self.pool.refresh_fullness(parent_id)?;
                return Ok(());
            }

            // The parent was already full and is now one key over: split
            // it and keep climbing with the promoted key.
            let (sibling_id, sibling) = self.pool.alloc(BlockKind::Branch)?;
            self.pool.pin(sibling_id)?;
            pinned.push(sibling_id);

            let (promoted, moved) = {
                let mut left = parent.borrow_mut();
                let mut right = sibling.borrow_mut();
                let left = left
                    .as_branch_mut()
                    .ok_or(Error::CorruptBlock(parent_id, "expected a branch"))?;
                let right = right
                    .as_branch_mut()
                    .ok_or(Error::CorruptBlock(sibling_id, "expected a branch"))?;
                let promoted = left.split(right);
                (promoted, right.children().to_vec())
            };
            debug!(left = %parent_id, right = %sibling_id, promoted, "branch split");

            // Children that moved to the sibling now answer to it.
            for child in moved {
                self.pool.set_parent(child, Some(sibling_id))?;
            }
            self.pool.refresh_fullness(parent_id)?;
            self.pool.refresh_fullness(sibling_id)?;
            let grandparent = self.pool.meta().parent(parent_id)?;
            self.pool.set_parent(sibling_id, grandparent)?;

            left_id = parent_id;
            separator = promoted;
            right_id = sibling_id;
        }
    }

    // ========================================================================
    // Traversal
    // ========================================================================

    /// Descend from the root to the leaf responsible for `key`.
    fn search_leaf(&mut self, key: u64) -> Result<BlockId> {
        let mut id = self.root;
        loop {
            let block = self.pool.get(id)?;
            let next = match &*block.borrow() {
                Block::Leaf(_) => return Ok(id),
                Block::Branch(branch) => branch.descend(key),
                Block::Record(_) => {
                    return Err(Error::CorruptBlock(id, "record block in tree path"))
                }
            };
            id = next;
        }
    }

    /// Every key in the tree, ascending.
    pub fn scan(&mut self) -> Result<Vec<u64>> {
        let mut keys = Vec::new();
        let mut stack = vec![self.root];

        while let Some(id) = stack.pop() {
            let block = self.pool.get(id)?;
            let block = block.borrow();
            match &*block {
                Block::Leaf(leaf) => keys.extend(leaf.entries().iter().map(|e| e.key)),
                Block::Branch(branch) => {
                    // Reverse so the leftmost child is popped first.
                    stack.extend(branch.children().iter().rev().copied());
                }
                Block::Record(_) => {
                    return Err(Error::CorruptBlock(id, "record block in tree path"))
                }
            }
        }

        Ok(keys)
    }

    /// Number of levels from the root down to the leaves (1 for a tree
    /// that is a single leaf).
    pub fn height(&mut self) -> Result<usize> {
        let mut levels = 1;
        let mut id = self.root;
        loop {
            let block = self.pool.get(id)?;
            let next = match &*block.borrow() {
                Block::Leaf(_) => return Ok(levels),
                Block::Branch(branch) => branch
                    .children()
                    .first()
                    .copied()
                    .ok_or(Error::CorruptBlock(id, "branch without children"))?,
                Block::Record(_) => {
                    return Err(Error::CorruptBlock(id, "record block in tree path"))
                }
            };
            id = next;
            levels += 1;
        }
    }

    // ========================================================================
    // Snapshots and introspection
    // ========================================================================

    /// Capture the engine state needed to reopen this tree later.
    pub fn export_snapshot(&self) -> Snapshot {
        Snapshot {
            descriptors: self.pool.meta().descriptors(),
            root: self.root,
        }
    }

    /// Replace the engine state wholesale from `snapshot`. Resident
    /// frames are discarded; the data file is expected to match.
    pub fn import_snapshot(&mut self, snapshot: Snapshot) -> Result<()> {
        snapshot.validate()?;
        self.pool.restore_meta(snapshot.descriptors)?;
        self.root = snapshot.root;
        Ok(())
    }

    /// The current root block number.
    #[inline]
    pub fn root(&self) -> BlockId {
        self.root
    }

    /// The buffer pool's performance counters.
    pub fn pool_stats(&self) -> PoolStats {
        self.pool.stats()
    }

    // ========================================================================
    // Internal helpers
    // ========================================================================

    /// Binary-search `key` in a leaf, returning its record pointer.
    fn leaf_find(&mut self, leaf_id: BlockId, key: u64) -> Result<Option<RecordPtr>> {
        let block = self.pool.get(leaf_id)?;
        let block = block.borrow();
        let leaf = block
            .as_leaf()
            .ok_or(Error::CorruptBlock(leaf_id, "expected a leaf"))?;
        Ok(leaf.find(key).map(|entry| entry.ptr))
    }

    /// Resolve a record pointer, checking that the slot is live and
    /// actually holds `key`.
    fn read_record(&mut self, key: u64, ptr: RecordPtr) -> Result<Record> {
        let block = self.pool.get(ptr.block)?;
        let block = block.borrow();
        let records = block
            .as_record()
            .ok_or(Error::CorruptBlock(ptr.block, "pointer into non-record block"))?;
        let record = records
            .record(ptr.slot)
            .ok_or(Error::CorruptBlock(ptr.block, "pointer at free record slot"))?;

        if record.key != key {
            return Err(Error::CorruptBlock(ptr.block, "record key mismatch"));
        }
        Ok(record.clone())
    }
}
