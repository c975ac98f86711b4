//! Leaf blocks - sorted `(key, record pointer)` entries.

use crate::common::config::{BLOCK_SIZE, LEAF_CAPACITY, LEAF_SLOT_SIZE};
use crate::common::{BlockId, Error, Result};

/// Where a record lives: its record block plus the slot within it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RecordPtr {
    /// The record block holding the record.
    pub block: BlockId,
    /// Slot offset within that block, `0..RECORD_CAPACITY`.
    pub slot: u16,
}

/// One leaf entry: a key and where its record lives.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LeafEntry {
    pub key: u64,
    pub ptr: RecordPtr,
}

/// A leaf block: up to 330 entries, kept ascending and key-unique.
///
/// # On-disk layout
/// 330 fixed 12-byte slots:
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       8     key (little-endian; 0 = empty slot)
/// 8       2     record block number
/// 10      2     record slot offset
/// ```
/// Flush writes occupied entries in ascending order from slot 0; load
/// re-inserts every non-empty slot in key order and discards the rest.
#[derive(Debug, Default)]
pub struct LeafBlock {
    entries: Vec<LeafEntry>,
}

impl LeafBlock {
    /// Create an empty leaf.
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
        }
    }

    /// Number of live entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// A leaf is full when it holds `LEAF_CAPACITY` entries.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.entries.len() == LEAF_CAPACITY
    }

    /// The entries, ascending by key.
    #[inline]
    pub fn entries(&self) -> &[LeafEntry] {
        &self.entries
    }

    /// Exact-match search.
    pub fn find(&self, key: u64) -> Option<&LeafEntry> {
        self.entries
            .binary_search_by_key(&key, |e| e.key)
            .ok()
            .map(|pos| &self.entries[pos])
    }

    /// Insert `(key, ptr)` at its sorted position. The leaf must not be
    /// full and the key must not be present; the engine checks both.
    pub fn insert(&mut self, key: u64, ptr: RecordPtr) {
        debug_assert!(!self.is_full(), "insert into a full leaf");

        let pos = self.entries.partition_point(|e| e.key <= key);
        debug_assert!(pos == 0 || self.entries[pos - 1].key != key);
        self.entries.insert(pos, LeafEntry { key, ptr });
    }

    /// Merge `(key, ptr)` into this full leaf, then move the upper half of
    /// the entries into `right`. Returns the separator: the first key now
    /// in `right`.
    pub fn insert_split(&mut self, key: u64, ptr: RecordPtr, right: &mut LeafBlock) -> u64 {
        debug_assert!(self.is_full(), "splitting a leaf that isn't full");
        debug_assert!(right.is_empty());

        let pos = self.entries.partition_point(|e| e.key <= key);
        self.entries.insert(pos, LeafEntry { key, ptr });

        let mid = self.entries.len() / 2;
        right.entries = self.entries.split_off(mid);

        right.entries[0].key
    }

    /// Serialize into a zeroed block buffer.
    pub fn serialize(&self, buf: &mut [u8; BLOCK_SIZE]) {
        for (i, entry) in self.entries.iter().enumerate() {
            let off = i * LEAF_SLOT_SIZE;
            buf[off..off + 8].copy_from_slice(&entry.key.to_le_bytes());
            buf[off + 8..off + 10].copy_from_slice(&entry.ptr.block.0.to_le_bytes());
            buf[off + 10..off + 12].copy_from_slice(&entry.ptr.slot.to_le_bytes());
        }
    }

    /// Rebuild from a block read off disk.
    ///
    /// # Errors
    /// `Error::CorruptBlock` on a duplicate key.
    pub fn load(id: BlockId, buf: &[u8; BLOCK_SIZE]) -> Result<Self> {
        let mut leaf = Self::new();

        for slot in 0..LEAF_CAPACITY {
            let off = slot * LEAF_SLOT_SIZE;
            let key = u64::from_le_bytes(buf[off..off + 8].try_into().unwrap());
            if key == 0 {
                continue; // empty slot
            }

            let block = u16::from_le_bytes(buf[off + 8..off + 10].try_into().unwrap());
            let slot_off = u16::from_le_bytes(buf[off + 10..off + 12].try_into().unwrap());
            let ptr = RecordPtr {
                block: BlockId::new(block),
                slot: slot_off,
            };

            // Slots are written in ascending order; re-insert at the key's
            // sorted position so a shuffled-but-valid block still loads.
            match leaf.entries.binary_search_by_key(&key, |e| e.key) {
                Ok(_) => return Err(Error::CorruptBlock(id, "duplicate leaf key")),
                Err(pos) => leaf.entries.insert(pos, LeafEntry { key, ptr }),
            }
        }

        Ok(leaf)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ptr(block: u16, slot: u16) -> RecordPtr {
        RecordPtr {
            block: BlockId::new(block),
            slot,
        }
    }

    #[test]
    fn test_insert_keeps_order() {
        let mut leaf = LeafBlock::new();
        leaf.insert(30, ptr(1, 0));
        leaf.insert(10, ptr(1, 1));
        leaf.insert(20, ptr(1, 2));

        let keys: Vec<u64> = leaf.entries().iter().map(|e| e.key).collect();
        assert_eq!(keys, vec![10, 20, 30]);
    }

    #[test]
    fn test_find() {
        let mut leaf = LeafBlock::new();
        leaf.insert(5, ptr(2, 7));

        assert_eq!(leaf.find(5).unwrap().ptr, ptr(2, 7));
        assert!(leaf.find(6).is_none());
    }

    #[test]
    fn test_fullness_boundary() {
        let mut leaf = LeafBlock::new();
        for k in 1..=LEAF_CAPACITY as u64 {
            assert!(!leaf.is_full());
            leaf.insert(k, ptr(1, 0));
        }
        assert!(leaf.is_full());
    }

    #[test]
    fn test_insert_split_preserves_entry_count() {
        let mut leaf = LeafBlock::new();
        for k in 1..=LEAF_CAPACITY as u64 {
            leaf.insert(k * 2, ptr(1, 0));
        }

        let before = leaf.len();
        let mut right = LeafBlock::new();
        let sep = leaf.insert_split(7, ptr(1, 1), &mut right);

        assert_eq!(leaf.len() + right.len(), before + 1);
        assert!(!leaf.is_full());
        assert!(!right.is_full());
        // Separator is the right sibling's first key, and everything in
        // the left half is strictly below it.
        assert_eq!(sep, right.entries()[0].key);
        assert!(leaf.entries().last().unwrap().key < sep);
    }

    #[test]
    fn test_serialize_load_round_trip() {
        let mut leaf = LeafBlock::new();
        leaf.insert(100, ptr(3, 9));
        leaf.insert(7, ptr(2, 0));
        leaf.insert(u64::MAX, ptr(1, 63));

        let mut buf = [0u8; BLOCK_SIZE];
        leaf.serialize(&mut buf);

        let loaded = LeafBlock::load(BlockId::new(0), &buf).unwrap();
        assert_eq!(loaded.entries(), leaf.entries());
    }

    #[test]
    fn test_load_skips_empty_slots() {
        let buf = [0u8; BLOCK_SIZE];
        let leaf = LeafBlock::load(BlockId::new(0), &buf).unwrap();
        assert!(leaf.is_empty());
    }

    #[test]
    fn test_load_rejects_duplicate_keys() {
        let mut leaf = LeafBlock::new();
        leaf.insert(9, ptr(1, 0));
        let mut buf = [0u8; BLOCK_SIZE];
        leaf.serialize(&mut buf);
        // Duplicate the first slot into the second.
        let (first, rest) = buf.split_at_mut(LEAF_SLOT_SIZE);
        rest[..LEAF_SLOT_SIZE].copy_from_slice(first);

        assert!(matches!(
            LeafBlock::load(BlockId::new(0), &buf),
            Err(Error::CorruptBlock(_, _))
        ));
    }
}
