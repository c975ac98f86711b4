//! Record blocks - fixed 64-byte record slots.

use crate::common::config::{BLOCK_SIZE, DESC_SIZE, RECORD_CAPACITY, RECORD_SLOT_SIZE};
use crate::common::{BlockId, Result};

/// A stored record: the key and its description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// The record's key; never 0 (that's the free-slot sentinel).
    pub key: u64,
    /// Description text, at most [`DESC_SIZE`] bytes.
    pub desc: String,
}

/// Clamp a description to the largest char boundary within the wire slot.
///
/// The 56-byte slot admits nothing longer; anything past it is dropped.
pub fn clamp_desc(desc: &str) -> &str {
    if desc.len() <= DESC_SIZE {
        return desc;
    }
    let mut end = DESC_SIZE;
    while !desc.is_char_boundary(end) {
        end -= 1;
    }
    &desc[..end]
}

/// A record block: 64 slots, each free (key 0) or holding one record.
///
/// # On-disk layout
/// 64 fixed 64-byte slots:
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       8     key (little-endian; 0 = free slot)
/// 8       56    description, NUL-padded
/// ```
#[derive(Debug)]
pub struct RecordBlock {
    slots: Vec<Option<Record>>,
}

impl RecordBlock {
    /// Create a record block with every slot free.
    pub fn new() -> Self {
        Self {
            slots: vec![None; RECORD_CAPACITY],
        }
    }

    /// A record block is full when no slot is free.
    pub fn is_full(&self) -> bool {
        self.slots.iter().all(|s| s.is_some())
    }

    /// Claim the first free slot for `(key, desc)`, returning its offset.
    /// None when the block is full; the engine's metadata probe should
    /// have prevented that.
    pub fn alloc(&mut self, key: u64, desc: &str) -> Option<u16> {
        debug_assert_ne!(key, 0, "key 0 is the free-slot sentinel");

        let slot = self.slots.iter().position(|s| s.is_none())?;
        self.slots[slot] = Some(Record {
            key,
            desc: clamp_desc(desc).to_owned(),
        });

        Some(slot as u16)
    }

    /// The record at `slot`, if the slot is live.
    pub fn record(&self, slot: u16) -> Option<&Record> {
        self.slots.get(slot as usize)?.as_ref()
    }

    /// Overwrite the description at `slot` in place; the key is untouched.
    /// Returns false if the slot is free.
    pub fn set_desc(&mut self, slot: u16, desc: &str) -> bool {
        match self.slots.get_mut(slot as usize) {
            Some(Some(record)) => {
                record.desc = clamp_desc(desc).to_owned();
                true
            }
            _ => false,
        }
    }

    /// Serialize into a zeroed block buffer. Free slots stay zeroed.
    pub fn serialize(&self, buf: &mut [u8; BLOCK_SIZE]) {
        for (i, slot) in self.slots.iter().enumerate() {
            if let Some(record) = slot {
                let off = i * RECORD_SLOT_SIZE;
                buf[off..off + 8].copy_from_slice(&record.key.to_le_bytes());
                let bytes = record.desc.as_bytes();
                buf[off + 8..off + 8 + bytes.len()].copy_from_slice(bytes);
            }
        }
    }

    /// Rebuild from a block read off disk, trimming the NUL padding.
    pub fn load(_id: BlockId, buf: &[u8; BLOCK_SIZE]) -> Result<Self> {
        let mut block = Self::new();

        for slot in 0..RECORD_CAPACITY {
            let off = slot * RECORD_SLOT_SIZE;
            let key = u64::from_le_bytes(buf[off..off + 8].try_into().unwrap());
            if key == 0 {
                continue; // free slot
            }

            let raw = &buf[off + 8..off + 8 + DESC_SIZE];
            let end = raw.iter().rposition(|&b| b != 0).map_or(0, |p| p + 1);
            let desc = String::from_utf8_lossy(&raw[..end]).into_owned();

            block.slots[slot] = Some(Record { key, desc });
        }

        Ok(block)
    }
}

impl Default for RecordBlock {
    fn default() -> Self {
        Self::new()
    }
}
