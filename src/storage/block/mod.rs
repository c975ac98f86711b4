//! Block variants and their binary codecs.
//!
//! Blocks form a closed tagged union over [`LeafBlock`], [`BranchBlock`]
//! and [`RecordBlock`], dispatched by the metadata table's
//! [`BlockKind`](crate::meta::BlockKind) when a block is wired into the
//! buffer pool. Each variant serializes into exactly one 4096-byte block:
//! flush zeroes the buffer and writes only occupied slots in ascending
//! order; load reads all 4096 bytes and discards free-sentinel slots.

mod branch;
mod leaf;
mod record;

pub use branch::BranchBlock;
pub use leaf::{LeafBlock, LeafEntry, RecordPtr};
pub use record::{clamp_desc, Record, RecordBlock};

use crate::common::config::BLOCK_SIZE;
use crate::common::{BlockId, Result};
use crate::meta::BlockKind;

/// An in-memory, deserialized block.
#[derive(Debug)]
pub enum Block {
    Leaf(LeafBlock),
    Branch(BranchBlock),
    Record(RecordBlock),
}

impl Block {
    /// A freshly allocated block of `kind`, with empty content.
    ///
    /// # Panics
    /// `kind` must not be Unused; the pool checks the metadata table
    /// before constructing a variant.
    pub fn empty(kind: BlockKind) -> Block {
        match kind {
            BlockKind::Leaf => Block::Leaf(LeafBlock::new()),
            BlockKind::Branch => Block::Branch(BranchBlock::new()),
            BlockKind::Record => Block::Record(RecordBlock::new()),
            BlockKind::Unused => unreachable!("pool rejects Unused before construction"),
        }
    }

    /// Deserialize a block of `kind` from its on-disk bytes.
    pub fn load(kind: BlockKind, id: BlockId, buf: &[u8; BLOCK_SIZE]) -> Result<Block> {
        Ok(match kind {
            BlockKind::Leaf => Block::Leaf(LeafBlock::load(id, buf)?),
            BlockKind::Branch => Block::Branch(BranchBlock::load(id, buf)?),
            BlockKind::Record => Block::Record(RecordBlock::load(id, buf)?),
            BlockKind::Unused => unreachable!("pool rejects Unused before construction"),
        })
    }

    /// Serialize into a zeroed block buffer.
    pub fn serialize(&self, buf: &mut [u8; BLOCK_SIZE]) {
        match self {
            Block::Leaf(leaf) => leaf.serialize(buf),
            Block::Branch(branch) => branch.serialize(buf),
            Block::Record(record) => record.serialize(buf),
        }
    }

    /// Whether the block has no spare capacity for another entry.
    pub fn is_full(&self) -> bool {
        match self {
            Block::Leaf(leaf) => leaf.is_full(),
            Block::Branch(branch) => branch.is_full(),
            Block::Record(record) => record.is_full(),
        }
    }

    /// This block's kind tag.
    pub fn kind(&self) -> BlockKind {
        match self {
            Block::Leaf(_) => BlockKind::Leaf,
            Block::Branch(_) => BlockKind::Branch,
            Block::Record(_) => BlockKind::Record,
        }
    }

    pub fn as_leaf(&self) -> Option<&LeafBlock> {
        match self {
            Block::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }

    pub fn as_leaf_mut(&mut self) -> Option<&mut LeafBlock> {
        match self {
            Block::Leaf(leaf) => Some(leaf),
            _ => None,
        }
    }

    pub fn as_branch(&self) -> Option<&BranchBlock> {
        match self {
            Block::Branch(branch) => Some(branch),
            _ => None,
        }
    }

    pub fn as_branch_mut(&mut self) -> Option<&mut BranchBlock> {
        match self {
            Block::Branch(branch) => Some(branch),
            _ => None,
        }
    }

    pub fn as_record(&self) -> Option<&RecordBlock> {
        match self {
            Block::Record(record) => Some(record),
            _ => None,
        }
    }

    pub fn as_record_mut(&mut self) -> Option<&mut RecordBlock> {
        match self {
            Block::Record(record) => Some(record),
            _ => None,
        }
    }
}
