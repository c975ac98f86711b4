//! Block descriptors - per-block metadata.

use crate::common::BlockId;

/// The kind of content a block holds.
///
/// Uses `#[repr(u8)]` to guarantee a 1-byte representation, should a
/// snapshot collaborator choose to serialize descriptors byte-wise.
#[repr(u8)]
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// Never allocated.
    #[default]
    Unused = 0,
    /// B+Tree leaf: sorted `(key, record pointer)` entries.
    Leaf = 1,
    /// B+Tree branch: separator keys plus child block numbers.
    Branch = 2,
    /// Record storage: fixed 64-byte record slots.
    Record = 3,
}

/// Metadata for one block slot.
///
/// Descriptors are created by [`MetaTable::allocate`](super::MetaTable::allocate)
/// and never deleted - block reclamation is a non-goal. The `parent` link
/// is an index-based back-reference resolved through the buffer pool on
/// demand, never an owning reference, so eviction cannot dangle it.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BlockDescriptor {
    /// What the block holds, or Unused.
    pub kind: BlockKind,
    /// True when the block has no spare capacity for another entry.
    pub full: bool,
    /// The branch block this block hangs under; None for the root (and
    /// for record blocks, which live outside the tree).
    pub parent: Option<BlockId>,
}

impl BlockDescriptor {
    /// A freshly allocated descriptor of the given kind.
    pub fn new(kind: BlockKind) -> Self {
        Self {
            kind,
            full: false,
            parent: None,
        }
    }

    /// Whether this slot has ever been allocated.
    #[inline]
    pub fn is_used(&self) -> bool {
        self.kind != BlockKind::Unused
    }
}
