//! The metadata table itself.

use crate::common::config::BLOCK_COUNT;
use crate::common::{BlockId, Error, Result};
use crate::meta::{BlockDescriptor, BlockKind};

/// Fixed-size table of one [`BlockDescriptor`] per block slot.
///
/// All mutation of descriptor state goes through this type. Operations on
/// an Unused descriptor (other than allocation and `kind`) fail with
/// [`Error::InvalidBlock`].
#[derive(Debug)]
pub struct MetaTable {
    descriptors: Vec<BlockDescriptor>,

    /// Index below which every descriptor is known to be used. Blocks are
    /// never reclaimed, so the first Unused descriptor only moves forward
    /// and the cursor stays exact.
    next_unused: usize,
}

impl MetaTable {
    /// Create a table with every descriptor Unused.
    pub fn new() -> Self {
        Self {
            descriptors: vec![BlockDescriptor::default(); BLOCK_COUNT],
            next_unused: 0,
        }
    }

    /// Allocate the first Unused descriptor as `kind`.
    ///
    /// The new descriptor starts not-full with no parent.
    ///
    /// # Errors
    /// `Error::OutOfBlocks` when every descriptor is in use.
    pub fn allocate(&mut self, kind: BlockKind) -> Result<BlockId> {
        debug_assert_ne!(kind, BlockKind::Unused, "allocating an Unused block");

        if self.next_unused >= BLOCK_COUNT {
            return Err(Error::OutOfBlocks);
        }

        let index = self.next_unused;
        self.descriptors[index] = BlockDescriptor::new(kind);
        self.next_unused += 1;

        Ok(BlockId::new(index as u16))
    }

    /// First block of `kind` that is not full, if any.
    pub fn find_not_full(&self, kind: BlockKind) -> Option<BlockId> {
        self.descriptors[..self.next_unused]
            .iter()
            .position(|d| d.kind == kind && !d.full)
            .map(|index| BlockId::new(index as u16))
    }

    /// The kind recorded for `id` (Unused if never allocated or out of
    /// range -- block numbers above `BLOCK_COUNT` can arrive through a
    /// corrupt on-disk pointer).
    #[inline]
    pub fn kind(&self, id: BlockId) -> BlockKind {
        self.descriptors
            .get(id.index())
            .map_or(BlockKind::Unused, |d| d.kind)
    }

    /// Whether `id` is recorded as full.
    pub fn is_full(&self, id: BlockId) -> Result<bool> {
        Ok(self.used(id)?.full)
    }

    /// Record `id`'s fullness.
    pub fn set_fullness(&mut self, id: BlockId, full: bool) -> Result<()> {
        self.used_mut(id)?.full = full;
        Ok(())
    }

    /// The parent branch of `id`, or None for the root.
    pub fn parent(&self, id: BlockId) -> Result<Option<BlockId>> {
        Ok(self.used(id)?.parent)
    }

    /// Record `id`'s parent branch.
    pub fn set_parent(&mut self, id: BlockId, parent: Option<BlockId>) -> Result<()> {
        self.used_mut(id)?.parent = parent;
        Ok(())
    }

    /// Snapshot view of every descriptor, in block order.
    pub fn descriptors(&self) -> Vec<BlockDescriptor> {
        self.descriptors.clone()
    }

    /// Replace the whole table from a snapshot.
    ///
    /// # Errors
    /// `Error::BadSnapshot` if the descriptor count is wrong.
    pub fn restore(&mut self, descriptors: Vec<BlockDescriptor>) -> Result<()> {
        if descriptors.len() != BLOCK_COUNT {
            return Err(Error::BadSnapshot("wrong descriptor count"));
        }

        self.next_unused = descriptors
            .iter()
            .position(|d| !d.is_used())
            .unwrap_or(BLOCK_COUNT);
        self.descriptors = descriptors;

        Ok(())
    }

    fn used(&self, id: BlockId) -> Result<&BlockDescriptor> {
        match self.descriptors.get(id.index()) {
            Some(d) if d.is_used() => Ok(d),
            _ => Err(Error::InvalidBlock(id)),
        }
    }

    fn used_mut(&mut self, id: BlockId) -> Result<&mut BlockDescriptor> {
        match self.descriptors.get_mut(id.index()) {
            Some(d) if d.is_used() => Ok(d),
            _ => Err(Error::InvalidBlock(id)),
        }
    }
}

impl Default for MetaTable {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_allocate_first_unused() {
        let mut table = MetaTable::new();

        assert_eq!(table.allocate(BlockKind::Leaf).unwrap(), BlockId::new(0));
        assert_eq!(table.allocate(BlockKind::Record).unwrap(), BlockId::new(1));
        assert_eq!(table.allocate(BlockKind::Branch).unwrap(), BlockId::new(2));

        assert_eq!(table.kind(BlockId::new(0)), BlockKind::Leaf);
        assert_eq!(table.kind(BlockId::new(1)), BlockKind::Record);
        assert_eq!(table.kind(BlockId::new(2)), BlockKind::Branch);
        assert_eq!(table.kind(BlockId::new(3)), BlockKind::Unused);
    }

    #[test]
    fn test_allocate_starts_not_full_orphan() {
        let mut table = MetaTable::new();
        let id = table.allocate(BlockKind::Leaf).unwrap();

        assert!(!table.is_full(id).unwrap());
        assert_eq!(table.parent(id).unwrap(), None);
    }

    #[test]
    fn test_allocate_exhaustion() {
        let mut table = MetaTable::new();
        for _ in 0..BLOCK_COUNT {
            table.allocate(BlockKind::Record).unwrap();
        }

        assert!(matches!(
            table.allocate(BlockKind::Record),
            Err(Error::OutOfBlocks)
        ));
    }

    #[test]
    fn test_find_not_full() {
        let mut table = MetaTable::new();
        let a = table.allocate(BlockKind::Record).unwrap();
        let b = table.allocate(BlockKind::Record).unwrap();
        table.allocate(BlockKind::Leaf).unwrap();

        // First-fit on kind.
        assert_eq!(table.find_not_full(BlockKind::Record), Some(a));

        table.set_fullness(a, true).unwrap();
        assert_eq!(table.find_not_full(BlockKind::Record), Some(b));

        table.set_fullness(b, true).unwrap();
        assert_eq!(table.find_not_full(BlockKind::Record), None);

        assert_eq!(table.find_not_full(BlockKind::Branch), None);
    }

    #[test]
    fn test_ops_on_unused_fail() {
        let mut table = MetaTable::new();
        let id = BlockId::new(99);

        assert!(matches!(table.is_full(id), Err(Error::InvalidBlock(_))));
        assert!(matches!(
            table.set_fullness(id, true),
            Err(Error::InvalidBlock(_))
        ));
        assert!(matches!(table.parent(id), Err(Error::InvalidBlock(_))));
        assert!(matches!(
            table.set_parent(id, None),
            Err(Error::InvalidBlock(_))
        ));
    }

    #[test]
    fn test_out_of_range_id_is_invalid_not_a_panic() {
        let mut table = MetaTable::new();
        let id = BlockId::new(9000); // beyond BLOCK_COUNT

        assert_eq!(table.kind(id), BlockKind::Unused);
        assert!(matches!(table.is_full(id), Err(Error::InvalidBlock(_))));
        assert!(matches!(
            table.set_fullness(id, true),
            Err(Error::InvalidBlock(_))
        ));
        assert!(matches!(table.parent(id), Err(Error::InvalidBlock(_))));
        assert!(matches!(
            table.set_parent(id, None),
            Err(Error::InvalidBlock(_))
        ));
    }

    #[test]
    fn test_parent_link() {
        let mut table = MetaTable::new();
        let leaf = table.allocate(BlockKind::Leaf).unwrap();
        let branch = table.allocate(BlockKind::Branch).unwrap();

        table.set_parent(leaf, Some(branch)).unwrap();
        assert_eq!(table.parent(leaf).unwrap(), Some(branch));

        table.set_parent(leaf, None).unwrap();
        assert_eq!(table.parent(leaf).unwrap(), None);
    }

    #[test]
    fn test_restore_round_trip() {
        let mut table = MetaTable::new();
        let a = table.allocate(BlockKind::Leaf).unwrap();
        table.allocate(BlockKind::Record).unwrap();
        table.set_fullness(a, true).unwrap();

        let snapshot = table.descriptors();

        let mut restored = MetaTable::new();
        restored.restore(snapshot).unwrap();

        assert_eq!(restored.kind(a), BlockKind::Leaf);
        assert!(restored.is_full(a).unwrap());
        // Allocation resumes after the restored blocks.
        assert_eq!(
            restored.allocate(BlockKind::Branch).unwrap(),
            BlockId::new(2)
        );
    }

    #[test]
    fn test_restore_rejects_wrong_count() {
        let mut table = MetaTable::new();
        assert!(matches!(
            table.restore(vec![BlockDescriptor::default(); 3]),
            Err(Error::BadSnapshot(_))
        ));
    }
}
