//! Branch blocks - separator keys over child block numbers.

use crate::common::config::{BLOCK_SIZE, BRANCH_CAPACITY, BRANCH_SLOT_SIZE};
use crate::common::{BlockId, Error, Result};

/// A branch block: ascending separator keys plus one more child than keys.
///
/// Separator semantics: every key under `children[i]` is `< keys[i]`, and
/// every key under the last child is `>= keys.last()`. Descending for key
/// `x` picks `children[pos]` where `pos` is the count of keys `<= x`; the
/// split code places the promoted key with the same rule, so a key equal
/// to a separator always lives in the right subtree.
///
/// # On-disk layout
/// Up to 341 fixed 12-byte slots, one per live key:
/// ```text
/// Offset  Size  Field
/// ------  ----  -----
/// 0       8     separator key (little-endian; 0 = empty slot)
/// 8       2     left child block number  (children[i])
/// 10      2     right child block number (children[i+1])
/// ```
/// Consecutive slots share a child: slot i's right pointer equals slot
/// i+1's left pointer. Load merges the pairs back into the deduplicated
/// children list and rejects a broken chain as corruption.
#[derive(Debug, Default)]
pub struct BranchBlock {
    keys: Vec<u64>,
    children: Vec<BlockId>,
}

impl BranchBlock {
    /// Create an empty branch (no keys, no children yet).
    pub fn new() -> Self {
        Self {
            keys: Vec::new(),
            children: Vec::new(),
        }
    }

    /// Number of separator keys.
    #[inline]
    pub fn len(&self) -> usize {
        self.keys.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.keys.is_empty()
    }

    /// A branch is full when it holds `BRANCH_CAPACITY` keys.
    #[inline]
    pub fn is_full(&self) -> bool {
        self.keys.len() >= BRANCH_CAPACITY
    }

    /// The separator keys, ascending.
    #[inline]
    pub fn keys(&self) -> &[u64] {
        &self.keys
    }

    /// The child block numbers, one more than there are keys.
    #[inline]
    pub fn children(&self) -> &[BlockId] {
        &self.children
    }

    /// The child to descend into for `key`: `children[count of keys <= key]`.
    pub fn descend(&self, key: u64) -> BlockId {
        let pos = self.keys.partition_point(|&k| k <= key);
        self.children[pos]
    }

    /// Merge the `(left, key, right)` triple from a child split into this
    /// branch. `left` is the already-linked child that split; `right` is
    /// its new sibling, inserted just after it.
    ///
    /// The caller checks fullness first; during a branch split the triple
    /// is merged into an already-full branch, transiently exceeding
    /// capacity, and [`split`](Self::split) is applied immediately after.
    pub fn insert(&mut self, left: BlockId, key: u64, right: BlockId) {
        let pos = self.keys.partition_point(|&k| k <= key);
        self.keys.insert(pos, key);

        if self.children.is_empty() {
            // First key of a fresh branch (new root): both children arrive.
            self.children.push(left);
            self.children.push(right);
        } else {
            debug_assert_eq!(self.children[pos], left, "triple does not match child slot");
            self.children.insert(pos + 1, right);
        }
    }

    /// Move the upper half of an overfull branch into `right`, promoting
    /// the middle key. The promoted key leaves this branch and belongs one
    /// level up; returns it.
    pub fn split(&mut self, right: &mut BranchBlock) -> u64 {
        debug_assert!(self.keys.len() > BRANCH_CAPACITY, "splitting a branch that isn't overfull");
        debug_assert!(right.is_empty());

        let mid = self.keys.len() / 2;
        right.keys = self.keys.split_off(mid + 1);
        right.children = self.children.split_off(mid + 1);
        let promoted = self.keys.pop().expect("overfull branch has a middle key");

        debug_assert_eq!(self.children.len(), self.keys.len() + 1);
        debug_assert_eq!(right.children.len(), right.keys.len() + 1);

        promoted
    }

    /// Serialize into a zeroed block buffer.
    pub fn serialize(&self, buf: &mut [u8; BLOCK_SIZE]) {
        debug_assert!(self.keys.len() <= BRANCH_CAPACITY);

        for (i, &key) in self.keys.iter().enumerate() {
            let off = i * BRANCH_SLOT_SIZE;
            buf[off..off + 8].copy_from_slice(&key.to_le_bytes());
            buf[off + 8..off + 10].copy_from_slice(&self.children[i].0.to_le_bytes());
            buf[off + 10..off + 12].copy_from_slice(&self.children[i + 1].0.to_le_bytes());
        }
    }

    /// Rebuild from a block read off disk, merging each slot's left
    /// pointer with the previous slot's right pointer.
    ///
    /// # Errors
    /// `Error::CorruptBlock` when keys are out of order or the shared
    /// child chain doesn't line up.
    pub fn load(id: BlockId, buf: &[u8; BLOCK_SIZE]) -> Result<Self> {
        let mut branch = Self::new();

        for slot in 0..BRANCH_CAPACITY {
            let off = slot * BRANCH_SLOT_SIZE;
            let key = u64::from_le_bytes(buf[off..off + 8].try_into().unwrap());
            if key == 0 {
                continue; // empty slot
            }

            let left = BlockId::new(u16::from_le_bytes(buf[off + 8..off + 10].try_into().unwrap()));
            let right =
                BlockId::new(u16::from_le_bytes(buf[off + 10..off + 12].try_into().unwrap()));

            if let Some(&last) = branch.keys.last() {
                if key <= last {
                    return Err(Error::CorruptBlock(id, "branch keys out of order"));
                }
            }

            match branch.children.last() {
                None => branch.children.push(left),
                Some(&prev_right) if prev_right == left => {}
                Some(_) => return Err(Error::CorruptBlock(id, "branch child chain broken")),
            }

            branch.keys.push(key);
            branch.children.push(right);
        }

        if !branch.keys.is_empty() && branch.children.len() != branch.keys.len() + 1 {
            return Err(Error::CorruptBlock(id, "branch children count mismatch"));
        }

        Ok(branch)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn b(id: u16) -> BlockId {
        BlockId::new(id)
    }

    /// A branch over children 10..=13 with separators 100, 200, 300.
    fn sample_branch() -> BranchBlock {
        let mut branch = BranchBlock::new();
        branch.insert(b(10), 200, b(12));
        branch.insert(b(10), 100, b(11));
        branch.insert(b(12), 300, b(13));
        branch
    }

    #[test]
    fn test_insert_maintains_invariant() {
        let branch = sample_branch();
        assert_eq!(branch.keys(), &[100, 200, 300]);
        assert_eq!(branch.children(), &[b(10), b(11), b(12), b(13)]);
        assert_eq!(branch.children().len(), branch.len() + 1);
    }

    #[test]
    fn test_descend_rule() {
        let branch = sample_branch();

        assert_eq!(branch.descend(50), b(10));
        // A key equal to a separator goes right of it.
        assert_eq!(branch.descend(100), b(11));
        assert_eq!(branch.descend(150), b(11));
        assert_eq!(branch.descend(300), b(13));
        assert_eq!(branch.descend(u64::MAX), b(13));
    }

    #[test]
    fn test_split_promotes_middle_key() {
        let mut branch = BranchBlock::new();
        branch.insert(b(0), 10, b(1));
        for i in 1..=BRANCH_CAPACITY as u64 {
            // Append at the high end: child i splits off child i+1.
            branch.insert(b(i as u16), (i + 1) * 10, b(i as u16 + 1));
        }
        // One past capacity, as in mid-propagation.
        assert_eq!(branch.len(), BRANCH_CAPACITY + 1);

        let before_keys = branch.len();
        let mut right = BranchBlock::new();
        let promoted = branch.split(&mut right);

        // Every key is either kept, moved, or promoted.
        assert_eq!(branch.len() + right.len() + 1, before_keys);
        assert_eq!(branch.children().len(), branch.len() + 1);
        assert_eq!(right.children().len(), right.len() + 1);
        assert!(branch.keys().last().unwrap() < &promoted);
        assert!(right.keys().first().unwrap() > &promoted);
        assert!(!branch.is_full());
        assert!(!right.is_full());
    }

    #[test]
    fn test_serialize_load_round_trip() {
        let branch = sample_branch();

        let mut buf = [0u8; BLOCK_SIZE];
        branch.serialize(&mut buf);

        let loaded = BranchBlock::load(BlockId::new(0), &buf).unwrap();
        assert_eq!(loaded.keys(), branch.keys());
        assert_eq!(loaded.children(), branch.children());
    }

    #[test]
    fn test_load_empty_block() {
        let buf = [0u8; BLOCK_SIZE];
        let branch = BranchBlock::load(BlockId::new(0), &buf).unwrap();
        assert!(branch.is_empty());
        assert!(branch.children().is_empty());
    }

    #[test]
    fn test_load_rejects_broken_child_chain() {
        let branch = sample_branch();
        let mut buf = [0u8; BLOCK_SIZE];
        branch.serialize(&mut buf);

        // Corrupt slot 1's left child so it no longer matches slot 0's right.
        let off = BRANCH_SLOT_SIZE + 8;
        buf[off..off + 2].copy_from_slice(&99u16.to_le_bytes());

        assert!(matches!(
            BranchBlock::load(BlockId::new(0), &buf),
            Err(Error::CorruptBlock(_, "branch child chain broken"))
        ));
    }

    #[test]
    fn test_load_rejects_out_of_order_keys() {
        let branch = sample_branch();
        let mut buf = [0u8; BLOCK_SIZE];
        branch.serialize(&mut buf);

        // Overwrite slot 1's key with something below slot 0's.
        buf[BRANCH_SLOT_SIZE..BRANCH_SLOT_SIZE + 8].copy_from_slice(&5u64.to_le_bytes());

        assert!(matches!(
            BranchBlock::load(BlockId::new(0), &buf),
            Err(Error::CorruptBlock(_, "branch keys out of order"))
        ));
    }
}
