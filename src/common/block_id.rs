//! Block identifier type.

use std::fmt;

/// Identifies a block in the data file.
///
/// Using `u16` because block numbers range over `0..8192` and are stored
/// in 2-byte fields inside leaf and branch slots, so the in-memory type
/// matches the wire type.
///
/// # Example
/// ```
/// use blocktree::BlockId;
///
/// let id = BlockId::new(42);
/// assert_eq!(id.0, 42);
/// assert_eq!(id.index(), 42usize);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BlockId(pub u16);

impl BlockId {
    /// Create a new BlockId.
    #[inline]
    pub fn new(id: u16) -> Self {
        BlockId(id)
    }

    /// The block number as a table/array index.
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// Byte offset of this block in the data file.
    #[inline]
    pub fn file_offset(self) -> u64 {
        self.0 as u64 * crate::common::config::BLOCK_SIZE as u64
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Block({})", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_block_id_new() {
        let id = BlockId::new(42);
        assert_eq!(id.0, 42);
        assert_eq!(id.index(), 42);
    }

    #[test]
    fn test_block_id_file_offset() {
        assert_eq!(BlockId::new(0).file_offset(), 0);
        assert_eq!(BlockId::new(3).file_offset(), 3 * 4096);
    }

    #[test]
    fn test_block_id_ordering() {
        assert!(BlockId::new(1) < BlockId::new(2));
        assert!(BlockId::new(5) > BlockId::new(3));
    }

    #[test]
    fn test_block_id_display() {
        assert_eq!(format!("{}", BlockId::new(42)), "Block(42)");
    }
}
