//! Frame - a resident block in the buffer pool.

use std::cell::RefCell;
use std::rc::Rc;

use crate::storage::block::Block;

/// A wired block plus the bookkeeping the pool needs.
///
/// The block content is shared with the engine as `Rc<RefCell<Block>>`:
/// the engine holds handles across pool calls while it mutates a block,
/// and the pool keeps its own handle for flushing. The pin count protects
/// blocks an in-flight operation is still mutating from eviction; there
/// is no dirty flag - a resident block is serialized in full whenever it
/// is evicted or the pool is flushed.
#[derive(Debug)]
pub struct Frame {
    block: Rc<RefCell<Block>>,
    pin_count: u32,
}

impl Frame {
    /// Wire `block` into a new frame, unpinned.
    pub fn new(block: Block) -> Self {
        Self {
            block: Rc::new(RefCell::new(block)),
            pin_count: 0,
        }
    }

    /// A shared handle to the block content.
    #[inline]
    pub fn block(&self) -> Rc<RefCell<Block>> {
        Rc::clone(&self.block)
    }

    /// Increment the pin count. Returns the new pin count.
    #[inline]
    pub fn pin(&mut self) -> u32 {
        self.pin_count += 1;
        self.pin_count
    }

    /// Decrement the pin count. Returns the new pin count.
    ///
    /// # Panics
    /// Panics if the pin count is already 0.
    #[inline]
    pub fn unpin(&mut self) -> u32 {
        assert!(self.pin_count > 0, "pin count underflow");
        self.pin_count -= 1;
        self.pin_count
    }

    /// Get the current pin count.
    #[inline]
    pub fn pin_count(&self) -> u32 {
        self.pin_count
    }

    /// Check if the frame is currently pinned.
    #[inline]
    pub fn is_pinned(&self) -> bool {
        self.pin_count > 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::meta::BlockKind;

    #[test]
    fn test_frame_new_unpinned() {
        let frame = Frame::new(Block::empty(BlockKind::Leaf));
        assert!(!frame.is_pinned());
        assert_eq!(frame.pin_count(), 0);
    }

    #[test]
    fn test_frame_pin_unpin() {
        let mut frame = Frame::new(Block::empty(BlockKind::Leaf));

        assert_eq!(frame.pin(), 1);
        assert!(frame.is_pinned());

        assert_eq!(frame.pin(), 2);
        assert_eq!(frame.pin_count(), 2);

        assert_eq!(frame.unpin(), 1);
        assert!(frame.is_pinned());

        assert_eq!(frame.unpin(), 0);
        assert!(!frame.is_pinned());
    }

    #[test]
    #[should_panic(expected = "pin count underflow")]
    fn test_frame_unpin_underflow() {
        let mut frame = Frame::new(Block::empty(BlockKind::Leaf));
        frame.unpin();
    }

    #[test]
    fn test_frame_shares_block_content() {
        let frame = Frame::new(Block::empty(BlockKind::Leaf));

        let handle = frame.block();
        handle.borrow_mut().as_leaf_mut().unwrap().insert(
            9,
            crate::storage::block::RecordPtr {
                block: crate::common::BlockId::new(1),
                slot: 0,
            },
        );

        // The frame's own handle sees the mutation.
        assert_eq!(frame.block().borrow().as_leaf().unwrap().len(), 1);
    }
}
