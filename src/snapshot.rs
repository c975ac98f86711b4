//! Engine state snapshots.
//!
//! A [`Snapshot`] captures everything the engine keeps outside the data
//! file: the full metadata table and the root block number. Paired with
//! the data file it is enough to reopen a store exactly where it left
//! off. How a snapshot is encoded at rest is up to the caller; this
//! module only defines the in-memory shape and its consistency checks.

use crate::common::config::BLOCK_COUNT;
use crate::common::{BlockId, Error, Result};
use crate::meta::{BlockDescriptor, BlockKind};

/// The engine's out-of-file state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Snapshot {
    /// One descriptor per block in the data file.
    pub descriptors: Vec<BlockDescriptor>,

    /// The current root block.
    pub root: BlockId,
}

impl Snapshot {
    /// Check the snapshot for internal consistency.
    ///
    /// # Errors
    /// Returns `Error::BadSnapshot` naming the first inconsistency found.
    pub fn validate(&self) -> Result<()> {
        if self.descriptors.len() != BLOCK_COUNT {
            return Err(Error::BadSnapshot("wrong descriptor count"));
        }

        let desc = self
            .descriptors
            .get(self.root.index())
            .ok_or(Error::BadSnapshot("root out of range"))?;

        match desc.kind {
            BlockKind::Leaf | BlockKind::Branch => {}
            _ => return Err(Error::BadSnapshot("root is not a tree block")),
        }
        if desc.parent.is_some() {
            return Err(Error::BadSnapshot("root has a parent"));
        }

        // Every recorded parent must point at a Branch block.
        for desc in &self.descriptors {
            if let Some(parent) = desc.parent {
                let parent_desc = self
                    .descriptors
                    .get(parent.index())
                    .ok_or(Error::BadSnapshot("parent out of range"))?;
                if parent_desc.kind != BlockKind::Branch {
                    return Err(Error::BadSnapshot("parent is not a branch"));
                }
            }
        }

        Ok(())
    }
}
