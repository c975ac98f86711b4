//! The metadata table.
//!
//! One [`BlockDescriptor`] exists per block slot, whether or not the block
//! is in use. The table is the authoritative record of every block's kind,
//! fullness and parent link; it owns no block content and is kept entirely
//! in memory. It is not embedded in the data file - it travels in the
//! snapshot handed to the external persistence collaborator.

mod descriptor;
mod table;

pub use descriptor::{BlockDescriptor, BlockKind};
pub use table::MetaTable;
