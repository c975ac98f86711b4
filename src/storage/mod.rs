//! Storage layer - flat-file I/O and on-disk block formats.
//!
//! This module handles persistent storage:
//! - [`BlockFile`] - Low-level block I/O against the fixed-size data file
//! - [`block`] - The Leaf/Branch/Record block variants and their codecs

mod block_file;
pub mod block;

pub use block_file::BlockFile;
