//! blocktree - a disk-backed B+Tree key/value store with an LRU buffer pool.
//!
//! # Architecture
//! ```text
//! ┌───────────────────────────────────────────────────────────┐
//! │                        blocktree                          │
//! ├───────────────────────────────────────────────────────────┤
//! │  ┌───────────────────────────────────────────────────┐    │
//! │  │             B+Tree Engine (tree/)                 │    │
//! │  │   search_leaf → lookup / insert / update          │    │
//! │  │   cascading split propagation, root ownership     │    │
//! │  └───────────────────────────────────────────────────┘    │
//! │                           ↓                               │
//! │  ┌───────────────────────────────────────────────────┐    │
//! │  │            Buffer Pool (buffer/)                  │    │
//! │  │   ┌───────────────────────────────────────────┐   │    │
//! │  │   │  LRU eviction + split-time pinning        │   │    │
//! │  │   └───────────────────────────────────────────┘   │    │
//! │  │      BufferPool + Frame + PoolStats               │    │
//! │  └───────────────────────────────────────────────────┘    │
//! │              ↓                        ↓                   │
//! │  ┌────────────────────┐  ┌────────────────────────────┐   │
//! │  │ Metadata Table     │  │  Storage Layer (storage/)  │   │
//! │  │ (meta/)            │  │  BlockFile + Leaf/Branch/  │   │
//! │  │ kind/full/parent   │  │  Record block codecs       │   │
//! │  └────────────────────┘  └────────────────────────────┘   │
//! └───────────────────────────────────────────────────────────┘
//! ```
//!
//! The engine asks the pool for blocks by number; the pool consults the
//! metadata table for the block's kind, materializes the matching block
//! variant (loading its bytes from the flat storage file unless the block
//! was just allocated), and evicts the least-recently-touched unpinned
//! frame when the pool is at capacity. Persistence of the metadata table
//! and root pointer is delegated to an external snapshot collaborator via
//! [`tree::BPlusTree::export_snapshot`] / [`tree::BPlusTree::import_snapshot`].
//!
//! # Modules
//! - [`common`] - Shared primitives (BlockId, Error, config)
//! - [`meta`] - Block descriptors and the metadata table
//! - [`storage`] - Flat-file I/O and the on-disk block formats
//! - [`buffer`] - The buffer pool and its LRU replacer
//! - [`tree`] - The B+Tree engine
//! - [`snapshot`] - The exported `{descriptors, root}` snapshot struct
//!
//! # Quick Start
//! ```no_run
//! use blocktree::BPlusTree;
//!
//! let mut tree = BPlusTree::open("my_store.db").unwrap();
//! tree.insert(42, "the answer").unwrap();
//! assert_eq!(tree.lookup(42).unwrap().desc, "the answer");
//! let snapshot = tree.close().unwrap();
//! // hand `snapshot` to whatever persists it; feed it back via restore()
//! ```

pub mod buffer;
pub mod common;
pub mod meta;
pub mod snapshot;
pub mod storage;
pub mod tree;

// Re-export commonly used items at crate root for convenience
pub use common::config::{BLOCK_COUNT, BLOCK_SIZE, POOL_CAPACITY};
pub use common::{BlockId, Error, Result};

pub use buffer::{BufferPool, PoolStats};
pub use meta::{BlockDescriptor, BlockKind, MetaTable};
pub use snapshot::Snapshot;
pub use storage::block::{Record, RecordPtr};
pub use storage::BlockFile;
pub use tree::BPlusTree;
