//! BlockFile - low-level file I/O for data blocks.
//!
//! The [`BlockFile`] handles all direct file operations: reading and
//! writing whole 4KB blocks of the fixed-size data file.

use std::fs::{File, OpenOptions};
use std::io::{Read, Seek, SeekFrom, Write};
use std::path::Path;

use crate::common::config::{BLOCK_SIZE, DATA_FILE_SIZE};
use crate::common::{BlockId, Result};

/// Owns the single flat data file.
///
/// # File Layout
/// The file is exactly `BLOCK_COUNT * BLOCK_SIZE` bytes, with blocks laid
/// out sequentially:
/// ```text
/// ┌─────────┬─────────┬─────────┬─────────┬──────────┐
/// │ Block 0 │ Block 1 │ Block 2 │  ...    │ Block 8191│
/// │ (4KB)   │ (4KB)   │ (4KB)   │         │ (4KB)    │
/// └─────────┴─────────┴─────────┴─────────┴──────────┘
/// Offset:  0      4096     8192    ...    8191×4096
/// ```
///
/// Block `n` is located at file offset `n × BLOCK_SIZE`. A new file is
/// sized up front and reads back as zeros, which every block codec treats
/// as "all slots free".
///
/// # Durability
/// Every `write_block` ends with a flush + `fsync()` barrier before
/// returning. An insert that cascades through k splits therefore issues
/// k+1 synchronous syncs; simplicity over throughput is deliberate here.
pub struct BlockFile {
    file: File,
}

impl BlockFile {
    /// Create a new data file, pre-sized to its full fixed length.
    ///
    /// # Errors
    /// Returns an error if the file already exists or cannot be created.
    pub fn create<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create_new(true)
            .open(path)?;
        file.set_len(DATA_FILE_SIZE)?;

        Ok(Self { file })
    }

    /// Open an existing data file.
    ///
    /// # Errors
    /// Returns an error if the file doesn't exist, cannot be opened, or
    /// is not exactly `DATA_FILE_SIZE` bytes long.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let file = OpenOptions::new().read(true).write(true).open(&path)?;

        let len = file.metadata()?.len();
        if len != DATA_FILE_SIZE {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidData,
                format!("data file is {} bytes, expected {}", len, DATA_FILE_SIZE),
            )
            .into());
        }

        Ok(Self { file })
    }

    /// Open an existing data file, or create if it doesn't exist.
    pub fn open_or_create<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::open(path)
        } else {
            Self::create(path)
        }
    }

    /// Read the full 4096 bytes of a block.
    pub fn read_block(&mut self, id: BlockId) -> Result<[u8; BLOCK_SIZE]> {
        self.file.seek(SeekFrom::Start(id.file_offset()))?;

        let mut buf = [0u8; BLOCK_SIZE];
        self.file.read_exact(&mut buf)?;

        Ok(buf)
    }

    /// Write the full 4096 bytes of a block, then the durability barrier.
    pub fn write_block(&mut self, id: BlockId, buf: &[u8; BLOCK_SIZE]) -> Result<()> {
        self.file.seek(SeekFrom::Start(id.file_offset()))?;
        self.file.write_all(buf)?;
        self.file.flush()?;
        self.file.sync_all()?;

        Ok(())
    }
}
