//! Block storage seam
//!
//! Frames are addressed by block index only. The device driver (FAT on an SD
//! card in practice) lives outside this crate and implements [`BlockDevice`].

use heapless::String;

use crate::error::StorageError;

/// Size of one storage block in bytes. Each frame row occupies one block.
pub const BLOCK_SIZE: usize = 512;

/// Longest file name the index can resolve (8.3)
pub const MAX_NAME_LEN: usize = 12;

/// Short file name as stored in the directory
pub type FileName = String<MAX_NAME_LEN>;

/// Working buffer holding exactly one block
pub type RowBuffer = [u8; BLOCK_SIZE];

/// One directory entry, as reported by enumeration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DirEntry {
    pub name: FileName,
    pub is_directory: bool,
    pub is_hidden: bool,
    /// Position of the entry in the directory, stable until files change
    pub position: u16,
}

/// An unbroken run of blocks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Extent {
    pub first_block: u32,
    pub block_count: u32,
}

impl Extent {
    /// Absolute block number of the `n`-th block, if inside the extent
    pub const fn block(self, n: u32) -> Option<u32> {
        if n < self.block_count {
            Some(self.first_block + n)
        } else {
            None
        }
    }
}

/// Block storage device
pub trait BlockDevice {
    /// Read one block
    fn read_block(&mut self, block: u32, buf: &mut RowBuffer) -> Result<(), StorageError>;

    /// Write one block
    fn write_block(&mut self, block: u32, buf: &RowBuffer) -> Result<(), StorageError>;

    /// Create `name` as a single contiguous run of at least `size` bytes,
    /// returning its first block. Fails if `name` already exists.
    fn allocate_contiguous(&mut self, name: &str, size: u32) -> Result<u32, StorageError>;

    /// Delete `name`. Missing files are reported as [`StorageError::NotFound`].
    fn remove(&mut self, name: &str) -> Result<(), StorageError>;

    /// The `cursor`-th live directory entry in storage order, or `None` past the end
    fn entry(&mut self, cursor: usize) -> Result<Option<DirEntry>, StorageError>;

    /// Look up the entry at a directory position
    fn entry_at(&mut self, position: u16) -> Result<DirEntry, StorageError>;

    /// Read bytes of `name` starting at `offset`. Returns the number of bytes
    /// read, which is short only at end of file.
    fn read_at(&mut self, name: &str, offset: u32, buf: &mut [u8]) -> Result<usize, StorageError>;

    /// Block extent of `name`, or `None` if the file is not contiguous
    fn contiguous_extent(&mut self, name: &str) -> Result<Option<Extent>, StorageError>;
}

/// Build a [`FileName`], rejecting names that do not fit
pub fn file_name(name: &str) -> Option<FileName> {
    let mut out = FileName::new();
    out.push_str(name).ok()?;
    Some(out)
}
