//! Error types
//!
//! Every error except [`Error::IndexOutOfRange`], [`Error::NoFrameSelected`]
//! and [`Error::InvalidState`] is fatal: the coordinator blanks the strip and
//! keeps reporting the fault until the operator rescans.

use thiserror::Error;

/// Reasons a source bitmap is rejected
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum FormatError {
    /// The file is shorter than the bitmap headers
    #[error("file too short for bitmap header")]
    Truncated,
    /// The first two bytes are not `BM`
    #[error("bad signature")]
    BadSignature,
    /// Only single-plane images are supported
    #[error("{0} color planes")]
    Planes(u16),
    /// Only 24 bits per pixel are supported
    #[error("{0} bits per pixel")]
    BitDepth(u16),
    /// Only uncompressed images are supported
    #[error("compression method {0}")]
    Compressed(u32),
    /// Width or height is zero or out of range
    #[error("invalid dimensions")]
    Dimensions,
    /// Pixel data would end past the 4 GiB file size limit
    #[error("pixel data out of range")]
    DataRange,
}

/// Failures reported by the block storage device
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum StorageError {
    #[error("file not found")]
    NotFound,
    #[error("open failed")]
    Open,
    #[error("read failed")]
    Read,
    #[error("write failed")]
    Write,
    #[error("contiguous allocation failed")]
    Allocate,
    #[error("remove failed")]
    Remove,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum Error {
    #[error("unsupported bitmap: {0}")]
    Format(#[from] FormatError),
    #[error("storage: {0}")]
    Storage(#[from] StorageError),
    #[error("frame is not stored contiguously")]
    StorageFragmented,
    #[error("frame table is full ({capacity} entries)")]
    CapacityExceeded { capacity: usize },
    #[error("settings expect {cached} frames, found {found}")]
    ConfigMismatch { cached: u8, found: usize },
    #[error("frame index {index} out of range ({count} frames)")]
    IndexOutOfRange { index: usize, count: usize },
    #[error("invalid configuration: {0}")]
    InvalidConfig(&'static str),
    #[error("no frame selected")]
    NoFrameSelected,
    #[error("operation not valid in current playback state")]
    InvalidState,
}

/// Two-line operator message for a 16x2 character display
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Diagnostic {
    pub title: &'static str,
    pub detail: &'static str,
}

impl Error {
    /// Whether the error must stop the device until a rescan
    pub const fn is_fatal(&self) -> bool {
        !matches!(
            self,
            Self::IndexOutOfRange { .. } | Self::NoFrameSelected | Self::InvalidState
        )
    }

    pub const fn diagnostic(&self) -> Diagnostic {
        let (title, detail) = match self {
            Self::Format(_) => ("Bad image file", "24bit BMP only"),
            Self::Storage(StorageError::NotFound) => ("SD error", "file not found"),
            Self::Storage(StorageError::Allocate) => ("SD error", "card full?"),
            Self::Storage(StorageError::Write) => ("SD error", "write failed"),
            Self::Storage(_) => ("SD error", "check card"),
            Self::StorageFragmented => ("Frame fragmented", "rescan needed"),
            Self::CapacityExceeded { .. } => ("Too many images", "remove some"),
            Self::ConfigMismatch { .. } => ("Files changed", "rescan needed"),
            Self::IndexOutOfRange { .. } => ("No such image", "pick another"),
            Self::InvalidConfig(_) => ("Bad config", "check firmware"),
            Self::NoFrameSelected => ("No image", "select a file"),
            Self::InvalidState => ("Busy", "try again"),
        };
        Diagnostic { title, detail }
    }
}
