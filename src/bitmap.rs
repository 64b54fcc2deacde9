//! Bitmap header parsing
//!
//! Only the fields the pipeline needs are read. Everything except
//! uncompressed, single-plane, 24-bit images is rejected.

use crate::error::FormatError;
use crate::geometry::row_stride;

/// File header (14 bytes) plus the start of the info header
pub const HEADER_LEN: usize = 34;

const SIGNATURE: [u8; 2] = *b"BM";
const MAX_DIMENSION: u32 = 1 << 15;

/// Parsed geometry of a 24-bit bitmap
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitmapHeader {
    /// Offset of the first pixel row in the file
    pub data_offset: u32,
    pub width: usize,
    /// Absolute row count
    pub height: usize,
    /// Rows are stored top row first (negative height in the file)
    pub top_down: bool,
    /// Offset just past the last pixel row
    pub data_end: u32,
}

impl BitmapHeader {
    #[allow(
        clippy::cast_sign_loss,
        clippy::cast_possible_wrap,
        clippy::cast_possible_truncation
    )]
    pub fn parse(bytes: &[u8]) -> Result<Self, FormatError> {
        if bytes.len() < HEADER_LEN {
            return Err(FormatError::Truncated);
        }
        if bytes[0..2] != SIGNATURE {
            return Err(FormatError::BadSignature);
        }

        let data_offset = read_u32(bytes, 10);
        let width = read_u32(bytes, 18) as i32;
        let height = read_u32(bytes, 22) as i32;
        let planes = read_u16(bytes, 26);
        let bit_depth = read_u16(bytes, 28);
        let compression = read_u32(bytes, 30);

        if planes != 1 {
            return Err(FormatError::Planes(planes));
        }
        if bit_depth != 24 {
            return Err(FormatError::BitDepth(bit_depth));
        }
        if compression != 0 {
            return Err(FormatError::Compressed(compression));
        }

        let abs_height = height.unsigned_abs();
        if width <= 0 || abs_height == 0 || width as u32 > MAX_DIMENSION || abs_height > MAX_DIMENSION
        {
            return Err(FormatError::Dimensions);
        }
        if (data_offset as usize) < HEADER_LEN {
            return Err(FormatError::Truncated);
        }
        // Stride is at most 3 * MAX_DIMENSION + 3, so the cast is exact
        let data_end = (row_stride(width as usize) as u32)
            .checked_mul(abs_height)
            .and_then(|len| len.checked_add(data_offset))
            .ok_or(FormatError::DataRange)?;

        Ok(Self {
            data_offset,
            width: width as usize,
            height: abs_height as usize,
            top_down: height < 0,
            data_end,
        })
    }

    pub const fn stride(&self) -> usize {
        row_stride(self.width)
    }

    /// File offset of the row that is `n`-th from the bottom of the image,
    /// or `None` past the last row
    pub fn row_offset_from_bottom(&self, n: usize) -> Option<u32> {
        if n >= self.height {
            return None;
        }
        let stored = if self.top_down { self.height - 1 - n } else { n };
        let skip = u32::try_from(stored.checked_mul(self.stride())?).ok()?;
        self.data_offset.checked_add(skip)
    }
}

fn read_u16(bytes: &[u8], at: usize) -> u16 {
    u16::from_le_bytes([bytes[at], bytes[at + 1]])
}

fn read_u32(bytes: &[u8], at: usize) -> u32 {
    u32::from_le_bytes([bytes[at], bytes[at + 1], bytes[at + 2], bytes[at + 3]])
}
