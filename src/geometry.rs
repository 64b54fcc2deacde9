//! Mapping between source image columns and strip positions

/// Which source columns land on which LEDs
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CropWindow {
    /// Source columns dropped on the left edge
    pub skip: usize,
    /// Source columns shown
    pub active: usize,
    /// Strip position of the first shown column
    pub offset: usize,
}

impl CropWindow {
    /// Fit an image `width` columns wide onto `strip_length` LEDs.
    ///
    /// Wide images lose columns on both edges, with the odd column taken
    /// from the right. Narrow images are centered, the odd LED left dark on
    /// the right.
    pub const fn new(width: usize, strip_length: usize) -> Self {
        if width >= strip_length {
            let excess = width - strip_length;
            Self {
                skip: excess / 2,
                active: strip_length,
                offset: 0,
            }
        } else {
            Self {
                skip: 0,
                active: width,
                offset: (strip_length - width) / 2,
            }
        }
    }

    /// Source columns dropped on the right edge
    pub const fn right_skip(self, width: usize) -> usize {
        width - self.skip - self.active
    }
}

/// Bytes in one stored bitmap row, padded to four bytes
pub const fn row_stride(width: usize) -> usize {
    (width * 3).div_ceil(4) * 4
}
