//! Ordered dithering
//!
//! A 16x16 Bayer matrix decides, per pixel position, whether the fractional
//! part of a gamma-corrected level rounds up. Every threshold 0..=255 occurs
//! exactly once, so over a full tile a fraction `f` rounds up `f` times in 256.

pub const MATRIX_SIZE: usize = 16;

/// Threshold matrix, indexed `[row % 16][column % 16]`
pub static THRESHOLDS: [[u8; MATRIX_SIZE]; MATRIX_SIZE] = bayer_matrix();

#[allow(clippy::cast_possible_truncation)]
const fn bayer_matrix() -> [[u8; MATRIX_SIZE]; MATRIX_SIZE] {
    let mut matrix = [[0u8; MATRIX_SIZE]; MATRIX_SIZE];
    let mut y = 0;
    while y < MATRIX_SIZE {
        let mut x = 0;
        while x < MATRIX_SIZE {
            // Interleave the bits of (x ^ y) and y, then reverse them
            let xc = x ^ y;
            let mut value = 0;
            let mut bit = 0;
            while bit < 4 {
                value = (value << 1) | ((xc >> bit) & 1);
                value = (value << 1) | ((y >> bit) & 1);
                bit += 1;
            }
            matrix[y][x] = value as u8;
            x += 1;
        }
        y += 1;
    }
    matrix
}

/// Quantize an 8.8 level to 8 bits using the threshold at `(row, column)`
#[inline]
#[allow(clippy::cast_possible_truncation)]
pub fn dither(level: u16, row: usize, column: usize) -> u8 {
    let whole = (level >> 8) as u8;
    let fraction = level as u8;
    let threshold = THRESHOLDS[row % MATRIX_SIZE][column % MATRIX_SIZE];
    whole.saturating_add(u8::from(fraction > threshold))
}

/// Quantize by truncation
#[inline]
#[allow(clippy::cast_possible_truncation)]
pub const fn truncate(level: u16) -> u8 {
    (level >> 8) as u8
}
