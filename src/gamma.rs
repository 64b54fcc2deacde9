//! Gamma correction
//!
//! The table keeps eight fractional bits per entry so the dither stage can
//! recover the precision gamma compression throws away at low levels.

/// 8-bit level to 8.8 fixed-point drive level
#[derive(Clone)]
pub struct GammaTable {
    table: [u16; 256],
}

impl GammaTable {
    /// Build the table for `level^gamma`, normalised to 0..=255
    #[allow(
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss,
        clippy::cast_precision_loss
    )]
    pub fn new(gamma: f32) -> Self {
        let mut table = [0u16; 256];
        for (level, entry) in table.iter_mut().enumerate() {
            let normalized = level as f32 / 255.0;
            let corrected = libm::powf(normalized, gamma) * 255.0 * 256.0;
            *entry = libm::roundf(corrected).clamp(0.0, 65280.0) as u16;
        }
        Self { table }
    }

    /// Corrected level with eight fractional bits
    #[inline]
    pub const fn get(&self, level: u8) -> u16 {
        self.table[level as usize]
    }
}

impl core::fmt::Debug for GammaTable {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("GammaTable")
            .field("max", &self.table[255])
            .finish_non_exhaustive()
    }
}
