use crate::error::Error;
use crate::storage::BLOCK_SIZE;

/// Byte order of one pixel on the wire
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChannelOrder {
    Rgb,
    /// WS2812 and most clones
    #[default]
    Grb,
    Bgr,
}

impl ChannelOrder {
    /// Arrange an `(r, g, b)` triplet for the wire
    #[inline]
    pub const fn arrange(self, r: u8, g: u8, b: u8) -> [u8; 3] {
        match self {
            Self::Rgb => [r, g, b],
            Self::Grb => [g, r, b],
            Self::Bgr => [b, g, r],
        }
    }
}

/// Static hardware and calibration parameters
#[derive(Debug, Clone)]
pub struct PainterConfig {
    /// Number of addressable LEDs
    pub strip_length: usize,
    pub channel_order: ChannelOrder,
    /// Gamma exponent used to build the correction table
    pub gamma: f32,
    /// Apply ordered dithering after gamma correction
    pub dither: bool,
    /// Maximum current the supply may deliver to the strip, in mA
    pub current_budget_ma: u32,
    /// Empirical divisor for the current model, in percent (100 = 1.0).
    ///
    /// Measured strips draw less than the datasheet model predicts; raise
    /// this until estimates match a meter.
    pub current_correction: u32,
    /// Input clock of the row timer
    pub timer_clock_hz: u32,
    /// Playback rate at the lowest speed setting
    pub min_rows_per_second: u32,
    /// Number of block reads the profiler times per frame
    pub profile_reads: u16,
}

impl PainterConfig {
    pub const DEFAULT: Self = Self {
        strip_length: 144,
        channel_order: ChannelOrder::Grb,
        gamma: 2.2,
        dither: true,
        current_budget_ma: 4_000,
        current_correction: 100,
        timer_clock_hz: 250_000,
        min_rows_per_second: 10,
        profile_reads: 16,
    };

    /// Bytes of one row on the wire
    pub const fn row_bytes(&self) -> usize {
        self.strip_length * 3
    }

    pub fn validate(&self) -> Result<(), Error> {
        if self.strip_length == 0 {
            return Err(Error::InvalidConfig("strip length is zero"));
        }
        if self.row_bytes() > BLOCK_SIZE {
            return Err(Error::InvalidConfig("strip does not fit one block"));
        }
        if self.current_correction == 0 {
            return Err(Error::InvalidConfig("current correction is zero"));
        }
        if self.timer_clock_hz == 0 {
            return Err(Error::InvalidConfig("timer clock is zero"));
        }
        if self.min_rows_per_second == 0 {
            return Err(Error::InvalidConfig("minimum rate is zero"));
        }
        if !self.gamma.is_finite() || self.gamma <= 0.0 {
            return Err(Error::InvalidConfig("gamma must be positive"));
        }
        Ok(())
    }
}

impl Default for PainterConfig {
    fn default() -> Self {
        Self::DEFAULT
    }
}
