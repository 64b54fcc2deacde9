//! Persisted user settings

use crate::error::Error;

/// Layout version of [`Settings`]. Records with another tag are discarded.
pub const SETTINGS_VERSION: u16 = 2;

/// Operator choices that survive power cycles
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Settings {
    pub version: u16,
    /// Brightness the stored frames were generated with
    pub brightness: u8,
    /// Speed dial position
    pub speed: u8,
    /// Seconds between start and the first row
    pub delay: u8,
    /// Frames indexed by the last full scan
    pub frame_count: u8,
}

impl Settings {
    pub const DEFAULT: Self = Self {
        version: SETTINGS_VERSION,
        brightness: 64,
        speed: 128,
        delay: 0,
        frame_count: 0,
    };

    pub const fn is_current(&self) -> bool {
        self.version == SETTINGS_VERSION
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::DEFAULT
    }
}

/// Non-volatile storage for [`Settings`] (EEPROM in practice)
pub trait SettingsStore {
    /// The stored record, or `None` if nothing was ever saved
    fn load(&mut self) -> Result<Option<Settings>, Error>;

    fn save(&mut self, settings: &Settings) -> Result<(), Error>;
}
