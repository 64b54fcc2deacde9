#![no_std]

pub mod bitmap;
pub mod config;
pub mod dither;
pub mod encoder;
pub mod error;
pub mod frame_store;
pub mod gamma;
pub mod geometry;
pub mod math8;
pub mod menu;
pub mod painter;
pub mod pipeline;
pub mod profiler;
pub mod scheduler;
pub mod settings;
pub mod storage;

pub use config::{ChannelOrder, PainterConfig};
pub use encoder::{ProtocolEncoder, SymbolWriter};
pub use error::{Diagnostic, Error, FormatError, StorageError};
pub use frame_store::{FrameIndex, FrameStore, MAX_FRAMES, ScanReport};
pub use menu::{Input, MenuEffect, MenuItem, MenuState, transition};
pub use painter::{Painter, Peripherals};
pub use pipeline::{ColorPipeline, ImageReport};
pub use profiler::{Clock, SystemClock, ThroughputProfiler};
pub use scheduler::{PlaybackRate, PlaybackScheduler, PlaybackState, TickTimer};
pub use settings::{Settings, SettingsStore};
pub use storage::{BLOCK_SIZE, BlockDevice, DirEntry, Extent, FileName, RowBuffer};

pub use embassy_time::{Duration, Instant};

/// Abstract LED output
///
/// Implement this trait to support different hardware platforms. Playback is
/// generic over it.
pub trait OutputDriver {
    /// Send one row of bytes, already in wire order
    fn transmit(&mut self, bytes: &[u8]);
}
