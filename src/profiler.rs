//! Playback rate ceiling
//!
//! Every row tick transmits one row and then reads the next block, so the
//! tick period must cover the slowest read the card produces plus the time
//! the strip needs to shift a row in.

use embassy_time::{Duration, Instant};

use crate::config::PainterConfig;
use crate::error::Error;
use crate::frame_store::FrameStore;
use crate::storage::{BlockDevice, RowBuffer};

/// Fastest row rate the strip latches reliably, whatever its length
pub const MAX_ROWS_PER_SECOND: u32 = 1_000;

/// Time to shift one LED (24 bits at 800 kbit/s), in ns
pub const NANOS_PER_ELEMENT: u64 = 30_000;

/// Fixed cost of one scheduler tick outside transmit and read, in ns
pub const LOOP_OVERHEAD_NANOS: u64 = 50_000;

/// Safety margin on the measured read latency, in percent
pub const LATENCY_MARGIN_PERCENT: u64 = 5;

const NANOS_PER_SECOND: u64 = 1_000_000_000;

/// Time source for latency measurement
pub trait Clock {
    fn now(&mut self) -> Instant;
}

/// Clock backed by the embassy time driver
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&mut self) -> Instant {
        Instant::now()
    }
}

/// Measurement of one frame
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameProfile {
    /// Slowest of the timed block reads
    pub worst_read: Duration,
    /// Rate this frame can sustain
    pub max_rows_per_second: u32,
}

#[derive(Debug, Clone)]
pub struct ThroughputProfiler {
    strip_length: usize,
    reads: u16,
}

impl ThroughputProfiler {
    pub const fn new(config: &PainterConfig) -> Self {
        Self {
            strip_length: config.strip_length,
            reads: config.profile_reads,
        }
    }

    /// Time up to `reads` consecutive block reads of `frame`, keep the worst
    pub fn measure_frame<D: BlockDevice, C: Clock>(
        &self,
        device: &mut D,
        clock: &mut C,
        frame: &str,
        buffer: &mut RowBuffer,
    ) -> Result<FrameProfile, Error> {
        let extent = device
            .contiguous_extent(frame)?
            .ok_or(Error::StorageFragmented)?;

        let reads = extent.block_count.min(u32::from(self.reads).max(1));
        let mut worst_read = Duration::from_ticks(0);
        for n in 0..reads {
            let start = clock.now();
            device.read_block(extent.first_block + n, buffer)?;
            let elapsed = clock.now().saturating_duration_since(start);
            worst_read = worst_read.max(elapsed);
        }

        Ok(FrameProfile {
            worst_read,
            max_rows_per_second: self.rate_for_latency(worst_read),
        })
    }

    /// Highest rate every indexed frame can sustain
    pub fn profile_all<D: BlockDevice, C: Clock, const N: usize>(
        &self,
        store: &FrameStore<N>,
        device: &mut D,
        clock: &mut C,
        buffer: &mut RowBuffer,
    ) -> Result<u32, Error> {
        let mut ceiling = MAX_ROWS_PER_SECOND;
        for index in 0..store.len() {
            #[allow(clippy::cast_possible_truncation)]
            let frame = store.frame_name(device, index as u8)?;
            let profile = self.measure_frame(device, clock, &frame, buffer)?;
            log::debug!(
                "{}: worst read {} us, {} rows/s",
                frame,
                profile.worst_read.as_micros(),
                profile.max_rows_per_second
            );
            ceiling = ceiling.min(profile.max_rows_per_second);
        }
        log::info!("playback ceiling {} rows/s", ceiling);
        Ok(ceiling)
    }

    /// Row rate for a worst-case read latency, never above
    /// [`MAX_ROWS_PER_SECOND`]
    #[allow(clippy::cast_possible_truncation)]
    pub fn rate_for_latency(&self, worst_read: Duration) -> u32 {
        let read_nanos = worst_read.as_micros() * 1_000 * (100 + LATENCY_MARGIN_PERCENT) / 100;
        let transmit_nanos = self.strip_length as u64 * NANOS_PER_ELEMENT;
        let period_nanos = read_nanos + transmit_nanos + LOOP_OVERHEAD_NANOS;
        let rate = NANOS_PER_SECOND / period_nanos;
        rate.min(u64::from(MAX_ROWS_PER_SECOND)) as u32
    }
}
