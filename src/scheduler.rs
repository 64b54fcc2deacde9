//! Row pacing
//!
//! Playback is a busy loop around a free-running timer. Interrupts stay off
//! for the whole transmission, so the loop polls the timer's overflow flag
//! instead of sleeping on it.
//!
//! One tick:
//! 1. Wait for the period boundary
//! 2. Transmit the buffered row
//! 3. Read the next row's block into the same buffer while the next period runs
//!
//! A read that outlasts the period makes the following tick late; it never
//! corrupts the row. Stopping is only considered when the frame wraps around:
//! releasing the hold input mid-frame lets the frame finish.

use crate::OutputDriver;
use crate::config::PainterConfig;
use crate::error::Error;
use crate::math8::lerp_dial;
use crate::storage::{BlockDevice, Extent, RowBuffer};

/// Free-running hardware counter
pub trait TickTimer {
    /// (Re)start with an overflow every `period_ticks` timer clocks
    fn start(&mut self, period_ticks: u32);

    /// Whether a period boundary passed since the last call. Clears the flag.
    fn poll_overflow(&mut self) -> bool;

    fn stop(&mut self);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Nothing loaded
    Idle,
    /// First row buffered, timer not running
    Armed,
    /// Emitting rows
    Running,
    /// Frame finished; waits for the blank row, then for acknowledgement
    Draining,
}

/// Effective pacing of a playback run
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PlaybackRate {
    pub rows_per_second: u32,
    /// Timer reload value
    pub period_ticks: u32,
}

/// Drives one frame from storage to the strip, one row per timer period
pub struct PlaybackScheduler<T: TickTimer, O: OutputDriver> {
    timer: T,
    output: O,
    state: PlaybackState,
    extent: Extent,
    row: u32,
    blanked: bool,
    row_bytes: usize,
    timer_clock_hz: u32,
    min_rows_per_second: u32,
}

impl<T: TickTimer, O: OutputDriver> PlaybackScheduler<T, O> {
    pub const fn new(timer: T, output: O, config: &PainterConfig) -> Self {
        Self {
            timer,
            output,
            state: PlaybackState::Idle,
            extent: Extent {
                first_block: 0,
                block_count: 0,
            },
            row: 0,
            blanked: false,
            row_bytes: config.row_bytes(),
            timer_clock_hz: config.timer_clock_hz,
            min_rows_per_second: config.min_rows_per_second,
        }
    }

    pub const fn state(&self) -> PlaybackState {
        self.state
    }

    /// Next row to be loaded or transmitted
    pub const fn row(&self) -> u32 {
        self.row
    }

    pub fn output_mut(&mut self) -> &mut O {
        &mut self.output
    }

    pub fn timer(&self) -> &T {
        &self.timer
    }

    /// Open `frame` and buffer its first row
    pub fn preload<D: BlockDevice>(
        &mut self,
        device: &mut D,
        frame: &str,
        buffer: &mut RowBuffer,
    ) -> Result<(), Error> {
        if self.state != PlaybackState::Idle {
            return Err(Error::InvalidState);
        }
        let extent = device
            .contiguous_extent(frame)?
            .filter(|extent| extent.block_count > 0)
            .ok_or(Error::StorageFragmented)?;
        device.read_block(extent.first_block, buffer)?;

        self.extent = extent;
        self.row = 0;
        self.blanked = false;
        self.state = PlaybackState::Armed;
        log::debug!("armed {} ({} rows)", frame, extent.block_count);
        Ok(())
    }

    /// Start the timer at the rate `dial` selects between the configured
    /// floor and `ceiling`
    pub fn start(&mut self, dial: u8, ceiling: u32) -> Result<PlaybackRate, Error> {
        if self.state != PlaybackState::Armed {
            return Err(Error::InvalidState);
        }
        let rows_per_second = lerp_dial(dial, self.min_rows_per_second, ceiling).max(1);
        let rate = PlaybackRate {
            rows_per_second,
            period_ticks: (self.timer_clock_hz / rows_per_second).max(1),
        };
        self.timer.start(rate.period_ticks);
        self.state = PlaybackState::Running;
        log::info!(
            "playback at {} rows/s (period {} ticks)",
            rate.rows_per_second,
            rate.period_ticks
        );
        Ok(rate)
    }

    /// Serve one period boundary
    ///
    /// `hold` is only consulted after the last row of the frame: while it
    /// returns true the frame repeats, otherwise a blank row is queued and
    /// playback drains.
    pub fn tick<D, F>(&mut self, device: &mut D, buffer: &mut RowBuffer, hold: F) -> Result<PlaybackState, Error>
    where
        D: BlockDevice,
        F: FnOnce() -> bool,
    {
        match self.state {
            PlaybackState::Running => {
                self.wait_boundary();
                self.output.transmit(&buffer[..self.row_bytes]);
                self.row += 1;

                if self.row >= self.extent.block_count {
                    if hold() {
                        self.row = 0;
                    } else {
                        buffer.fill(0);
                        self.state = PlaybackState::Draining;
                        return Ok(self.state);
                    }
                }
                if let Some(block) = self.extent.block(self.row) {
                    device.read_block(block, buffer)?;
                }
            }
            PlaybackState::Draining if !self.blanked => {
                self.wait_boundary();
                self.output.transmit(&buffer[..self.row_bytes]);
                self.timer.stop();
                self.blanked = true;
                log::debug!("playback drained");
            }
            _ => return Err(Error::InvalidState),
        }
        Ok(self.state)
    }

    /// Tick until the frame has played out and the strip is dark
    pub fn run<D, F>(&mut self, device: &mut D, buffer: &mut RowBuffer, mut hold: F) -> Result<(), Error>
    where
        D: BlockDevice,
        F: FnMut() -> bool,
    {
        while !self.is_drained() {
            self.tick(device, buffer, &mut hold)?;
        }
        Ok(())
    }

    /// Whether playback finished and awaits acknowledgement
    pub const fn is_drained(&self) -> bool {
        matches!(self.state, PlaybackState::Draining) && self.blanked
    }

    /// Return to idle once the operator confirmed the end of playback, or
    /// drop a preloaded frame that was never started
    pub fn acknowledge(&mut self) -> Result<(), Error> {
        if self.is_drained() || self.state == PlaybackState::Armed {
            self.state = PlaybackState::Idle;
            Ok(())
        } else {
            Err(Error::InvalidState)
        }
    }

    /// Stop immediately and blank the strip
    pub fn abort(&mut self, buffer: &mut RowBuffer) {
        self.timer.stop();
        buffer.fill(0);
        self.output.transmit(&buffer[..self.row_bytes]);
        self.state = PlaybackState::Idle;
        self.blanked = false;
    }

    fn wait_boundary(&mut self) {
        while !self.timer.poll_overflow() {
            core::hint::spin_loop();
        }
    }
}
