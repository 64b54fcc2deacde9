//! Coordinator
//!
//! [`Painter`] owns every piece of mutable state: configuration, settings,
//! frame index, playback ceiling, the hardware handles and the single row
//! buffer shared by frame generation and playback. The two never run at the
//! same time, so the buffer is simply lent to whichever is active.
//!
//! `Settings::brightness` is always the brightness the stored frames were
//! generated with. A new brightness is only requested; it takes effect, and
//! becomes persistable, once a rescan regenerated every frame with it.

use embassy_time::Duration;

#[cfg(feature = "esp32-log")]
use esp_println::println;

use crate::OutputDriver;
use crate::config::PainterConfig;
use crate::error::{Diagnostic, Error};
use crate::frame_store::{FrameIndex, FrameStore, MAX_FRAMES, ScanReport};
use crate::menu::{MenuEffect, MenuItem};
use crate::pipeline::ColorPipeline;
use crate::profiler::{Clock, MAX_ROWS_PER_SECOND, SystemClock, ThroughputProfiler};
use crate::scheduler::{PlaybackRate, PlaybackScheduler, PlaybackState, TickTimer};
use crate::settings::{Settings, SettingsStore};
use crate::storage::{BLOCK_SIZE, BlockDevice, FileName, RowBuffer};

/// Brightness change per menu step
const BRIGHTNESS_STEP: u8 = 8;

/// Speed dial change per menu step
const SPEED_STEP: u8 = 8;

/// Hardware the coordinator drives
pub struct Peripherals<D, S, T, O, C = SystemClock> {
    pub device: D,
    pub settings: S,
    pub timer: T,
    pub output: O,
    pub clock: C,
}

pub struct Painter<D, S, T, O, C = SystemClock>
where
    D: BlockDevice,
    S: SettingsStore,
    T: TickTimer,
    O: OutputDriver,
    C: Clock,
{
    config: PainterConfig,
    pipeline: ColorPipeline,
    profiler: ThroughputProfiler,
    store: FrameStore<MAX_FRAMES>,
    scheduler: PlaybackScheduler<T, O>,
    device: D,
    settings_store: S,
    clock: C,

    settings: Settings,
    selected: Option<FrameIndex>,
    ceiling: u32,
    /// Brightness the next rescan generates frames with
    requested_brightness: u8,
    /// Lowest brightness keeping every image within the current budget,
    /// when the last rescan exceeded it
    suggested_brightness: Option<u8>,
    pending_brightness: u8,
    buffer: RowBuffer,
    fault: Option<Error>,
}

impl<D, S, T, O, C> Painter<D, S, T, O, C>
where
    D: BlockDevice,
    S: SettingsStore,
    T: TickTimer,
    O: OutputDriver,
    C: Clock,
{
    pub fn new(config: PainterConfig, peripherals: Peripherals<D, S, T, O, C>) -> Result<Self, Error> {
        config.validate()?;
        Ok(Self {
            pipeline: ColorPipeline::new(&config),
            profiler: ThroughputProfiler::new(&config),
            store: FrameStore::new(),
            scheduler: PlaybackScheduler::new(peripherals.timer, peripherals.output, &config),
            device: peripherals.device,
            settings_store: peripherals.settings,
            clock: peripherals.clock,
            settings: Settings::DEFAULT,
            selected: None,
            ceiling: MAX_ROWS_PER_SECOND,
            requested_brightness: Settings::DEFAULT.brightness,
            suggested_brightness: None,
            pending_brightness: Settings::DEFAULT.brightness,
            buffer: [0; BLOCK_SIZE],
            fault: None,
            config,
        })
    }

    /// Load settings and index existing frames
    ///
    /// Settings from another firmware layout are replaced by defaults and
    /// trigger a full rescan. Otherwise the frames on the card must match
    /// the count recorded by the last rescan.
    pub fn boot(&mut self) -> Result<usize, Error> {
        let stored = self.settings_store.load().map_err(|err| self.fail(err))?;
        match stored.filter(Settings::is_current) {
            Some(settings) => {
                self.load_settings(settings);
                self.ensure_idle()?;
                // Count before profiling: new images have no frame to measure yet
                let found = self.index()?;
                if found != usize::from(settings.frame_count) {
                    return Err(self.fail(Error::ConfigMismatch {
                        cached: settings.frame_count,
                        found,
                    }));
                }
                self.update_ceiling()?;
                Ok(found)
            }
            None => {
                log::warn!("no valid settings, starting from defaults");
                self.load_settings(Settings::DEFAULT);
                Ok(self.rescan()?.frames)
            }
        }
    }

    /// Regenerate every frame at the requested brightness and re-measure
    /// playback speed. Clears a latched fault.
    ///
    /// When an image exceeds the current budget, the lowest suggested
    /// brightness is kept and offered by the next brightness edit.
    pub fn rescan(&mut self) -> Result<ScanReport, Error> {
        self.ensure_idle()?;
        self.fault = None;
        self.selected = None;
        let brightness = self.requested_brightness;
        let report = self
            .store
            .full_scan(&mut self.device, &self.pipeline, brightness, &mut self.buffer)
            .map_err(|err| self.fail(err))?;

        self.settings.brightness = brightness;
        self.settings.frame_count = u8::try_from(report.frames).unwrap_or(u8::MAX);
        self.suggested_brightness = report.suggested_brightness;
        if let Some(suggested) = report.suggested_brightness {
            log::warn!(
                "brightness {} exceeds the current budget, {} suggested",
                brightness,
                suggested
            );
            self.pending_brightness = suggested;
        }
        self.update_ceiling()?;
        self.select_first();
        Ok(report)
    }

    /// Rebuild the index assuming frames on the card are current
    pub fn quick_scan(&mut self) -> Result<usize, Error> {
        self.ensure_ready()?;
        self.ensure_idle()?;
        let count = self.index()?;
        self.update_ceiling()?;
        Ok(count)
    }

    pub fn frame_count(&self) -> usize {
        self.store.len()
    }

    /// Operator-facing name of a frame
    pub fn frame_name(&mut self, index: FrameIndex) -> Result<FileName, Error> {
        self.ensure_ready()?;
        self.store.display_name(&mut self.device, index)
    }

    /// Choose the frame to play. Out-of-range indices leave the selection as is.
    pub fn select_frame(&mut self, index: FrameIndex) -> Result<(), Error> {
        self.ensure_ready()?;
        self.store.position(index)?;
        self.selected = Some(index);
        Ok(())
    }

    pub const fn selected_frame(&self) -> Option<FrameIndex> {
        self.selected
    }

    /// Request a new brightness; returns whether frames must be regenerated
    ///
    /// The stored settings keep the brightness of the current frames until
    /// [`Painter::rescan`] succeeds.
    pub fn set_brightness(&mut self, brightness: u8) -> Result<bool, Error> {
        self.ensure_ready()?;
        self.requested_brightness = brightness;
        self.pending_brightness = brightness;
        Ok(brightness != self.settings.brightness)
    }

    /// Brightness the next rescan will use
    pub const fn requested_brightness(&self) -> u8 {
        self.requested_brightness
    }

    /// Brightness that would bring the frames back within the current
    /// budget, if the last rescan exceeded it
    pub const fn suggested_brightness(&self) -> Option<u8> {
        self.suggested_brightness
    }

    pub fn set_speed(&mut self, speed: u8) {
        self.settings.speed = speed;
    }

    pub fn set_delay(&mut self, seconds: u8) {
        self.settings.delay = seconds;
    }

    pub const fn settings(&self) -> &Settings {
        &self.settings
    }

    pub const fn config(&self) -> &PainterConfig {
        &self.config
    }

    /// Highest row rate every frame sustains
    pub const fn ceiling(&self) -> u32 {
        self.ceiling
    }

    pub fn save_settings(&mut self) -> Result<(), Error> {
        self.ensure_ready()?;
        let settings = self.settings;
        self.settings_store.save(&settings).map_err(|err| self.fail(err))
    }

    /// Play the selected frame until `hold` reads false at a frame boundary.
    ///
    /// Returns with the strip dark, waiting for [`Painter::stop`].
    pub fn play<F: FnMut() -> bool>(&mut self, hold: F) -> Result<PlaybackRate, Error> {
        self.ensure_ready()?;
        let index = self.selected.ok_or(Error::NoFrameSelected)?;
        self.play_frame(index, hold).map_err(|err| self.fail(err))
    }

    /// Acknowledge the end of playback
    pub fn stop(&mut self) -> Result<(), Error> {
        self.scheduler.acknowledge()
    }

    pub fn playback_state(&self) -> PlaybackState {
        self.scheduler.state()
    }

    /// Latched fatal error, if any
    pub const fn fault(&self) -> Option<Error> {
        self.fault
    }

    pub fn diagnostic(&self) -> Option<Diagnostic> {
        self.fault.as_ref().map(Error::diagnostic)
    }

    pub fn device_mut(&mut self) -> &mut D {
        &mut self.device
    }

    pub fn output_mut(&mut self) -> &mut O {
        self.scheduler.output_mut()
    }

    pub const fn settings_store(&self) -> &S {
        &self.settings_store
    }

    /// Brightness being edited in the menu
    pub const fn pending_brightness(&self) -> u8 {
        self.pending_brightness
    }

    /// Carry out a menu effect. `hold` is read during playback.
    pub fn apply<F: FnMut() -> bool>(&mut self, effect: MenuEffect, hold: F) -> Result<(), Error> {
        match effect {
            MenuEffect::None => {}
            MenuEffect::Play => {
                self.play(hold)?;
            }
            MenuEffect::Stop => self.stop()?,
            MenuEffect::Adjust(item, step) => self.adjust(item, step)?,
            MenuEffect::BeginBrightness => {
                self.pending_brightness = self.suggested_brightness.unwrap_or(self.requested_brightness);
            }
            MenuEffect::CommitBrightness => {
                self.set_brightness(self.pending_brightness)?;
            }
            MenuEffect::Rescan => {
                self.rescan()?;
            }
            MenuEffect::SaveConfig => self.save_settings()?,
        }
        Ok(())
    }

    fn adjust(&mut self, item: MenuItem, step: i8) -> Result<(), Error> {
        let up = step > 0;
        match item {
            MenuItem::FileSelect => {
                let count = self.store.len();
                if count == 0 {
                    return Err(Error::NoFrameSelected);
                }
                let current = usize::from(self.selected.unwrap_or(0));
                let next = if up {
                    (current + 1) % count
                } else {
                    (current + count - 1) % count
                };
                #[allow(clippy::cast_possible_truncation)]
                let next = next as FrameIndex;
                self.select_frame(next)?;
            }
            MenuItem::Brightness => {
                self.pending_brightness = step_u8(self.pending_brightness, BRIGHTNESS_STEP, up);
            }
            MenuItem::Speed => self.settings.speed = step_u8(self.settings.speed, SPEED_STEP, up),
            MenuItem::Delay => self.settings.delay = step_u8(self.settings.delay, 1, up),
            MenuItem::Start | MenuItem::SaveConfig => {}
        }
        Ok(())
    }

    fn play_frame<F: FnMut() -> bool>(&mut self, index: FrameIndex, hold: F) -> Result<PlaybackRate, Error> {
        let frame = self.store.frame_name(&mut self.device, index)?;
        self.scheduler.preload(&mut self.device, &frame, &mut self.buffer)?;

        if self.settings.delay > 0 {
            embassy_time::block_for(Duration::from_secs(u64::from(self.settings.delay)));
        }

        let rate = self.scheduler.start(self.settings.speed, self.ceiling)?;
        self.scheduler.run(&mut self.device, &mut self.buffer, hold)?;
        Ok(rate)
    }

    fn load_settings(&mut self, settings: Settings) {
        self.settings = settings;
        self.requested_brightness = settings.brightness;
        self.pending_brightness = settings.brightness;
        self.suggested_brightness = None;
    }

    /// Rebuild the frame index without touching frames, keeping a selection
    /// that is still in range
    fn index(&mut self) -> Result<usize, Error> {
        let previous = self.selected;
        let count = self
            .store
            .quick_scan(&mut self.device)
            .map_err(|err| self.fail(err))?;
        self.selected = previous.filter(|&index| usize::from(index) < count);
        if self.selected.is_none() {
            self.select_first();
        }
        Ok(count)
    }

    fn update_ceiling(&mut self) -> Result<(), Error> {
        self.ceiling = self
            .profiler
            .profile_all(&self.store, &mut self.device, &mut self.clock, &mut self.buffer)
            .map_err(|err| self.fail(err))?;
        Ok(())
    }

    fn select_first(&mut self) {
        self.selected = (!self.store.is_empty()).then_some(0);
    }

    /// The row buffer is only lent out while playback is idle
    fn ensure_idle(&self) -> Result<(), Error> {
        if self.scheduler.state() == PlaybackState::Idle {
            Ok(())
        } else {
            Err(Error::InvalidState)
        }
    }

    fn ensure_ready(&self) -> Result<(), Error> {
        match self.fault {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }

    /// Record `err`; fatal errors blank the strip and latch until a rescan
    fn fail(&mut self, err: Error) -> Error {
        if err.is_fatal() {
            self.scheduler.abort(&mut self.buffer);
            self.fault = Some(err);
            let diagnostic = err.diagnostic();
            log::error!("{} ({} / {})", err, diagnostic.title, diagnostic.detail);
            #[cfg(feature = "esp32-log")]
            println!("[Painter] fatal: {}", err);
        }
        err
    }
}

const fn step_u8(value: u8, step: u8, up: bool) -> u8 {
    if up {
        value.saturating_add(step)
    } else {
        value.saturating_sub(step)
    }
}
