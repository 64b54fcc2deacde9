//! Frame index
//!
//! Frames are identified by a small index into a table of directory
//! positions. Names are looked up from the device on demand so the table
//! stays two bytes per frame.

use heapless::Vec;

use crate::error::{Error, StorageError};
use crate::pipeline::ColorPipeline;
use crate::storage::{BlockDevice, DirEntry, FileName, RowBuffer, file_name};

/// Handle of a frame within the current scan
pub type FrameIndex = u8;

/// Frames one scan can index. Counts must fit a `u8` in persisted settings.
pub const MAX_FRAMES: usize = 255;

/// Suffix of source images
pub const SOURCE_SUFFIX: &str = ".BMP";

/// Suffix of processed frames
pub const FRAME_SUFFIX: &str = ".RAW";

/// Result of a full scan
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ScanReport {
    /// Frames indexed and regenerated
    pub frames: usize,
    /// Lowest brightness any image asked for, if one exceeded the budget
    pub suggested_brightness: Option<u8>,
}

/// Whether `name` carries the source suffix (case-insensitive)
pub fn is_source_name(name: &str) -> bool {
    source_stem(name).is_some()
}

/// Name without the source suffix, shown to the operator
pub fn source_stem(name: &str) -> Option<&str> {
    let split = name.len().checked_sub(SOURCE_SUFFIX.len())?;
    if split == 0 || !name.is_char_boundary(split) {
        return None;
    }
    let (stem, suffix) = name.split_at(split);
    suffix.eq_ignore_ascii_case(SOURCE_SUFFIX).then_some(stem)
}

/// Storage name of the frame generated from `source`
pub fn frame_file_name(source: &str) -> Option<FileName> {
    let mut name = file_name(source_stem(source)?)?;
    name.push_str(FRAME_SUFFIX).ok()?;
    Some(name)
}

const fn is_eligible(entry: &DirEntry) -> bool {
    !entry.is_directory && !entry.is_hidden
}

/// Table of indexed frames, holding at most `N`
#[derive(Debug, Default)]
pub struct FrameStore<const N: usize> {
    positions: Vec<u16, N>,
}

impl<const N: usize> FrameStore<N> {
    pub const fn new() -> Self {
        Self {
            positions: Vec::new(),
        }
    }

    pub fn len(&self) -> usize {
        self.positions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.positions.is_empty()
    }

    /// Forget all frames
    pub fn clear(&mut self) {
        self.positions.clear();
    }

    /// Directory position backing `index`
    pub fn position(&self, index: FrameIndex) -> Result<u16, Error> {
        self.positions
            .get(usize::from(index))
            .copied()
            .ok_or(Error::IndexOutOfRange {
                index: usize::from(index),
                count: self.len(),
            })
    }

    /// Rebuild the index without touching frames
    ///
    /// Only valid while neither the files nor the brightness changed since
    /// the last full scan.
    pub fn quick_scan<D: BlockDevice>(&mut self, device: &mut D) -> Result<usize, Error> {
        self.index_entries(device, |_, _| Ok(()))?;
        log::info!("quick scan: {} frames", self.len());
        Ok(self.len())
    }

    /// Rebuild the index and regenerate every frame at `brightness`
    pub fn full_scan<D: BlockDevice>(
        &mut self,
        device: &mut D,
        pipeline: &ColorPipeline,
        brightness: u8,
        buffer: &mut RowBuffer,
    ) -> Result<ScanReport, Error> {
        let mut suggested_brightness: Option<u8> = None;
        self.index_entries(device, |device, entry| {
            let output = frame_file_name(&entry.name).ok_or(StorageError::Open)?;
            let report = pipeline.process(device, &entry.name, Some(output.as_str()), brightness, buffer)?;
            if report.exceeds_budget(brightness) {
                log::warn!(
                    "{}: {} mA over budget, brightness {} suggested",
                    entry.name,
                    report.estimated_current_ma,
                    report.suggested_brightness
                );
                let lowest = suggested_brightness.map_or(report.suggested_brightness, |current| {
                    current.min(report.suggested_brightness)
                });
                suggested_brightness = Some(lowest);
            }
            Ok(())
        })?;

        log::info!("full scan: {} frames at brightness {}", self.len(), brightness);
        Ok(ScanReport {
            frames: self.len(),
            suggested_brightness,
        })
    }

    /// Name of the source image behind `index`
    pub fn source_name<D: BlockDevice>(&self, device: &mut D, index: FrameIndex) -> Result<FileName, Error> {
        let position = self.position(index)?;
        Ok(device.entry_at(position)?.name)
    }

    /// Storage name of the frame behind `index`
    pub fn frame_name<D: BlockDevice>(&self, device: &mut D, index: FrameIndex) -> Result<FileName, Error> {
        let source = self.source_name(device, index)?;
        frame_file_name(&source).ok_or(Error::Storage(StorageError::NotFound))
    }

    /// Operator-facing name of `index`
    pub fn display_name<D: BlockDevice>(&self, device: &mut D, index: FrameIndex) -> Result<FileName, Error> {
        let source = self.source_name(device, index)?;
        source_stem(&source)
            .and_then(file_name)
            .ok_or(Error::Storage(StorageError::NotFound))
    }

    /// Walk the directory in storage order, indexing every source image and
    /// handing it to `visit`. The table is rebuilt from scratch.
    fn index_entries<D, F>(&mut self, device: &mut D, mut visit: F) -> Result<(), Error>
    where
        D: BlockDevice,
        F: FnMut(&mut D, &DirEntry) -> Result<(), Error>,
    {
        self.positions.clear();
        let mut cursor = 0;
        while let Some(entry) = device.entry(cursor)? {
            cursor += 1;
            if !is_eligible(&entry) || !is_source_name(&entry.name) {
                continue;
            }
            if self.positions.push(entry.position).is_err() {
                log::error!("frame table full at {}", entry.name);
                return Err(Error::CapacityExceeded { capacity: N });
            }
            visit(device, &entry)?;
        }
        Ok(())
    }
}
