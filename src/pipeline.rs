//! Bitmap to frame conversion
//!
//! Each source row goes through brightness scaling, gamma correction, ordered
//! dithering and channel reordering, then is written to its own storage
//! block. Only one row is held in memory at a time: the caller's working
//! buffer.

use crate::bitmap::{BitmapHeader, HEADER_LEN};
use crate::config::{ChannelOrder, PainterConfig};
use crate::dither::{dither, truncate};
use crate::error::{Error, FormatError, StorageError};
use crate::gamma::GammaTable;
use crate::geometry::CropWindow;
use crate::math8::scale8;
use crate::storage::{BLOCK_SIZE, BlockDevice, Extent, RowBuffer};

/// Current drawn by one channel per output step, in µA (20 mA at 255)
pub const MICROAMPS_PER_STEP: u32 = 78;

/// Outcome of processing one image
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ImageReport {
    /// Rows in the frame, equal to the absolute image height
    pub rows: usize,
    /// Largest sum of corrected channel values over any row
    pub max_row_sum: u32,
    /// Peak strip current predicted for the brightest row
    pub estimated_current_ma: u32,
    /// Brightness that keeps this image within the current budget
    pub suggested_brightness: u8,
}

impl ImageReport {
    pub const fn exceeds_budget(&self, brightness: u8) -> bool {
        self.suggested_brightness < brightness
    }
}

/// Color pipeline, built once per configuration
#[derive(Debug, Clone)]
pub struct ColorPipeline {
    gamma: GammaTable,
    order: ChannelOrder,
    dither: bool,
    strip_length: usize,
    current_budget_ma: u32,
    current_correction: u32,
}

impl ColorPipeline {
    pub fn new(config: &PainterConfig) -> Self {
        Self {
            gamma: GammaTable::new(config.gamma),
            order: config.channel_order,
            dither: config.dither,
            strip_length: config.strip_length,
            current_budget_ma: config.current_budget_ma,
            current_correction: config.current_correction,
        }
    }

    /// Convert `source` and, when `output` is given, store the frame under
    /// that name, replacing any previous frame.
    ///
    /// Nothing is written unless the header is valid and the file holds
    /// every pixel row. A failure after allocation leaves a partial frame
    /// behind.
    #[allow(clippy::cast_possible_truncation)]
    pub fn process<D: BlockDevice>(
        &self,
        device: &mut D,
        source: &str,
        output: Option<&str>,
        brightness: u8,
        buffer: &mut RowBuffer,
    ) -> Result<ImageReport, Error> {
        let mut raw = [0u8; HEADER_LEN];
        let read = device.read_at(source, 0, &mut raw)?;
        let header = BitmapHeader::parse(&raw[..read])?;
        let window = CropWindow::new(header.width, self.strip_length);

        // A short file must fail before the old frame is replaced
        let mut last = [0u8; 1];
        if device.read_at(source, header.data_end - 1, &mut last)? == 0 {
            return Err(FormatError::Truncated.into());
        }

        let extent = match output {
            Some(name) => Some(allocate_frame(device, name, header.height)?),
            None => None,
        };

        let mut max_row_sum = 0;
        for row in 0..header.height {
            let sum = self.load_row(device, source, &header, window, row, brightness, buffer)?;
            max_row_sum = max_row_sum.max(sum);
            if let Some(block) = extent.and_then(|extent| extent.block(row as u32)) {
                device.write_block(block, buffer)?;
            }
        }

        let estimated_current_ma = self.estimate_current_ma(max_row_sum);
        let report = ImageReport {
            rows: header.height,
            max_row_sum,
            estimated_current_ma,
            suggested_brightness: self.suggest_brightness(brightness, estimated_current_ma),
        };
        log::debug!(
            "{}: {} rows, {}x{} cropped at {}, peak {} mA",
            source,
            report.rows,
            header.width,
            header.height,
            window.skip,
            report.estimated_current_ma
        );
        Ok(report)
    }

    /// Peak current for a row whose corrected channels sum to `row_sum`
    #[allow(clippy::cast_possible_truncation)]
    pub const fn estimate_current_ma(&self, row_sum: u32) -> u32 {
        let microamps = row_sum as u64 * MICROAMPS_PER_STEP as u64;
        (microamps / (10 * self.current_correction as u64)) as u32
    }

    /// Scale `brightness` down so `estimated_ma` fits the budget
    #[allow(clippy::cast_possible_truncation)]
    pub const fn suggest_brightness(&self, brightness: u8, estimated_ma: u32) -> u8 {
        if estimated_ma <= self.current_budget_ma {
            return brightness;
        }
        (brightness as u64 * self.current_budget_ma as u64 / estimated_ma as u64) as u8
    }

    /// Decode the `row`-th row from the bottom into `buffer`, corrected and
    /// laid out for the strip. Returns the row's channel sum.
    #[allow(clippy::too_many_arguments)]
    fn load_row<D: BlockDevice>(
        &self,
        device: &mut D,
        source: &str,
        header: &BitmapHeader,
        window: CropWindow,
        row: usize,
        brightness: u8,
        buffer: &mut RowBuffer,
    ) -> Result<u32, Error> {
        buffer.fill(0);
        let start = window.offset * 3;
        let pixels = &mut buffer[start..start + window.active * 3];

        let offset = u32::try_from(window.skip * 3)
            .ok()
            .zip(header.row_offset_from_bottom(row))
            .and_then(|(skip, row_offset)| row_offset.checked_add(skip))
            .ok_or(FormatError::DataRange)?;
        if device.read_at(source, offset, pixels)? < pixels.len() {
            return Err(StorageError::Read.into());
        }
        Ok(self.correct_row(pixels, row, window.offset, brightness))
    }

    /// Correct BGR pixels in place, rewriting them in wire order
    pub fn correct_row(&self, pixels: &mut [u8], row: usize, first_column: usize, brightness: u8) -> u32 {
        let mut sum = 0;
        for (i, pixel) in pixels.chunks_exact_mut(3).enumerate() {
            let column = first_column + i;
            let b = self.correct(pixel[0], brightness, row, column);
            let g = self.correct(pixel[1], brightness, row, column);
            let r = self.correct(pixel[2], brightness, row, column);
            sum += u32::from(r) + u32::from(g) + u32::from(b);
            pixel.copy_from_slice(&self.order.arrange(r, g, b));
        }
        sum
    }

    #[inline]
    fn correct(&self, level: u8, brightness: u8, row: usize, column: usize) -> u8 {
        let level = self.gamma.get(scale8(level, brightness));
        if self.dither {
            dither(level, row, column)
        } else {
            truncate(level)
        }
    }
}

/// Replace `name` with a fresh contiguous frame of `rows` blocks
#[allow(clippy::cast_possible_truncation)]
fn allocate_frame<D: BlockDevice>(device: &mut D, name: &str, rows: usize) -> Result<Extent, Error> {
    match device.remove(name) {
        Ok(()) | Err(StorageError::NotFound) => {}
        Err(err) => return Err(err.into()),
    }
    let block_count = rows as u32;
    let first_block = device.allocate_contiguous(name, block_count * BLOCK_SIZE as u32)?;
    Ok(Extent {
        first_block,
        block_count,
    })
}
