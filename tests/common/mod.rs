//! Host-side fakes for the hardware seams
#![allow(dead_code)]

use std::collections::VecDeque;

use myrtio_light_painter::storage::file_name;
use myrtio_light_painter::{
    BLOCK_SIZE, BlockDevice, Clock, DirEntry, Error, Extent, Instant, OutputDriver, RowBuffer,
    Settings, SettingsStore, StorageError, TickTimer,
};

#[derive(Debug, Clone)]
enum Contents {
    Bytes(Vec<u8>),
    Blocks(Extent),
}

#[derive(Debug, Clone)]
struct File {
    name: String,
    is_directory: bool,
    is_hidden: bool,
    fragmented: bool,
    contents: Contents,
}

/// FAT-like card: removed entries free their slot, new files take the
/// first free slot
#[derive(Debug, Default)]
pub struct RamDisk {
    slots: Vec<Option<File>>,
    blocks: Vec<RowBuffer>,
    pub block_reads: usize,
    pub block_writes: usize,
    pub fail_reads: bool,
    pub fail_writes_after: Option<usize>,
}

impl RamDisk {
    pub fn new() -> Self {
        Self::default()
    }

    fn insert(&mut self, file: File) {
        match self.slots.iter().position(Option::is_none) {
            Some(free) => self.slots[free] = Some(file),
            None => self.slots.push(Some(file)),
        }
    }

    pub fn add_file(&mut self, name: &str, bytes: Vec<u8>) {
        self.insert(File {
            name: name.into(),
            is_directory: false,
            is_hidden: false,
            fragmented: false,
            contents: Contents::Bytes(bytes),
        });
    }

    pub fn add_hidden(&mut self, name: &str, bytes: Vec<u8>) {
        self.add_file(name, bytes);
        self.find_mut(name).unwrap().is_hidden = true;
    }

    pub fn add_directory(&mut self, name: &str) {
        self.add_file(name, Vec::new());
        self.find_mut(name).unwrap().is_directory = true;
    }

    pub fn fragment(&mut self, name: &str) {
        self.find_mut(name).unwrap().fragmented = true;
    }

    pub fn exists(&self, name: &str) -> bool {
        self.find(name).is_some()
    }

    /// Blocks of a stored frame
    pub fn frame_rows(&self, name: &str) -> Vec<RowBuffer> {
        match &self.find(name).unwrap().contents {
            Contents::Blocks(extent) => {
                let first = extent.first_block as usize;
                self.blocks[first..first + extent.block_count as usize].to_vec()
            }
            Contents::Bytes(_) => panic!("{name} is not a frame"),
        }
    }

    fn find(&self, name: &str) -> Option<&File> {
        self.slots.iter().flatten().find(|file| file.name == name)
    }

    fn find_mut(&mut self, name: &str) -> Option<&mut File> {
        self.slots.iter_mut().flatten().find(|file| file.name == name)
    }

    fn dir_entry(file: &File, position: usize) -> DirEntry {
        DirEntry {
            name: file_name(&file.name).unwrap(),
            is_directory: file.is_directory,
            is_hidden: file.is_hidden,
            position: u16::try_from(position).unwrap(),
        }
    }
}

impl BlockDevice for RamDisk {
    fn read_block(&mut self, block: u32, buf: &mut RowBuffer) -> Result<(), StorageError> {
        if self.fail_reads {
            return Err(StorageError::Read);
        }
        self.block_reads += 1;
        let source = self.blocks.get(block as usize).ok_or(StorageError::Read)?;
        buf.copy_from_slice(source);
        Ok(())
    }

    fn write_block(&mut self, block: u32, buf: &RowBuffer) -> Result<(), StorageError> {
        if self.fail_writes_after.is_some_and(|limit| self.block_writes >= limit) {
            return Err(StorageError::Write);
        }
        self.block_writes += 1;
        let target = self.blocks.get_mut(block as usize).ok_or(StorageError::Write)?;
        target.copy_from_slice(buf);
        Ok(())
    }

    fn allocate_contiguous(&mut self, name: &str, size: u32) -> Result<u32, StorageError> {
        if self.exists(name) {
            return Err(StorageError::Allocate);
        }
        let first_block = u32::try_from(self.blocks.len()).unwrap();
        let block_count = size.div_ceil(BLOCK_SIZE as u32);
        self.blocks
            .extend(std::iter::repeat_n([0u8; BLOCK_SIZE], block_count as usize));
        self.insert(File {
            name: name.into(),
            is_directory: false,
            is_hidden: false,
            fragmented: false,
            contents: Contents::Blocks(Extent {
                first_block,
                block_count,
            }),
        });
        Ok(first_block)
    }

    fn remove(&mut self, name: &str) -> Result<(), StorageError> {
        let position = self
            .slots
            .iter()
            .position(|slot| matches!(slot, Some(file) if file.name == name))
            .ok_or(StorageError::NotFound)?;
        self.slots[position] = None;
        Ok(())
    }

    fn entry(&mut self, cursor: usize) -> Result<Option<DirEntry>, StorageError> {
        Ok(self
            .slots
            .iter()
            .enumerate()
            .filter_map(|(position, slot)| slot.as_ref().map(|file| (position, file)))
            .nth(cursor)
            .map(|(position, file)| Self::dir_entry(file, position)))
    }

    fn entry_at(&mut self, position: u16) -> Result<DirEntry, StorageError> {
        self.slots
            .get(usize::from(position))
            .and_then(Option::as_ref)
            .map(|file| Self::dir_entry(file, usize::from(position)))
            .ok_or(StorageError::NotFound)
    }

    fn read_at(&mut self, name: &str, offset: u32, buf: &mut [u8]) -> Result<usize, StorageError> {
        if self.fail_reads {
            return Err(StorageError::Read);
        }
        let file = self.find(name).ok_or(StorageError::NotFound)?;
        let Contents::Bytes(bytes) = &file.contents else {
            return Err(StorageError::Open);
        };
        let start = (offset as usize).min(bytes.len());
        let count = buf.len().min(bytes.len() - start);
        buf[..count].copy_from_slice(&bytes[start..start + count]);
        Ok(count)
    }

    fn contiguous_extent(&mut self, name: &str) -> Result<Option<Extent>, StorageError> {
        let file = self.find(name).ok_or(StorageError::NotFound)?;
        match file.contents {
            Contents::Blocks(extent) if !file.fragmented => Ok(Some(extent)),
            _ => Ok(None),
        }
    }
}

/// Encode a 24-bit bitmap. `pixel(x, y)` returns `[r, g, b]`, with `y`
/// counted from the bottom row.
pub fn bitmap(width: u32, height: i32, pixel: impl Fn(u32, u32) -> [u8; 3]) -> Vec<u8> {
    bitmap_with(width, height, 1, 24, 0, pixel)
}

pub fn bitmap_with(
    width: u32,
    height: i32,
    planes: u16,
    bit_depth: u16,
    compression: u32,
    pixel: impl Fn(u32, u32) -> [u8; 3],
) -> Vec<u8> {
    let rows = height.unsigned_abs();
    let stride = (width * 3).div_ceil(4) * 4;
    let data_len = stride * rows;

    let mut out = Vec::new();
    out.extend_from_slice(b"BM");
    out.extend_from_slice(&(54 + data_len).to_le_bytes());
    out.extend_from_slice(&[0; 4]);
    out.extend_from_slice(&54u32.to_le_bytes());
    out.extend_from_slice(&40u32.to_le_bytes());
    out.extend_from_slice(&width.to_le_bytes());
    out.extend_from_slice(&height.to_le_bytes());
    out.extend_from_slice(&planes.to_le_bytes());
    out.extend_from_slice(&bit_depth.to_le_bytes());
    out.extend_from_slice(&compression.to_le_bytes());
    out.extend_from_slice(&data_len.to_le_bytes());
    out.extend_from_slice(&[0; 16]);
    assert_eq!(out.len(), 54);

    for stored in 0..rows {
        let y = if height < 0 { rows - 1 - stored } else { stored };
        for x in 0..width {
            let [r, g, b] = pixel(x, y);
            out.extend_from_slice(&[b, g, r]);
        }
        out.extend(std::iter::repeat_n(0u8, (stride - width * 3) as usize));
    }
    out
}

/// Timer whose period always already elapsed
#[derive(Debug, Default)]
pub struct InstantTimer {
    pub period: Option<u32>,
    pub overflows: usize,
    pub stopped: bool,
}

impl TickTimer for InstantTimer {
    fn start(&mut self, period_ticks: u32) {
        self.period = Some(period_ticks);
        self.stopped = false;
    }

    fn poll_overflow(&mut self) -> bool {
        self.overflows += 1;
        true
    }

    fn stop(&mut self) {
        self.stopped = true;
    }
}

/// Records every transmitted row
#[derive(Debug, Default)]
pub struct RecordingOutput {
    pub rows: Vec<Vec<u8>>,
}

impl OutputDriver for RecordingOutput {
    fn transmit(&mut self, bytes: &[u8]) {
        self.rows.push(bytes.to_vec());
    }
}

/// Clock replaying scripted timestamps (µs), repeating the last one
#[derive(Debug, Default)]
pub struct ScriptClock {
    pub ticks: VecDeque<u64>,
    last: u64,
}

impl ScriptClock {
    pub fn new(ticks: &[u64]) -> Self {
        Self {
            ticks: ticks.iter().copied().collect(),
            last: 0,
        }
    }
}

impl Clock for ScriptClock {
    fn now(&mut self) -> Instant {
        if let Some(next) = self.ticks.pop_front() {
            self.last = next;
        }
        Instant::from_micros(self.last)
    }
}

#[derive(Debug, Default)]
pub struct MemorySettings {
    pub stored: Option<Settings>,
    pub saves: usize,
}

impl SettingsStore for MemorySettings {
    fn load(&mut self) -> Result<Option<Settings>, Error> {
        Ok(self.stored)
    }

    fn save(&mut self, settings: &Settings) -> Result<(), Error> {
        self.stored = Some(*settings);
        self.saves += 1;
        Ok(())
    }
}
