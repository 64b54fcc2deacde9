//! Single-wire LED protocol encoder
//!
//! Each data bit is sent as four line symbols on a serial peripheral clocked
//! at [`SYMBOL_RATE_HZ`]: `1110` for a one and `1000` for a zero. That gives a
//! 1.25 µs bit period with high times of 937.5 ns and 312.5 ns, a 3:1 ratio.
//! Bits go out most significant first, bytes in buffer order.
//!
//! The strip latches once the line stays low for more than ~50 µs. The
//! scheduler's block read between rows always exceeds that, so no reset
//! delay is emitted here.

use core::convert::Infallible;

use smart_leds::{RGB8, SmartLedsWrite};

use crate::OutputDriver;
use crate::config::ChannelOrder;

/// Serial clock the symbol stream is designed for
pub const SYMBOL_RATE_HZ: u32 = 3_200_000;

/// Line symbols per data bit
pub const SYMBOLS_PER_BIT: usize = 4;

/// Encoded bytes per data byte
pub const ENCODED_LEN: usize = SYMBOLS_PER_BIT;

/// Symbol pairs for two data bits, indexed by their value
const PATTERNS: [u8; 4] = [0b1000_1000, 0b1000_1110, 0b1110_1000, 0b1110_1110];

/// Serial peripheral shifting symbols onto the data line, MSB first
pub trait SymbolWriter {
    /// Queue symbols for transmission. Must not return before the last
    /// symbol has been handed to the hardware.
    fn write_symbols(&mut self, symbols: &[u8]);
}

/// Encode one data byte. Cost and output length do not depend on the value.
#[inline]
pub const fn encode_byte(byte: u8) -> [u8; ENCODED_LEN] {
    [
        PATTERNS[(byte >> 6) as usize & 0b11],
        PATTERNS[(byte >> 4) as usize & 0b11],
        PATTERNS[(byte >> 2) as usize & 0b11],
        PATTERNS[byte as usize & 0b11],
    ]
}

/// Drives one strip through a [`SymbolWriter`]
#[derive(Debug)]
pub struct ProtocolEncoder<W: SymbolWriter> {
    writer: W,
    order: ChannelOrder,
}

impl<W: SymbolWriter> ProtocolEncoder<W> {
    /// `order` only applies to [`SmartLedsWrite`]; rows passed to
    /// [`OutputDriver::transmit`] are already in wire order.
    pub const fn new(writer: W, order: ChannelOrder) -> Self {
        Self { writer, order }
    }

    pub fn writer(&self) -> &W {
        &self.writer
    }

    pub fn into_inner(self) -> W {
        self.writer
    }

    fn send_pixel(&mut self, bytes: [u8; 3]) {
        let mut chunk = [0u8; 3 * ENCODED_LEN];
        for (slot, byte) in chunk.chunks_exact_mut(ENCODED_LEN).zip(bytes) {
            slot.copy_from_slice(&encode_byte(byte));
        }
        self.writer.write_symbols(&chunk);
    }
}

impl<W: SymbolWriter> OutputDriver for ProtocolEncoder<W> {
    /// Send a row of wire-ordered bytes with interrupts held off, so no
    /// handler can stretch a pulse past tolerance.
    fn transmit(&mut self, bytes: &[u8]) {
        critical_section::with(|_| {
            let mut pixels = bytes.chunks_exact(3);
            for pixel in pixels.by_ref() {
                self.send_pixel([pixel[0], pixel[1], pixel[2]]);
            }
            for &byte in pixels.remainder() {
                self.writer.write_symbols(&encode_byte(byte));
            }
        });
    }
}

impl<W: SymbolWriter> SmartLedsWrite for ProtocolEncoder<W> {
    type Error = Infallible;
    type Color = RGB8;

    fn write<T, I>(&mut self, iterator: T) -> Result<(), Self::Error>
    where
        T: IntoIterator<Item = I>,
        I: Into<Self::Color>,
    {
        let order = self.order;
        critical_section::with(|_| {
            for color in iterator {
                let RGB8 { r, g, b } = color.into();
                self.send_pixel(order.arrange(r, g, b));
            }
        });
        Ok(())
    }
}
