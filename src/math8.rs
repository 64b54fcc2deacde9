/// Scale an 8-bit value by `(1 + scale) / 256`
///
/// `scale = 255` leaves the value untouched, `scale = 0` keeps `value / 256`
/// (which truncates to zero).
#[inline]
#[allow(clippy::cast_lossless)]
pub const fn scale8(value: u8, scale: u8) -> u8 {
    ((value as u16 * (1 + scale as u16)) >> 8) as u8
}

/// Map an 8-bit dial position linearly onto `min..=max`
///
/// Returns `max` when the range is empty or inverted.
#[inline]
pub const fn lerp_dial(dial: u8, min: u32, max: u32) -> u32 {
    if max <= min {
        return max;
    }
    let span = (max - min) as u64;
    min + ((span * dial as u64) / 255) as u32
}
