//! Bit addressing for the output buffer.
//!
//! Bit `i` of the chain lives in byte `i / 8`, on output `Q(i % 8)` of the
//! chip that byte is shifted into. Bytes go out in index order, each one
//! MSB first, so byte 0 ends up in the chip farthest from the controller
//! and byte `CHIPS - 1` in the chip wired directly to it.

use crate::register::ShiftError;

/// Resolves a chain bit index to its byte offset and bit mask.
///
/// # Errors
/// * [`ShiftError::OutOfRange`] - if `index >= 8 * CHIPS`
///
/// # Example
/// ```
/// use embedded_hc595::register::helpers::bit_position;
///
/// // Bit 11 of a two-chip chain is Q3 of byte 1
/// assert_eq!(bit_position::<2>(11), Ok((1, 0b0000_1000)));
/// assert!(bit_position::<2>(16).is_err());
/// ```
pub fn bit_position<const CHIPS: usize>(index: usize) -> Result<(usize, u8), ShiftError> {
    if index >= pin_count::<CHIPS>() {
        return Err(ShiftError::OutOfRange);
    }
    Ok((index / 8, 1 << (index % 8)))
}

/// Number of addressable outputs in a chain of `CHIPS` chips.
#[inline]
pub const fn pin_count<const CHIPS: usize>() -> usize {
    CHIPS * 8
}
