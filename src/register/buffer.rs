use bitmaps::{Bitmap, Bits, BitsImpl};

use crate::register::{ShiftError, helpers::bit_position};

/// Commanded state of every output in the chain.
///
/// One byte per chip plus a per-chip record of which bytes were written
/// since the last successful commit. The pending record never shortens a
/// commit: the whole buffer is always shifted out.
#[derive(Clone)]
pub struct OutputBuffer<const CHIPS: usize>
where
    BitsImpl<CHIPS>: Bits,
{
    bytes: [u8; CHIPS],
    pending: Bitmap<CHIPS>,
}

impl<const CHIPS: usize> core::fmt::Debug for OutputBuffer<CHIPS>
where
    BitsImpl<CHIPS>: Bits,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("OutputBuffer")
            .field("bytes", &self.bytes)
            .field("synced", &self.is_synced())
            .finish()
    }
}

impl<const CHIPS: usize> OutputBuffer<CHIPS>
where
    BitsImpl<CHIPS>: Bits,
{
    /// Starts from `bytes` with every chip pending, since the hardware
    /// has not seen this state yet.
    pub(crate) fn new(bytes: [u8; CHIPS]) -> Self {
        Self {
            bytes,
            pending: Bitmap::mask(CHIPS),
        }
    }

    /// Returns the commanded level of output `index`.
    pub fn get(&self, index: usize) -> Result<bool, ShiftError> {
        let (byte, mask) = bit_position::<CHIPS>(index)?;
        Ok(self.bytes[byte] & mask != 0)
    }

    /// Sets output `index` to `value`. Leaves the buffer untouched on error.
    pub fn set(&mut self, index: usize, value: bool) -> Result<(), ShiftError> {
        let (byte, mask) = bit_position::<CHIPS>(index)?;
        if value {
            self.bytes[byte] |= mask;
        } else {
            self.bytes[byte] &= !mask;
        }
        self.pending.set(byte, true);
        Ok(())
    }

    /// Inverts output `index` and returns its new level.
    pub fn toggle(&mut self, index: usize) -> Result<bool, ShiftError> {
        let (byte, mask) = bit_position::<CHIPS>(index)?;
        self.bytes[byte] ^= mask;
        self.pending.set(byte, true);
        Ok(self.bytes[byte] & mask != 0)
    }

    /// Drives every output in the chain to `value`.
    pub fn set_all(&mut self, value: bool) {
        self.replace([if value { 0xFF } else { 0x00 }; CHIPS]);
    }

    /// Replaces the whole buffer, one byte per chip.
    pub fn replace(&mut self, bytes: [u8; CHIPS]) {
        self.bytes = bytes;
        self.pending = Bitmap::mask(CHIPS);
    }

    /// Raw byte view in wire order.
    #[inline]
    pub fn as_bytes(&self) -> &[u8; CHIPS] {
        &self.bytes
    }

    /// Returns true if the last commit delivered every written byte.
    #[inline]
    pub fn is_synced(&self) -> bool {
        self.pending.is_empty()
    }

    /// Returns true if chip `chip` has writes not yet latched.
    ///
    /// After a failed commit, a chip that is not pending still shows its
    /// commanded outputs, since nothing for it changed since the last
    /// successful latch. Only pending chips may be stale.
    pub fn is_pending(&self, chip: usize) -> Result<bool, ShiftError> {
        if chip >= CHIPS {
            return Err(ShiftError::OutOfRange);
        }
        Ok(self.pending.get(chip))
    }

    pub(crate) fn level(&self, index: usize) -> bool {
        self.bytes[index / 8] & (1 << (index % 8)) != 0
    }

    pub(crate) fn mark_synced(&mut self) {
        self.pending = Bitmap::new();
    }
}
