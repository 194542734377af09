use embedded_hal::{digital, spi};

/// Errors that can occur while driving the shift register chain.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ShiftError {
    /// A write was attempted from inside a [`modify`] batch on the same
    /// controller. Nothing was changed or shifted.
    ///
    /// [`modify`]: crate::register::ShiftRegister::modify
    Busy,
    /// Bit index outside `0..8 * CHIPS`.
    OutOfRange,
    /// The bus or latch line failed during a commit.
    ///
    /// The in-memory buffer already holds the requested state; calling
    /// `commit` again retries without re-specifying any bits.
    Transport(TransportError),
}

/// Which hardware line failed during a commit, with the HAL's error kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum TransportError {
    /// SPI bus write or flush failed.
    Bus(spi::ErrorKind),
    /// A bit-banged clock or data line failed.
    Pin(digital::ErrorKind),
    /// The latch line could not be driven.
    Latch(digital::ErrorKind),
}

impl From<TransportError> for ShiftError {
    fn from(err: TransportError) -> Self {
        ShiftError::Transport(err)
    }
}

impl core::fmt::Display for ShiftError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            ShiftError::Busy => write!(f, "controller is inside a batch update"),
            ShiftError::OutOfRange => write!(f, "bit index exceeds chain width"),
            ShiftError::Transport(err) => write!(f, "commit failed: {err}"),
        }
    }
}

impl core::fmt::Display for TransportError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            TransportError::Bus(kind) => write!(f, "bus error: {kind}"),
            TransportError::Pin(kind) => write!(f, "clock/data line error: {kind}"),
            TransportError::Latch(kind) => write!(f, "latch line error: {kind}"),
        }
    }
}

impl core::error::Error for ShiftError {}

impl core::error::Error for TransportError {}

impl digital::Error for ShiftError {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}
