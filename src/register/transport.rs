use embedded_hal::{
    digital::{OutputPin, PinState},
    spi::{Error as _, SpiBus},
};

use crate::register::TransportError;

/// Synchronous serial transport that clocks a frame into the chain.
///
/// Implementations shift every byte MSB first and return only once the
/// last clock edge has gone out. Any failure aborts the frame; the caller
/// never latches an aborted frame.
pub trait ShiftOut {
    fn shift_out(&mut self, frame: &[u8]) -> Result<(), TransportError>;
}

impl<SPI> ShiftOut for SPI
where
    SPI: SpiBus<u8>,
{
    fn shift_out(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        self.write(frame)
            .map_err(|err| TransportError::Bus(err.kind()))?;
        self.flush().map_err(|err| TransportError::Bus(err.kind()))
    }
}

/// GPIO-only transport: drives SER and SRCLK directly.
///
/// Data is presented on `data` while `clock` is low and sampled by the
/// chip on the rising clock edge. The clock idles low.
#[derive(Debug)]
pub struct BitBang<CLK, DATA> {
    clock: CLK,
    data: DATA,
}

impl<CLK, DATA> BitBang<CLK, DATA>
where
    CLK: OutputPin,
    DATA: OutputPin,
{
    pub fn new(clock: CLK, data: DATA) -> Self {
        Self { clock, data }
    }

    /// Gives the clock and data lines back.
    pub fn release(self) -> (CLK, DATA) {
        (self.clock, self.data)
    }

    fn shift_byte(&mut self, byte: u8) -> Result<(), TransportError> {
        for bit in (0..8).rev() {
            let level = PinState::from(byte & (1 << bit) != 0);
            self.data.set_state(level).map_err(pin_error)?;
            self.clock.set_high().map_err(pin_error)?;
            self.clock.set_low().map_err(pin_error)?;
        }
        Ok(())
    }
}

impl<CLK, DATA> ShiftOut for BitBang<CLK, DATA>
where
    CLK: OutputPin,
    DATA: OutputPin,
{
    fn shift_out(&mut self, frame: &[u8]) -> Result<(), TransportError> {
        self.clock.set_low().map_err(pin_error)?;
        for &byte in frame {
            self.shift_byte(byte)?;
        }
        Ok(())
    }
}

fn pin_error<E: embedded_hal::digital::Error>(err: E) -> TransportError {
    TransportError::Pin(err.kind())
}
