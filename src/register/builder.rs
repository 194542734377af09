use core::marker::PhantomData;

use bitmaps::{Bits, BitsImpl};
use embedded_hal::{digital::OutputPin, spi::SpiBus};

use crate::register::{BitBang, ShiftError, ShiftRegister, transport::ShiftOut};

// Builder states
pub struct NeedChips;
pub struct NeedTransport;
pub struct NeedLatch;
pub struct Ready;

/// Step-by-step configuration of a [`ShiftRegister`].
///
/// ```rust
/// # use embedded_hal::spi::SpiBus;
/// # use embedded_hc595::prelude::*;
/// # fn demo<SPI: SpiBus<u8>, L: OutputPin>(spi_bus: SPI, latch_pin: L) -> Result<(), ShiftError> {
/// let register = ShiftRegisterBuilder::new()
///     .chips::<2>()
///     .spi(spi_bus)
///     .latch(latch_pin)
///     .initial_registers([0x00, 0xFF])
///     .build()?;
/// assert!(register.get_bit(8)?);
/// # Ok(())
/// # }
/// ```
pub struct ShiftRegisterBuilder<T, L, const CHIPS: usize, State> {
    transport: T,
    latch: L,
    registers: [u8; CHIPS],
    _state: PhantomData<State>,
}

impl Default for ShiftRegisterBuilder<(), (), 0, NeedChips> {
    fn default() -> Self {
        Self::new()
    }
}

// Start the builder
impl ShiftRegisterBuilder<(), (), 0, NeedChips> {
    pub fn new() -> Self {
        ShiftRegisterBuilder {
            transport: (),
            latch: (),
            registers: [],
            _state: PhantomData,
        }
    }

    /// Set the number of daisy-chained chips.
    pub fn chips<const CHIPS: usize>(self) -> ShiftRegisterBuilder<(), (), CHIPS, NeedTransport> {
        ShiftRegisterBuilder {
            transport: (),
            latch: (),
            registers: [0; CHIPS],
            _state: PhantomData,
        }
    }
}

// Set transport
impl<const CHIPS: usize> ShiftRegisterBuilder<(), (), CHIPS, NeedTransport> {
    /// Use any [`ShiftOut`] implementation as the serial transport.
    pub fn transport<T: ShiftOut>(
        self,
        transport: T,
    ) -> ShiftRegisterBuilder<T, (), CHIPS, NeedLatch> {
        ShiftRegisterBuilder {
            transport,
            latch: (),
            registers: self.registers,
            _state: PhantomData,
        }
    }

    /// Drive SER/SRCLK from an SPI bus (MOSI and SCK).
    pub fn spi<SPI: SpiBus<u8>>(
        self,
        bus: SPI,
    ) -> ShiftRegisterBuilder<SPI, (), CHIPS, NeedLatch> {
        self.transport(bus)
    }

    /// Drive SER/SRCLK from two plain output pins.
    pub fn bit_bang<CLK, DATA>(
        self,
        clock: CLK,
        data: DATA,
    ) -> ShiftRegisterBuilder<BitBang<CLK, DATA>, (), CHIPS, NeedLatch>
    where
        CLK: OutputPin,
        DATA: OutputPin,
    {
        self.transport(BitBang::new(clock, data))
    }
}

// Set latch
impl<T: ShiftOut, const CHIPS: usize> ShiftRegisterBuilder<T, (), CHIPS, NeedLatch> {
    /// Set the RCLK (storage register clock) line.
    pub fn latch<L: OutputPin>(self, latch: L) -> ShiftRegisterBuilder<T, L, CHIPS, Ready> {
        ShiftRegisterBuilder {
            transport: self.transport,
            latch,
            registers: self.registers,
            _state: PhantomData,
        }
    }
}

// Build the final driver
impl<T, L, const CHIPS: usize> ShiftRegisterBuilder<T, L, CHIPS, Ready>
where
    T: ShiftOut,
    L: OutputPin,
    BitsImpl<CHIPS>: Bits,
{
    /// State committed during [`build`](Self::build). Defaults to all low.
    pub fn initial_registers(mut self, registers: [u8; CHIPS]) -> Self {
        self.registers = registers;
        self
    }

    /// Build the driver and commit the initial state.
    ///
    /// # Errors
    /// * [`ShiftError::Transport`] - if the initial commit fails
    pub fn build(self) -> Result<ShiftRegister<T, L, CHIPS>, ShiftError> {
        ShiftRegister::with_registers(self.transport, self.latch, self.registers)
    }
}
