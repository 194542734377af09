use core::cell::RefCell;

use bitmaps::{Bits, BitsImpl};
use critical_section::Mutex;
use embedded_hal::digital::OutputPin;

use crate::register::{
    Pin, ShiftError, TransportError,
    buffer::OutputBuffer,
    helpers::{bit_position, pin_count},
    transport::ShiftOut,
};

struct Chain<T, L, const CHIPS: usize>
where
    BitsImpl<CHIPS>: Bits,
{
    buffer: OutputBuffer<CHIPS>,
    transport: T,
    latch: L,
    // set while a `modify` closure runs on a scratch copy of `buffer`
    batching: bool,
}

impl<T, L, const CHIPS: usize> Chain<T, L, CHIPS>
where
    T: ShiftOut,
    L: OutputPin,
    BitsImpl<CHIPS>: Bits,
{
    /// Latch low, shift the whole buffer, latch high.
    ///
    /// The latch is only raised after the transport reports the full frame
    /// went out, so an aborted shift never reaches the outputs.
    fn commit(&mut self) -> Result<(), ShiftError> {
        let result = self.shift_and_latch();
        match result {
            Ok(()) => {
                self.buffer.mark_synced();
                trace!("hc595: latched {=usize} chip(s)", CHIPS);
            }
            Err(err) => warn!("hc595: commit failed: {}", err),
        }
        result
    }

    fn shift_and_latch(&mut self) -> Result<(), ShiftError> {
        self.latch.set_low().map_err(latch_error)?;
        self.transport.shift_out(self.buffer.as_bytes())?;
        self.latch.set_high().map_err(latch_error)?;
        Ok(())
    }
}

fn latch_error<E: embedded_hal::digital::Error>(err: E) -> ShiftError {
    TransportError::Latch(err.kind()).into()
}

/// Driver for a daisy chain of `CHIPS` 74HC595 shift registers.
///
/// Owns the output buffer, the serial transport and the latch line. Every
/// operation runs inside one critical section, so a buffer change and the
/// shift-out/latch sequence that publishes it happen as a single unit even
/// when several [`Pin`]s on different threads or interrupt levels share
/// the controller.
///
/// # Const Generics
/// - `CHIPS`: Number of chips in the chain; the chain has `8 * CHIPS` outputs
///
/// # Type Parameters
/// - `T`: Serial transport, any SPI bus or a [`BitBang`](crate::register::BitBang)
/// - `L`: Latch (RCLK) output line
///
/// A chain needs at least one chip; `CHIPS = 0` does not compile:
///
/// ```rust,compile_fail
/// use embedded_hc595::prelude::*;
///
/// fn empty_chain<T: ShiftOut, L: OutputPin>(transport: T, latch: L) {
///     let _ = ShiftRegister::<T, L, 0>::new(transport, latch);
/// }
/// ```
///
/// ```rust
/// use embedded_hc595::prelude::*;
///
/// fn single_chip<T: ShiftOut, L: OutputPin>(transport: T, latch: L) {
///     let _ = ShiftRegister::<T, L, 1>::new(transport, latch);
/// }
/// ```
pub struct ShiftRegister<T, L, const CHIPS: usize>
where
    BitsImpl<CHIPS>: Bits,
{
    chain: Mutex<RefCell<Chain<T, L, CHIPS>>>,
}

impl<T, L, const CHIPS: usize> core::fmt::Debug for ShiftRegister<T, L, CHIPS>
where
    BitsImpl<CHIPS>: Bits,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("ShiftRegister")
            .field("chips", &CHIPS)
            .finish_non_exhaustive()
    }
}

impl<T, L, const CHIPS: usize> ShiftRegister<T, L, CHIPS>
where
    T: ShiftOut,
    L: OutputPin,
    BitsImpl<CHIPS>: Bits,
{
    /// Creates the driver with every output low and commits that state.
    pub fn new(transport: T, latch: L) -> Result<Self, ShiftError> {
        Self::with_registers(transport, latch, [0; CHIPS])
    }

    /// Creates the driver starting from `registers` and commits that state,
    /// so buffer and hardware agree from the first call on.
    ///
    /// # Errors
    /// * [`ShiftError::Transport`] - if the initial commit fails
    pub fn with_registers(
        transport: T,
        latch: L,
        registers: [u8; CHIPS],
    ) -> Result<Self, ShiftError> {
        let this = Self {
            chain: Mutex::new(RefCell::new(Chain {
                buffer: OutputBuffer::new(registers),
                transport,
                latch,
                batching: false,
            })),
        };
        this.commit()?;
        Ok(this)
    }

    /// Number of chips in the chain.
    #[inline]
    pub const fn chip_count(&self) -> usize {
        CHIPS
    }

    /// Number of addressable outputs, `8 * CHIPS`.
    #[inline]
    pub const fn pin_count(&self) -> usize {
        pin_count::<CHIPS>()
    }

    /// Sets output `index` to `value` and commits the whole chain.
    ///
    /// Every call shifts all `8 * CHIPS` bits, even when the bit already
    /// holds `value`; the chip cannot update a single output.
    ///
    /// On [`ShiftError::Transport`] the buffer keeps `value` while the
    /// outputs keep their previous state; [`commit`](Self::commit) retries.
    ///
    /// Returns [`ShiftError::Busy`] when called from inside a
    /// [`modify`](Self::modify) closure.
    pub fn set_bit(&self, index: usize, value: bool) -> Result<(), ShiftError> {
        self.with_idle_chain(|chain| {
            chain.buffer.set(index, value)?;
            chain.commit()
        })
    }

    /// Returns the commanded level of output `index`.
    ///
    /// This is the buffer value, not a hardware read; the chip has no
    /// readback path. Inside a [`modify`](Self::modify) closure this is the
    /// value from before the batch.
    pub fn get_bit(&self, index: usize) -> Result<bool, ShiftError> {
        self.with_chain(|chain| chain.buffer.get(index))
    }

    /// Shifts the buffer out and pulses the latch.
    pub fn commit(&self) -> Result<(), ShiftError> {
        self.with_idle_chain(|chain| chain.commit())
    }

    /// Raw buffer bytes in wire order, one per chip.
    pub fn registers(&self) -> [u8; CHIPS] {
        self.with_chain(|chain| *chain.buffer.as_bytes())
    }

    /// Replaces every output at once with a single commit.
    pub fn write_registers(&self, registers: [u8; CHIPS]) -> Result<(), ShiftError> {
        self.with_idle_chain(|chain| {
            chain.buffer.replace(registers);
            chain.commit()
        })
    }

    /// Applies several changes to the buffer and commits them together.
    ///
    /// `f` works on a copy of the buffer. If it returns `Ok` the copy
    /// replaces the buffer and is committed once; if it returns an error
    /// the copy is dropped and nothing is shifted out.
    ///
    /// The whole call runs in one critical section. Writes to this
    /// controller from inside `f` (through [`set_bit`](Self::set_bit), a
    /// [`Pin`], [`commit`](Self::commit) or a nested `modify`) fail with
    /// [`ShiftError::Busy`]; reads see the state from before the batch.
    pub fn modify<R>(
        &self,
        f: impl FnOnce(&mut OutputBuffer<CHIPS>) -> Result<R, ShiftError>,
    ) -> Result<R, ShiftError> {
        critical_section::with(|cs| {
            let mut scratch = {
                let mut chain = self.chain.borrow_ref_mut(cs);
                if chain.batching {
                    return Err(ShiftError::Busy);
                }
                chain.batching = true;
                chain.buffer.clone()
            };

            let result = f(&mut scratch);

            let mut chain = self.chain.borrow_ref_mut(cs);
            chain.batching = false;
            let value = result?;
            chain.buffer = scratch;
            chain.commit()?;
            Ok(value)
        })
    }

    /// Returns true if the outputs reflect the buffer, i.e. no write has
    /// happened since the last successful commit.
    pub fn is_synced(&self) -> bool {
        self.with_chain(|chain| chain.buffer.is_synced())
    }

    /// Returns true if chip `chip` (0 is the first byte shifted, i.e. the
    /// chip farthest from the controller) has no writes waiting for a
    /// commit.
    ///
    /// After a failed commit, a synced chip is known to still show its
    /// commanded outputs; only unsynced chips may be stale.
    pub fn is_chip_synced(&self, chip: usize) -> Result<bool, ShiftError> {
        self.with_chain(|chain| chain.buffer.is_pending(chip).map(|pending| !pending))
    }

    /// Handle for output `index`.
    pub fn pin(&self, index: usize) -> Result<Pin<'_, T, L, CHIPS>, ShiftError> {
        Pin::new(self, index)
    }

    /// Tears the driver down and hands back the transport and latch line.
    pub fn release(self) -> (T, L) {
        let chain = self.chain.into_inner().into_inner();
        (chain.transport, chain.latch)
    }

    /// Level of an index already validated by [`Pin::new`].
    pub(crate) fn level(&self, index: usize) -> bool {
        self.with_chain(|chain| chain.buffer.level(index))
    }

    pub(crate) fn check_index(index: usize) -> Result<(), ShiftError> {
        bit_position::<CHIPS>(index).map(|_| ())
    }

    fn with_chain<R>(&self, f: impl FnOnce(&mut Chain<T, L, CHIPS>) -> R) -> R {
        critical_section::with(|cs| {
            let mut chain = self.chain.borrow_ref_mut(cs);
            f(&mut *chain)
        })
    }

    /// Like `with_chain`, but refuses to write while a batch is open.
    fn with_idle_chain<R>(
        &self,
        f: impl FnOnce(&mut Chain<T, L, CHIPS>) -> Result<R, ShiftError>,
    ) -> Result<R, ShiftError> {
        self.with_chain(|chain| {
            if chain.batching {
                return Err(ShiftError::Busy);
            }
            f(chain)
        })
    }
}
