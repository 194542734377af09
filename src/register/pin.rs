use bitmaps::{Bits, BitsImpl};
use embedded_hal::digital::{ErrorType, OutputPin, PinState, StatefulOutputPin};

use crate::register::{ShiftError, ShiftRegister, transport::ShiftOut};

/// One output of a [`ShiftRegister`] chain, usable wherever an
/// `embedded-hal` output pin is expected.
///
/// A `Pin` is just an index into the controller's buffer. Any number of
/// handles may exist for the same index; they all read and write the same
/// bit. Every write shifts out the entire chain, so changing many pins one
/// by one costs one full commit each. Use [`ShiftRegister::modify`] to
/// batch.
pub struct Pin<'a, T, L, const CHIPS: usize>
where
    BitsImpl<CHIPS>: Bits,
{
    register: &'a ShiftRegister<T, L, CHIPS>,
    index: usize,
}

impl<T, L, const CHIPS: usize> core::fmt::Debug for Pin<'_, T, L, CHIPS>
where
    BitsImpl<CHIPS>: Bits,
{
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Pin")
            .field("index", &self.index)
            .finish_non_exhaustive()
    }
}

impl<T, L, const CHIPS: usize> Clone for Pin<'_, T, L, CHIPS>
where
    BitsImpl<CHIPS>: Bits,
{
    fn clone(&self) -> Self {
        *self
    }
}

impl<T, L, const CHIPS: usize> Copy for Pin<'_, T, L, CHIPS> where BitsImpl<CHIPS>: Bits {}

impl<'a, T, L, const CHIPS: usize> Pin<'a, T, L, CHIPS>
where
    T: ShiftOut,
    L: OutputPin,
    BitsImpl<CHIPS>: Bits,
{
    /// Returns [`ShiftError::OutOfRange`] unless `index < 8 * CHIPS`.
    pub fn new(
        register: &'a ShiftRegister<T, L, CHIPS>,
        index: usize,
    ) -> Result<Self, ShiftError> {
        ShiftRegister::<T, L, CHIPS>::check_index(index)?;
        Ok(Self { register, index })
    }

    /// Position of this pin in the chain.
    #[inline]
    pub fn index(&self) -> usize {
        self.index
    }

    /// Commanded level, read from the controller's buffer.
    pub fn get_value(&self) -> bool {
        self.register.level(self.index)
    }

    /// Drives the pin and commits the whole chain.
    pub fn set_value(&self, value: bool) -> Result<(), ShiftError> {
        self.register.set_bit(self.index, value)
    }
}

impl<T, L, const CHIPS: usize> ErrorType for Pin<'_, T, L, CHIPS>
where
    BitsImpl<CHIPS>: Bits,
{
    type Error = ShiftError;
}

impl<T, L, const CHIPS: usize> OutputPin for Pin<'_, T, L, CHIPS>
where
    T: ShiftOut,
    L: OutputPin,
    BitsImpl<CHIPS>: Bits,
{
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.set_value(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.set_value(true)
    }

    fn set_state(&mut self, state: PinState) -> Result<(), Self::Error> {
        self.set_value(state == PinState::High)
    }
}

impl<T, L, const CHIPS: usize> StatefulOutputPin for Pin<'_, T, L, CHIPS>
where
    T: ShiftOut,
    L: OutputPin,
    BitsImpl<CHIPS>: Bits,
{
    fn is_set_high(&mut self) -> Result<bool, Self::Error> {
        Ok(self.get_value())
    }

    fn is_set_low(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.get_value())
    }

    /// Read-modify-commit under one critical section.
    fn toggle(&mut self) -> Result<(), Self::Error> {
        let index = self.index;
        self.register.modify(|buf| buf.toggle(index)).map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::register::{
        TransportError,
        test_support::{Rig, spi_commit},
    };

    #[test]
    fn pin_construction_checks_bounds() {
        let rig = Rig::new();
        let register: ShiftRegister<_, _, 2> = ShiftRegister::new(rig.bus(), rig.latch()).unwrap();

        assert_eq!(register.pin(15).unwrap().index(), 15);
        assert_eq!(register.pin(16).unwrap_err(), ShiftError::OutOfRange);
        assert_eq!(
            Pin::new(&register, usize::MAX).unwrap_err(),
            ShiftError::OutOfRange
        );
    }

    #[test]
    fn set_value_commits_through_controller() {
        let rig = Rig::new();
        let register: ShiftRegister<_, _, 1> = ShiftRegister::new(rig.bus(), rig.latch()).unwrap();
        let pin = register.pin(1).unwrap();
        rig.take();

        pin.set_value(true).unwrap();

        assert_eq!(rig.events(), spi_commit(&[0x02]));
        assert!(pin.get_value());
        assert!(register.get_bit(1).unwrap());
    }

    #[test]
    fn handles_for_same_index_alias() {
        let rig = Rig::new();
        let register: ShiftRegister<_, _, 1> = ShiftRegister::new(rig.bus(), rig.latch()).unwrap();
        let a = register.pin(4).unwrap();
        let b = register.pin(4).unwrap();

        a.set_value(true).unwrap();
        assert!(b.get_value());

        b.set_value(false).unwrap();
        assert!(!a.get_value());
    }

    #[test]
    fn pin_reads_see_writes_made_through_controller() {
        let rig = Rig::new();
        let register: ShiftRegister<_, _, 1> = ShiftRegister::new(rig.bus(), rig.latch()).unwrap();
        let pin = register.pin(7).unwrap();

        register.write_registers([0x80]).unwrap();

        assert!(pin.get_value());
    }

    #[test]
    fn output_pin_trait_drives_bit() {
        let rig = Rig::new();
        let register: ShiftRegister<_, _, 1> = ShiftRegister::new(rig.bus(), rig.latch()).unwrap();
        let mut pin = register.pin(0).unwrap();

        pin.set_high().unwrap();
        assert!(pin.is_set_high().unwrap());

        pin.set_state(PinState::Low).unwrap();
        assert!(pin.is_set_low().unwrap());
        assert_eq!(rig.latch_pulses(), 3);
    }

    #[test]
    fn toggle_commits_once_per_call() {
        let rig = Rig::new();
        let register: ShiftRegister<_, _, 1> = ShiftRegister::new(rig.bus(), rig.latch()).unwrap();
        let mut pin = register.pin(2).unwrap();
        rig.take();

        pin.toggle().unwrap();
        assert_eq!(rig.take(), spi_commit(&[0x04]));

        pin.toggle().unwrap();
        assert_eq!(rig.take(), spi_commit(&[0x00]));
    }

    #[test]
    fn failed_set_value_surfaces_transport_error() {
        let rig = Rig::new();
        let register: ShiftRegister<_, _, 1> = ShiftRegister::new(rig.bus(), rig.latch()).unwrap();
        let pin = register.pin(6).unwrap();
        rig.fail_bus(true);

        assert!(matches!(
            pin.set_value(true),
            Err(ShiftError::Transport(TransportError::Bus(_)))
        ));
        // buffer holds the request even though the outputs do not
        assert!(pin.get_value());
        assert!(!register.is_synced());
    }

    #[test]
    fn pin_writes_inside_modify_are_refused() {
        let rig = Rig::new();
        let register: ShiftRegister<_, _, 1> = ShiftRegister::new(rig.bus(), rig.latch()).unwrap();
        let mut pin = register.pin(3).unwrap();
        rig.take();

        register
            .modify(|buf| {
                buf.set(0, true)?;
                assert_eq!(pin.set_value(true), Err(ShiftError::Busy));
                assert_eq!(pin.toggle(), Err(ShiftError::Busy));
                assert!(!pin.get_value());
                Ok(())
            })
            .unwrap();

        assert_eq!(rig.events(), spi_commit(&[0x01]));
        assert!(!pin.get_value());
    }

    /// Code written against `OutputPin` works the same on a chain pin.
    #[test]
    fn generic_output_code_accepts_chain_pins() {
        fn blink<P: OutputPin>(pin: &mut P) -> Result<(), P::Error> {
            pin.set_high()?;
            pin.set_low()
        }

        let rig = Rig::new();
        let register: ShiftRegister<_, _, 1> = ShiftRegister::new(rig.bus(), rig.latch()).unwrap();
        let mut pin = register.pin(5).unwrap();
        rig.take();

        blink(&mut pin).unwrap();

        assert_eq!(rig.bytes().as_slice(), &[0x20, 0x00]);
        assert_eq!(rig.latch_pulses(), 2);
    }
}
