//! Test support utilities - only compiled in test builds.
//!
//! A [`Rig`] owns an event trace and fault switches; the mock bus and pins
//! borrow it so tests can inspect what reached the "hardware" while the
//! controller still owns the mocks.

use core::cell::{Cell, RefCell};

use embedded_hal::{digital, spi};

/// Something observable on the wires.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Event {
    Byte(u8),
    Flush,
    Latch(bool),
    Clock(bool),
    Data(bool),
}

pub type Events = heapless::Vec<Event, 512>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MockError;

impl spi::Error for MockError {
    fn kind(&self) -> spi::ErrorKind {
        spi::ErrorKind::Other
    }
}

impl digital::Error for MockError {
    fn kind(&self) -> digital::ErrorKind {
        digital::ErrorKind::Other
    }
}

#[derive(Default)]
pub struct Rig {
    events: RefCell<Events>,
    bus_fault: Cell<bool>,
    latch_fault: Cell<bool>,
    pin_fault: Cell<bool>,
}

impl Rig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn bus(&self) -> MockBus<'_> {
        MockBus { rig: self }
    }

    pub fn latch(&self) -> MockPin<'_> {
        MockPin {
            rig: self,
            role: Role::Latch,
        }
    }

    pub fn clock(&self) -> MockPin<'_> {
        MockPin {
            rig: self,
            role: Role::Clock,
        }
    }

    pub fn data(&self) -> MockPin<'_> {
        MockPin {
            rig: self,
            role: Role::Data,
        }
    }

    pub fn fail_bus(&self, fail: bool) {
        self.bus_fault.set(fail);
    }

    pub fn fail_latch(&self, fail: bool) {
        self.latch_fault.set(fail);
    }

    pub fn fail_pins(&self, fail: bool) {
        self.pin_fault.set(fail);
    }

    pub fn events(&self) -> Events {
        self.events.borrow().clone()
    }

    /// Returns the trace so far and starts a fresh one.
    pub fn take(&self) -> Events {
        core::mem::take(&mut *self.events.borrow_mut())
    }

    /// Bytes written over SPI, in wire order.
    pub fn bytes(&self) -> heapless::Vec<u8, 64> {
        self.events
            .borrow()
            .iter()
            .filter_map(|event| match event {
                Event::Byte(b) => Some(*b),
                _ => None,
            })
            .collect()
    }

    /// Data level sampled at every rising clock edge.
    pub fn clocked_bits(&self) -> heapless::Vec<bool, 256> {
        let mut bits = heapless::Vec::new();
        let mut data = false;
        for event in self.events.borrow().iter() {
            match event {
                Event::Data(level) => data = *level,
                Event::Clock(true) => bits.push(data).expect("bit trace full"),
                _ => {}
            }
        }
        bits
    }

    /// Number of low-to-high latch transitions.
    pub fn latch_pulses(&self) -> usize {
        self.events
            .borrow()
            .iter()
            .filter(|event| **event == Event::Latch(true))
            .count()
    }

    fn record(&self, event: Event) {
        self.events
            .borrow_mut()
            .push(event)
            .expect("event trace full");
    }
}

pub struct MockBus<'a> {
    rig: &'a Rig,
}

impl spi::ErrorType for MockBus<'_> {
    type Error = MockError;
}

impl spi::SpiBus<u8> for MockBus<'_> {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        words.fill(0);
        Ok(())
    }

    /// A faulted bus gets the first byte out before giving up, like a
    /// transfer aborted mid-frame.
    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        for (i, &word) in words.iter().enumerate() {
            if self.rig.bus_fault.get() && i == 1 {
                return Err(MockError);
            }
            self.rig.record(Event::Byte(word));
        }
        if self.rig.bus_fault.get() {
            return Err(MockError);
        }
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        read.fill(0);
        self.write(write)
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        let mut out = [0u8; 64];
        let len = words.len().min(out.len());
        out[..len].copy_from_slice(&words[..len]);
        words.fill(0);
        self.write(&out[..len])
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        self.rig.record(Event::Flush);
        Ok(())
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Role {
    Latch,
    Clock,
    Data,
}

pub struct MockPin<'a> {
    rig: &'a Rig,
    role: Role,
}

impl MockPin<'_> {
    fn drive(&mut self, level: bool) -> Result<(), MockError> {
        let faulted = match self.role {
            Role::Latch => self.rig.latch_fault.get(),
            Role::Clock | Role::Data => self.rig.pin_fault.get(),
        };
        if faulted {
            return Err(MockError);
        }
        self.rig.record(match self.role {
            Role::Latch => Event::Latch(level),
            Role::Clock => Event::Clock(level),
            Role::Data => Event::Data(level),
        });
        Ok(())
    }
}

impl digital::ErrorType for MockPin<'_> {
    type Error = MockError;
}

impl digital::OutputPin for MockPin<'_> {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.drive(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.drive(true)
    }
}

/// The wire trace of one successful SPI commit of `bytes`.
pub fn spi_commit(bytes: &[u8]) -> Events {
    let mut events = Events::new();
    events.push(Event::Latch(false)).expect("event trace full");
    for &b in bytes {
        events.push(Event::Byte(b)).expect("event trace full");
    }
    events.push(Event::Flush).expect("event trace full");
    events.push(Event::Latch(true)).expect("event trace full");
    events
}
