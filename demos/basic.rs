//! Basic example: two chained 74HC595s on a host mock
//!
//! This example demonstrates:
//! - Using the builder pattern to configure the chain
//! - Per-pin handles that behave like ordinary output pins
//! - Batching several changes into one commit with `modify`
//! - How buffer bytes map onto the chips
//!
//! The SPI bus and latch are stand-ins that print what real hardware would
//! see, so the example runs on a desktop.

use std::convert::Infallible;

use embedded_hal::{
    digital::ErrorType as PinErrorType,
    spi::{ErrorType as SpiErrorType, SpiBus},
};
use embedded_hc595::prelude::*;

// ============ Host stand-ins ============

/// Prints every frame as it would appear on MOSI.
struct ConsoleBus;

impl SpiErrorType for ConsoleBus {
    type Error = Infallible;
}

impl SpiBus<u8> for ConsoleBus {
    fn read(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        words.fill(0);
        Ok(())
    }

    fn write(&mut self, words: &[u8]) -> Result<(), Self::Error> {
        print!("  shift");
        for byte in words {
            print!(" {byte:08b}");
        }
        println!();
        Ok(())
    }

    fn transfer(&mut self, read: &mut [u8], write: &[u8]) -> Result<(), Self::Error> {
        self.write(write)?;
        read.fill(0);
        Ok(())
    }

    fn transfer_in_place(&mut self, words: &mut [u8]) -> Result<(), Self::Error> {
        self.write(words)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}

/// Prints the rising edge that copies the shift register to the outputs.
struct ConsoleLatch;

impl PinErrorType for ConsoleLatch {
    type Error = Infallible;
}

impl OutputPin for ConsoleLatch {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        println!("  latch");
        Ok(())
    }
}

/// Any code written against `OutputPin` drives a chain output.
fn blink<P: OutputPin>(led: &mut P) -> Result<(), P::Error> {
    led.set_high()?;
    led.set_low()
}

pub fn main() -> Result<(), ShiftError> {
    // Two chips: byte 0 is shifted first and ends up in the far chip
    println!("build:");
    let register = ShiftRegisterBuilder::new()
        .chips::<2>()
        .spi(ConsoleBus)
        .latch(ConsoleLatch)
        .build()?;

    println!("{} outputs on {} chips", register.pin_count(), register.chip_count());

    // ========== Single pins ==========
    // Each write shifts the whole chain and latches once
    println!("pin 3 high:");
    let mut status_led = register.pin(3)?;
    status_led.set_high()?;

    println!("blink pin 12:");
    let mut relay = register.pin(12)?;
    blink(&mut relay)?;

    // ========== Batched update ==========
    // One shift and one latch for all three changes
    println!("batch:");
    register.modify(|buf| {
        buf.set(0, true)?;
        buf.set(8, true)?;
        buf.toggle(3)?;
        Ok(())
    })?;

    let [far, near] = register.registers();
    println!("far chip {far:08b}, near chip {near:08b}");
    assert!(register.is_synced());

    Ok(())
}
