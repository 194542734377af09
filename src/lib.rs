//! A `no_std`, no-alloc driver for daisy-chained 74HC595 shift registers.
//!
//! The chip turns three wires (data, clock, latch) into `8 * CHIPS`
//! parallel outputs. It has no way to change a single output: every update
//! shifts the whole register in, then a rising latch edge copies it to the
//! output pins. This crate keeps a shadow of the commanded outputs and hands
//! out per-bit [`Pin`](register::Pin) handles that behave like ordinary
//! `embedded-hal` output pins.
//!
//! # Features
//!
//! - **Zero heap allocation** - Buffer sized by a const generic chip count
//! - **Any SPI bus or two GPIOs** - `SpiBus` or bit-banged clock/data
//! - **Atomic commits** - Buffer update, shift-out and latch pulse run in one critical section
//! - **Drop-in pins** - Handles implement `OutputPin` and `StatefulOutputPin`
//! - **Divergence tracking** - Know when a failed commit left outputs stale
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────┐  set_value  ┌──────────────────────────┐  SER/SRCLK  ┌─────────┐
//! │  Pin (idx 3) │────────────▶│  ShiftRegister           │────────────▶│ 74HC595 │
//! │  Pin (idx 9) │             │   OutputBuffer [u8; N]   │    RCLK ↑   │  chain  │
//! │  ...         │◀────────────│   transport + latch      │────────────▶│         │
//! └──────────────┘  get_value  └──────────────────────────┘             └─────────┘
//! ```
//!
//! - **Pin writes** set one bit in the buffer, then commit the full buffer
//! - **Commits** drive the latch low, shift every byte out, then raise the latch
//! - **Failed commits** leave the latch low so the outputs keep their last state;
//!   the buffer keeps the new value and `commit()` retries it
//!
//! # Bit order
//!
//! Bit `i` is output `Q(i % 8)` of byte `i / 8`. Bytes are shifted in index
//! order, MSB first, so byte 0 lands in the chip farthest from the
//! microcontroller.
//!
//! # Example
//!
//! ```rust
//! use embedded_hal::spi::SpiBus;
//! use embedded_hc595::prelude::*;
//!
//! // Two chips on SPI (MOSI -> SER, SCK -> SRCLK), RCLK on a GPIO
//! fn run<SPI: SpiBus<u8>, L: OutputPin>(spi_bus: SPI, latch_pin: L) -> Result<(), ShiftError> {
//!     let register = ShiftRegisterBuilder::new()
//!         .chips::<2>()
//!         .spi(spi_bus)
//!         .latch(latch_pin)
//!         .build()?;
//!
//!     let mut led = register.pin(3)?;
//!     led.set_high()?; // shifts both bytes, pulses the latch once
//!
//!     // Several changes, one commit
//!     register.modify(|buf| {
//!         buf.set(8, true)?;
//!         buf.set(15, true)
//!     })
//! }
//! ```
//!
//! `demos/basic.rs` runs the same flow on the host: `cargo run --example basic`.

#![deny(unsafe_code)]
#![no_std]

#[macro_use]
mod fmt;

pub mod register;

pub mod prelude {
    pub use crate::register::prelude::*;
    pub use embedded_hal::digital::{OutputPin, PinState, StatefulOutputPin};
}
