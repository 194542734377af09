pub mod buffer;
pub mod builder;
pub mod controller;
pub mod error;
pub mod helpers;
pub mod pin;
pub mod transport;

#[cfg(test)]
mod test_support;

pub use buffer::OutputBuffer;
pub use builder::ShiftRegisterBuilder;
pub use controller::ShiftRegister;
pub use error::{ShiftError, TransportError};
pub use pin::Pin;
pub use transport::{BitBang, ShiftOut};

pub mod prelude {
    pub use super::{
        BitBang, OutputBuffer, Pin, ShiftError, ShiftOut, ShiftRegister, ShiftRegisterBuilder,
        TransportError,
    };
}
