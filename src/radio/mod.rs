//! Oversampled RTS capture decoding and the radio packet handoff
//!
//! Each packet the radio hands over goes through:
//! 1. Glitch cleanup of 1-2 sample pulses
//! 2. Frame sync over the hardware/software sync pulses
//! 3. Manchester decoding of 56 bits
//! 4. De-whitening, checksum and field extraction (see `crate::rts`)

pub mod capture;
mod bits;
mod decoder;
mod demod;
pub mod driver;
pub mod receive;
mod sync;
mod timing;

#[cfg(test)]
pub(crate) mod testing;

pub use capture::{CaptureConfig, CaptureStats, RadioCapture};
pub use demod::DecodedFrame;
pub use driver::SimulatedRadio;
pub use timing::FRAME_BYTES;
