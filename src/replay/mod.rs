//! Replay of recorded captures through the simulated radio

mod runner;

pub use runner::{CaptureReplay, CaptureSource};
