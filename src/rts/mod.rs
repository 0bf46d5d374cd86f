//! RTS frame interpretation: de-whitening, checksum and field extraction

mod checksum;
pub mod parser;
mod types;

pub use parser::parse_frame;
pub use types::{Button, ButtonEvent};
