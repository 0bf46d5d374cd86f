//! RTS data types

use serde::Serialize;

use crate::radio::FRAME_BYTES;

/// De-whitened frame: key/checksum, command, rolling code, address
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PayloadFrame(pub [u8; FRAME_BYTES]);

impl PayloadFrame {
    pub fn bytes(&self) -> &[u8; FRAME_BYTES] {
        &self.0
    }
}

/// Button combination carried in the command nibble
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Button {
    My,
    Up,
    MyUp,
    Down,
    MyDown,
    UpDown,
    MyUpDown,
    Prog,
    Unknown,
}

impl From<u8> for Button {
    fn from(nibble: u8) -> Self {
        match nibble {
            1 => Self::My,
            2 => Self::Up,
            3 => Self::MyUp,
            4 => Self::Down,
            5 => Self::MyDown,
            6 => Self::UpDown,
            7 => Self::MyUpDown,
            8 => Self::Prog,
            _ => Self::Unknown,
        }
    }
}

impl Button {
    /// Command text as printed by the receiver; `Unknown` has none
    pub fn command(&self) -> Option<&'static str> {
        match self {
            Self::My => Some("MY"),
            Self::Up => Some("UP"),
            Self::MyUp => Some("MY+UP"),
            Self::Down => Some("DOWN"),
            Self::MyDown => Some("MY+DOWN"),
            Self::UpDown => Some("UP+DOWN"),
            Self::MyUpDown => Some("MY+UP+DOWN"),
            Self::Prog => Some("PROG"),
            Self::Unknown => None,
        }
    }
}

/// One decoded button press
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ButtonEvent {
    /// 24-bit remote identifier
    pub remote_address: u32,

    /// Per-press sequence number
    pub rolling_code: u16,

    pub button: Button,
}

impl std::fmt::Display for ButtonEvent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "From remote {:06x} (seq {}): {}",
            self.remote_address,
            self.rolling_code,
            self.button.command().unwrap_or("")
        )
    }
}
