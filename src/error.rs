//! Decode pipeline errors
//!
//! Every variant is non-fatal: the receive loop drops the packet it was working
//! on and moves to the next one in the driver queue.

/// Reasons a captured packet produced no button event
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum DecodeError {
    #[error("capture overflow: driver reported {bytes} bytes, buffer holds {capacity}")]
    CaptureOverflow { bytes: usize, capacity: usize },

    #[error("sync pulse width {width} out of tolerance")]
    FrameSync { width: usize },

    #[error("checksum mismatch (residue {residue:#x})")]
    Checksum { residue: u8 },

    #[error("no edge after bit {position}")]
    EdgeNotFound { position: usize },
}
