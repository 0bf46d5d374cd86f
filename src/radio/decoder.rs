//! Capture → button event pipeline
//!
//! Runs the stages in order on one raw capture: glitch cleanup, frame sync,
//! Manchester decoding, then de-whitening/checksum/field extraction.

use tracing::{info, trace, warn};

use super::bits::RawCapture;
use super::demod::decode_manchester;
use super::sync::synchronize;
use crate::error::DecodeError;
use crate::rts::{parse_frame, Button, ButtonEvent};

/// Per-outcome counters
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct DecoderStats {
    pub packets: u64,
    pub glitches_cleared: u64,
    pub repeated_frames: u64,
    pub sync_errors: u64,
    pub missing_edges: u64,
    pub checksum_errors: u64,
    pub decoded: u64,
    pub unknown_buttons: u64,
}

/// RTS capture decoder
#[derive(Debug, Default)]
pub struct Decoder {
    pub stats: DecoderStats,
}

impl Decoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decode one capture in place.
    ///
    /// The capture is modified by the glitch cleanup and should be treated as
    /// consumed afterwards.
    pub fn decode(&mut self, capture: &mut RawCapture) -> Result<ButtonEvent, DecodeError> {
        self.stats.packets += 1;
        trace!("Raw capture ({} bytes): {}", capture.as_bytes().len(), capture.to_bit_string());

        let result = self.run_stages(capture);
        match &result {
            Ok(event) => {
                self.stats.decoded += 1;
                if event.button == Button::Unknown {
                    self.stats.unknown_buttons += 1;
                }
                info!("{}", event);
            }
            Err(DecodeError::FrameSync { width }) => {
                self.stats.sync_errors += 1;
                warn!("SW sync pulse length does not match ({} ticks)", width);
            }
            Err(DecodeError::Checksum { residue }) => {
                self.stats.checksum_errors += 1;
                warn!("Checksum mismatch (residue {:#x})", residue);
            }
            Err(DecodeError::EdgeNotFound { position }) => {
                self.stats.missing_edges += 1;
                warn!("Capture ended without an edge after bit {}", position);
            }
            Err(DecodeError::CaptureOverflow { .. }) => {}
        }
        result
    }

    fn run_stages(&mut self, capture: &mut RawCapture) -> Result<ButtonEvent, DecodeError> {
        self.stats.glitches_cleared += capture.clean_pulses() as u64;

        let sync = synchronize(capture)?;
        if sync.repeated {
            self.stats.repeated_frames += 1;
        }

        let frame = decode_manchester(capture, sync)?;
        trace!("Manchester frame: {}", hex::encode(frame.bytes()));

        parse_frame(&frame)
    }
}
