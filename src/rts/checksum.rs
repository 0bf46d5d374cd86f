//! De-whitening and nibble checksum for RTS frames

use super::types::PayloadFrame;
use crate::error::DecodeError;
use crate::radio::{DecodedFrame, FRAME_BYTES};

/// Undo the transmitter's running XOR: each byte was XORed with the previous
/// transmitted byte.
pub fn dewhiten(frame: &DecodedFrame) -> PayloadFrame {
    let raw = frame.bytes();
    let mut payload = [0u8; FRAME_BYTES];
    payload[0] = raw[0];
    for i in 1..FRAME_BYTES {
        payload[i] = raw[i] ^ raw[i - 1];
    }
    PayloadFrame(payload)
}

/// XOR of both nibbles of every byte; a valid frame folds to zero
pub fn compute_checksum(payload: &[u8]) -> u8 {
    payload.iter().fold(0u8, |cks, &b| cks ^ b ^ (b >> 4)) & 0x0F
}

/// Check the nibble checksum of a de-whitened frame
pub fn check_checksum(payload: &PayloadFrame) -> Result<(), DecodeError> {
    match compute_checksum(payload.bytes()) {
        0 => Ok(()),
        residue => Err(DecodeError::Checksum { residue }),
    }
}
