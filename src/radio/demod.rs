//! Manchester decoding of the synchronized payload
//!
//! RTS codes a 1 as low-high and a 0 as high-low. The cursor always sits on
//! the mid-bit transition of the bit just decoded, so the run that follows
//! tells us about the next bit:
//! - a full-bit run (no boundary transition) means the next bit differs
//! - a half-bit run means a boundary transition, so the next bit repeats and
//!   the mid-bit edge is one more edge away

use super::bits::{put_bit, RawCapture};
use super::sync::{skip_edges, SyncPoint};
use super::timing::{BIT_SPLIT_TICKS, FRAME_BITS, FRAME_BYTES};
use crate::error::DecodeError;

/// 56 Manchester-decoded bits, still whitened
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodedFrame(pub [u8; FRAME_BYTES]);

impl DecodedFrame {
    pub fn bytes(&self) -> &[u8; FRAME_BYTES] {
        &self.0
    }
}

/// Decode all 56 frame bits starting from a sync point
pub fn decode_manchester(capture: &RawCapture, sync: SyncPoint) -> Result<DecodedFrame, DecodeError> {
    let mut frame = [0u8; FRAME_BYTES];
    let mut cursor = sync.cursor;
    let mut previous = sync.first_bit;
    put_bit(&mut frame, 0, previous);

    for pos in 1..FRAME_BITS {
        let run = capture.edge_distance(cursor)?;
        let (bit, edges) = if run >= BIT_SPLIT_TICKS {
            (!previous, 1)
        } else {
            (previous, 2)
        };
        cursor = skip_edges(capture, cursor, edges)?;
        put_bit(&mut frame, pos, bit);
        previous = bit;
    }

    Ok(DecodedFrame(frame))
}
