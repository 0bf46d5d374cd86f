//! RTS frame synchronization
//!
//! The radio's own preamble/sync detector can't express the RTS framing, so
//! the capture starts in the low gap after the first hardware sync pulse:
//!
//! ```text
//! +-----+     +-----+     +---------+    +-+-+-+-+-+-+-+-+-+-+-+
//! + hw1 +-----+ hw2 +-----+ swsync  +----+ manchester payload  +----
//!          ^
//!      capture start
//! ```
//!
//! Repeated frames (button held down) carry seven hardware pulses instead of
//! two, which shows up as a "sync" pulse far too short; we then skip the five
//! extra pulses and measure again.

use tracing::{debug, trace};

use super::bits::RawCapture;
use super::timing::{FIRST_BIT_LOW_TICKS, REPEAT_EXTRA_EDGES, SYNC_MAX_TICKS, SYNC_MIN_TICKS};
use crate::error::DecodeError;

/// Where Manchester decoding starts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SyncPoint {
    /// Bit position of the mid-bit transition of the first payload bit
    pub cursor: usize,
    /// Value of the first payload bit
    pub first_bit: bool,
    /// Frame used the repeated-packet preamble
    pub repeated: bool,
}

/// Advance `cursor` past the next `edges` transitions
pub(super) fn skip_edges(
    capture: &RawCapture,
    mut cursor: usize,
    edges: usize,
) -> Result<usize, DecodeError> {
    for _ in 0..edges {
        cursor += capture.edge_distance(cursor)?;
    }
    Ok(cursor)
}

fn sync_width_ok(width: usize) -> bool {
    (SYNC_MIN_TICKS..=SYNC_MAX_TICKS).contains(&width)
}

/// Locate the payload in a cleaned capture
pub fn synchronize(capture: &RawCapture) -> Result<SyncPoint, DecodeError> {
    // rising + falling edge of hw2, then rising edge of the sw sync
    let mut cursor = skip_edges(capture, 0, 3)?;

    let mut width = capture.edge_distance(cursor)?;
    let mut repeated = false;
    if !sync_width_ok(width) {
        debug!("Repeated packet (first sync width {})", width);
        repeated = true;
        cursor = skip_edges(capture, cursor, REPEAT_EXTRA_EDGES)?;
        width = capture.edge_distance(cursor)?;
    }

    if !sync_width_ok(width) {
        return Err(DecodeError::FrameSync { width });
    }

    // falling edge of the sw sync: start of the payload region
    cursor += capture.edge_distance(cursor)?;

    // The sync is followed by a half-bit of low; a leading 1 (low-high)
    // stretches that low by another half-bit.
    let low = capture.edge_distance(cursor)?;
    let first_bit = low > FIRST_BIT_LOW_TICKS;
    let to_mid_bit = if first_bit { 1 } else { 2 };
    cursor = skip_edges(capture, cursor, to_mid_bit)?;

    trace!(
        "Synchronized: cursor={} first_bit={} repeated={} sync_width={}",
        cursor,
        first_bit as u8,
        repeated,
        width
    );

    Ok(SyncPoint {
        cursor,
        first_bit,
        repeated,
    })
}
