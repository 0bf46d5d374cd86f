//! Bit-addressable raw capture buffer
//!
//! The radio hands us one oversampled packet as bytes, MSB first: bit 0 is the
//! most significant bit of byte 0. Everything upstream of the Manchester
//! decoder works on level runs inside this buffer.

use tracing::trace;

use super::timing::{CAPTURE_CAPACITY, MAX_GLITCH_TICKS};
use crate::error::DecodeError;

/// Read bit `pos` (MSB-first) from a byte slice
#[inline(always)]
pub fn get_bit(buf: &[u8], pos: usize) -> bool {
    (buf[pos / 8] >> (7 - (pos % 8))) & 1 == 1
}

/// Write bit `pos` (MSB-first) in a byte slice
#[inline(always)]
pub fn put_bit(buf: &mut [u8], pos: usize, value: bool) {
    let mask = 1 << (7 - (pos % 8));
    if value {
        buf[pos / 8] |= mask;
    } else {
        buf[pos / 8] &= !mask;
    }
}

/// Fixed-capacity capture of one oversampled packet
pub struct RawCapture {
    buf: [u8; CAPTURE_CAPACITY],
    len: usize,
}

impl RawCapture {
    pub fn new() -> Self {
        Self {
            buf: [0; CAPTURE_CAPACITY],
            len: 0,
        }
    }

    /// Prepare the buffer for a packet of `bytes` bytes and return the slice
    /// the driver should copy into.
    ///
    /// Fails with `CaptureOverflow` without touching the previous contents when
    /// the packet would not fit.
    pub fn load(&mut self, bytes: usize) -> Result<&mut [u8], DecodeError> {
        if bytes > CAPTURE_CAPACITY {
            return Err(DecodeError::CaptureOverflow {
                bytes,
                capacity: CAPTURE_CAPACITY,
            });
        }
        self.len = bytes;
        Ok(&mut self.buf[..bytes])
    }

    /// Captured bytes
    pub fn as_bytes(&self) -> &[u8] {
        &self.buf[..self.len]
    }

    /// Captured length in bits
    pub fn bit_len(&self) -> usize {
        self.len * 8
    }

    #[inline(always)]
    pub fn bit(&self, pos: usize) -> bool {
        get_bit(&self.buf, pos)
    }

    /// Distance from `start` to the next level transition.
    ///
    /// The level at `start` is the reference; scanning begins at `start + 1`.
    /// A run that reaches the end of the capture has no edge.
    pub fn edge_distance(&self, start: usize) -> Result<usize, DecodeError> {
        let end = self.bit_len();
        if start >= end {
            return Err(DecodeError::EdgeNotFound { position: start });
        }

        let level = self.bit(start);
        (start + 1..end)
            .find(|&cursor| self.bit(cursor) != level)
            .map(|cursor| cursor - start)
            .ok_or(DecodeError::EdgeNotFound { position: start })
    }

    /// Remove high glitches of 1 or 2 samples surrounded by low samples.
    ///
    /// Valid pulses are at least one half-bit (4 samples) wide, so anything
    /// narrower is receiver noise. Returns the number of glitches cleared.
    pub fn clean_pulses(&mut self) -> usize {
        let end = self.bit_len();
        let mut cleared = 0;
        let mut i = 0;

        while i < end {
            if !self.bit(i) {
                if let Some(width) = self.glitch_width_after(i) {
                    for pos in i + 1..=i + width {
                        put_bit(&mut self.buf, pos, false);
                    }
                    cleared += 1;
                    i += width;
                }
            }
            i += 1;
        }

        if cleared > 0 {
            trace!("Cleared {} glitch pulses", cleared);
        }
        cleared
    }

    /// Width of a high pulse starting at `low + 1` if it is a glitch
    fn glitch_width_after(&self, low: usize) -> Option<usize> {
        let end = self.bit_len();
        (1..=MAX_GLITCH_TICKS).find(|&width| {
            let closing = low + width + 1;
            closing < end
                && (low + 1..=low + width).all(|pos| self.bit(pos))
                && !self.bit(closing)
        })
    }

    /// Capture rendered as grouped binary, for trace logs
    pub fn to_bit_string(&self) -> String {
        self.as_bytes()
            .iter()
            .map(|b| format!("{:08b}", b))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

impl Default for RawCapture {
    fn default() -> Self {
        Self::new()
    }
}
