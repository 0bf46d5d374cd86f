//! Transmitter model for tests
//!
//! Builds oversampled captures the way an RTS remote would put them on air:
//! checksum sealed, whitened, Manchester coded (1 = low-high, 0 = high-low),
//! behind the hardware and software sync pulses.

use super::bits::{put_bit, RawCapture};
use super::timing::{CAPTURE_CAPACITY, FRAME_BITS, FRAME_BYTES, HALF_BIT_TICKS, REPEAT_EXTRA_PULSES, SYNC_PULSE_TICKS};

/// Low samples at the start of every capture (tail of the gap after hw1)
pub const LEAD_TICKS: usize = 2 * HALF_BIT_TICKS;

/// Hardware sync pulses are four half-bits high, four low
const HW_PULSE_TICKS: usize = 4 * HALF_BIT_TICKS;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Framing {
    Plain,
    Repeated,
}

/// Store the nibble checksum in the low nibble of byte 1
pub fn seal(mut payload: [u8; FRAME_BYTES]) -> [u8; FRAME_BYTES] {
    payload[1] &= 0xF0;
    let cks = payload.iter().fold(0u8, |acc, &b| acc ^ b ^ (b >> 4));
    payload[1] |= cks & 0x0F;
    payload
}

/// Running XOR applied by the remote before transmission
pub fn whiten(payload: [u8; FRAME_BYTES]) -> [u8; FRAME_BYTES] {
    let mut frame = payload;
    for i in 1..FRAME_BYTES {
        frame[i] = payload[i] ^ frame[i - 1];
    }
    frame
}

/// One level held for a number of ticks
pub type Run = (bool, usize);

/// Encode a payload (checksum already in place) into a full-size capture
pub fn encode_capture(payload: [u8; FRAME_BYTES], framing: Framing) -> Vec<u8> {
    sample_runs(&frame_runs(payload, framing))
}

/// The transmission as level runs at nominal widths. Adjacent equal levels
/// are merged, so every run ends on an edge.
pub fn frame_runs(payload: [u8; FRAME_BYTES], framing: Framing) -> Vec<Run> {
    let frame = whiten(payload);
    let mut runs = Vec::new();
    push_run(&mut runs, false, LEAD_TICKS);

    let hw_pulses = match framing {
        Framing::Plain => 1,
        Framing::Repeated => 1 + REPEAT_EXTRA_PULSES,
    };
    for _ in 0..hw_pulses {
        push_run(&mut runs, true, HW_PULSE_TICKS);
        push_run(&mut runs, false, HW_PULSE_TICKS);
    }
    push_run(&mut runs, true, SYNC_PULSE_TICKS);
    push_run(&mut runs, false, HALF_BIT_TICKS);

    for pos in 0..FRAME_BITS {
        let bit = (frame[pos / 8] >> (7 - pos % 8)) & 1 == 1;
        push_run(&mut runs, !bit, HALF_BIT_TICKS);
        push_run(&mut runs, bit, HALF_BIT_TICKS);
    }
    runs
}

/// Index of the software sync pulse in `frame_runs` output
pub fn sync_run(runs: &[Run]) -> usize {
    runs.iter()
        .position(|&run| run == (true, SYNC_PULSE_TICKS))
        .expect("transmission has a sync pulse")
}

fn push_run(runs: &mut Vec<Run>, level: bool, ticks: usize) {
    match runs.last_mut() {
        Some((last, width)) if *last == level => *width += ticks,
        _ => runs.push((level, ticks)),
    }
}

/// Sample level runs into a full-size capture, low after the last run
pub fn sample_runs(runs: &[Run]) -> Vec<u8> {
    let total: usize = runs.iter().map(|&(_, ticks)| ticks).sum();
    assert!(total <= CAPTURE_CAPACITY * 8, "frame does not fit the capture");

    let mut bytes = vec![0u8; CAPTURE_CAPACITY];
    let mut pos = 0;
    for &(level, ticks) in runs {
        for _ in 0..ticks {
            put_bit(&mut bytes, pos, level);
            pos += 1;
        }
    }
    bytes
}

/// Raise `width` samples starting at bit `pos`
pub fn inject_glitch(bytes: &mut [u8], pos: usize, width: usize) {
    for p in pos..pos + width {
        put_bit(bytes, p, true);
    }
}

/// Copy raw bytes into a fresh capture
pub fn load(bytes: &[u8]) -> RawCapture {
    let mut capture = RawCapture::new();
    capture
        .load(bytes.len())
        .expect("test capture fits")
        .copy_from_slice(bytes);
    capture
}
