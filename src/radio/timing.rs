//! RTS timing constants at the receiver's oversampling ratio
//!
//! The radio front end samples each Manchester half-bit (604µs nominal) four
//! times. Every threshold used by the synchronizer and the Manchester decoder
//! is derived here from that ratio so the protocol numbers can be audited
//! without reading the decode logic.

/// Raw samples per Manchester half-bit
pub const OVERSAMPLING: usize = 4;

/// Nominal half-bit period in raw samples (ticks)
pub const HALF_BIT_TICKS: usize = OVERSAMPLING;

/// Nominal full-bit period in ticks
pub const FULL_BIT_TICKS: usize = 2 * HALF_BIT_TICKS;

/// Software sync pulse lasts eight half-bits (~4.8ms)
pub const SYNC_PULSE_TICKS: usize = 8 * HALF_BIT_TICKS;

/// Accepted deviation of the software sync pulse, one half-bit either way
pub const SYNC_TOLERANCE_TICKS: usize = HALF_BIT_TICKS;

/// Shortest accepted software sync pulse (28 ticks)
pub const SYNC_MIN_TICKS: usize = SYNC_PULSE_TICKS - SYNC_TOLERANCE_TICKS;

/// Longest accepted software sync pulse (36 ticks)
pub const SYNC_MAX_TICKS: usize = SYNC_PULSE_TICKS + SYNC_TOLERANCE_TICKS;

/// A low run after the sync longer than this (5 ticks) carries the first
/// half of a leading 1 bit
pub const FIRST_BIT_LOW_TICKS: usize = HALF_BIT_TICKS + 1;

/// Runs at or above this (6 ticks) span a full bit, below it a half bit
pub const BIT_SPLIT_TICKS: usize = (HALF_BIT_TICKS + FULL_BIT_TICKS) / 2;

/// Extra hardware sync pulses sent ahead of a repeated frame
pub const REPEAT_EXTRA_PULSES: usize = 5;

/// Edges to skip over the extra pulses (rising + falling each)
pub const REPEAT_EXTRA_EDGES: usize = 2 * REPEAT_EXTRA_PULSES;

/// Widest glitch removed by the pulse cleaner
pub const MAX_GLITCH_TICKS: usize = 2;

/// Raw capture buffer size reported by the radio configuration
pub const CAPTURE_CAPACITY: usize = 86;

/// Logical bits per RTS frame
pub const FRAME_BITS: usize = 56;

/// Bytes per RTS frame
pub const FRAME_BYTES: usize = FRAME_BITS / 8;
