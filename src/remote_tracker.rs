//! Remote state tracking
//!
//! A held button makes the remote send the same frame over and over (the
//! repeated-packet framing). The tracker folds those repeats into a single
//! press per remote and keeps per-remote counters for the periodic summary.

use std::collections::HashMap;
use std::time::{Duration, Instant};
use tracing::debug;

use crate::rts::{Button, ButtonEvent};

/// Maximum age for remote state before removal
const REMOTE_TIMEOUT_SECS: u64 = 300;

/// Interval between stale-remote sweeps
const CLEANUP_INTERVAL_SECS: u64 = 30;

/// Aggregated state of one remote
#[derive(Debug, Clone)]
pub struct RemoteState {
    /// 24-bit remote address
    pub address: u32,
    /// Rolling code of the most recent frame
    pub last_rolling_code: u16,
    /// Button of the most recent frame
    pub last_button: Button,
    /// Frames received, repeats included
    pub frames: u64,
    /// Distinct presses
    pub presses: u64,
    /// Repeats of the current press
    pub repeats: u32,
    pub last_seen: Instant,
}

impl RemoteState {
    fn new(event: &ButtonEvent, now: Instant) -> Self {
        Self {
            address: event.remote_address,
            last_rolling_code: event.rolling_code,
            last_button: event.button,
            frames: 0,
            presses: 0,
            repeats: 0,
            last_seen: now,
        }
    }

    fn is_stale(&self, now: Instant) -> bool {
        now.duration_since(self.last_seen) > Duration::from_secs(REMOTE_TIMEOUT_SECS)
    }
}

/// Outcome of feeding one event to the tracker
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TrackerUpdate {
    /// First frame of a new press
    NewPress,
    /// Same press seen again; `count` repeats so far
    Repeat { count: u32 },
}

/// Remote tracker - manages state for all remotes heard
pub struct RemoteTracker {
    remotes: HashMap<u32, RemoteState>,
    max_remotes: usize,
    repeat_window: Duration,
    last_cleanup: Option<Instant>,
}

impl RemoteTracker {
    pub fn new(max_remotes: usize, repeat_window: Duration) -> Self {
        Self {
            remotes: HashMap::with_capacity(max_remotes),
            max_remotes: max_remotes.max(1),
            repeat_window,
            last_cleanup: None,
        }
    }

    /// Record a decoded event received at `now`
    pub fn update(&mut self, event: &ButtonEvent, now: Instant) -> TrackerUpdate {
        let address = event.remote_address;

        if !self.remotes.contains_key(&address) {
            if self.remotes.len() >= self.max_remotes {
                self.evict(now);
            }
            debug!("New remote heard: {:06x}", address);
        }

        let state = self
            .remotes
            .entry(address)
            .or_insert_with(|| RemoteState::new(event, now));

        let is_repeat = state.frames > 0
            && state.last_rolling_code == event.rolling_code
            && state.last_button == event.button
            && now.duration_since(state.last_seen) <= self.repeat_window;

        state.frames += 1;
        state.last_seen = now;
        state.last_rolling_code = event.rolling_code;
        state.last_button = event.button;

        let update = if is_repeat {
            state.repeats += 1;
            TrackerUpdate::Repeat {
                count: state.repeats,
            }
        } else {
            state.presses += 1;
            state.repeats = 0;
            TrackerUpdate::NewPress
        };

        // Periodic cleanup
        let last_cleanup = *self.last_cleanup.get_or_insert(now);
        if now.duration_since(last_cleanup) > Duration::from_secs(CLEANUP_INTERVAL_SECS) {
            self.cleanup_stale(now);
            self.last_cleanup = Some(now);
        }

        update
    }

    pub fn get(&self, address: u32) -> Option<&RemoteState> {
        self.remotes.get(&address)
    }

    /// Remove remotes not heard for a while
    fn cleanup_stale(&mut self, now: Instant) -> usize {
        let before = self.remotes.len();
        self.remotes.retain(|_, state| !state.is_stale(now));
        let removed = before - self.remotes.len();
        if removed > 0 {
            debug!("Removed {} stale remotes", removed);
        }
        removed
    }

    /// Drop stale remotes, or the least recently seen one if none is stale
    fn evict(&mut self, now: Instant) {
        let before = self.remotes.len();

        if self.cleanup_stale(now) == 0 {
            if let Some(oldest) = self
                .remotes
                .values()
                .min_by_key(|state| state.last_seen)
                .map(|state| state.address)
            {
                self.remotes.remove(&oldest);
            }
        }
        debug!(
            "Evicted {} remotes, {} remaining",
            before - self.remotes.len(),
            self.remotes.len()
        );
    }

    /// Get summary statistics
    pub fn stats_summary(&self) -> TrackerStats {
        TrackerStats {
            remotes: self.remotes.len(),
            presses: self.remotes.values().map(|r| r.presses).sum(),
            frames: self.remotes.values().map(|r| r.frames).sum(),
        }
    }
}

/// Tracker statistics
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackerStats {
    pub remotes: usize,
    pub presses: u64,
    pub frames: u64,
}

impl std::fmt::Display for TrackerStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Remotes: {}, {} presses, {} frames",
            self.remotes, self.presses, self.frames
        )
    }
}
