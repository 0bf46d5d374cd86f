//! Receive loop thread
//!
//! Runs the cooperative drain loop on a dedicated thread and forwards decoded
//! button events over a bounded channel. Statistics are published through
//! atomics so the main task can report them without touching the loop.

use anyhow::{Context, Result};
use crossbeam_channel::{bounded, Receiver, Sender};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::{Duration, Instant};
use tracing::{debug, info};

use super::driver::PacketQueue;
use super::receive::{PacketNotifier, ReceiveLoop};
use crate::rts::ButtonEvent;

/// Receive loop configuration
#[derive(Debug, Clone)]
pub struct CaptureConfig {
    /// Sleep between loop iterations when nothing is pending
    pub poll_interval: Duration,
    /// Decoded events buffered towards the consumer
    pub event_capacity: usize,
    /// Interval of the periodic stats log line
    pub stats_interval: Duration,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            poll_interval: Duration::from_millis(2),
            event_capacity: 256,
            stats_interval: Duration::from_secs(10),
        }
    }
}

/// Statistics for the receive loop (atomic for thread-safe access)
#[derive(Debug, Default)]
pub struct CaptureStats {
    pub packets_drained: AtomicU64,
    pub overflows: AtomicU64,
    pub short_copies: AtomicU64,
    pub repeated_frames: AtomicU64,
    pub sync_errors: AtomicU64,
    pub missing_edges: AtomicU64,
    pub checksum_errors: AtomicU64,
    pub events_decoded: AtomicU64,
    pub events_dropped: AtomicU64,
}

impl CaptureStats {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn get(counter: &AtomicU64) -> u64 {
        counter.load(Ordering::Relaxed)
    }

    pub fn record_dropped_event(&self) {
        self.events_dropped.fetch_add(1, Ordering::Relaxed);
    }

    fn publish<Q: PacketQueue>(&self, receive: &ReceiveLoop<Q>) {
        let loop_stats = receive.stats();
        let decoder = receive.decoder_stats();
        self.packets_drained.store(loop_stats.packets, Ordering::Relaxed);
        self.overflows.store(loop_stats.overflows, Ordering::Relaxed);
        self.short_copies.store(loop_stats.short_copies, Ordering::Relaxed);
        self.repeated_frames.store(decoder.repeated_frames, Ordering::Relaxed);
        self.sync_errors.store(decoder.sync_errors, Ordering::Relaxed);
        self.missing_edges.store(decoder.missing_edges, Ordering::Relaxed);
        self.checksum_errors.store(decoder.checksum_errors, Ordering::Relaxed);
        self.events_decoded.store(decoder.decoded, Ordering::Relaxed);
    }
}

impl std::fmt::Display for CaptureStats {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Packets: {} | Decoded: {} | Dropped: {} | Repeated: {} | Overflows: {} | Short copies: {} | Sync errors: {} | Missing edges: {} | Checksum errors: {}",
            Self::get(&self.packets_drained),
            Self::get(&self.events_decoded),
            Self::get(&self.events_dropped),
            Self::get(&self.repeated_frames),
            Self::get(&self.overflows),
            Self::get(&self.short_copies),
            Self::get(&self.sync_errors),
            Self::get(&self.missing_edges),
            Self::get(&self.checksum_errors)
        )
    }
}

/// Receive loop controller
pub struct RadioCapture<Q> {
    config: CaptureConfig,
    queue: Q,
    notifier: PacketNotifier,
    running: Arc<AtomicBool>,
    stats: Arc<CaptureStats>,
}

impl<Q> RadioCapture<Q>
where
    Q: PacketQueue + Clone + Send + 'static,
{
    pub fn new(config: CaptureConfig, queue: Q, notifier: PacketNotifier) -> Self {
        Self {
            config,
            queue,
            notifier,
            running: Arc::new(AtomicBool::new(false)),
            stats: CaptureStats::new(),
        }
    }

    /// Start the loop thread and return a receiver for decoded events
    pub fn start(&self) -> Result<Receiver<ButtonEvent>> {
        info!(
            "Starting receive loop (poll {:?}, {} event slots)",
            self.config.poll_interval, self.config.event_capacity
        );

        let (event_tx, event_rx) = bounded::<ButtonEvent>(self.config.event_capacity);

        let config = self.config.clone();
        let receive = ReceiveLoop::new(self.queue.clone(), self.notifier.clone());
        let running = self.running.clone();
        let stats = self.stats.clone();

        running.store(true, Ordering::SeqCst);

        thread::Builder::new()
            .name("rts-receive".to_string())
            .spawn(move || run_loop(config, receive, running, stats, event_tx))
            .context("Failed to spawn receive thread")?;

        Ok(event_rx)
    }

    /// Stop the loop thread after its current iteration
    pub fn stop(&self) {
        if self.running.swap(false, Ordering::SeqCst) {
            info!("Stopping receive loop...");
        }
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn stats(&self) -> &Arc<CaptureStats> {
        &self.stats
    }
}

/// Main receive loop (runs in dedicated thread)
fn run_loop<Q: PacketQueue>(
    config: CaptureConfig,
    mut receive: ReceiveLoop<Q>,
    running: Arc<AtomicBool>,
    stats: Arc<CaptureStats>,
    event_tx: Sender<ButtonEvent>,
) {
    let mut last_stats_time = Instant::now();

    while running.load(Ordering::SeqCst) {
        let events = receive.process_action();
        let drained = !events.is_empty();

        for event in events {
            // never block the loop on a slow consumer
            if event_tx.try_send(event).is_err() {
                stats.record_dropped_event();
                debug!("Event channel full, dropping {}", event);
            }
        }
        stats.publish(&receive);

        if last_stats_time.elapsed() >= config.stats_interval {
            info!("[Receive Stats] {}", stats);
            last_stats_time = Instant::now();
        }

        if !drained {
            thread::sleep(config.poll_interval);
        }
    }

    let loop_stats = receive.stats();
    debug!(
        "Loop {:?} after {} drains, {} packets released",
        receive.state(),
        loop_stats.drains,
        loop_stats.released
    );
    info!("Receive loop stopped");
    info!("Final stats: {}", stats);
}

impl<Q> Drop for RadioCapture<Q> {
    fn drop(&mut self) {
        self.running.store(false, Ordering::SeqCst);
    }
}
