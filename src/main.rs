//! RTS Capture - Somfy RTS remote receiver
//!
//! Decodes oversampled on/off-keyed captures of RTS remotes into button
//! presses. Captures are replayed from a recording through a host-side radio
//! driver, drained by the receive loop thread and reported on stdout.

mod config;
mod error;
mod radio;
mod remote_tracker;
mod replay;
mod report;
mod rts;

use anyhow::{Context, Result};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::{debug, error, info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use config::Config;
use radio::{CaptureConfig, CaptureStats, RadioCapture, SimulatedRadio};
use remote_tracker::{RemoteTracker, TrackerUpdate};
use replay::CaptureReplay;
use report::EventSink;

/// Decoded events buffered between the loop thread and the reporter
const EVENT_CAPACITY: usize = 256;

fn init_logging() {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| {
            EnvFilter::try_new(std::env::var("LOG_LEVEL").unwrap_or_else(|_| "info".to_string()))
        })
        .unwrap_or_else(|_| EnvFilter::new("info"));

    // stdout carries the event stream
    fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();
}

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    info!("===========================================");
    info!("   RTS Capture - Somfy RTS receiver");
    info!("===========================================");

    let config = Config::from_env();

    info!("Configuration:");
    info!("  Capture source: {}", config.capture_source);
    info!("  Queue depth: {}", config.queue_depth);
    info!("  Poll interval: {:?}", config.poll_interval);
    info!("  Replay interval: {:?}", config.replay_interval);
    info!("  Repeat window: {:?}", config.repeat_window);
    info!("  Output format: {:?}", config.output_format);

    let radio = Arc::new(SimulatedRadio::new(config.queue_depth));

    let capture = RadioCapture::new(
        CaptureConfig {
            poll_interval: config.poll_interval,
            event_capacity: EVENT_CAPACITY,
            stats_interval: config.stats_interval,
        },
        radio.clone(),
        radio.notifier(),
    );
    let event_rx = capture.start()?;

    let replay = Arc::new(CaptureReplay::new(
        config.capture_source.clone(),
        config.replay_interval,
    ));
    let mut replay_handle = Some({
        let replay = replay.clone();
        let radio = radio.clone();
        tokio::spawn(async move { replay.run(radio).await })
    });

    let shutdown = Arc::new(AtomicBool::new(false));
    {
        let shutdown = shutdown.clone();
        tokio::spawn(async move {
            if tokio::signal::ctrl_c().await.is_ok() {
                info!("Ctrl+C received, shutting down...");
                shutdown.store(true, Ordering::SeqCst);
            }
        });
    }

    let mut tracker = RemoteTracker::new(config.max_remotes, config.repeat_window);
    let mut sink = EventSink::new(std::io::stdout(), config.output_format);
    let mut last_tracker_report = Instant::now();

    loop {
        match event_rx.recv_timeout(Duration::from_millis(100)) {
            Ok(event) => report(&mut tracker, &mut sink, &event)?,
            Err(crossbeam_channel::RecvTimeoutError::Timeout) => {}
            Err(crossbeam_channel::RecvTimeoutError::Disconnected) => {
                warn!("Receive loop channel disconnected");
                break;
            }
        }

        if last_tracker_report.elapsed() >= config.stats_interval {
            info!("[Tracker] {}", tracker.stats_summary());
            last_tracker_report = Instant::now();
        }

        if shutdown.load(Ordering::SeqCst) {
            break;
        }

        if replay_handle.as_ref().is_some_and(|handle| handle.is_finished()) {
            if let Some(handle) = replay_handle.take() {
                match handle.await {
                    Ok(Ok(())) => {}
                    Ok(Err(e)) => error!("Capture replay failed: {:#}", e),
                    Err(e) => error!("Capture replay task panicked: {}", e),
                }
            }
        }

        // Replay done and every delivered packet drained: nothing more will arrive
        let drained = CaptureStats::get(&capture.stats().packets_drained);
        if replay_handle.is_none() && radio.held() == 0 && drained == radio.packets_received() {
            for event in event_rx.try_iter() {
                report(&mut tracker, &mut sink, &event)?;
            }
            break;
        }

        if !capture.is_running() {
            warn!("Receive loop stopped unexpectedly");
            break;
        }
    }

    capture.stop();
    if let Some(handle) = replay_handle {
        handle.abort();
    }

    info!("[Tracker] {}", tracker.stats_summary());
    info!(
        "Shutdown complete. Captures replayed: {}, dropped by radio: {}, presses reported: {}",
        replay.captures_replayed(),
        radio.packets_dropped(),
        sink.written()
    );
    Ok(())
}

fn report<W: std::io::Write>(
    tracker: &mut RemoteTracker,
    sink: &mut EventSink<W>,
    event: &rts::ButtonEvent,
) -> Result<()> {
    let update = tracker.update(event, Instant::now());
    if let TrackerUpdate::Repeat { count } = update {
        let frames = tracker
            .get(event.remote_address)
            .map_or(0, |state| state.frames);
        debug!("Repeat {} of {} ({} frames from remote)", count, event, frames);
    }
    sink.emit(event, update)
        .context("Failed to write decoded event")?;
    Ok(())
}
