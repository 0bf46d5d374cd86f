//! Capture replay runner - reads recorded captures and feeds the radio
//!
//! One capture per line, as hex: `*<hex>;` (the dump format) or bare hex,
//! whitespace inside the hex allowed. Blank lines and `#` comments are skipped.

use anyhow::{Context, Result};
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::io::{AsyncBufReadExt, AsyncRead, BufReader};
use tokio_stream::wrappers::LinesStream;
use tokio_stream::StreamExt;
use tracing::{debug, info, warn};

use crate::radio::SimulatedRadio;

const SLOT_WAIT: Duration = Duration::from_millis(1);

/// Where recorded captures come from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CaptureSource {
    Stdin,
    File(PathBuf),
}

impl std::fmt::Display for CaptureSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Stdin => write!(f, "stdin"),
            Self::File(path) => write!(f, "{}", path.display()),
        }
    }
}

/// Feeds recorded captures into the radio's receive path
pub struct CaptureReplay {
    source: CaptureSource,
    interval: Duration,
    captures_replayed: Arc<AtomicU64>,
    parse_errors: Arc<AtomicU64>,
}

impl CaptureReplay {
    pub fn new(source: CaptureSource, interval: Duration) -> Self {
        Self {
            source,
            interval,
            captures_replayed: Arc::new(AtomicU64::new(0)),
            parse_errors: Arc::new(AtomicU64::new(0)),
        }
    }

    /// Replay every capture of the source, returning at end of input
    pub async fn run(&self, radio: Arc<SimulatedRadio>) -> Result<()> {
        info!("Replaying captures from {}", self.source);

        let reader: Box<dyn AsyncRead + Unpin + Send> = match &self.source {
            CaptureSource::Stdin => Box::new(tokio::io::stdin()),
            CaptureSource::File(path) => Box::new(
                tokio::fs::File::open(path)
                    .await
                    .with_context(|| format!("Failed to open capture file {}", path.display()))?,
            ),
        };

        self.replay_lines(reader, &radio).await?;

        info!(
            "Replay finished. Captures: {}, Parse errors: {}",
            self.captures_replayed(),
            self.parse_errors()
        );
        Ok(())
    }

    async fn replay_lines<R>(&self, reader: R, radio: &SimulatedRadio) -> Result<()>
    where
        R: AsyncRead + Unpin,
    {
        let mut lines = LinesStream::new(BufReader::new(reader).lines());
        let mut line_no = 0usize;

        while let Some(line) = lines.next().await {
            let line = line.context("Failed to read capture line")?;
            line_no += 1;

            match parse_capture_line(&line) {
                None => continue,
                Some(Ok(bytes)) => {
                    debug!("Line {}: capture of {} bytes", line_no, bytes.len());
                    // a recording is not live air: wait for a free slot
                    while radio.is_full() {
                        tokio::time::sleep(SLOT_WAIT).await;
                    }
                    self.captures_replayed.fetch_add(1, Ordering::Relaxed);
                    radio.receive(bytes);
                }
                Some(Err(e)) => {
                    self.parse_errors.fetch_add(1, Ordering::Relaxed);
                    warn!("Line {}: not a capture ({})", line_no, e);
                    continue;
                }
            }

            if !self.interval.is_zero() {
                tokio::time::sleep(self.interval).await;
            }
        }

        Ok(())
    }

    pub fn captures_replayed(&self) -> u64 {
        self.captures_replayed.load(Ordering::Relaxed)
    }

    pub fn parse_errors(&self) -> u64 {
        self.parse_errors.load(Ordering::Relaxed)
    }
}

/// Parse one capture line; `None` for blank lines and comments
fn parse_capture_line(line: &str) -> Option<Result<Vec<u8>, hex::FromHexError>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return None;
    }

    let body = line.strip_prefix('*').unwrap_or(line);
    let body = body.strip_suffix(';').unwrap_or(body);
    let digits: String = body.chars().filter(|c| !c.is_whitespace()).collect();

    Some(hex::decode(digits))
}
