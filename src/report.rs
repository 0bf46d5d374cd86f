//! Decoded event output
//!
//! Button presses go to stdout, one per line, so the stream can be piped
//! while logs stay on stderr.

use serde::Serialize;
use std::io::Write;
use std::str::FromStr;

use crate::remote_tracker::TrackerUpdate;
use crate::rts::{Button, ButtonEvent};

/// Line format of the event stream
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputFormat {
    /// `From remote 1a2b3c (seq 42): DOWN`, new presses only
    #[default]
    Text,
    /// One JSON object per frame, repeats included
    Json,
}

impl FromStr for OutputFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "text" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown output format '{}'", other)),
        }
    }
}

/// JSON shape of one reported frame
#[derive(Debug, Serialize)]
struct ReportedEvent<'a> {
    timestamp_ms: i64,
    remote: String,
    rolling_code: u16,
    button: Button,
    command: Option<&'a str>,
    repeat: u32,
}

/// Writes decoded events in the configured format
pub struct EventSink<W: Write> {
    writer: W,
    format: OutputFormat,
    written: u64,
}

impl<W: Write> EventSink<W> {
    pub fn new(writer: W, format: OutputFormat) -> Self {
        Self {
            writer,
            format,
            written: 0,
        }
    }

    /// Report one event; returns whether a line was written
    pub fn emit(&mut self, event: &ButtonEvent, update: TrackerUpdate) -> anyhow::Result<bool> {
        let repeat = match update {
            TrackerUpdate::NewPress => 0,
            TrackerUpdate::Repeat { count } => count,
        };

        match self.format {
            OutputFormat::Text => {
                if repeat > 0 {
                    return Ok(false);
                }
                writeln!(self.writer, "{}", event)?;
            }
            OutputFormat::Json => {
                let reported = ReportedEvent {
                    timestamp_ms: chrono::Utc::now().timestamp_millis(),
                    remote: format!("{:06x}", event.remote_address),
                    rolling_code: event.rolling_code,
                    button: event.button,
                    command: event.button.command(),
                    repeat,
                };
                serde_json::to_writer(&mut self.writer, &reported)?;
                writeln!(self.writer)?;
            }
        }

        self.writer.flush()?;
        self.written += 1;
        Ok(true)
    }

    pub fn written(&self) -> u64 {
        self.written
    }

    #[cfg(test)]
    fn into_inner(self) -> W {
        self.writer
    }
}
