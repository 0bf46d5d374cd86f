//! Configuration loaded from environment variables

use std::path::PathBuf;
use std::time::Duration;

use crate::replay::CaptureSource;
use crate::report::OutputFormat;

/// Application configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Where recorded captures are read from
    pub capture_source: CaptureSource,

    /// Held-packet slots of the radio driver
    pub queue_depth: usize,

    /// Idle sleep of the receive loop thread
    pub poll_interval: Duration,

    /// Delay between replayed captures
    pub replay_interval: Duration,

    /// Frames repeating a press within this window are folded into it
    pub repeat_window: Duration,

    /// Remotes tracked at once
    pub max_remotes: usize,

    pub output_format: OutputFormat,

    /// Statistics reporting interval
    pub stats_interval: Duration,
}

impl Config {
    /// Load configuration from environment variables
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let parsed = |key: &str| lookup(key).and_then(|s| s.trim().parse::<u64>().ok());

        Self {
            capture_source: match lookup("CAPTURE_PATH") {
                Some(path) if !path.trim().is_empty() && path.trim() != "-" => {
                    CaptureSource::File(PathBuf::from(path.trim()))
                }
                _ => CaptureSource::Stdin,
            },

            queue_depth: parsed("QUEUE_DEPTH")
                .filter(|&n| n > 0)
                .unwrap_or(4) as usize,

            poll_interval: Duration::from_millis(parsed("POLL_INTERVAL_MS").unwrap_or(2)),

            replay_interval: Duration::from_millis(parsed("REPLAY_INTERVAL_MS").unwrap_or(0)),

            repeat_window: Duration::from_millis(parsed("REPEAT_WINDOW_MS").unwrap_or(500)),

            max_remotes: parsed("MAX_REMOTES")
                .filter(|&n| n > 0)
                .unwrap_or(64) as usize,

            output_format: lookup("OUTPUT_FORMAT")
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),

            stats_interval: Duration::from_secs(
                parsed("STATS_INTERVAL_SECS")
                    .filter(|&n| n > 0)
                    .unwrap_or(10),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_with(vars: &[(&str, &str)]) -> Config {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults() {
        let config = config_with(&[]);
        assert_eq!(config.capture_source, CaptureSource::Stdin);
        assert_eq!(config.queue_depth, 4);
        assert_eq!(config.poll_interval, Duration::from_millis(2));
        assert_eq!(config.replay_interval, Duration::ZERO);
        assert_eq!(config.repeat_window, Duration::from_millis(500));
        assert_eq!(config.max_remotes, 64);
        assert_eq!(config.output_format, OutputFormat::Text);
        assert_eq!(config.stats_interval, Duration::from_secs(10));
    }

    #[test]
    fn test_overrides() {
        let config = config_with(&[
            ("CAPTURE_PATH", "captures/sample.txt"),
            ("QUEUE_DEPTH", "8"),
            ("REPLAY_INTERVAL_MS", "250"),
            ("OUTPUT_FORMAT", "json"),
        ]);
        assert_eq!(
            config.capture_source,
            CaptureSource::File(PathBuf::from("captures/sample.txt"))
        );
        assert_eq!(config.queue_depth, 8);
        assert_eq!(config.replay_interval, Duration::from_millis(250));
        assert_eq!(config.output_format, OutputFormat::Json);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let config = config_with(&[
            ("CAPTURE_PATH", "-"),
            ("QUEUE_DEPTH", "0"),
            ("MAX_REMOTES", "lots"),
            ("OUTPUT_FORMAT", "yaml"),
            ("STATS_INTERVAL_SECS", "-3"),
        ]);
        assert_eq!(config.capture_source, CaptureSource::Stdin);
        assert_eq!(config.queue_depth, 4);
        assert_eq!(config.max_remotes, 64);
        assert_eq!(config.output_format, OutputFormat::Text);
        assert_eq!(config.stats_interval, Duration::from_secs(10));
    }
}
