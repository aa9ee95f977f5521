/// Core types for the mountwarden monitor
use serde::{Deserialize, Serialize};
use std::time::Duration;
use thiserror::Error;

/// Default pause between the end of one sweep and the start of the next.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(180);

/// Default wall-clock budget for a single probe before it is killed.
pub const DEFAULT_PROBE_DEADLINE: Duration = Duration::from_secs(60);

/// Monitor configuration, fixed at startup.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct MonitorConfig {
    /// Pause between sweeps in daemon mode
    pub sweep_interval: Duration,
    /// Wall-clock budget for one probe; exceeded probes are SIGKILLed
    pub probe_deadline: Duration,
    /// Detach and sweep forever; false = foreground, exactly one sweep
    pub daemonize: bool,
    /// Mirror every log record to stdout regardless of severity
    pub echo_stdout: bool,
}

impl Default for MonitorConfig {
    fn default() -> Self {
        Self {
            sweep_interval: DEFAULT_SWEEP_INTERVAL,
            probe_deadline: DEFAULT_PROBE_DEADLINE,
            daemonize: true,
            echo_stdout: false,
        }
    }
}

impl MonitorConfig {
    /// Validate the configuration before any runtime setup.
    ///
    /// Hard errors are unrecoverable at startup; the returned strings are
    /// warnings the caller should log once the log sink is up.
    pub fn validate(&self) -> Result<Vec<String>> {
        if self.probe_deadline < Duration::from_secs(1) {
            return Err(MonitorError::Config(
                "probe deadline must be at least one second".to_string(),
            ));
        }
        if self.daemonize && self.sweep_interval.is_zero() {
            return Err(MonitorError::Config(
                "sweep interval must be nonzero in daemon mode".to_string(),
            ));
        }

        let mut warnings = Vec::new();
        if self.probe_deadline >= self.sweep_interval && self.daemonize {
            // Legal: a sweep over hung mounts already takes up to
            // deadline x mounts, but this usually means a mistyped flag.
            warnings.push(format!(
                "probe deadline ({}s) is not shorter than the sweep interval ({}s)",
                self.probe_deadline.as_secs(),
                self.sweep_interval.as_secs()
            ));
        }
        Ok(warnings)
    }
}

/// Custom error types for mountwarden
#[derive(Error, Debug)]
pub enum MonitorError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("mount enumeration error: {0}")]
    Enumeration(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("process error: {0}")]
    Process(String),

    #[error("privilege error: {0}")]
    Privilege(String),

    #[error("logging error: {0}")]
    Logging(String),
}

impl From<nix::errno::Errno> for MonitorError {
    fn from(err: nix::errno::Errno) -> Self {
        MonitorError::Process(err.to_string())
    }
}

/// Result type alias for mountwarden operations
pub type Result<T> = std::result::Result<T, MonitorError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_is_valid() {
        let config = MonitorConfig::default();
        let warnings = config.validate().unwrap();
        assert!(warnings.is_empty());
        assert_eq!(config.sweep_interval, Duration::from_secs(180));
        assert_eq!(config.probe_deadline, Duration::from_secs(60));
    }

    #[test]
    fn sub_second_deadline_is_rejected() {
        let config = MonitorConfig {
            probe_deadline: Duration::from_millis(200),
            ..MonitorConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn zero_interval_is_rejected_in_daemon_mode() {
        let config = MonitorConfig {
            sweep_interval: Duration::ZERO,
            ..MonitorConfig::default()
        };
        assert!(config.validate().is_err());

        // A one-shot foreground run never sleeps, so the interval is moot.
        let oneshot = MonitorConfig {
            sweep_interval: Duration::ZERO,
            daemonize: false,
            ..MonitorConfig::default()
        };
        assert!(oneshot.validate().is_ok());
    }

    #[test]
    fn deadline_longer_than_interval_warns() {
        let config = MonitorConfig {
            sweep_interval: Duration::from_secs(30),
            probe_deadline: Duration::from_secs(60),
            ..MonitorConfig::default()
        };
        let warnings = config.validate().unwrap();
        assert_eq!(warnings.len(), 1);
    }
}
