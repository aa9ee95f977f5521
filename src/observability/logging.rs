//! The log sink: every record goes to syslog (LOG_DAEMON), optionally
//! mirrored to stdout in print mode.

use crate::config::types::{MonitorError, Result};
use log::{Level, LevelFilter, Metadata, Record};
use std::sync::Mutex;
use syslog::{Facility, Formatter3164, Logger, LoggerBackend};

struct MonitorLogger {
    syslog: Mutex<Logger<LoggerBackend, Formatter3164>>,
    echo_stdout: bool,
}

impl log::Log for MonitorLogger {
    fn enabled(&self, metadata: &Metadata) -> bool {
        metadata.level() <= Level::Debug
    }

    fn log(&self, record: &Record) {
        if !self.enabled(record.metadata()) {
            return;
        }
        let message = record.args().to_string();
        if self.echo_stdout {
            println!("{:<5} {}", record.level(), message);
        }
        if let Ok(mut sink) = self.syslog.lock() {
            let _ = match record.level() {
                Level::Error => sink.err(&message),
                Level::Warn => sink.warning(&message),
                Level::Info => sink.info(&message),
                Level::Debug | Level::Trace => sink.debug(&message),
            };
        }
    }

    fn flush(&self) {}
}

/// Connect to the local syslog daemon and install the logger. Failure is a
/// fatal startup error. Call after daemonization so the logged pid is the
/// daemon's.
pub fn init(echo_stdout: bool) -> Result<()> {
    let formatter = Formatter3164 {
        facility: Facility::LOG_DAEMON,
        hostname: None,
        process: "mountwarden".to_string(),
        pid: std::process::id(),
    };
    let sink = syslog::unix(formatter)
        .map_err(|e| MonitorError::Logging(format!("cannot connect to syslog: {}", e)))?;

    log::set_boxed_logger(Box::new(MonitorLogger {
        syslog: Mutex::new(sink),
        echo_stdout,
    }))
    .map_err(|e| MonitorError::Logging(format!("log sink already installed: {}", e)))?;
    log::set_max_level(LevelFilter::Debug);
    Ok(())
}
