use crate::config::types::MonitorConfig;
use crate::{daemon, kernel::alarm, observability::logging, sweep};
use anyhow::Result;
use clap::Parser;
use std::time::Duration;

#[derive(Parser)]
#[command(
    name = "mountwarden",
    version,
    about = "Paranoid mount monitor: probes every mounted filesystem for liveness"
)]
struct Cli {
    /// Stay in the foreground and perform exactly one sweep
    #[arg(long)]
    no_daemon: bool,

    /// Mirror all log output to stdout regardless of severity
    #[arg(long)]
    print: bool,

    /// Seconds to sleep between sweeps
    #[arg(long, value_name = "SECONDS", default_value_t = 180)]
    interval: u64,

    /// Seconds a single probe may run before it is forcibly killed
    #[arg(long, value_name = "SECONDS", default_value_t = 60)]
    deadline: u64,
}

impl Cli {
    fn into_config(self) -> MonitorConfig {
        MonitorConfig {
            sweep_interval: Duration::from_secs(self.interval),
            probe_deadline: Duration::from_secs(self.deadline),
            daemonize: !self.no_daemon,
            echo_stdout: self.print,
        }
    }
}

/// Parse arguments, run the startup sequence, and hand off to the sweep
/// loop. Any error returned here reaches stderr with a nonzero exit.
pub fn run() -> Result<()> {
    let config = Cli::parse().into_config();
    let warnings = config.validate()?;

    // Privilege check precedes any daemonization attempt.
    daemon::require_root()?;

    if config.daemonize {
        daemon::detach()?;
    }

    logging::init(config.echo_stdout)?;
    for warning in &warnings {
        log::warn!("configuration warning: {}", warning);
    }

    // The deadline handler must be in place before the first probe.
    alarm::install()?;

    if config.daemonize {
        log::info!(
            "mountwarden started: sweeping every {}s, {}s probe deadline",
            config.sweep_interval.as_secs(),
            config.probe_deadline.as_secs()
        );
    } else {
        log::info!(
            "mountwarden performing a single sweep with a {}s probe deadline",
            config.probe_deadline.as_secs()
        );
    }

    sweep::run(&config);
    Ok(())
}
