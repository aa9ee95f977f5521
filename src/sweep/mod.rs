//! The sweep loop: enumerate -> probe each mount in order -> report.

pub mod reporter;

pub use reporter::Sweep;

use crate::config::types::MonitorConfig;
use crate::kernel::{alarm, mounts};
use crate::probe::{supervisor, ProbeOutcome};
use chrono::Utc;
use std::thread;
use std::time::Instant;
use uuid::Uuid;

/// Run one complete pass over the current mount table.
///
/// Enumeration failure is sweep-level only: the pass proceeds with zero
/// mounts and the daemon retries on the next interval.
pub fn run_sweep(config: &MonitorConfig) -> Sweep {
    // Correlates the per-mount lines of one pass with its summary.
    let sweep_id = Uuid::new_v4().to_string()[..8].to_string();
    let start_time = Utc::now();
    let started = Instant::now();

    let mount_table = match mounts::snapshot() {
        Ok(mount_table) => mount_table,
        Err(e) => {
            log::error!("{}; sweeping zero mounts [sweep {}]", e, sweep_id);
            Vec::new()
        }
    };
    log::debug!(
        "probing {} mounts [sweep {}]",
        mount_table.len(),
        sweep_id
    );

    // Strictly one probe at a time, in snapshot order; results keep that
    // order.
    let outcomes: Vec<ProbeOutcome> = mount_table
        .iter()
        .map(|mount| supervisor::probe_mount(mount, config.probe_deadline))
        .collect();

    let sweep = reporter::summarize(start_time, started.elapsed(), &outcomes);
    reporter::emit(&sweep, &sweep_id);
    sweep
}

/// Sweep forever at the configured interval, or exactly once in no-daemon
/// mode. Each iteration also collects stray children and drains the
/// spurious-alarm flag.
pub fn run(config: &MonitorConfig) {
    loop {
        run_sweep(config);

        supervisor::reap_strays();
        if alarm::take_spurious_alarm() {
            // Benign race: the deadline fired between a reap and its disarm.
            log::debug!("deadline timer fired with no probe outstanding; ignored");
        }

        if !config.daemonize {
            break;
        }
        thread::sleep(config.sweep_interval);
    }
}
