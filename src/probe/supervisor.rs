//! Probe orchestration: fork, deadline, reap, classify.
//!
//! Probes run strictly one at a time, in snapshot order. Serialization is
//! deliberate: an unbounded number of simultaneous probes could itself
//! exhaust process and fd resources on a host already struggling with hung
//! mounts. The cost is latency only: a hung mount delays, but never blocks,
//! detection of the mounts after it.

use crate::kernel::alarm;
use crate::kernel::mounts::Mount;
use crate::probe::report::{self, ProbeReport};
use crate::probe::{worker, ProbeOutcome};
use nix::errno::Errno;
use nix::sys::signal::Signal;
use nix::sys::wait::{waitpid, WaitPidFlag, WaitStatus};
use nix::unistd::{close, fork, pipe, ForkResult, Pid};
use std::time::Duration;

/// Probe one mount under the given deadline and classify the result.
///
/// The active-probe handle is non-empty for at most the window between the
/// fork and the post-reap clear, and never for two probes at once.
pub fn probe_mount(mount: &Mount, deadline: Duration) -> ProbeOutcome {
    log::debug!("checking {}", mount.describe());

    let (report_read, report_write) = match pipe() {
        Ok(fds) => fds,
        Err(e) => {
            log::error!("cannot create report pipe for {}: {}", mount.describe(), e);
            return ProbeOutcome::SpawnError;
        }
    };

    // SAFETY: the child immediately enters worker::run, which ends in _exit
    // and never unwinds back into this frame. The parent is single-threaded,
    // so the child's allocator state is consistent.
    match unsafe { fork() } {
        Ok(ForkResult::Child) => {
            let _ = close(report_read);
            worker::run(mount, report_write)
        }
        Ok(ForkResult::Parent { child }) => {
            let _ = close(report_write);
            supervise(mount, child, report_read, deadline)
        }
        Err(e) => {
            let _ = close(report_read);
            let _ = close(report_write);
            log::error!("cannot fork probe for {}: {}", mount.describe(), e);
            ProbeOutcome::SpawnError
        }
    }
}

/// Parent side: handle, deadline, blocking reap, classification.
fn supervise(
    mount: &Mount,
    child: Pid,
    report_fd: std::os::unix::io::RawFd,
    deadline: Duration,
) -> ProbeOutcome {
    alarm::record_active_probe(child);
    alarm::arm(deadline);

    let status = wait_for(child);

    alarm::disarm();
    let deadline_fired = alarm::take_deadline_fired();

    // The child is gone and our write end is closed, so this cannot block.
    let probe_report = report::read_from_fd(report_fd).ok();

    alarm::clear_active_probe();

    let outcome = match status {
        Ok(status) => classify(status, probe_report.as_ref(), deadline_fired),
        Err(e) => {
            log::error!("waitpid for probe {} of {} failed: {}", child, mount.describe(), e);
            ProbeOutcome::Failure(e as i32)
        }
    };
    log_outcome(mount, outcome, probe_report.as_ref(), deadline);
    outcome
}

/// Block until the probe terminates, normally or by cancellation.
fn wait_for(child: Pid) -> nix::Result<WaitStatus> {
    loop {
        match waitpid(child, None) {
            Err(Errno::EINTR) => continue,
            other => return other,
        }
    }
}

/// Map a wait status plus the report onto a ProbeOutcome. Pure; the only
/// place the deadline SIGKILL is told apart from a third-party signal.
pub fn classify(
    status: WaitStatus,
    probe_report: Option<&ProbeReport>,
    deadline_fired: bool,
) -> ProbeOutcome {
    match status {
        WaitStatus::Signaled(_, Signal::SIGKILL, _) if deadline_fired => ProbeOutcome::TimedOut,
        WaitStatus::Signaled(_, sig, _) => ProbeOutcome::Signaled(sig as i32),
        WaitStatus::Exited(_, code) => match probe_report {
            Some(probe_report) => probe_report.to_outcome(),
            // Exited without a report: the result channel is broken, and
            // the exit code is all the evidence left.
            None => ProbeOutcome::Failure(code),
        },
        // Stopped/continued states are never requested; a probe observed in
        // one is not a live mount.
        _ => ProbeOutcome::Failure(-1),
    }
}

fn log_outcome(
    mount: &Mount,
    outcome: ProbeOutcome,
    probe_report: Option<&ProbeReport>,
    deadline: Duration,
) {
    let detail = probe_report
        .and_then(|r| r.detail.clone())
        .unwrap_or_default();
    match outcome {
        ProbeOutcome::Success => {
            if let Some(r) = probe_report {
                log::debug!(
                    "{} is live: {} entries scanned as uid {} gid {}",
                    mount.describe(),
                    r.entries,
                    r.scanned_uid.unwrap_or(0),
                    r.scanned_gid.unwrap_or(0)
                );
            }
        }
        ProbeOutcome::PermissionDenied => {
            log::info!(
                "{} excluded from liveness check: {}",
                mount.describe(),
                detail
            );
        }
        ProbeOutcome::TimedOut => {
            // All deadline logging lives here, after the reap; the signal
            // handler itself must stay silent.
            log::error!(
                "probe of {} exceeded the {}s deadline and was killed",
                mount.describe(),
                deadline.as_secs()
            );
        }
        ProbeOutcome::Signaled(sig) => {
            log::error!("probe of {} terminated by signal {}", mount.describe(), sig);
        }
        ProbeOutcome::Failure(code) => {
            if detail.is_empty() {
                log::error!("probe of {} failed with code {}", mount.describe(), code);
            } else {
                log::error!("probe of {} failed: {}", mount.describe(), detail);
            }
        }
        // Spawn errors are logged at the fork site, where errno is fresh.
        ProbeOutcome::SpawnError => {}
    }
}

/// Best-effort non-blocking reap of any stray terminated children,
/// including accidentally inherited orphans. Run once per sweep iteration.
pub fn reap_strays() -> usize {
    let mut reaped = 0;
    loop {
        // -1: any child, as in waitpid(2).
        match waitpid(Pid::from_raw(-1), Some(WaitPidFlag::WNOHANG)) {
            Ok(WaitStatus::StillAlive) => break,
            Ok(WaitStatus::Exited(..)) | Ok(WaitStatus::Signaled(..)) => reaped += 1,
            Ok(_) => continue,
            Err(Errno::ECHILD) => break,
            Err(e) => {
                log::error!("stray reap pass failed: {}", e);
                break;
            }
        }
    }
    if reaped > 0 {
        log::debug!("reaped {} stray child processes", reaped);
    }
    reaped
}
