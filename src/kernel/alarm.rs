//! The probe deadline: a single process-wide SIGALRM timer.
//!
//! The handler's whole job is to read the active-probe handle and SIGKILL
//! that pid. Everything else (logging, classification, bookkeeping) happens
//! in the supervisor after the reap, because only atomics and kill(2) are
//! legal in signal context.

use crate::config::types::{MonitorError, Result};
use nix::sys::signal::{self, SaFlags, SigAction, SigHandler, SigSet, Signal};
use nix::unistd::{alarm, Pid};
use std::sync::atomic::{AtomicBool, AtomicI32, Ordering};
use std::time::Duration;

/// Pid of the currently outstanding probe, or 0. Single-writer: the
/// supervisor sets and clears it; the SIGALRM handler only reads it.
static ACTIVE_PROBE: AtomicI32 = AtomicI32::new(0);

/// Set by the handler when it kills a probe, so the supervisor can tell a
/// deadline SIGKILL apart from one sent by a third party.
static DEADLINE_FIRED: AtomicBool = AtomicBool::new(false);

/// Set by the handler when it fires with no probe outstanding (the benign
/// race against disarm). Drained and logged by the sweep loop.
static SPURIOUS_ALARM: AtomicBool = AtomicBool::new(false);

extern "C" fn on_alarm(_sig: libc::c_int) {
    // ASYNC-SIGNAL SAFETY: atomics and kill(2) only. No logging, no
    // allocation, no other shared state.
    let pid = ACTIVE_PROBE.load(Ordering::SeqCst);
    if pid > 0 {
        DEADLINE_FIRED.store(true, Ordering::SeqCst);
        // SAFETY: plain kill(2). ESRCH from a just-reaped pid is ignored.
        unsafe { libc::kill(pid, libc::SIGKILL) };
    } else {
        SPURIOUS_ALARM.store(true, Ordering::SeqCst);
    }
}

/// Install the SIGALRM handler. Must succeed before any probe is launched;
/// failure is a fatal startup error.
pub fn install() -> Result<()> {
    let action = SigAction::new(
        SigHandler::Handler(on_alarm),
        SaFlags::SA_RESTART,
        SigSet::empty(),
    );
    // SAFETY: on_alarm is async-signal-safe (atomics and kill only).
    unsafe { signal::sigaction(Signal::SIGALRM, &action) }
        .map_err(|e| MonitorError::Process(format!("cannot install SIGALRM handler: {}", e)))?;
    Ok(())
}

/// Record the probe the handler may kill. Called by the supervisor
/// immediately after fork, before the deadline is armed.
pub fn record_active_probe(pid: Pid) {
    ACTIVE_PROBE.store(pid.as_raw(), Ordering::SeqCst);
}

/// Clear the handle. Called unconditionally after every reap.
pub fn clear_active_probe() {
    ACTIVE_PROBE.store(0, Ordering::SeqCst);
}

/// The currently recorded probe, if any.
pub fn active_probe() -> Option<Pid> {
    match ACTIVE_PROBE.load(Ordering::SeqCst) {
        0 => None,
        pid => Some(Pid::from_raw(pid)),
    }
}

/// Arm the deadline for exactly one probe. alarm(2) has whole-second
/// granularity; sub-second remainders round up.
pub fn arm(deadline: Duration) {
    DEADLINE_FIRED.store(false, Ordering::SeqCst);
    let secs = deadline
        .as_secs()
        .saturating_add(u64::from(deadline.subsec_nanos() > 0));
    alarm::set(secs.min(u64::from(u32::MAX)) as u32);
}

/// Disarm the deadline. Called immediately after the probe is reaped.
pub fn disarm() {
    alarm::cancel();
}

/// True once per deadline expiry that killed a probe; reading resets it.
pub fn take_deadline_fired() -> bool {
    DEADLINE_FIRED.swap(false, Ordering::SeqCst)
}

/// True once per firing that found no probe outstanding; reading resets it.
pub fn take_spurious_alarm() -> bool {
    SPURIOUS_ALARM.swap(false, Ordering::SeqCst)
}
