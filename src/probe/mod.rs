//! Per-mount probes: one forked child per mount, one outcome per probe.

pub mod report;
pub mod supervisor;
pub mod worker;

use serde::Serialize;
use std::fmt;

/// Terminal classification of one probe. Exactly one value per probe.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub enum ProbeOutcome {
    /// The scan completed cleanly
    Success,
    /// OS error, bad exit status, or privilege-drop failure (errno or exit code)
    Failure(i32),
    /// The deadline expired and the probe was SIGKILLed
    TimedOut,
    /// The probe was terminated by a signal the enforcer did not send
    Signaled(i32),
    /// The mount is inaccessible to any principal, or to its owner after the
    /// drop. Not evidence of a hang, so never conflated with Failure.
    PermissionDenied,
    /// The probe child could not be created
    SpawnError,
}

impl ProbeOutcome {
    pub fn is_live(self) -> bool {
        matches!(self, ProbeOutcome::Success)
    }

    /// PermissionDenied is reported separately and excluded from the
    /// live/dead ratio.
    pub fn counts_toward_ratio(self) -> bool {
        !matches!(self, ProbeOutcome::PermissionDenied)
    }
}

impl fmt::Display for ProbeOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProbeOutcome::Success => write!(f, "live"),
            ProbeOutcome::Failure(code) => write!(f, "failed (code {})", code),
            ProbeOutcome::TimedOut => write!(f, "timed out"),
            ProbeOutcome::Signaled(sig) => write!(f, "terminated by signal {}", sig),
            ProbeOutcome::PermissionDenied => write!(f, "inaccessible"),
            ProbeOutcome::SpawnError => write!(f, "could not be spawned"),
        }
    }
}
