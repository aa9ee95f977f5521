//! The probe's structured result channel.
//!
//! The worker writes exactly one JSON report to its status pipe before
//! exiting; the supervisor reads it after the reap. The report, not the exit
//! status, carries the verdict; the exit code is only consulted when the
//! report is missing.

use crate::config::types::{MonitorError, Result};
use crate::kernel::mounts::MountIdentity;
use crate::probe::ProbeOutcome;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{Read, Write};
use std::os::unix::io::{FromRawFd, RawFd};

/// What the worker observed. Closed set; the supervisor maps it onto
/// ProbeOutcome without inspecting scan internals.
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub enum ScanVerdict {
    /// Full directory scan completed
    #[serde(rename = "clean")]
    Clean,
    /// Mount inaccessible to any principal, or to the owner after the drop
    #[serde(rename = "denied")]
    Denied,
    /// OS error or privilege-drop failure
    #[serde(rename = "error")]
    Error,
}

/// One probe's report, written to the status pipe.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ProbeReport {
    pub verdict: ScanVerdict,
    /// OS error code, when one was observed
    pub errno: Option<i32>,
    /// Human-readable context for log lines
    pub detail: Option<String>,
    /// Identity the scan ran under, once resolved
    pub scanned_uid: Option<u32>,
    pub scanned_gid: Option<u32>,
    /// Directory entries seen; debug detail only, never a liveness signal
    pub entries: u64,
}

impl ProbeReport {
    pub fn clean(identity: MountIdentity, entries: u64) -> Self {
        Self {
            verdict: ScanVerdict::Clean,
            errno: None,
            detail: None,
            scanned_uid: Some(identity.uid),
            scanned_gid: Some(identity.gid),
            entries,
        }
    }

    pub fn denied(detail: impl Into<String>) -> Self {
        Self {
            verdict: ScanVerdict::Denied,
            errno: None,
            detail: Some(detail.into()),
            scanned_uid: None,
            scanned_gid: None,
            entries: 0,
        }
    }

    pub fn error(errno: Option<i32>, detail: impl Into<String>) -> Self {
        Self {
            verdict: ScanVerdict::Error,
            errno,
            detail: Some(detail.into()),
            scanned_uid: None,
            scanned_gid: None,
            entries: 0,
        }
    }

    pub fn to_outcome(&self) -> ProbeOutcome {
        match self.verdict {
            ScanVerdict::Clean => ProbeOutcome::Success,
            ScanVerdict::Denied => ProbeOutcome::PermissionDenied,
            ScanVerdict::Error => ProbeOutcome::Failure(self.errno.unwrap_or(-1)),
        }
    }
}

/// Write the report to the pipe and close it. A report is far smaller than
/// the pipe buffer, so the worker never blocks here.
pub fn write_to_fd(fd: RawFd, report: &ProbeReport) -> Result<()> {
    // SAFETY: fd is the write end of the pipe created for this probe; the
    // File takes ownership and closes it on drop.
    let mut file = unsafe { File::from_raw_fd(fd) };
    let payload = serde_json::to_vec(report)
        .map_err(|e| MonitorError::Process(format!("failed to encode probe report: {}", e)))?;
    file.write_all(&payload)?;
    file.flush()?;
    Ok(())
}

/// Read the report after the child has been reaped. EOF is guaranteed: the
/// child is gone and the parent closed its copy of the write end.
pub fn read_from_fd(fd: RawFd) -> Result<ProbeReport> {
    // SAFETY: fd is the read end of the pipe created for this probe; the
    // File takes ownership and closes it on drop.
    let mut file = unsafe { File::from_raw_fd(fd) };
    let mut data = Vec::new();
    file.read_to_end(&mut data)?;
    if data.is_empty() {
        return Err(MonitorError::Process(
            "probe exited without writing a report".to_string(),
        ));
    }
    serde_json::from_slice(&data)
        .map_err(|e| MonitorError::Process(format!("failed to decode probe report: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verdicts_map_onto_outcomes() {
        let identity = MountIdentity {
            uid: 1000,
            gid: 1000,
            mode: 0o755,
        };
        assert_eq!(
            ProbeReport::clean(identity, 12).to_outcome(),
            ProbeOutcome::Success
        );
        assert_eq!(
            ProbeReport::denied("mode 0000").to_outcome(),
            ProbeOutcome::PermissionDenied
        );
        assert_eq!(
            ProbeReport::error(Some(5), "readdir failed").to_outcome(),
            ProbeOutcome::Failure(5)
        );
        assert_eq!(
            ProbeReport::error(None, "setresgid failed").to_outcome(),
            ProbeOutcome::Failure(-1)
        );
    }

    #[test]
    fn round_trips_through_the_pipe() {
        let (read_fd, write_fd) = nix::unistd::pipe().unwrap();
        let identity = MountIdentity {
            uid: 0,
            gid: 0,
            mode: 0o755,
        };
        write_to_fd(write_fd, &ProbeReport::clean(identity, 3)).unwrap();

        let report = read_from_fd(read_fd).unwrap();
        assert_eq!(report.verdict, ScanVerdict::Clean);
        assert_eq!(report.entries, 3);
        assert_eq!(report.scanned_uid, Some(0));
    }

    #[test]
    fn empty_pipe_is_a_missing_report() {
        let (read_fd, write_fd) = nix::unistd::pipe().unwrap();
        nix::unistd::close(write_fd).unwrap();
        assert!(read_from_fd(read_fd).is_err());
    }
}
