//! The probe child.
//!
//! Runs in complete isolation from the supervisor's memory: it communicates
//! only through the report pipe and its wait status, and always terminates
//! via _exit without unwinding back into the parent's frames.

use crate::kernel::{credentials, mounts};
use crate::kernel::mounts::Mount;
use crate::probe::report::{self, ProbeReport};
use std::fs;
use std::io;
use std::os::unix::io::RawFd;
use std::path::Path;

/// Exit code when the report itself could not be written (EX_SOFTWARE).
const REPORT_WRITE_FAILED: i32 = 70;

/// Probe one mount and report through `report_fd`. Never returns.
pub fn run(mount: &Mount, report_fd: RawFd) -> ! {
    let outcome = scan_mount(mount);
    let written = report::write_to_fd(report_fd, &outcome).is_ok();
    // _exit skips atexit handlers and stdio buffers shared with the parent.
    unsafe { libc::_exit(if written { 0 } else { REPORT_WRITE_FAILED }) }
}

fn scan_mount(mount: &Mount) -> ProbeReport {
    // An unresolvable or all-access-denied mount is not evidence of a hang.
    let identity = match mounts::resolve_identity(&mount.path) {
        Ok(identity) => identity,
        Err(e) => {
            return ProbeReport::denied(format!("cannot stat {}: {}", mount.path.display(), e))
        }
    };
    if identity.mode & 0o777 == 0 {
        return ProbeReport::denied(format!(
            "{} mode {:04o} denies access to every principal",
            mount.path.display(),
            identity.mode
        ));
    }

    // Group before user; see kernel::credentials.
    if let Err(e) = credentials::drop_to(identity.uid, identity.gid) {
        return ProbeReport::error(
            None,
            format!(
                "privilege drop to uid {} gid {} failed: {}",
                identity.uid, identity.gid, e
            ),
        );
    }

    log::debug!(
        "scanning {} as uid {} gid {}",
        mount.path.display(),
        identity.uid,
        identity.gid
    );

    // The scan is the probe: a hung filesystem blocks in the underlying
    // readdir, which is exactly what the deadline catches.
    match scan_directory(&mount.path) {
        Ok(entries) => ProbeReport::clean(identity, entries),
        Err(e) if e.kind() == io::ErrorKind::PermissionDenied => ProbeReport::denied(format!(
            "{} is not readable by its owner after the privilege drop: {}",
            mount.path.display(),
            e
        )),
        Err(e) => ProbeReport::error(
            e.raw_os_error(),
            format!("scan of {} failed: {}", mount.path.display(), e),
        ),
    }
}

/// Full linear scan of the directory's entries. The count is returned for
/// the debug log only.
fn scan_directory(path: &Path) -> io::Result<u64> {
    let mut entries = 0u64;
    for entry in fs::read_dir(path)? {
        entry?;
        entries += 1;
    }
    Ok(entries)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::probe::report::ScanVerdict;
    use std::path::PathBuf;

    fn mount_at(path: PathBuf) -> Mount {
        Mount { path, source: None }
    }

    #[test]
    fn scan_counts_directory_entries() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("a"), b"x").unwrap();
        fs::write(dir.path().join("b"), b"y").unwrap();
        assert_eq!(scan_directory(dir.path()).unwrap(), 2);
    }

    #[test]
    fn scan_of_missing_directory_fails() {
        let err = scan_directory(Path::new("/nonexistent/mountwarden-test")).unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn unresolvable_mount_is_denied_not_failed() {
        let report = scan_mount(&mount_at(PathBuf::from("/nonexistent/mountwarden-test")));
        assert_eq!(report.verdict, ScanVerdict::Denied);
    }

    #[test]
    fn all_access_denied_mode_is_denied_before_any_drop() {
        use std::os::unix::fs::PermissionsExt;

        let dir = tempfile::tempdir().unwrap();
        fs::set_permissions(dir.path(), fs::Permissions::from_mode(0o000)).unwrap();

        let report = scan_mount(&mount_at(dir.path().to_path_buf()));
        assert_eq!(report.verdict, ScanVerdict::Denied);

        // Restore so the tempdir can be removed.
        fs::set_permissions(dir.path(), fs::Permissions::from_mode(0o755)).unwrap();
    }
}
