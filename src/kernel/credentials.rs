//! UID/GID transitions to the mount owner's credentials.
//!
//! CRITICAL: setresgid MUST be called BEFORE setresuid. Dropping the user
//! identity first forfeits the right to change group identity afterwards.

use crate::config::types::{MonitorError, Result};

/// Transition the calling process to the given owner identity:
/// clear supplementary groups -> setresgid -> setresuid -> verify.
///
/// Runs in the probe child only; any failure is fatal to that probe. A
/// root-owned mount transitions to uid/gid 0, a successful no-op.
pub fn drop_to(uid: u32, gid: u32) -> Result<()> {
    clear_supplementary_groups()?;
    // CRITICAL: GID before UID
    set_gid(gid)?;
    set_uid(uid)?;
    verify_transition(uid, gid)
}

fn clear_supplementary_groups() -> Result<()> {
    nix::unistd::setgroups(&[]).map_err(|e| {
        MonitorError::Privilege(format!("failed to clear supplementary groups: {}", e))
    })
}

/// MUST be called BEFORE set_uid.
fn set_gid(gid: u32) -> Result<()> {
    // SAFETY: setresgid atomically sets real, effective, and saved GIDs.
    let rc = unsafe { libc::setresgid(gid as libc::gid_t, gid as libc::gid_t, gid as libc::gid_t) };
    if rc != 0 {
        let err = std::io::Error::last_os_error();
        return Err(MonitorError::Privilege(format!(
            "failed to setresgid({}): {}",
            gid, err
        )));
    }
    Ok(())
}

/// MUST be called AFTER set_gid.
fn set_uid(uid: u32) -> Result<()> {
    // SAFETY: setresuid atomically sets real, effective, and saved UIDs.
    let rc = unsafe { libc::setresuid(uid as libc::uid_t, uid as libc::uid_t, uid as libc::uid_t) };
    if rc != 0 {
        let err = std::io::Error::last_os_error();
        return Err(MonitorError::Privilege(format!(
            "failed to setresuid({}): {}",
            uid, err
        )));
    }
    Ok(())
}

fn verify_transition(expected_uid: u32, expected_gid: u32) -> Result<()> {
    use nix::unistd::{getegid, geteuid, getgid, getuid};

    let real_uid = getuid().as_raw();
    let effective_uid = geteuid().as_raw();
    if real_uid != expected_uid || effective_uid != expected_uid {
        return Err(MonitorError::Privilege(format!(
            "UID verification failed: expected {}, got real={}, effective={}",
            expected_uid, real_uid, effective_uid
        )));
    }

    let real_gid = getgid().as_raw();
    let effective_gid = getegid().as_raw();
    if real_gid != expected_gid || effective_gid != expected_gid {
        return Err(MonitorError::Privilege(format!(
            "GID verification failed: expected {}, got real={}, effective={}",
            expected_gid, real_gid, effective_gid
        )));
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use nix::unistd::{getgid, getuid, geteuid};

    #[test]
    fn drop_to_current_identity() {
        // As root this is a real (if trivial) transition; as an ordinary
        // user clearing supplementary groups needs CAP_SETGID and fails.
        // Either way it must not panic.
        let result = drop_to(getuid().as_raw(), getgid().as_raw());
        if geteuid().is_root() {
            assert!(result.is_ok());
        }
    }

    #[test]
    fn drop_to_foreign_identity_fails_without_root() {
        if geteuid().is_root() {
            return;
        }
        // An unprivileged process cannot become another user.
        assert!(drop_to(1, 1).is_err());
    }

    #[test]
    fn verify_accepts_the_current_identity() {
        assert!(verify_transition(getuid().as_raw(), getgid().as_raw()).is_ok());
        assert!(verify_transition(getuid().as_raw().wrapping_add(1), getgid().as_raw()).is_err());
    }
}
