//! Startup checks and background detachment. Thin OS wrappers only.

use crate::config::types::{MonitorError, Result};
use nix::unistd::{chdir, fork, setsid, ForkResult};
use std::process;

/// The monitor must start as root: probes de-escalate from root to each
/// mount owner's credentials. Checked before any daemonization attempt.
pub fn require_root() -> Result<()> {
    if !nix::unistd::geteuid().is_root() {
        return Err(MonitorError::Privilege(
            "mountwarden must run as root to de-escalate probe credentials".to_string(),
        ));
    }
    Ok(())
}

/// Detach from the controlling terminal: fork, setsid, fork again, then
/// change the working directory to /.
pub fn detach() -> Result<()> {
    // SAFETY: no threads exist this early and the log sink is not yet
    // installed, so nothing holds a lock across the fork.
    match unsafe { fork() }
        .map_err(|e| MonitorError::Process(format!("first fork failed: {}", e)))?
    {
        ForkResult::Parent { .. } => process::exit(0),
        ForkResult::Child => {}
    }

    setsid().map_err(|e| MonitorError::Process(format!("setsid failed: {}", e)))?;

    // Second fork: the session leader exits, so the daemon can never
    // reacquire a controlling terminal.
    // SAFETY: as above.
    match unsafe { fork() }
        .map_err(|e| MonitorError::Process(format!("second fork failed: {}", e)))?
    {
        ForkResult::Parent { .. } => process::exit(0),
        ForkResult::Child => {}
    }

    chdir("/").map_err(|e| {
        MonitorError::Process(format!("cannot change working directory to /: {}", e))
    })?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn root_requirement_matches_euid() {
        let result = require_root();
        assert_eq!(result.is_ok(), nix::unistd::geteuid().is_root());
    }
}
