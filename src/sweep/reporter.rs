//! Per-sweep aggregation and the one summary line each pass emits.

use crate::probe::ProbeOutcome;
use chrono::{DateTime, Utc};
use serde::Serialize;
use std::time::Duration;

/// Summary of one complete pass. Derived, write-once after all probes of
/// the pass complete.
#[derive(Clone, Debug, Serialize)]
pub struct Sweep {
    pub start_time: DateTime<Utc>,
    pub mounts_total: usize,
    pub mounts_live: usize,
    pub mounts_dead: usize,
    /// PermissionDenied mounts: counted, reported, excluded from the
    /// live/dead ratio.
    pub mounts_inaccessible: usize,
    pub duration: Duration,
}

impl Sweep {
    pub fn has_dead_mounts(&self) -> bool {
        self.mounts_dead > 0
    }
}

/// Fold one pass's outcomes into a Sweep record.
pub fn summarize(start_time: DateTime<Utc>, duration: Duration, outcomes: &[ProbeOutcome]) -> Sweep {
    let mounts_total = outcomes.len();
    let mounts_live = outcomes.iter().filter(|o| o.is_live()).count();
    let mounts_inaccessible = outcomes
        .iter()
        .filter(|o| !o.counts_toward_ratio())
        .count();
    Sweep {
        start_time,
        mounts_total,
        mounts_live,
        mounts_dead: mounts_total - mounts_live - mounts_inaccessible,
        mounts_inaccessible,
        duration,
    }
}

/// Emit the summary: error severity when any mount is dead, info otherwise.
pub fn emit(sweep: &Sweep, sweep_id: &str) {
    let line = format!(
        "checked {} mounts in {}s: {} live, {} dead, {} inaccessible [sweep {}]",
        sweep.mounts_total,
        sweep.duration.as_secs(),
        sweep.mounts_live,
        sweep.mounts_dead,
        sweep.mounts_inaccessible,
        sweep_id
    );
    if sweep.has_dead_mounts() {
        log::error!("{}", line);
    } else {
        log::info!("{}", line);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sweep_of(outcomes: &[ProbeOutcome]) -> Sweep {
        summarize(Utc::now(), Duration::from_secs(1), outcomes)
    }

    #[test]
    fn all_clean_sweep_is_fully_live() {
        let sweep = sweep_of(&[
            ProbeOutcome::Success,
            ProbeOutcome::Success,
            ProbeOutcome::Success,
        ]);
        assert_eq!(sweep.mounts_total, 3);
        assert_eq!(sweep.mounts_live, 3);
        assert_eq!(sweep.mounts_dead, 0);
        assert!(!sweep.has_dead_mounts());
    }

    #[test]
    fn timed_out_mount_counts_dead() {
        let sweep = sweep_of(&[
            ProbeOutcome::Success,
            ProbeOutcome::TimedOut,
            ProbeOutcome::Success,
        ]);
        assert_eq!(sweep.mounts_total, 3);
        assert_eq!(sweep.mounts_live, 2);
        assert_eq!(sweep.mounts_dead, 1);
        assert!(sweep.has_dead_mounts());
    }

    #[test]
    fn permission_denied_is_excluded_from_the_ratio() {
        let sweep = sweep_of(&[
            ProbeOutcome::Success,
            ProbeOutcome::PermissionDenied,
            ProbeOutcome::Success,
        ]);
        assert_eq!(sweep.mounts_total, 3);
        assert_eq!(sweep.mounts_live, 2);
        assert_eq!(sweep.mounts_dead, 0);
        assert_eq!(sweep.mounts_inaccessible, 1);
        assert!(!sweep.has_dead_mounts());
    }

    #[test]
    fn every_failure_kind_counts_dead() {
        let sweep = sweep_of(&[
            ProbeOutcome::Failure(5),
            ProbeOutcome::Signaled(11),
            ProbeOutcome::SpawnError,
            ProbeOutcome::TimedOut,
        ]);
        assert_eq!(sweep.mounts_dead, 4);
        assert_eq!(sweep.mounts_live, 0);
    }

    #[test]
    fn empty_sweep_is_clean() {
        let sweep = sweep_of(&[]);
        assert_eq!(sweep.mounts_total, 0);
        assert!(!sweep.has_dead_mounts());
    }
}
