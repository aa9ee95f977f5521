//! Mount table snapshots.
//!
//! The enumerator only ever reads the kernel's mount table; it never touches
//! the mounted filesystems themselves. Any stat of a mountpoint performs I/O
//! on a possibly-hung filesystem, so identity resolution is reserved for the
//! probe child, where the deadline covers it.

use crate::config::types::{MonitorError, Result};
use serde::Serialize;
use std::fs;
use std::io;
use std::os::unix::fs::MetadataExt;
use std::path::{Path, PathBuf};

/// The kernel's view of the mount table. /proc/mounts is just a symlink to
/// this file.
pub const MOUNT_TABLE: &str = "/proc/self/mounts";

/// One mounted filesystem, as of the snapshot. Immutable per sweep.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Mount {
    /// Directory the filesystem is attached at
    pub path: PathBuf,
    /// Backing device or remote export; None for virtual filesystems
    pub source: Option<String>,
}

impl Mount {
    /// Label for log lines: "path (source)" or just the path.
    pub fn describe(&self) -> String {
        match &self.source {
            Some(source) => format!("{} ({})", self.path.display(), source),
            None => self.path.display().to_string(),
        }
    }
}

/// Owner and permission bits of a mount directory, resolved by the probe.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MountIdentity {
    pub uid: u32,
    pub gid: u32,
    /// Permission bits only (mode & 0o7777)
    pub mode: u32,
}

/// Snapshot the current mount table, in kernel order.
///
/// Failure here is sweep-level and non-fatal: the caller logs it, sweeps
/// zero mounts, and retries on the next interval.
pub fn snapshot() -> Result<Vec<Mount>> {
    let table = fs::read_to_string(MOUNT_TABLE)
        .map_err(|e| MonitorError::Enumeration(format!("cannot read {}: {}", MOUNT_TABLE, e)))?;
    Ok(parse_table(&table))
}

/// Stat a mount directory for its owning uid/gid and permission bits.
///
/// Called from the probe child only: on a hung mount this blocks exactly
/// like the scan would.
pub fn resolve_identity(path: &Path) -> io::Result<MountIdentity> {
    let meta = fs::metadata(path)?;
    Ok(MountIdentity {
        uid: meta.uid(),
        gid: meta.gid(),
        mode: meta.mode() & 0o7777,
    })
}

fn parse_table(table: &str) -> Vec<Mount> {
    let mut mounts = Vec::new();
    for line in table.lines() {
        // Fields: fsname dir type opts freq passno
        let mut fields = line.split_whitespace();
        let source = match fields.next() {
            Some(field) => unescape(field),
            None => continue,
        };
        let dir = match fields.next() {
            Some(field) => unescape(field),
            None => continue,
        };
        let source = if source == "none" { None } else { Some(source) };
        mounts.push(Mount {
            path: PathBuf::from(dir),
            source,
        });
    }
    mounts
}

/// Decode the octal escapes getmntent(3) would decode for us: \040 space,
/// \011 tab, \012 newline, \134 backslash.
fn unescape(field: &str) -> String {
    let mut out = String::with_capacity(field.len());
    let mut chars = field.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        let code: String = chars.by_ref().take(3).collect();
        match u8::from_str_radix(&code, 8) {
            Ok(byte) => out.push(byte as char),
            Err(_) => {
                out.push('\\');
                out.push_str(&code);
            }
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_table_in_order() {
        let table = "\
/dev/sda1 / ext4 rw,relatime 0 0
proc /proc proc rw,nosuid,nodev,noexec 0 0
fileserver:/export /mnt/data nfs4 rw,hard 0 0
";
        let mounts = parse_table(table);
        assert_eq!(mounts.len(), 3);
        assert_eq!(mounts[0].path, PathBuf::from("/"));
        assert_eq!(mounts[0].source.as_deref(), Some("/dev/sda1"));
        assert_eq!(mounts[2].path, PathBuf::from("/mnt/data"));
        assert_eq!(mounts[2].source.as_deref(), Some("fileserver:/export"));
    }

    #[test]
    fn none_source_becomes_absent() {
        let mounts = parse_table("none /run/user/0 tmpfs rw 0 0\n");
        assert_eq!(mounts.len(), 1);
        assert_eq!(mounts[0].source, None);
        assert_eq!(mounts[0].describe(), "/run/user/0");
    }

    #[test]
    fn decodes_octal_escapes_in_paths() {
        let mounts = parse_table("/dev/sdb1 /mnt/back\\040ups ext4 rw 0 0\n");
        assert_eq!(mounts[0].path, PathBuf::from("/mnt/back ups"));
    }

    #[test]
    fn skips_short_lines() {
        let mounts = parse_table("garbage\n\n/dev/sda1 / ext4 rw 0 0\n");
        assert_eq!(mounts.len(), 1);
    }

    #[test]
    fn unescape_passes_through_bad_escapes() {
        assert_eq!(unescape("a\\zzzb"), "a\\zzzb");
        assert_eq!(unescape("tab\\011sep"), "tab\tsep");
    }

    #[test]
    fn snapshot_reads_the_live_table() {
        // /proc/self/mounts always exists on Linux and contains at least /.
        let mounts = snapshot().unwrap();
        assert!(mounts.iter().any(|m| m.path == PathBuf::from("/")));
    }

    #[test]
    fn resolve_identity_reports_owner_and_mode() {
        let dir = tempfile::tempdir().unwrap();
        let identity = resolve_identity(dir.path()).unwrap();
        assert_eq!(identity.uid, nix::unistd::getuid().as_raw());
        assert_eq!(identity.gid, nix::unistd::getgid().as_raw());
        assert_ne!(identity.mode & 0o777, 0);
    }

    #[test]
    fn resolve_identity_fails_for_missing_path() {
        assert!(resolve_identity(Path::new("/nonexistent/mountwarden-test")).is_err());
    }
}
