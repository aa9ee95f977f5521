//! mountwarden: a paranoid mount monitor for Linux hosts
//!
//! Some classes of storage failure take care to detect: a stale NFS mount
//! still looks mounted, but any access to it, including monitoring code,
//! blocks until repeated TCP and NFS timeouts expire, possibly days later.
//! mountwarden therefore never touches a mount from its own process. Every
//! check runs in a forked probe child that drops to the mount owner's
//! credentials and scans the mount directory under a hard SIGALRM deadline;
//! a probe that fails to respond is SIGKILLed and the mount reported dead.
//!
//! # Architecture
//!
//! ## Kernel Primitives ([`kernel`])
//! - [`kernel::mounts`]: mount table snapshots and identity resolution
//! - [`kernel::credentials`]: gid-before-uid privilege de-escalation
//! - [`kernel::alarm`]: the probe deadline and active-probe handle
//!
//! ## Probing ([`probe`])
//! - [`probe::worker`]: the isolated child that performs one scan
//! - [`probe::supervisor`]: fork / deadline / reap / classify, one probe at
//!   a time
//! - [`probe::report`]: the structured result channel between the two
//!
//! ## Sweeps ([`sweep`])
//! - [`sweep`]: the enumerate-probe-report loop
//! - [`sweep::reporter`]: per-pass aggregation and the summary log line
//!
//! ## Ambient ([`config`], [`observability`], [`daemon`], [`cli`])
//! - [`config::types`]: configuration, errors, shared aliases
//! - [`observability::logging`]: syslog sink with optional stdout mirror
//! - [`daemon`]: root check and terminal detachment
//! - [`cli`]: argument parsing and the startup sequence
//!
//! # Design Principles
//!
//! 1. **The controller never blocks on a mount**: its only suspension point
//!    is waiting for the current probe
//! 2. **One probe at a time**: bounded resource usage beats sweep latency
//!    on a host that is already struggling
//! 3. **Signal handlers do one thing**: read the handle, kill the probe;
//!    classification and logging happen after the reap
//! 4. **An unreadable mount is not a dead mount**: permission problems are
//!    reported, never conflated with hangs

// Kernel Primitives
pub mod kernel;

// Probing
pub mod probe;

// Sweeps
pub mod sweep;

// Configuration
pub mod config;

// Observability
pub mod observability;

// Daemon plumbing
pub mod daemon;

// CLI entrypoint wiring
pub mod cli;

// Re-export commonly used types for convenience
pub use config::types::{MonitorConfig, MonitorError, Result};
pub use kernel::mounts::Mount;
pub use probe::ProbeOutcome;
pub use sweep::Sweep;
