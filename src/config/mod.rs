//! Configuration and shared type definitions.

pub mod types;

pub use types::*;
