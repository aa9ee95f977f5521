//! Log sink wiring.

pub mod logging;
