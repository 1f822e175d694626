//! Workspace root crate.
//!
//! Re-exports the pedal, safety and sim building blocks so the scenario
//! tests can depend on one crate.

pub use pedal::*;
pub use safety::*;
pub use sim::*;
