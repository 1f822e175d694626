mod gate;
mod interlock;
mod latch;
mod plausibility;

pub use gate::{GateEvent, StartupGate};
pub use interlock::{Interlock, InterlockConfig, RawInputs, ThrottleCommand};
pub use latch::{FaultLatch, LatchState};
pub use plausibility::{relative_deviation, BrakeOverlap, FaultReason, PlausibilityConfig};
