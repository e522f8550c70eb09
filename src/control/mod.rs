// Movement control for the terrE base
//
// Provides:
// - Direction presets and per-build wheel wiring tables
// - The motion controller: shared motion state, drive loop, safety watchdog,
//   and the command dispatcher

mod controller;
mod presets;

pub use controller::{DriveMode, MotionController, MotionState};
pub use presets::{Direction, UnknownDirection, Wiring};
