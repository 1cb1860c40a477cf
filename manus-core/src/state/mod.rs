//! Routine runner state machine
//!
//! Manages runner lifecycle: Idle → Running → terminal → Idle.

pub mod events;
pub mod machine;

pub use events::RunnerEvent;
pub use machine::{RunOutcome, RunnerState};
