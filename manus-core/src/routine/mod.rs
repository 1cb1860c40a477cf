//! Motion routines
//!
//! A routine is an ordered list of groups; every move in a group starts
//! together and the next group waits for all of them to finish.

pub mod definition;
pub mod library;
pub mod motion;

pub use definition::{Group, RoutineDefinition, RoutineError, MAX_LABEL_LEN};
pub use library::{RoutineLibrary, BUILTIN_ROUTINES};
pub use motion::{clamp_secs, ActuatorId, Direction, MoveSpec, MAX_ACTUATORS};
