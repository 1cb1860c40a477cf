//! Board-agnostic core logic for the hand actuator controller
//!
//! This crate contains all application logic that does not depend on
//! specific hardware or threading:
//!
//! - Directions, actuator ids and move specifications
//! - Routine definitions and the builtin routine library
//! - Routine runner state machine
//! - Cooperative cancellation token
//! - Configuration type definitions

#![deny(unsafe_code)]

pub mod cancel;
pub mod config;
pub mod routine;
pub mod state;

pub use cancel::CancellationToken;
pub use routine::{
    ActuatorId, Direction, Group, MoveSpec, RoutineDefinition, RoutineError, RoutineLibrary,
    MAX_ACTUATORS,
};
