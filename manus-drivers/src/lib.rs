//! Actuator drivers
//!
//! This crate turns pairs of [`manus_hal::OutputChannel`]s into linear
//! actuators:
//!
//! - Relay pair with a hardware-independent interlock
//! - Actuator drive primitive (deadtime, single-coil energize, hold)
//! - Advance / pause / retract move sequence with cooperative cancellation
//! - Blocking delay helpers over `embedded_hal::delay::DelayNs`

#![deny(unsafe_code)]

pub mod actuator;
pub mod delay;
pub mod error;
pub mod relay;

pub use actuator::{Actuator, ActuatorState, DriveTiming, MoveOutcome};
pub use delay::{hold, StdDelay};
pub use error::DriveError;
pub use relay::RelayPair;
