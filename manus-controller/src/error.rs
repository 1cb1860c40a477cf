//! Controller errors

use manus_core::RoutineError;
use manus_drivers::DriveError;
use manus_hal::ChannelError;
use thiserror::Error;

/// Errors returned by the bank, runner and hand facade
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ControlError {
    /// No routine with this name or index
    #[error("unknown routine '{0}'")]
    UnknownRoutine(String),
    /// Cycle count of zero
    #[error("cycle count must be at least 1")]
    InvalidCycles,
    /// A routine is already in flight
    #[error("a routine is already running")]
    Busy,
    /// Actuator number not on this bank
    #[error("unknown actuator {0}")]
    UnknownActuator(u8),
    /// Manual move with a non-positive duration
    #[error("invalid duration {0}: must be greater than zero")]
    InvalidDuration(f64),
    /// Actuator drive failed
    #[error(transparent)]
    Drive(#[from] DriveError),
    /// Routine could not be built
    #[error(transparent)]
    Routine(RoutineError),
}

impl From<RoutineError> for ControlError {
    fn from(e: RoutineError) -> Self {
        match e {
            RoutineError::UnknownRoutine(name) => ControlError::UnknownRoutine(name),
            RoutineError::UnknownActuator(n) => ControlError::UnknownActuator(n),
            other => ControlError::Routine(other),
        }
    }
}

impl From<ChannelError> for ControlError {
    fn from(e: ChannelError) -> Self {
        ControlError::Drive(DriveError::Output(e))
    }
}
