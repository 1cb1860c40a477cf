//! Driver errors

use manus_core::ActuatorId;
use manus_hal::ChannelError;
use thiserror::Error;

/// Errors raised while driving an actuator
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DriveError {
    /// An output failed to change state
    #[error(transparent)]
    Output(#[from] ChannelError),
    /// The opposite coil was still energized
    #[error("actuator {actuator}: refusing to energize while the opposite relay is on")]
    Interlock { actuator: ActuatorId },
}
