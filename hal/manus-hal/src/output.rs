//! Output channel abstraction
//!
//! A channel is a single binary output driving one relay coil. Two
//! channels make up the relay pair of one actuator.

use thiserror::Error;

/// Errors that can occur when driving an output channel
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ChannelError {
    /// The underlying output failed to change state
    #[error("output line {line} failed: {reason}")]
    Fault { line: u8, reason: String },
    /// The channel was released and can no longer be driven
    #[error("output line {line} has been released")]
    Released { line: u8 },
}

impl ChannelError {
    /// Line the error was raised on
    pub fn line(&self) -> u8 {
        match self {
            ChannelError::Fault { line, .. } | ChannelError::Released { line } => *line,
        }
    }
}

/// Binary output channel
///
/// Implementations must be cheap to call repeatedly: the controller
/// writes OFF defensively before every energization and during every
/// rest pass.
pub trait OutputChannel {
    /// Line number (BCM GPIO number for pin backends)
    fn line(&self) -> u8;

    /// Energize (`true`) or de-energize (`false`) the output
    fn set(&mut self, on: bool) -> Result<(), ChannelError>;

    /// Whether the output is energized, as of the last successful write
    fn is_set(&self) -> bool;

    /// Release the underlying output
    ///
    /// The output is de-energized first. Releasing twice is a no-op; any
    /// `set` after release fails with [`ChannelError::Released`].
    fn release(&mut self) -> Result<(), ChannelError>;
}

impl<C: OutputChannel + ?Sized> OutputChannel for Box<C> {
    fn line(&self) -> u8 {
        (**self).line()
    }

    fn set(&mut self, on: bool) -> Result<(), ChannelError> {
        (**self).set(on)
    }

    fn is_set(&self) -> bool {
        (**self).is_set()
    }

    fn release(&mut self) -> Result<(), ChannelError> {
        (**self).release()
    }
}
