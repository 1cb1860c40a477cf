//! Interlocked relay pair

use manus_core::{ActuatorId, Direction};
use manus_hal::{ChannelError, OutputChannel};
use tracing::{trace, warn};

use crate::error::DriveError;

/// Two exclusively owned outputs of one actuator
///
/// At most one of the two outputs is energized at any time. Both are
/// forced OFF on construction.
#[derive(Debug)]
pub struct RelayPair<C> {
    actuator: ActuatorId,
    a: C,
    b: C,
}

impl<C: OutputChannel> RelayPair<C> {
    /// Take ownership of two outputs and force them OFF
    pub fn new(actuator: ActuatorId, a: C, b: C) -> Result<Self, ChannelError> {
        let mut pair = Self { actuator, a, b };
        pair.force_off()?;
        Ok(pair)
    }

    /// Actuator this pair belongs to
    pub fn actuator(&self) -> ActuatorId {
        self.actuator
    }

    /// Lines of (A, B)
    pub fn lines(&self) -> (u8, u8) {
        (self.a.line(), self.b.line())
    }

    /// Both outputs read OFF
    pub fn is_off(&self) -> bool {
        !self.a.is_set() && !self.b.is_set()
    }

    /// Direction currently energized, if any
    pub fn energized(&self) -> Option<Direction> {
        match (self.a.is_set(), self.b.is_set()) {
            (true, false) => Some(Direction::Open),
            (false, true) => Some(Direction::Close),
            _ => None,
        }
    }

    /// Force both outputs OFF
    ///
    /// Both writes are always attempted; the first failure is returned.
    pub fn force_off(&mut self) -> Result<(), ChannelError> {
        trace!(actuator = %self.actuator, "relay pair off");
        let a = self.a.set(false);
        let b = self.b.set(false);
        if let Err(e) = &a {
            warn!(actuator = %self.actuator, error = %e, "relay A failed to turn off");
        }
        if let Err(e) = &b {
            warn!(actuator = %self.actuator, error = %e, "relay B failed to turn off");
        }
        a.and(b)
    }

    /// Energize the coil for `direction`
    ///
    /// Refuses when the opposite coil reads ON.
    pub fn energize(&mut self, direction: Direction) -> Result<(), DriveError> {
        let (target, other) = match direction {
            Direction::Open => (&mut self.a, &self.b),
            Direction::Close => (&mut self.b, &self.a),
        };

        if other.is_set() {
            warn!(actuator = %self.actuator, %direction, "interlock: opposite relay is on");
            return Err(DriveError::Interlock {
                actuator: self.actuator,
            });
        }

        trace!(actuator = %self.actuator, line = target.line(), %direction, "relay on");
        target.set(true)?;
        Ok(())
    }

    /// Release both outputs
    ///
    /// Both releases are always attempted; the first failure is returned.
    pub fn release(&mut self) -> Result<(), ChannelError> {
        let a = self.a.release();
        let b = self.b.release();
        a.and(b)
    }
}
