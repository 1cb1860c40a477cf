//! Single-actuator move specification

use core::fmt;
use core::str::FromStr;
use core::time::Duration;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use super::definition::RoutineError;

/// Maximum actuators on one bank
pub const MAX_ACTUATORS: usize = 8;

/// Actuator drive direction
///
/// OPEN energizes relay A, CLOSE energizes relay B.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Direction {
    /// Extend the finger
    Open,
    /// Retract the finger (the HOME direction)
    Close,
}

impl Direction {
    /// Get the opposite direction
    pub fn opposite(self) -> Self {
        match self {
            Direction::Open => Direction::Close,
            Direction::Close => Direction::Open,
        }
    }

    /// Lowercase name as used in configuration files
    pub fn as_str(self) -> &'static str {
        match self {
            Direction::Open => "open",
            Direction::Close => "close",
        }
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Direction {
    type Err = RoutineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "open" => Ok(Direction::Open),
            "close" => Ok(Direction::Close),
            _ => Err(RoutineError::InvalidDirection(s.to_string())),
        }
    }
}

/// 1-based actuator index
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct ActuatorId(u8);

impl ActuatorId {
    /// Create an id, `None` unless `1 <= n <= MAX_ACTUATORS`
    pub const fn new(n: u8) -> Option<Self> {
        if n >= 1 && (n as usize) <= MAX_ACTUATORS {
            Some(Self(n))
        } else {
            None
        }
    }

    /// The 1-based number
    pub const fn get(self) -> u8 {
        self.0
    }
}

impl fmt::Display for ActuatorId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl TryFrom<u8> for ActuatorId {
    type Error = RoutineError;

    fn try_from(n: u8) -> Result<Self, Self::Error> {
        ActuatorId::new(n).ok_or(RoutineError::UnknownActuator(n))
    }
}

/// Convert seconds to a duration, clamping negative and non-finite values
/// to zero and saturating very large values
pub fn clamp_secs(seconds: f64) -> Duration {
    if !seconds.is_finite() || seconds <= 0.0 {
        return Duration::ZERO;
    }
    Duration::try_from_secs_f64(seconds).unwrap_or(Duration::MAX)
}

/// Advance, pause and retract of one actuator
///
/// The retract always runs in the opposite direction of `start`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MoveSpec {
    /// Actuator to move
    pub actuator: ActuatorId,
    /// Time driven in the start direction
    pub advance: Duration,
    /// De-energized hold between advance and retract
    pub pause: Duration,
    /// Time driven in the opposite direction
    pub retract: Duration,
    /// Direction of the advance phase
    pub start: Direction,
}

impl MoveSpec {
    /// Create a move from durations
    pub const fn new(
        actuator: ActuatorId,
        advance: Duration,
        pause: Duration,
        retract: Duration,
        start: Direction,
    ) -> Self {
        Self {
            actuator,
            advance,
            pause,
            retract,
            start,
        }
    }

    /// Create a move from seconds, clamping negative values to zero
    pub fn from_secs(
        actuator: ActuatorId,
        advance_s: f64,
        pause_s: f64,
        retract_s: f64,
        start: Direction,
    ) -> Self {
        Self::new(
            actuator,
            clamp_secs(advance_s),
            clamp_secs(pause_s),
            clamp_secs(retract_s),
            start,
        )
    }

    /// Manual single-direction command: advance only, no pause or retract
    pub fn advance_only(actuator: ActuatorId, seconds: f64, direction: Direction) -> Self {
        Self::from_secs(actuator, seconds, 0.0, 0.0, direction)
    }

    /// Direction of the retract phase
    pub fn retract_direction(&self) -> Direction {
        self.start.opposite()
    }

    /// Expected wall time of the whole move
    ///
    /// Each drive is bracketed by two deadtime holds.
    pub fn nominal_duration(&self, deadtime: Duration) -> Duration {
        self.advance
            .saturating_add(self.pause)
            .saturating_add(self.retract)
            .saturating_add(deadtime.saturating_mul(4))
    }
}
