//! Routine definitions
//!
//! Groups and routines are validated once at construction and immutable
//! afterwards, so the runner never has to re-check them mid-motion.

use core::time::Duration;

use heapless::{String, Vec};
use thiserror::Error;

use super::motion::{ActuatorId, Direction, MoveSpec, MAX_ACTUATORS};

/// Maximum routine name length
pub const MAX_LABEL_LEN: usize = 32;

/// Errors raised while building or selecting routines
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RoutineError {
    /// A move names neither OPEN nor CLOSE
    #[error("invalid direction '{0}': expected 'open' or 'close'")]
    InvalidDirection(std::string::String),
    /// Routine has no groups
    #[error("routine '{0}' has no groups")]
    EmptyRoutine(std::string::String),
    /// Group has no moves
    #[error("group has no moves")]
    EmptyGroup,
    /// Same actuator listed twice in one group
    #[error("actuator {0} appears twice in one group")]
    DuplicateActuator(ActuatorId),
    /// More moves than actuators
    #[error("group has more than {max} moves", max = MAX_ACTUATORS)]
    GroupTooLarge,
    /// Routine name does not fit
    #[error("routine name '{0}' is longer than {max} bytes", max = MAX_LABEL_LEN)]
    NameTooLong(std::string::String),
    /// Actuator number outside the bank
    #[error("unknown actuator {0}")]
    UnknownActuator(u8),
    /// No routine with this name or index
    #[error("unknown routine '{0}'")]
    UnknownRoutine(std::string::String),
}

/// Set of moves started together
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Group {
    moves: Vec<MoveSpec, MAX_ACTUATORS>,
}

impl Group {
    /// Build a group from moves
    ///
    /// Fails on an empty group or when an actuator appears twice.
    pub fn new(moves: impl IntoIterator<Item = MoveSpec>) -> Result<Self, RoutineError> {
        let mut group: Vec<MoveSpec, MAX_ACTUATORS> = Vec::new();

        for spec in moves {
            if group.iter().any(|m| m.actuator == spec.actuator) {
                return Err(RoutineError::DuplicateActuator(spec.actuator));
            }
            group.push(spec).map_err(|_| RoutineError::GroupTooLarge)?;
        }

        if group.is_empty() {
            return Err(RoutineError::EmptyGroup);
        }

        Ok(Self { moves: group })
    }

    /// Build a group where every listed actuator runs the same move
    pub fn uniform(
        actuators: &[u8],
        advance_s: f64,
        pause_s: f64,
        retract_s: f64,
        start: Direction,
    ) -> Result<Self, RoutineError> {
        let mut moves = std::vec::Vec::with_capacity(actuators.len());
        for &n in actuators {
            let id = ActuatorId::try_from(n)?;
            moves.push(MoveSpec::from_secs(id, advance_s, pause_s, retract_s, start));
        }
        Self::new(moves)
    }

    /// Moves in this group
    pub fn moves(&self) -> &[MoveSpec] {
        &self.moves
    }

    /// Actuators moved by this group
    pub fn actuators(&self) -> impl Iterator<Item = ActuatorId> + '_ {
        self.moves.iter().map(|m| m.actuator)
    }

    /// Number of moves
    pub fn len(&self) -> usize {
        self.moves.len()
    }

    /// Always false for a constructed group
    pub fn is_empty(&self) -> bool {
        self.moves.is_empty()
    }

    /// Expected wall time: the slowest move of the group
    pub fn nominal_duration(&self, deadtime: Duration) -> Duration {
        self.moves
            .iter()
            .map(|m| m.nominal_duration(deadtime))
            .max()
            .unwrap_or(Duration::ZERO)
    }
}

/// Named, ordered sequence of groups
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutineDefinition {
    name: String<MAX_LABEL_LEN>,
    groups: std::vec::Vec<Group>,
}

impl RoutineDefinition {
    /// Build a routine
    pub fn new(name: &str, groups: std::vec::Vec<Group>) -> Result<Self, RoutineError> {
        let mut label = String::new();
        label
            .push_str(name)
            .map_err(|_| RoutineError::NameTooLong(name.to_string()))?;

        if groups.is_empty() {
            return Err(RoutineError::EmptyRoutine(name.to_string()));
        }

        Ok(Self {
            name: label,
            groups,
        })
    }

    /// Routine name
    pub fn name(&self) -> &str {
        self.name.as_str()
    }

    /// Groups in execution order
    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    /// Highest actuator number referenced by any group
    pub fn highest_actuator(&self) -> Option<ActuatorId> {
        self.groups.iter().flat_map(|g| g.actuators()).max()
    }

    /// Check that every referenced actuator exists on a bank of `count`
    pub fn validate_for(&self, count: usize) -> Result<(), RoutineError> {
        match self.highest_actuator() {
            Some(id) if id.get() as usize > count => Err(RoutineError::UnknownActuator(id.get())),
            _ => Ok(()),
        }
    }

    /// Expected wall time of one cycle
    pub fn cycle_duration(&self, deadtime: Duration) -> Duration {
        self.groups
            .iter()
            .map(|g| g.nominal_duration(deadtime))
            .fold(Duration::ZERO, Duration::saturating_add)
    }
}
