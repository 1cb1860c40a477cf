//! Configuration type definitions
//!
//! These types represent the hand configuration: which backend drives the
//! relays, relay timing, the actuator/pin map and any extra routines.

use core::time::Duration;

use heapless::String;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::routine::{
    ActuatorId, Direction, Group, MoveSpec, RoutineDefinition, RoutineError, RoutineLibrary,
    MAX_LABEL_LEN,
};

/// Reference deadtime before any relay re-energizes (ms)
pub const DEFAULT_DEADTIME_MS: u64 = 50;

/// Reference poll step of the interruptible pause (ms)
pub const DEFAULT_PAUSE_TICK_MS: u64 = 50;

/// Reference HOME close pulse (ms)
pub const DEFAULT_HOME_CLOSE_MS: u64 = 3000;

/// Which output implementation drives the relays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Backend {
    /// In-memory relay board
    #[default]
    Simulated,
    /// Real GPIO pins
    Gpio,
}

impl Backend {
    /// Name used in status messages
    pub fn as_str(self) -> &'static str {
        match self {
            Backend::Simulated => "simulated",
            Backend::Gpio => "gpio",
        }
    }
}

/// Relay input pin
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PinConfig {
    /// GPIO line (BCM numbering)
    pub pin: u8,
    /// Relay input is active-low
    #[cfg_attr(feature = "serde", serde(default))]
    pub inverted: bool,
}

impl PinConfig {
    /// Create an active-high pin config
    pub const fn new(pin: u8) -> Self {
        Self {
            pin,
            inverted: false,
        }
    }

    /// Create an active-low pin config
    pub const fn inverted(pin: u8) -> Self {
        Self {
            pin,
            inverted: true,
        }
    }
}

/// One actuator and its relay pair
#[derive(Debug, Clone, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct ActuatorHwConfig {
    /// 1-based actuator number
    pub id: u8,
    /// Finger name (e.g., "thumb")
    #[cfg_attr(feature = "serde", serde(default))]
    pub name: String<MAX_LABEL_LEN>,
    /// Relay A, energized for OPEN
    pub open: PinConfig,
    /// Relay B, energized for CLOSE
    pub close: PinConfig,
}

impl ActuatorHwConfig {
    /// Create an actuator config with active-high relays
    pub fn new(id: u8, name: &str, open_pin: u8, close_pin: u8) -> Self {
        let mut label = String::new();
        let _ = label.push_str(name);
        Self {
            id,
            name: label,
            open: PinConfig::new(open_pin),
            close: PinConfig::new(close_pin),
        }
    }
}

/// Relay timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct TimingConfig {
    /// Both-off hold before and after every drive (ms)
    pub deadtime_ms: u64,
    /// Poll step of the interruptible pause (ms)
    pub pause_tick_ms: u64,
    /// HOME close pulse (ms)
    pub home_close_ms: u64,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            deadtime_ms: DEFAULT_DEADTIME_MS,
            pause_tick_ms: DEFAULT_PAUSE_TICK_MS,
            home_close_ms: DEFAULT_HOME_CLOSE_MS,
        }
    }
}

impl TimingConfig {
    /// Deadtime as a duration
    pub fn deadtime(&self) -> Duration {
        Duration::from_millis(self.deadtime_ms)
    }

    /// Pause tick as a duration, never shorter than 1 ms
    pub fn pause_tick(&self) -> Duration {
        Duration::from_millis(self.pause_tick_ms.max(1))
    }

    /// HOME close pulse as a duration
    pub fn home_close(&self) -> Duration {
        Duration::from_millis(self.home_close_ms)
    }
}

/// One move inside a routine group
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct MoveConfig {
    /// 1-based actuator number
    pub actuator: u8,
    /// Advance time (s)
    #[cfg_attr(feature = "serde", serde(default))]
    pub advance_s: f64,
    /// Pause time (s)
    #[cfg_attr(feature = "serde", serde(default))]
    pub pause_s: f64,
    /// Retract time (s)
    #[cfg_attr(feature = "serde", serde(default))]
    pub retract_s: f64,
    /// Start direction ("open" or "close")
    #[cfg_attr(feature = "serde", serde(default = "default_direction"))]
    pub direction: std::string::String,
}

impl Default for MoveConfig {
    fn default() -> Self {
        Self {
            actuator: 1,
            advance_s: 0.0,
            pause_s: 0.0,
            retract_s: 0.0,
            direction: default_direction(),
        }
    }
}

impl MoveConfig {
    /// Convert to a validated move
    pub fn to_move(&self) -> Result<MoveSpec, RoutineError> {
        let actuator = ActuatorId::try_from(self.actuator)?;
        let start: Direction = self.direction.parse()?;
        Ok(MoveSpec::from_secs(
            actuator,
            self.advance_s,
            self.pause_s,
            self.retract_s,
            start,
        ))
    }
}

/// One routine group
///
/// `actuators` lists actuators sharing the group timing; `moves` lists
/// actuators with their own timing. Both may be used together.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct GroupConfig {
    /// Actuators running the shared timing
    #[cfg_attr(feature = "serde", serde(default))]
    pub actuators: Vec<u8>,
    /// Shared advance time (s)
    #[cfg_attr(feature = "serde", serde(default))]
    pub advance_s: f64,
    /// Shared pause time (s)
    #[cfg_attr(feature = "serde", serde(default))]
    pub pause_s: f64,
    /// Shared retract time (s)
    #[cfg_attr(feature = "serde", serde(default))]
    pub retract_s: f64,
    /// Shared start direction
    #[cfg_attr(feature = "serde", serde(default = "default_direction"))]
    pub direction: std::string::String,
    /// Moves with individual timing
    #[cfg_attr(feature = "serde", serde(default))]
    pub moves: Vec<MoveConfig>,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            actuators: Vec::new(),
            advance_s: 0.0,
            pause_s: 0.0,
            retract_s: 0.0,
            direction: default_direction(),
            moves: Vec::new(),
        }
    }
}

impl GroupConfig {
    /// Convert to a validated group
    pub fn to_group(&self) -> Result<Group, RoutineError> {
        let mut moves = Vec::with_capacity(self.actuators.len() + self.moves.len());

        if !self.actuators.is_empty() {
            let start: Direction = self.direction.parse()?;
            for &n in &self.actuators {
                let actuator = ActuatorId::try_from(n)?;
                moves.push(MoveSpec::from_secs(
                    actuator,
                    self.advance_s,
                    self.pause_s,
                    self.retract_s,
                    start,
                ));
            }
        }

        for m in &self.moves {
            moves.push(m.to_move()?);
        }

        Group::new(moves)
    }
}

/// Routine defined in the configuration file
#[derive(Debug, Clone, PartialEq, Default)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct RoutineConfig {
    /// Routine name
    pub name: std::string::String,
    /// Groups in execution order
    #[cfg_attr(feature = "serde", serde(default))]
    pub groups: Vec<GroupConfig>,
}

impl RoutineConfig {
    /// Convert to a validated routine definition
    pub fn to_definition(&self) -> Result<RoutineDefinition, RoutineError> {
        let groups = self
            .groups
            .iter()
            .map(GroupConfig::to_group)
            .collect::<Result<Vec<_>, _>>()?;
        RoutineDefinition::new(&self.name, groups)
    }
}

/// Complete hand configuration
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct HandConfig {
    /// Output backend
    #[cfg_attr(feature = "serde", serde(default))]
    pub backend: Backend,
    /// Relay timing
    #[cfg_attr(feature = "serde", serde(default))]
    pub timing: TimingConfig,
    /// Actuators in id order
    #[cfg_attr(feature = "serde", serde(default = "reference_actuators"))]
    pub actuators: Vec<ActuatorHwConfig>,
    /// Extra routines, added to (or replacing) the builtin ones
    #[cfg_attr(feature = "serde", serde(default, rename = "routine"))]
    pub routines: Vec<RoutineConfig>,
}

impl Default for HandConfig {
    fn default() -> Self {
        Self {
            backend: Backend::default(),
            timing: TimingConfig::default(),
            actuators: reference_actuators(),
            routines: Vec::new(),
        }
    }
}

impl HandConfig {
    /// Number of actuators on the bank
    pub fn actuator_count(&self) -> usize {
        self.actuators.len()
    }

    /// Builtin routines plus the configured ones
    ///
    /// Every routine is checked against the configured actuator count.
    pub fn routine_library(&self) -> Result<RoutineLibrary, RoutineError> {
        let count = self.actuator_count();
        let mut library = RoutineLibrary::new();

        for routine in RoutineLibrary::builtin().iter() {
            // Builtin routines need five fingers; skip them on smaller banks
            if routine.validate_for(count).is_ok() {
                library.insert(routine.clone());
            }
        }

        for config in &self.routines {
            let routine = config.to_definition()?;
            routine.validate_for(count)?;
            library.insert(routine);
        }

        Ok(library)
    }
}

/// Reference five-finger pin map (BCM numbering)
pub fn reference_actuators() -> Vec<ActuatorHwConfig> {
    vec![
        ActuatorHwConfig::new(1, "thumb", 17, 27),
        ActuatorHwConfig::new(2, "index", 22, 23),
        ActuatorHwConfig::new(3, "middle", 24, 25),
        ActuatorHwConfig::new(4, "ring", 5, 6),
        ActuatorHwConfig::new(5, "pinky", 12, 13),
    ]
}

fn default_direction() -> std::string::String {
    Direction::Open.as_str().into()
}
