//! Configuration loading
//!
//! Reads `hand.toml`, deserializes it into [`HandConfig`] and validates
//! it before anything is built from it.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};

use manus_core::config::{Backend, HandConfig};
use manus_core::{RoutineError, RoutineLibrary, MAX_ACTUATORS};
use thiserror::Error;
use tracing::info;

use crate::error::ControlError;

/// Configuration errors
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// File is not valid TOML for a hand configuration
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
    /// A routine could not be built
    #[error("invalid routine: {0}")]
    Routine(#[from] RoutineError),
    /// Two actuators share an id
    #[error("actuator {0} is defined more than once")]
    DuplicateActuator(u8),
    /// Two relays share a GPIO line
    #[error("GPIO {0} is used by more than one relay")]
    DuplicatePin(u8),
    /// Actuator ids do not run 1..=N
    #[error("actuator {0} is missing: ids must run from 1 without gaps")]
    MissingActuator(u8),
    /// More actuators than a bank holds
    #[error("{0} actuators configured, at most {max} supported", max = MAX_ACTUATORS)]
    TooManyActuators(usize),
    /// Backend not available in this build
    #[error("the '{0}' backend is not supported by this build")]
    UnsupportedBackend(&'static str),
    /// The actuator bank could not be set up
    #[error("failed to set up actuators: {0}")]
    Bank(#[from] ControlError),
}

/// Read and validate a configuration file
pub fn load_config(path: &Path) -> Result<HandConfig, ConfigError> {
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let config = parse_config(&text)?;
    info!(path = %path.display(), actuators = config.actuator_count(), "configuration loaded");
    Ok(config)
}

/// Parse and validate configuration text
pub fn parse_config(text: &str) -> Result<HandConfig, ConfigError> {
    let config: HandConfig = toml::from_str(text)?;
    validate(&config)?;
    Ok(config)
}

/// Check the actuator map and build the routine library once
pub fn validate(config: &HandConfig) -> Result<RoutineLibrary, ConfigError> {
    let count = config.actuator_count();
    if count > MAX_ACTUATORS {
        return Err(ConfigError::TooManyActuators(count));
    }

    let mut ids = BTreeSet::new();
    let mut pins = BTreeSet::new();
    for actuator in &config.actuators {
        if !ids.insert(actuator.id) {
            return Err(ConfigError::DuplicateActuator(actuator.id));
        }
        for pin in [actuator.open.pin, actuator.close.pin] {
            if !pins.insert(pin) {
                return Err(ConfigError::DuplicatePin(pin));
            }
        }
    }

    // `count` fits in u8: it is at most MAX_ACTUATORS
    for n in 1..=count as u8 {
        if !ids.contains(&n) {
            return Err(ConfigError::MissingActuator(n));
        }
    }
    if count == 0 {
        return Err(ConfigError::MissingActuator(1));
    }

    Ok(config.routine_library()?)
}

/// Reject backends this build cannot drive
pub fn require_simulated(config: &HandConfig) -> Result<(), ConfigError> {
    match config.backend {
        Backend::Simulated => Ok(()),
        other => Err(ConfigError::UnsupportedBackend(other.as_str())),
    }
}
