//! Manus controller
//!
//! Ties the drivers together into a hand:
//!
//! - [`bank::ActuatorBank`] - per-actuator locking, rest pass, HOME
//! - [`parallel::run_parallel`] - thread-per-move fan-out with a barrier
//! - [`runner::RoutineRunner`] - cycles and groups, always ending at rest
//! - [`stop::StopController`] - stop-and-home from any thread
//! - [`status`] - status sinks for the presentation layer
//! - [`config`] - `hand.toml` loading and validation
//! - [`hand::Hand`] - facade over all of the above

#![deny(unsafe_code)]

pub mod bank;
pub mod config;
pub mod error;
pub mod hand;
pub mod parallel;
pub mod runner;
pub mod status;
pub mod stop;

pub use bank::{ActuatorBank, RestReport};
pub use config::{load_config, parse_config, ConfigError};
pub use error::ControlError;
pub use hand::{Hand, SimHand};
pub use parallel::{run_parallel, FanOutReport, Task};
pub use runner::{RoutineRunner, RunReport};
pub use status::{ChannelSink, NoopSink, Notifier, StatusSink, TracingSink};
pub use stop::StopController;
