//! Hand facade
//!
//! Bundles the bank, runner, stop controller and shared token behind the
//! operations a presentation layer needs: pick a routine, run it, jog one
//! finger, stop, HOME.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use manus_core::config::{HandConfig, TimingConfig};
use manus_core::{ActuatorId, CancellationToken, Direction, MoveSpec, RoutineLibrary};
use manus_drivers::{MoveOutcome, StdDelay};
use manus_hal::{OutputChannel, SimBoard, SimChannel};
use tracing::info;

use crate::bank::{ActuatorBank, RestReport};
use crate::config::{self, ConfigError};
use crate::error::ControlError;
use crate::runner::{RoutineRunner, RunReport};
use crate::status::Notifier;
use crate::stop::StopController;

/// Hand driven by the simulated relay board
pub type SimHand = Hand<SimChannel, StdDelay>;

/// Complete actuator controller
pub struct Hand<C, D> {
    bank: Arc<ActuatorBank<C, D>>,
    runner: RoutineRunner<C, D>,
    stop: StopController<C, D>,
    timing: TimingConfig,
}

impl<C, D> Hand<C, D>
where
    C: OutputChannel + Send,
    D: DelayNs + Send,
{
    /// Assemble a hand around an existing bank
    pub fn new(bank: ActuatorBank<C, D>, library: RoutineLibrary, timing: TimingConfig) -> Self {
        let bank = Arc::new(bank);
        let token = CancellationToken::new();
        Self {
            runner: RoutineRunner::new(Arc::clone(&bank), library),
            stop: StopController::new(Arc::clone(&bank), token),
            bank,
            timing,
        }
    }

    /// Actuator bank
    pub fn bank(&self) -> &ActuatorBank<C, D> {
        &self.bank
    }

    /// Routine runner
    pub fn runner(&self) -> &RoutineRunner<C, D> {
        &self.runner
    }

    /// Relay timing
    pub fn timing(&self) -> &TimingConfig {
        &self.timing
    }

    /// Shared stop token
    pub fn token(&self) -> &CancellationToken {
        self.stop.token()
    }

    /// Handle that can stop this hand from another thread
    pub fn stop_handle(&self) -> StopController<C, D> {
        self.stop.clone()
    }

    /// Routine names in selection order
    pub fn routines(&self) -> Vec<&str> {
        self.runner.library().names().collect()
    }

    /// Run a routine by name or 1-based index
    ///
    /// Clears any earlier stop before starting.
    pub fn run_routine(&self, selector: &str, cycles: u32) -> Result<RunReport, ControlError> {
        if self.runner.is_busy() {
            return Err(ControlError::Busy);
        }
        self.token().clear();
        self.runner.run_routine(selector, cycles, self.token())
    }

    /// Run a routine, stopping and homing it if it is still running after
    /// `limit`
    ///
    /// The timer is cancelled as soon as the run returns, so a run that ends
    /// early returns at once and never triggers a HOME.
    pub fn run_routine_with_limit(
        &self,
        selector: &str,
        cycles: u32,
        limit: Duration,
    ) -> Result<RunReport, ControlError> {
        let (done_tx, done_rx) = mpsc::channel::<()>();
        let stop = &self.stop;
        let close = self.timing.home_close();

        thread::scope(|s| {
            s.spawn(move || {
                if let Err(RecvTimeoutError::Timeout) = done_rx.recv_timeout(limit) {
                    stop.stop_and_home(close);
                }
            });

            let result = self.run_routine(selector, cycles);
            drop(done_tx);
            result
        })
    }

    /// Drive one actuator in `direction` for `seconds`
    pub fn manual(
        &self,
        actuator: u8,
        seconds: f64,
        direction: Direction,
    ) -> Result<MoveOutcome, ControlError> {
        if !seconds.is_finite() || seconds <= 0.0 {
            return Err(ControlError::InvalidDuration(seconds));
        }
        let id = ActuatorId::try_from(actuator)?;
        self.bank.notifier().notify(&format!(
            "[Actuator {id}] {} {seconds:.2}s",
            direction.as_str().to_uppercase()
        ));

        // Manual moves ignore the routine stop token
        let spec = MoveSpec::advance_only(id, seconds, direction);
        self.bank.run_move(&spec, &CancellationToken::new())
    }

    /// HOME with the configured close pulse
    pub fn home(&self) -> RestReport {
        self.bank.home_now(self.timing.home_close())
    }

    /// Stop any routine in flight and HOME
    pub fn stop(&self) -> RestReport {
        self.stop.stop_and_home(self.timing.home_close())
    }

    /// HOME, then release every output
    pub fn shutdown(self) -> RestReport {
        info!("shutting down");
        let mut report = self.home();
        report.faults.extend(self.bank.release_all().faults);
        report
    }
}

impl SimHand {
    /// Build a hand on a simulated board from a configuration
    pub fn simulated(
        config: &HandConfig,
        board: &SimBoard,
        notifier: Notifier,
    ) -> Result<Self, ConfigError> {
        config::require_simulated(config)?;
        let library = config::validate(config)?;
        let bank = ActuatorBank::from_config(
            config,
            |pin| Ok(board.channel(pin.pin)),
            StdDelay::new,
            notifier,
        )?;
        Ok(Self::new(bank, library, config.timing))
    }
}
