//! Actuator bank
//!
//! Owns every actuator of the hand behind its own lock. Manual commands,
//! routine moves and HOME all take that lock, so one actuator never sees
//! two concurrent drives. Poisoned locks are recovered: a panicked move
//! must not keep HOME from reaching the actuator.

use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use manus_core::config::{Backend, HandConfig, PinConfig};
use manus_core::{ActuatorId, CancellationToken, Direction, MoveSpec};
use manus_drivers::{Actuator, ActuatorState, DriveTiming, MoveOutcome, RelayPair};
use manus_hal::{ChannelError, OutputChannel};
use tracing::{info, warn};

use crate::error::ControlError;
use crate::parallel::{run_parallel, Task};
use crate::status::Notifier;

struct Slot<C, D> {
    id: ActuatorId,
    actuator: Mutex<Actuator<C, D>>,
}

/// Result of a rest pass
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RestReport {
    /// Actuators confirmed OFF and marked resting
    pub rested: usize,
    /// Actuators whose outputs could not be confirmed OFF
    pub faults: Vec<(ActuatorId, ChannelError)>,
}

impl RestReport {
    /// Check if every actuator reached rest
    pub fn is_clean(&self) -> bool {
        self.faults.is_empty()
    }
}

/// Fixed set of actuators, indexed 1..=N
pub struct ActuatorBank<C, D> {
    slots: Vec<Slot<C, D>>,
    backend: Backend,
    notifier: Notifier,
}

impl<C, D> ActuatorBank<C, D>
where
    C: OutputChannel + Send,
    D: DelayNs + Send,
{
    /// Take ownership of `actuators` and force them all to rest
    pub fn new(actuators: Vec<Actuator<C, D>>, backend: Backend, notifier: Notifier) -> Self {
        let mut slots: Vec<Slot<C, D>> = actuators
            .into_iter()
            .map(|actuator| Slot {
                id: actuator.id(),
                actuator: Mutex::new(actuator),
            })
            .collect();
        slots.sort_by_key(|slot| slot.id);

        let bank = Self {
            slots,
            backend,
            notifier,
        };

        bank.rest_all();
        info!(actuators = bank.len(), backend = backend.as_str(), "actuator bank ready");
        bank.notifier.notify(&format!(
            "{} actuators ready ({} outputs)",
            bank.len(),
            backend.as_str()
        ));
        bank
    }

    /// Build a bank from a validated configuration
    ///
    /// `channel` creates the output for one relay pin; `delay` creates the
    /// delay source of one actuator.
    pub fn from_config<F, G>(
        config: &HandConfig,
        mut channel: F,
        mut delay: G,
        notifier: Notifier,
    ) -> Result<Self, ControlError>
    where
        F: FnMut(PinConfig) -> Result<C, ChannelError>,
        G: FnMut() -> D,
    {
        let timing = DriveTiming::from(&config.timing);
        let mut actuators = Vec::with_capacity(config.actuators.len());

        for hw in &config.actuators {
            let id = ActuatorId::try_from(hw.id)?;
            let pair = RelayPair::new(id, channel(hw.open)?, channel(hw.close)?)?;
            actuators.push(Actuator::new(pair, delay(), timing));
        }

        Ok(Self::new(actuators, config.backend, notifier))
    }

    /// Number of actuators
    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Check if the bank has no actuators
    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Backend driving the outputs
    pub fn backend(&self) -> Backend {
        self.backend
    }

    /// Status notifier
    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Actuator ids in order
    pub fn ids(&self) -> impl Iterator<Item = ActuatorId> + '_ {
        self.slots.iter().map(|slot| slot.id)
    }

    fn slot(&self, id: ActuatorId) -> Result<&Slot<C, D>, ControlError> {
        self.slots
            .iter()
            .find(|slot| slot.id == id)
            .ok_or(ControlError::UnknownActuator(id.get()))
    }

    fn lock(slot: &Slot<C, D>) -> MutexGuard<'_, Actuator<C, D>> {
        slot.actuator.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Logical state of one actuator
    ///
    /// Waits for any drive in progress on that actuator.
    pub fn state(&self, id: ActuatorId) -> Result<ActuatorState, ControlError> {
        Ok(Self::lock(self.slot(id)?).state())
    }

    /// Check if every actuator is logically resting with both outputs OFF
    pub fn all_resting(&self) -> bool {
        self.slots.iter().all(|slot| {
            let actuator = Self::lock(slot);
            actuator.state() == ActuatorState::Resting && actuator.pair().is_off()
        })
    }

    /// Force every actuator OFF
    ///
    /// Never stops early: a fault is logged, reported and collected, and
    /// the pass moves on to the next actuator. Only actuators confirmed
    /// OFF are marked resting.
    pub fn rest_all(&self) -> RestReport {
        let mut report = RestReport::default();

        for slot in &self.slots {
            match Self::lock(slot).rest() {
                Ok(()) => report.rested += 1,
                Err(e) => {
                    warn!(actuator = %slot.id, error = %e, "actuator failed to rest");
                    self.notifier
                        .notify(&format!("Actuator {}: failed to turn off: {e}", slot.id));
                    report.faults.push((slot.id, e));
                }
            }
        }

        if report.is_clean() {
            self.notifier.notify("All actuators at rest (OFF)");
        }
        report
    }

    /// Drive every actuator CLOSE for `close` in parallel, then rest
    pub fn home_now(&self, close: Duration) -> RestReport {
        info!(?close, "HOME");
        self.notifier.notify(&format!(
            "HOME: closing all actuators for {:.2}s in parallel",
            close.as_secs_f64()
        ));

        let tasks = self
            .slots
            .iter()
            .map(|slot| {
                Task::new(format!("Actuator {}", slot.id), move || {
                    Self::lock(slot).drive(Direction::Close, close)?;
                    Ok(())
                })
            })
            .collect();
        run_parallel(tasks, &self.notifier);

        let report = self.rest_all();
        self.notifier.notify("HOME complete");
        report
    }

    /// Run one move on its actuator
    ///
    /// Blocks until the actuator is free. Used for routine moves and
    /// manual commands alike.
    pub fn run_move(
        &self,
        spec: &MoveSpec,
        token: &CancellationToken,
    ) -> Result<MoveOutcome, ControlError> {
        let slot = self.slot(spec.actuator)?;
        let mut actuator = Self::lock(slot);

        self.notifier.notify(&format!(
            "Actuator {}: {} {:.2}s, pause {:.2}s, retract {:.2}s",
            spec.actuator,
            spec.start,
            spec.advance.as_secs_f64(),
            spec.pause.as_secs_f64(),
            spec.retract.as_secs_f64(),
        ));

        let outcome = actuator.run_move(spec, token)?;
        if outcome == MoveOutcome::Interrupted {
            self.notifier
                .notify(&format!("Actuator {}: stopped, waiting for HOME", spec.actuator));
        }
        Ok(outcome)
    }

    /// Rest, then release every output
    ///
    /// The bank cannot drive anything afterwards.
    pub fn release_all(&self) -> RestReport {
        let mut report = self.rest_all();

        for slot in &self.slots {
            if let Err(e) = Self::lock(slot).release() {
                report.faults.push((slot.id, e));
            }
        }

        info!("outputs released");
        self.notifier.notify("Outputs released");
        report
    }
}
