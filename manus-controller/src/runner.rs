//! Routine runner
//!
//! Runs routine definitions against the bank, group by group:
//!
//! ```text
//! rest_all
//! for each cycle:          (token checked)
//!     for each group:      (token checked)
//!         run_parallel(group moves)   -- full barrier
//! rest_all                 (always, drop guard)
//! ```
//!
//! The runner state (`manus_core::state`) only returns to idle after the
//! trailing rest pass.

use std::sync::{Arc, Mutex, PoisonError};

use embedded_hal::delay::DelayNs;
use manus_core::state::{RunOutcome, RunnerEvent, RunnerState};
use manus_core::{CancellationToken, Group, RoutineDefinition, RoutineLibrary};
use manus_hal::OutputChannel;
use tracing::{debug, info, warn};

use crate::bank::{ActuatorBank, RestReport};
use crate::error::ControlError;
use crate::parallel::{run_parallel, FanOutReport, Task};

/// Summary of one routine run
#[derive(Debug, Clone, PartialEq)]
pub struct RunReport {
    /// Routine name
    pub routine: String,
    /// How the routine body ended
    pub outcome: RunOutcome,
    /// Cycles asked for
    pub cycles_requested: u32,
    /// Cycles that ran every group without a stop
    pub cycles_completed: u32,
    /// Groups dispatched, across all cycles
    pub groups_executed: usize,
    /// Failed move tasks, one message each
    pub failures: Vec<String>,
    /// Actuators the trailing rest pass could not confirm OFF
    pub rest_faults: usize,
}

/// Sequential group executor with cycle repetition
pub struct RoutineRunner<C, D> {
    bank: Arc<ActuatorBank<C, D>>,
    library: RoutineLibrary,
    state: Mutex<RunnerState>,
}

impl<C, D> RoutineRunner<C, D>
where
    C: OutputChannel + Send,
    D: DelayNs + Send,
{
    /// Create a runner over `bank` selecting from `library`
    pub fn new(bank: Arc<ActuatorBank<C, D>>, library: RoutineLibrary) -> Self {
        Self {
            bank,
            library,
            state: Mutex::new(RunnerState::Idle),
        }
    }

    /// Routines available by name or index
    pub fn library(&self) -> &RoutineLibrary {
        &self.library
    }

    /// Bank driven by this runner
    pub fn bank(&self) -> &Arc<ActuatorBank<C, D>> {
        &self.bank
    }

    /// Current runner state
    pub fn state(&self) -> RunnerState {
        *self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Check if a routine is in flight
    pub fn is_busy(&self) -> bool {
        self.state().is_busy()
    }

    /// Run the library routine selected by name or 1-based index
    ///
    /// An unknown selector fails after a rest pass that only writes OFF.
    pub fn run_routine(
        &self,
        selector: &str,
        cycles: u32,
        token: &CancellationToken,
    ) -> Result<RunReport, ControlError> {
        if cycles == 0 {
            return Err(ControlError::InvalidCycles);
        }
        let guard = self.begin()?;

        match self.library.resolve(selector) {
            Ok(definition) => Ok(self.execute(guard, definition, cycles, token)),
            Err(e) => {
                warn!(routine = selector, "unknown routine");
                self.bank
                    .notifier()
                    .notify(&format!("Unknown routine: {selector}"));
                guard.finish(RunnerEvent::Fault);
                Err(e.into())
            }
        }
    }

    /// Run an arbitrary routine definition
    pub fn run_definition(
        &self,
        definition: &RoutineDefinition,
        cycles: u32,
        token: &CancellationToken,
    ) -> Result<RunReport, ControlError> {
        if cycles == 0 {
            return Err(ControlError::InvalidCycles);
        }
        definition.validate_for(self.bank.len())?;
        let guard = self.begin()?;

        Ok(self.execute(guard, definition, cycles, token))
    }

    fn begin(&self) -> Result<RunGuard<'_, C, D>, ControlError> {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        if state.is_busy() {
            return Err(ControlError::Busy);
        }
        *state = state.transition(RunnerEvent::Start);
        Ok(RunGuard {
            runner: self,
            done: false,
        })
    }

    fn transition(&self, event: RunnerEvent) {
        let mut state = self.state.lock().unwrap_or_else(PoisonError::into_inner);
        let from = *state;
        let to = from.transition(event);
        debug!(?from, ?to, ?event, "runner transition");
        *state = to;
    }

    fn end(&self, event: RunnerEvent) -> RestReport {
        self.transition(event);
        let report = self.bank.rest_all();
        self.transition(RunnerEvent::Rested);
        report
    }

    fn execute(
        &self,
        guard: RunGuard<'_, C, D>,
        definition: &RoutineDefinition,
        cycles: u32,
        token: &CancellationToken,
    ) -> RunReport {
        let name = definition.name();
        let notifier = self.bank.notifier();

        info!(routine = name, cycles, "routine started");
        notifier.notify(&format!("Running {name} for {cycles} cycle(s)"));
        self.bank.rest_all();

        let mut report = RunReport {
            routine: name.to_owned(),
            outcome: RunOutcome::Completed,
            cycles_requested: cycles,
            cycles_completed: 0,
            groups_executed: 0,
            failures: Vec::new(),
            rest_faults: 0,
        };
        let mut stopped = false;

        'cycles: for cycle in 1..=cycles {
            if token.is_signaled() {
                stopped = true;
                break;
            }
            notifier.notify(&format!("Cycle {cycle}/{cycles}"));

            for (index, group) in definition.groups().iter().enumerate() {
                if token.is_signaled() {
                    stopped = true;
                    break 'cycles;
                }
                debug!(routine = name, cycle, group = index + 1, moves = group.len(), "group");
                let fan = self.run_group(group, token);
                report.groups_executed += 1;
                report.failures.extend(fan.failures);
            }

            if token.is_signaled() {
                stopped = true;
                break;
            }
            report.cycles_completed = cycle;
        }

        let event = if stopped {
            RunnerEvent::StopObserved
        } else if !report.failures.is_empty() {
            RunnerEvent::Fault
        } else {
            RunnerEvent::Finished
        };
        report.outcome = RunnerState::Running
            .transition(event)
            .outcome()
            .unwrap_or(RunOutcome::Failed);
        report.rest_faults = guard.finish(event).faults.len();

        info!(
            routine = name,
            outcome = %report.outcome,
            cycles = report.cycles_completed,
            groups = report.groups_executed,
            "routine ended"
        );
        notifier.notify(&format!("{name} {}", report.outcome));
        report
    }

    fn run_group(&self, group: &Group, token: &CancellationToken) -> FanOutReport {
        let bank = &*self.bank;
        let tasks = group
            .moves()
            .iter()
            .map(|spec| {
                Task::new(format!("Actuator {}", spec.actuator), move || {
                    bank.run_move(spec, token).map(|_| ())
                })
            })
            .collect();
        run_parallel(tasks, bank.notifier())
    }
}

/// Trailing rest pass for one run
///
/// Runs on `finish`, or on drop when the body unwinds.
struct RunGuard<'r, C, D>
where
    C: OutputChannel + Send,
    D: DelayNs + Send,
{
    runner: &'r RoutineRunner<C, D>,
    done: bool,
}

impl<C, D> RunGuard<'_, C, D>
where
    C: OutputChannel + Send,
    D: DelayNs + Send,
{
    fn finish(mut self, event: RunnerEvent) -> RestReport {
        self.done = true;
        self.runner.end(event)
    }
}

impl<C, D> Drop for RunGuard<'_, C, D>
where
    C: OutputChannel + Send,
    D: DelayNs + Send,
{
    fn drop(&mut self) {
        if !self.done {
            self.runner.end(RunnerEvent::Fault);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::status::{ChannelSink, Notifier};
    use manus_core::config::{HandConfig, TimingConfig};
    use manus_core::{ActuatorId, Direction, MoveSpec};
    use manus_drivers::StdDelay;
    use manus_hal::{SimBoard, SimChannel};
    use std::thread;
    use std::time::Duration;

    fn runner(board: &SimBoard, notifier: Notifier) -> RoutineRunner<SimChannel, StdDelay> {
        let config = HandConfig {
            timing: TimingConfig {
                deadtime_ms: 1,
                pause_tick_ms: 2,
                home_close_ms: 5,
            },
            ..Default::default()
        };
        let bank = ActuatorBank::from_config(
            &config,
            |pin| Ok(board.channel(pin.pin)),
            StdDelay::new,
            notifier,
        )
        .unwrap();
        RoutineRunner::new(Arc::new(bank), RoutineLibrary::builtin())
    }

    fn short_routine(ids: &[u8], advance_ms: f64) -> RoutineDefinition {
        let secs = advance_ms / 1000.0;
        let group = Group::uniform(ids, secs, 0.005, 0.005, Direction::Open).unwrap();
        RoutineDefinition::new("Short", vec![group]).unwrap()
    }

    #[test]
    fn test_zero_cycles_rejected() {
        let board = SimBoard::new();
        let runner = runner(&board, Notifier::noop());
        board.reset_history();

        let result = runner.run_routine("Routine 1", 0, &CancellationToken::new());
        assert_eq!(result, Err(ControlError::InvalidCycles));
        assert!(board.timeline().is_empty());
        assert_eq!(runner.state(), RunnerState::Idle);
    }

    #[test]
    fn test_unknown_routine_writes_only_off() {
        let board = SimBoard::new();
        let (sink, rx) = ChannelSink::new();
        let runner = runner(&board, Notifier::new(sink));
        board.reset_history();

        let result = runner.run_routine("Routine 9", 1, &CancellationToken::new());

        assert_eq!(result, Err(ControlError::UnknownRoutine("Routine 9".into())));
        assert_eq!(board.total_energize_count(), 0);
        assert!(board.timeline().iter().all(|e| !e.on));
        assert_eq!(runner.state(), RunnerState::Idle);

        let messages: Vec<String> = rx.try_iter().collect();
        assert!(messages.iter().any(|m| m == "Unknown routine: Routine 9"));
    }

    #[test]
    fn test_definition_with_unknown_actuator() {
        let board = SimBoard::new();
        let runner = runner(&board, Notifier::noop());

        let routine = short_routine(&[6], 1.0);
        let result = runner.run_definition(&routine, 1, &CancellationToken::new());
        assert_eq!(result, Err(ControlError::UnknownActuator(6)));
        assert_eq!(board.total_energize_count(), 0);
    }

    #[test]
    fn test_runs_cycles() {
        let board = SimBoard::new();
        let (sink, rx) = ChannelSink::new();
        let runner = runner(&board, Notifier::new(sink));

        let routine = short_routine(&[1, 2], 5.0);
        let report = runner
            .run_definition(&routine, 3, &CancellationToken::new())
            .unwrap();

        assert_eq!(report.outcome, RunOutcome::Completed);
        assert_eq!(report.cycles_completed, 3);
        assert_eq!(report.groups_executed, 3);
        assert!(report.failures.is_empty());
        // advance + retract per actuator per cycle
        assert_eq!(board.total_energize_count(), 12);
        assert!(runner.bank().all_resting());
        assert_eq!(runner.state(), RunnerState::Idle);

        let messages: Vec<String> = rx.try_iter().collect();
        assert!(messages.iter().any(|m| m == "Cycle 3/3"));
        assert_eq!(messages.last().map(String::as_str), Some("Short completed"));
    }

    #[test]
    fn test_select_by_index() {
        let board = SimBoard::new();
        let runner = runner(&board, Notifier::noop());
        let token = CancellationToken::new();
        token.signal();

        // Signaled token: nothing moves, but the selector resolves
        let report = runner.run_routine("2", 1, &token).unwrap();
        assert_eq!(report.routine, "Routine 2");
        assert_eq!(report.outcome, RunOutcome::Cancelled);
        assert_eq!(report.cycles_completed, 0);
        assert_eq!(board.total_energize_count(), 0);
    }

    #[test]
    fn test_busy_while_running() {
        let board = SimBoard::new();
        let runner = runner(&board, Notifier::noop());
        let token = CancellationToken::new();
        let routine = short_routine(&[1], 200.0);

        thread::scope(|s| {
            let handle = s.spawn(|| runner.run_definition(&routine, 1, &token));

            thread::sleep(Duration::from_millis(50));
            assert!(runner.is_busy());
            assert_eq!(
                runner.run_routine("Routine 1", 1, &token),
                Err(ControlError::Busy)
            );

            let report = handle.join().unwrap().unwrap();
            assert_eq!(report.outcome, RunOutcome::Completed);
        });

        assert_eq!(runner.state(), RunnerState::Idle);
    }

    #[test]
    fn test_failed_move_does_not_stop_group() {
        let board = SimBoard::new();
        let runner = runner(&board, Notifier::noop());
        // Actuator 2 open relay
        board.inject_fault(22);

        let routine = short_routine(&[1, 2, 3], 5.0);
        let report = runner
            .run_definition(&routine, 2, &CancellationToken::new())
            .unwrap();

        assert_eq!(report.outcome, RunOutcome::Failed);
        assert_eq!(report.groups_executed, 2);
        assert_eq!(report.failures.len(), 2);
        assert!(report.failures[0].starts_with("Actuator 2:"));
        assert_eq!(report.rest_faults, 1);
        // Actuators 1 and 3 still ran both cycles
        assert_eq!(board.energize_count(17), 2);
        assert_eq!(board.energize_count(24), 2);
        assert_eq!(runner.state(), RunnerState::Idle);
        assert!(!board.any_on());
    }

    #[test]
    fn test_stop_mid_routine() {
        let board = SimBoard::new();
        let runner = runner(&board, Notifier::noop());
        let token = CancellationToken::new();
        let id = ActuatorId::new(1).unwrap();
        let group = Group::new([MoveSpec::from_secs(id, 0.02, 1.0, 0.02, Direction::Open)]).unwrap();
        let routine = RoutineDefinition::new("Long pause", vec![group]).unwrap();

        thread::scope(|s| {
            let handle = s.spawn(|| runner.run_definition(&routine, 5, &token));
            thread::sleep(Duration::from_millis(100));
            token.signal();

            let report = handle.join().unwrap().unwrap();
            assert_eq!(report.outcome, RunOutcome::Cancelled);
            assert_eq!(report.cycles_completed, 0);
            assert_eq!(report.groups_executed, 1);
        });

        // Retract skipped
        assert_eq!(board.energize_count(27), 0);
        assert!(!board.any_on());
        assert_eq!(runner.state(), RunnerState::Idle);
    }
}
