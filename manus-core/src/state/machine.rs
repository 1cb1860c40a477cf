//! Runner state definition
//!
//! Every run funnels through a terminal state and a rest pass before the
//! runner accepts the next routine.

use core::fmt;

use super::events::RunnerEvent;

/// How a routine body ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// All cycles ran to the end
    Completed,
    /// Stopped early by the cancellation token
    Cancelled,
    /// A routine-level failure ended the run
    Failed,
}

impl fmt::Display for RunOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            RunOutcome::Completed => "completed",
            RunOutcome::Cancelled => "cancelled",
            RunOutcome::Failed => "failed",
        })
    }
}

/// Runner states
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RunnerState {
    /// Ready to accept a routine
    #[default]
    Idle,
    /// Routine groups executing
    Running,
    /// Routine body ended, trailing rest pass pending
    Ended(RunOutcome),
}

impl RunnerState {
    /// Check if a routine is in flight (including its rest pass)
    pub fn is_busy(&self) -> bool {
        !matches!(self, RunnerState::Idle)
    }

    /// Outcome of the routine body, once it ended
    pub fn outcome(&self) -> Option<RunOutcome> {
        match self {
            RunnerState::Ended(outcome) => Some(*outcome),
            _ => None,
        }
    }

    /// Process an event and return the next state
    pub fn transition(self, event: RunnerEvent) -> Self {
        use RunnerEvent::*;
        use RunnerState::*;

        match (self, event) {
            (Idle, Start) => Running,

            (Running, Finished) => Ended(RunOutcome::Completed),
            (Running, StopObserved) => Ended(RunOutcome::Cancelled),
            (Running, Fault) => Ended(RunOutcome::Failed),

            // Only the rest pass returns the runner to idle
            (Ended(_), Rested) => Idle,
            (Running, Rested) => Idle,

            // Default: stay in current state
            _ => self,
        }
    }
}
