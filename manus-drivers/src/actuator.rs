//! Linear actuator driver
//!
//! This driver provides:
//! - The drive primitive: off, deadtime, single-coil energize, hold, off,
//!   deadtime
//! - The advance / pause / retract move sequence
//! - An interruptible pause polled in fixed ticks
//!
//! # Cancellation
//!
//! A signaled token is honored at phase boundaries and pause ticks only.
//! An in-progress drive hold always completes. An interrupted move skips
//! its retract and leaves the actuator `Active`; bringing it back is the
//! job of the HOME pass.
//!
//! ```ignore
//! let mut actuator = Actuator::new(pair, StdDelay, DriveTiming::default());
//! let outcome = actuator.run_move(&spec, &token)?;
//! ```

use core::time::Duration;

use embedded_hal::delay::DelayNs;
use manus_core::config::TimingConfig;
use manus_core::{ActuatorId, CancellationToken, Direction, MoveSpec};
use manus_hal::{ChannelError, OutputChannel};
use tracing::{debug, warn};

use crate::delay::hold;
use crate::error::DriveError;
use crate::relay::RelayPair;

/// Logical actuator state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActuatorState {
    /// De-energized and known to be at rest
    #[default]
    Resting,
    /// Moving, interrupted, or after a fault: position unknown
    Active,
}

/// How a move ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MoveOutcome {
    /// Advance, pause and retract all ran
    Completed,
    /// Cancellation observed, retract skipped
    Interrupted,
}

/// Drive timing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DriveTiming {
    /// Both-off hold before and after every energization
    pub deadtime: Duration,
    /// Poll step of the interruptible pause
    pub pause_tick: Duration,
}

impl Default for DriveTiming {
    fn default() -> Self {
        Self::from(&TimingConfig::default())
    }
}

impl From<&TimingConfig> for DriveTiming {
    fn from(config: &TimingConfig) -> Self {
        Self {
            deadtime: config.deadtime(),
            pause_tick: config.pause_tick(),
        }
    }
}

/// One actuator: a relay pair, its logical state and a delay source
#[derive(Debug)]
pub struct Actuator<C, D> {
    pair: RelayPair<C>,
    state: ActuatorState,
    delay: D,
    timing: DriveTiming,
}

impl<C: OutputChannel, D: DelayNs> Actuator<C, D> {
    /// Create an actuator around an already constructed pair
    pub fn new(pair: RelayPair<C>, delay: D, timing: DriveTiming) -> Self {
        Self {
            pair,
            state: ActuatorState::Resting,
            delay,
            timing,
        }
    }

    /// Actuator id
    pub fn id(&self) -> ActuatorId {
        self.pair.actuator()
    }

    /// Logical state
    pub fn state(&self) -> ActuatorState {
        self.state
    }

    /// Drive timing
    pub fn timing(&self) -> DriveTiming {
        self.timing
    }

    /// Relay pair, for inspection
    pub fn pair(&self) -> &RelayPair<C> {
        &self.pair
    }

    /// Drive in `direction` for `duration`
    ///
    /// The only path that energizes an output. On failure the actuator
    /// stays `Active` and a best-effort OFF is attempted before returning
    /// the original error.
    pub fn drive(&mut self, direction: Direction, duration: Duration) -> Result<(), DriveError> {
        let id = self.id();
        self.state = ActuatorState::Active;

        self.pair.force_off()?;
        hold(&mut self.delay, self.timing.deadtime);

        if let Err(e) = self.pair.energize(direction) {
            let _ = self.pair.force_off();
            return Err(e);
        }
        debug!(actuator = %id, %direction, ?duration, "drive");
        hold(&mut self.delay, duration);

        if let Err(e) = self.pair.force_off() {
            // One retry before giving up on the coil
            let _ = self.pair.force_off();
            return Err(e.into());
        }
        hold(&mut self.delay, self.timing.deadtime);

        Ok(())
    }

    /// Force both outputs OFF, leaving the logical state unchanged
    pub fn off(&mut self) -> Result<(), ChannelError> {
        self.pair.force_off()
    }

    /// Force both outputs OFF and mark the actuator `Resting`
    ///
    /// The state only changes when both outputs were confirmed OFF.
    pub fn rest(&mut self) -> Result<(), ChannelError> {
        self.pair.force_off()?;
        self.state = ActuatorState::Resting;
        Ok(())
    }

    /// Run the advance / pause / retract sequence of `spec`
    pub fn run_move(
        &mut self,
        spec: &MoveSpec,
        token: &CancellationToken,
    ) -> Result<MoveOutcome, DriveError> {
        let id = self.id();
        if token.is_signaled() {
            debug!(actuator = %id, "move skipped: stop requested");
            return Ok(MoveOutcome::Interrupted);
        }

        self.state = ActuatorState::Active;

        debug!(actuator = %id, direction = %spec.start, "advance");
        self.drive(spec.start, spec.advance)?;
        if token.is_signaled() {
            debug!(actuator = %id, "interrupted after advance");
            return Ok(MoveOutcome::Interrupted);
        }

        self.off()?;
        if !self.pause(spec.pause, token) {
            debug!(actuator = %id, "interrupted during pause");
            return Ok(MoveOutcome::Interrupted);
        }

        let retract = spec.retract_direction();
        debug!(actuator = %id, direction = %retract, "retract");
        self.drive(retract, spec.retract)?;

        self.state = ActuatorState::Resting;
        Ok(MoveOutcome::Completed)
    }

    /// Hold de-energized for `duration`, polling `token` every tick
    ///
    /// Returns `false` when cancellation was observed.
    pub fn pause(&mut self, duration: Duration, token: &CancellationToken) -> bool {
        let tick = self.timing.pause_tick.max(Duration::from_millis(1));
        let mut remaining = duration;

        while !remaining.is_zero() {
            if token.is_signaled() {
                return false;
            }
            let step = remaining.min(tick);
            hold(&mut self.delay, step);
            remaining -= step;
        }

        !token.is_signaled()
    }

    /// Release both outputs
    pub fn release(&mut self) -> Result<(), ChannelError> {
        let result = self.pair.release();
        if let Err(e) = &result {
            warn!(actuator = %self.id(), error = %e, "release failed");
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::delay::testing::RecordingDelay;
    use manus_hal::{SimBoard, SimChannel};
    use proptest::prelude::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const A: u8 = 22;
    const B: u8 = 23;

    fn timing() -> DriveTiming {
        DriveTiming {
            deadtime: Duration::from_millis(50),
            pause_tick: Duration::from_millis(50),
        }
    }

    fn actuator(board: &SimBoard) -> Actuator<SimChannel, RecordingDelay> {
        let id = ActuatorId::new(2).unwrap();
        let pair = RelayPair::new(id, board.channel(A), board.channel(B)).unwrap();
        Actuator::new(pair, RecordingDelay::default(), timing())
    }

    fn spec(advance: f64, pause: f64, retract: f64, start: Direction) -> MoveSpec {
        MoveSpec::from_secs(ActuatorId::new(2).unwrap(), advance, pause, retract, start)
    }

    /// Delay that signals a token after a number of hold calls
    struct TrippingDelay {
        token: CancellationToken,
        after: usize,
        calls: Arc<AtomicUsize>,
    }

    impl DelayNs for TrippingDelay {
        fn delay_ns(&mut self, _ns: u32) {}

        fn delay_us(&mut self, _us: u32) {
            let n = self.calls.fetch_add(1, Ordering::SeqCst) + 1;
            if n == self.after {
                self.token.signal();
            }
        }
    }

    #[test]
    fn test_initial_state() {
        let board = SimBoard::new();
        let actuator = actuator(&board);

        assert_eq!(actuator.state(), ActuatorState::Resting);
        assert!(actuator.pair().is_off());
        assert_eq!(actuator.id().get(), 2);
    }

    #[test]
    fn test_drive_sequence() {
        let board = SimBoard::new();
        let mut actuator = actuator(&board);
        board.reset_history();

        actuator
            .drive(Direction::Open, Duration::from_secs(2))
            .unwrap();

        let writes: Vec<(u8, bool)> = board.timeline().iter().map(|e| (e.line, e.on)).collect();
        assert_eq!(
            writes,
            [
                (A, false),
                (B, false),
                (A, true),
                (A, false),
                (B, false)
            ]
        );
        // deadtime + hold + deadtime
        assert_eq!(actuator.delay.total(), Duration::from_millis(2_100));
        assert_eq!(actuator.state(), ActuatorState::Active);
        assert!(!board.any_on());
    }

    #[test]
    fn test_drive_close_energizes_b() {
        let board = SimBoard::new();
        let mut actuator = actuator(&board);

        actuator.drive(Direction::Close, Duration::ZERO).unwrap();
        assert_eq!(board.energize_count(B), 1);
        assert_eq!(board.energize_count(A), 0);
    }

    #[test]
    fn test_drive_fault_leaves_active() {
        let board = SimBoard::new();
        let mut actuator = actuator(&board);
        board.inject_fault(A);

        let result = actuator.drive(Direction::Close, Duration::from_secs(1));
        assert!(matches!(result, Err(DriveError::Output(_))));
        assert_eq!(actuator.state(), ActuatorState::Active);
        assert_eq!(board.total_energize_count(), 0);
    }

    #[test]
    fn test_energize_fault_forces_off() {
        let board = SimBoard::new();
        let mut actuator = actuator(&board);

        board.inject_fault(B);
        // Force-off of B fails first, so nothing is energized
        assert!(actuator.drive(Direction::Close, Duration::ZERO).is_err());
        assert!(!board.any_on());
    }

    #[test]
    fn test_rest_marks_resting() {
        let board = SimBoard::new();
        let mut actuator = actuator(&board);

        actuator.drive(Direction::Open, Duration::ZERO).unwrap();
        assert_eq!(actuator.state(), ActuatorState::Active);

        actuator.rest().unwrap();
        assert_eq!(actuator.state(), ActuatorState::Resting);

        // Idempotent
        actuator.rest().unwrap();
        assert_eq!(actuator.state(), ActuatorState::Resting);
        assert!(!board.any_on());
    }

    #[test]
    fn test_rest_fault_keeps_active() {
        let board = SimBoard::new();
        let mut actuator = actuator(&board);

        actuator.drive(Direction::Open, Duration::ZERO).unwrap();
        board.inject_fault(B);

        assert!(actuator.rest().is_err());
        assert_eq!(actuator.state(), ActuatorState::Active);
    }

    #[test]
    fn test_full_move() {
        let board = SimBoard::new();
        let mut actuator = actuator(&board);
        let token = CancellationToken::new();

        let outcome = actuator
            .run_move(&spec(2.0, 1.0, 2.0, Direction::Open), &token)
            .unwrap();

        assert_eq!(outcome, MoveOutcome::Completed);
        assert_eq!(actuator.state(), ActuatorState::Resting);
        assert_eq!(board.energize_count(A), 1);
        assert_eq!(board.energize_count(B), 1);
        // 2 + 1 + 2 seconds plus four deadtimes
        assert_eq!(actuator.delay.total(), Duration::from_millis(5_200));
        assert!(board.check_interlock(&[(A, B)]).is_ok());
    }

    #[test]
    fn test_close_first_move_retracts_open() {
        let board = SimBoard::new();
        let mut actuator = actuator(&board);
        let token = CancellationToken::new();
        board.reset_history();

        actuator
            .run_move(&spec(1.0, 0.0, 1.0, Direction::Close), &token)
            .unwrap();

        let ons: Vec<u8> = board
            .timeline()
            .iter()
            .filter(|e| e.on)
            .map(|e| e.line)
            .collect();
        assert_eq!(ons, [B, A]);
    }

    #[test]
    fn test_zero_durations_still_toggle() {
        let board = SimBoard::new();
        let mut actuator = actuator(&board);
        let token = CancellationToken::new();

        let outcome = actuator
            .run_move(&spec(0.0, 0.0, 0.0, Direction::Open), &token)
            .unwrap();

        assert_eq!(outcome, MoveOutcome::Completed);
        assert_eq!(board.total_energize_count(), 2);
        assert_eq!(actuator.delay.total(), Duration::from_millis(200));
        assert!(!board.any_on());
    }

    #[test]
    fn test_signaled_token_skips_move() {
        let board = SimBoard::new();
        let mut actuator = actuator(&board);
        let token = CancellationToken::new();
        token.signal();

        let outcome = actuator
            .run_move(&spec(2.0, 1.0, 2.0, Direction::Open), &token)
            .unwrap();

        assert_eq!(outcome, MoveOutcome::Interrupted);
        assert_eq!(actuator.state(), ActuatorState::Resting);
        assert_eq!(board.total_energize_count(), 0);
    }

    #[test]
    fn test_cancel_during_advance_skips_retract() {
        let board = SimBoard::new();
        let token = CancellationToken::new();
        let id = ActuatorId::new(2).unwrap();
        let pair = RelayPair::new(id, board.channel(A), board.channel(B)).unwrap();
        // Second hold is the advance hold
        let delay = TrippingDelay {
            token: token.clone(),
            after: 2,
            calls: Arc::new(AtomicUsize::new(0)),
        };
        let mut actuator = Actuator::new(pair, delay, timing());

        let outcome = actuator
            .run_move(&spec(5.0, 1.0, 5.0, Direction::Open), &token)
            .unwrap();

        assert_eq!(outcome, MoveOutcome::Interrupted);
        assert_eq!(actuator.state(), ActuatorState::Active);
        assert_eq!(board.energize_count(A), 1);
        assert_eq!(board.energize_count(B), 0);
        assert!(!board.any_on());
    }

    #[test]
    fn test_pause_interrupted_within_one_tick() {
        let board = SimBoard::new();
        let token = CancellationToken::new();
        let id = ActuatorId::new(2).unwrap();
        let pair = RelayPair::new(id, board.channel(A), board.channel(B)).unwrap();
        let calls = Arc::new(AtomicUsize::new(0));
        let delay = TrippingDelay {
            token: token.clone(),
            after: 3,
            calls: calls.clone(),
        };
        let mut actuator = Actuator::new(pair, delay, timing());

        // 10 s pause = 200 ticks; the token trips on the third tick
        assert!(!actuator.pause(Duration::from_secs(10), &token));
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_pause_zero() {
        let board = SimBoard::new();
        let mut actuator = actuator(&board);
        let token = CancellationToken::new();

        assert!(actuator.pause(Duration::ZERO, &token));
        assert_eq!(actuator.delay.calls, 0);
    }

    #[test]
    fn test_release() {
        let board = SimBoard::new();
        let mut actuator = actuator(&board);

        actuator.release().unwrap();
        assert!(board.is_released(A));
        assert!(board.is_released(B));
        assert!(actuator.drive(Direction::Open, Duration::ZERO).is_err());
    }

    #[test]
    fn test_timing_from_config() {
        let config = TimingConfig {
            deadtime_ms: 20,
            pause_tick_ms: 10,
            home_close_ms: 1000,
        };
        let timing = DriveTiming::from(&config);
        assert_eq!(timing.deadtime, Duration::from_millis(20));
        assert_eq!(timing.pause_tick, Duration::from_millis(10));
    }

    proptest! {
        #[test]
        fn prop_interlock_holds_for_any_drive_sequence(
            drives in proptest::collection::vec((any::<bool>(), 0u64..500), 1..30)
        ) {
            let board = SimBoard::new();
            let mut actuator = actuator(&board);

            for (open, ms) in drives {
                let direction = if open { Direction::Open } else { Direction::Close };
                actuator.drive(direction, Duration::from_millis(ms)).unwrap();
                prop_assert!(!board.any_on());
            }

            prop_assert!(board.check_interlock(&[(A, B)]).is_ok());
        }
    }
}
