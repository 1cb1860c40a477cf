//! Simulated relay board
//!
//! In-memory stand-in for a relay board, used on machines without GPIO and
//! in tests. Every successful write lands on a single shared timeline, so
//! the exact order in which outputs changed can be replayed across all
//! channels and threads.

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;

use crate::output::{ChannelError, OutputChannel};

/// One recorded write on the simulated board
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChannelEvent {
    /// Position on the board timeline (0-based, strictly increasing)
    pub seq: usize,
    /// Line that was written
    pub line: u8,
    /// Value written
    pub on: bool,
    /// Wall-clock time of the write
    pub at: Instant,
}

/// Two lines of the same pair were observed ON together
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterlockViolation {
    /// Timeline position at which both lines were ON
    pub seq: usize,
    /// First line of the pair
    pub a: u8,
    /// Second line of the pair
    pub b: u8,
}

#[derive(Debug, Default)]
struct LineState {
    on: bool,
    released: bool,
    faulted: bool,
    writes: u32,
    energize_writes: u32,
}

#[derive(Debug, Default)]
struct BoardState {
    lines: BTreeMap<u8, LineState>,
    timeline: Vec<ChannelEvent>,
}

/// Shared simulated board
///
/// Cloning the board shares the same state; channels created from any
/// clone write to the same timeline.
#[derive(Debug, Clone, Default)]
pub struct SimBoard {
    inner: Arc<Mutex<BoardState>>,
}

impl SimBoard {
    /// Create an empty board
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, BoardState> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create a channel on `line`, starting de-energized
    pub fn channel(&self, line: u8) -> SimChannel {
        self.state().lines.entry(line).or_default();
        SimChannel {
            line,
            board: self.inner.clone(),
        }
    }

    /// Current level of a line (false for unknown lines)
    pub fn level(&self, line: u8) -> bool {
        self.state().lines.get(&line).map(|l| l.on).unwrap_or(false)
    }

    /// Whether any line on the board is energized
    pub fn any_on(&self) -> bool {
        self.state().lines.values().any(|l| l.on)
    }

    /// Number of successful writes on a line
    pub fn writes(&self, line: u8) -> u32 {
        self.state().lines.get(&line).map(|l| l.writes).unwrap_or(0)
    }

    /// Number of successful ON writes on a line
    pub fn energize_count(&self, line: u8) -> u32 {
        self.state()
            .lines
            .get(&line)
            .map(|l| l.energize_writes)
            .unwrap_or(0)
    }

    /// Number of successful ON writes across the whole board
    pub fn total_energize_count(&self) -> u32 {
        self.state().lines.values().map(|l| l.energize_writes).sum()
    }

    /// Whether a line has been released
    pub fn is_released(&self, line: u8) -> bool {
        self.state()
            .lines
            .get(&line)
            .map(|l| l.released)
            .unwrap_or(false)
    }

    /// Make every following write on `line` fail
    pub fn inject_fault(&self, line: u8) {
        self.state().lines.entry(line).or_default().faulted = true;
    }

    /// Clear an injected fault
    pub fn clear_fault(&self, line: u8) {
        if let Some(l) = self.state().lines.get_mut(&line) {
            l.faulted = false;
        }
    }

    /// Snapshot of the recorded timeline
    pub fn timeline(&self) -> Vec<ChannelEvent> {
        self.state().timeline.clone()
    }

    /// Drop the recorded timeline and write counters, keeping levels
    pub fn reset_history(&self) {
        let mut state = self.state();
        state.timeline.clear();
        for line in state.lines.values_mut() {
            line.writes = 0;
            line.energize_writes = 0;
        }
    }

    /// Replay the timeline and verify no pair was ever ON on both lines
    ///
    /// Lines start de-energized. The check runs after every recorded
    /// write, which is every instant at which the board state changed.
    pub fn check_interlock(&self, pairs: &[(u8, u8)]) -> Result<(), InterlockViolation> {
        let timeline = self.timeline();
        let mut levels: BTreeMap<u8, bool> = BTreeMap::new();

        for event in &timeline {
            levels.insert(event.line, event.on);
            for &(a, b) in pairs {
                let a_on = levels.get(&a).copied().unwrap_or(false);
                let b_on = levels.get(&b).copied().unwrap_or(false);
                if a_on && b_on {
                    return Err(InterlockViolation { seq: event.seq, a, b });
                }
            }
        }

        Ok(())
    }
}

/// Channel on a [`SimBoard`]
#[derive(Debug)]
pub struct SimChannel {
    line: u8,
    board: Arc<Mutex<BoardState>>,
}

impl SimChannel {
    fn state(&self) -> MutexGuard<'_, BoardState> {
        self.board.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl OutputChannel for SimChannel {
    fn line(&self) -> u8 {
        self.line
    }

    fn set(&mut self, on: bool) -> Result<(), ChannelError> {
        let line = self.line;
        let mut state = self.state();
        let seq = state.timeline.len();

        let entry = state.lines.entry(line).or_default();
        if entry.released {
            return Err(ChannelError::Released { line });
        }
        if entry.faulted {
            return Err(ChannelError::Fault {
                line,
                reason: "injected fault".into(),
            });
        }

        entry.on = on;
        entry.writes += 1;
        if on {
            entry.energize_writes += 1;
        }

        state.timeline.push(ChannelEvent {
            seq,
            line,
            on,
            at: Instant::now(),
        });
        Ok(())
    }

    fn is_set(&self) -> bool {
        self.state().lines.get(&self.line).map(|l| l.on).unwrap_or(false)
    }

    fn release(&mut self) -> Result<(), ChannelError> {
        let released = self
            .state()
            .lines
            .get(&self.line)
            .map(|l| l.released)
            .unwrap_or(false);
        if released {
            return Ok(());
        }

        self.set(false)?;
        self.state().lines.entry(self.line).or_default().released = true;
        Ok(())
    }
}
