//! Shared helpers for integration tests

#![allow(dead_code)]

use std::sync::{Arc, Mutex};

use manus_controller::{Notifier, SimHand};
use manus_core::config::{HandConfig, TimingConfig};
use manus_hal::SimBoard;

/// Reference relay pairs as (open, close) lines
pub const PAIRS: [(u8, u8); 5] = [(17, 27), (22, 23), (24, 25), (5, 6), (12, 13)];

/// Reference pin map with short relay timing
pub fn fast_config(deadtime_ms: u64, pause_tick_ms: u64, home_close_ms: u64) -> HandConfig {
    HandConfig {
        timing: TimingConfig {
            deadtime_ms,
            pause_tick_ms,
            home_close_ms,
        },
        ..Default::default()
    }
}

/// Hand on a fresh simulated board, collecting status messages
pub fn hand(config: &HandConfig) -> (SimHand, SimBoard, Arc<Mutex<Vec<String>>>) {
    let board = SimBoard::new();
    let messages = Arc::new(Mutex::new(Vec::new()));
    let sink = Arc::clone(&messages);
    let notifier = Notifier::new(move |m: &str| sink.lock().unwrap().push(m.to_owned()));
    let hand = SimHand::simulated(config, &board, notifier).unwrap();
    (hand, board, messages)
}

/// Actuator owning `line`, 1-based
pub fn actuator_of(line: u8) -> Option<u8> {
    PAIRS
        .iter()
        .position(|&(a, b)| a == line || b == line)
        .map(|i| i as u8 + 1)
}

/// Assert every output on the board reads OFF
pub fn assert_all_off(board: &SimBoard) {
    for (a, b) in PAIRS {
        assert!(!board.level(a), "line {a} still on");
        assert!(!board.level(b), "line {b} still on");
    }
}
