//! Blocking delays
//!
//! Every timed hold goes through `embedded_hal::delay::DelayNs`, so tests
//! can swap the thread sleep for a recording delay.

use core::time::Duration;

use embedded_hal::delay::DelayNs;

/// Thread-sleeping delay
#[derive(Debug, Clone, Copy, Default)]
pub struct StdDelay;

impl StdDelay {
    /// Create a new delay
    pub fn new() -> Self {
        Self
    }
}

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(Duration::from_nanos(u64::from(ns)));
    }

    fn delay_us(&mut self, us: u32) {
        std::thread::sleep(Duration::from_micros(u64::from(us)));
    }

    fn delay_ms(&mut self, ms: u32) {
        std::thread::sleep(Duration::from_millis(u64::from(ms)));
    }
}

/// Block for `duration`
///
/// `DelayNs` only takes `u32` arguments, so long holds are split into
/// microsecond chunks. Sub-microsecond remainders are passed on as
/// nanoseconds.
pub fn hold<D: DelayNs + ?Sized>(delay: &mut D, duration: Duration) {
    let mut remaining_us = duration.as_micros();
    while remaining_us > 0 {
        let chunk = remaining_us.min(u128::from(u32::MAX));
        delay.delay_us(chunk as u32);
        remaining_us -= chunk;
    }

    let ns = duration.subsec_nanos() % 1_000;
    if ns > 0 {
        delay.delay_ns(ns);
    }
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingDelay;
    use super::*;
    use std::time::Instant;

    #[test]
    fn test_hold_zero_is_noop() {
        let mut delay = RecordingDelay::default();
        hold(&mut delay, Duration::ZERO);
        assert_eq!(delay.calls, 0);
    }

    #[test]
    fn test_hold_exact_total() {
        let mut delay = RecordingDelay::default();
        hold(&mut delay, Duration::from_nanos(2_500_000_123));
        assert_eq!(delay.total(), Duration::from_nanos(2_500_000_123));
    }

    #[test]
    fn test_hold_splits_long_durations() {
        let mut delay = RecordingDelay::default();
        // Longer than u32::MAX microseconds (~71.6 minutes)
        hold(&mut delay, Duration::from_secs(5_000));
        assert_eq!(delay.total(), Duration::from_secs(5_000));
        assert!(delay.calls >= 2);
    }

    #[test]
    fn test_std_delay_sleeps() {
        let mut delay = StdDelay::new();
        let start = Instant::now();
        hold(&mut delay, Duration::from_millis(20));
        assert!(start.elapsed() >= Duration::from_millis(20));
    }
}
