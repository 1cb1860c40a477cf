//! Stop handling
//!
//! Operator E-stop: signal the shared token, then HOME. Safe to call from
//! any thread while a routine is in flight; the routine observes the token
//! at its next check point and HOME waits for each actuator's current
//! drive hold to end before closing it.
//!
//! HOME assumes its fixed CLOSE pulse is long enough to retract a finger
//! from any partial advance. Nothing here can verify that.

use std::sync::Arc;
use std::time::Duration;

use embedded_hal::delay::DelayNs;
use manus_core::CancellationToken;
use manus_hal::OutputChannel;
use tracing::warn;

use crate::bank::{ActuatorBank, RestReport};

/// Stop-and-home handle
pub struct StopController<C, D> {
    bank: Arc<ActuatorBank<C, D>>,
    token: CancellationToken,
}

impl<C, D> Clone for StopController<C, D> {
    fn clone(&self) -> Self {
        Self {
            bank: Arc::clone(&self.bank),
            token: self.token.clone(),
        }
    }
}

impl<C, D> StopController<C, D>
where
    C: OutputChannel + Send,
    D: DelayNs + Send,
{
    /// Create a controller sharing `token` with the runner
    pub fn new(bank: Arc<ActuatorBank<C, D>>, token: CancellationToken) -> Self {
        Self { bank, token }
    }

    /// Shared stop token
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    /// Signal the token, then drive every actuator CLOSE for `close`
    pub fn stop_and_home(&self, close: Duration) -> RestReport {
        self.token.signal();
        warn!("stop requested");
        self.bank
            .notifier()
            .notify("Stop requested: returning to HOME");
        self.bank.home_now(close)
    }
}
