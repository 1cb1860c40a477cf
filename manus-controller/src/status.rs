//! Status reporting
//!
//! Human-readable status strings pushed to the presentation layer. The
//! sink is optional: the default drops every message, and a panicking
//! sink never reaches actuator control flow.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Arc;

use tracing::{debug, info, warn};

/// Receiver of status messages
///
/// Called concurrently from every move task of a group.
pub trait StatusSink: Send + Sync {
    /// Deliver one message
    fn notify(&self, message: &str);
}

impl<F> StatusSink for F
where
    F: Fn(&str) + Send + Sync,
{
    fn notify(&self, message: &str) {
        self(message)
    }
}

/// Sink that drops every message
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopSink;

impl StatusSink for NoopSink {
    fn notify(&self, _message: &str) {}
}

/// Sink that logs every message at `info`
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingSink;

impl StatusSink for TracingSink {
    fn notify(&self, message: &str) {
        info!(target: "manus::status", "{message}");
    }
}

/// Sink forwarding messages over an mpsc channel
#[derive(Debug, Clone)]
pub struct ChannelSink {
    tx: Sender<String>,
}

impl ChannelSink {
    /// Create a sink and the receiving end of its channel
    pub fn new() -> (Self, Receiver<String>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx }, rx)
    }
}

impl StatusSink for ChannelSink {
    fn notify(&self, message: &str) {
        // A dropped receiver just means nobody is listening
        let _ = self.tx.send(message.to_owned());
    }
}

/// Shared handle the controller reports through
///
/// Every message is logged before it is handed to the sink.
#[derive(Clone)]
pub struct Notifier {
    sink: Arc<dyn StatusSink>,
}

impl Notifier {
    /// Wrap a sink
    pub fn new(sink: impl StatusSink + 'static) -> Self {
        Self {
            sink: Arc::new(sink),
        }
    }

    /// Notifier that only logs
    pub fn noop() -> Self {
        Self::new(NoopSink)
    }

    /// Log and deliver a message
    pub fn notify(&self, message: &str) {
        debug!(target: "manus::status", "{message}");
        let sink = &self.sink;
        if panic::catch_unwind(AssertUnwindSafe(|| sink.notify(message))).is_err() {
            warn!("status sink panicked while handling {message:?}");
        }
    }
}

impl Default for Notifier {
    fn default() -> Self {
        Self::noop()
    }
}

impl core::fmt::Debug for Notifier {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Notifier").finish_non_exhaustive()
    }
}
