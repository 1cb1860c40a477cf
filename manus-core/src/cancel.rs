//! Cooperative cancellation
//!
//! A shared stop flag observed by the routine runner and every move task.
//! Setting it never interrupts a relay hold; it is honored at the next
//! phase boundary or pause tick.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Shared, thread-safe stop flag
///
/// Clones share the same flag.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    flag: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Create a new, unsignaled token
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation
    pub fn signal(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    /// Reset the token so a new routine can run
    pub fn clear(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    /// Check whether cancellation was requested
    pub fn is_signaled(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }
}
