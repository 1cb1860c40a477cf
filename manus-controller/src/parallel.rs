//! Parallel fan-out
//!
//! One OS thread per task, joined as a barrier. Task failures and panics
//! are turned into status messages here and never unwind into siblings.

use std::any::Any;
use std::thread;

use tracing::warn;

use crate::error::ControlError;
use crate::status::Notifier;

type TaskBody<'a> = Box<dyn FnOnce() -> Result<(), ControlError> + Send + 'a>;

/// Labelled unit of work for [`run_parallel`]
pub struct Task<'a> {
    label: String,
    body: TaskBody<'a>,
}

impl<'a> Task<'a> {
    /// Create a task
    pub fn new<F>(label: impl Into<String>, body: F) -> Self
    where
        F: FnOnce() -> Result<(), ControlError> + Send + 'a,
    {
        Self {
            label: label.into(),
            body: Box::new(body),
        }
    }

    /// Task label used in status messages
    pub fn label(&self) -> &str {
        &self.label
    }
}

/// Result of one fan-out
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FanOutReport {
    /// Tasks that returned `Ok`
    pub completed: usize,
    /// One message per failed or panicked task
    pub failures: Vec<String>,
}

impl FanOutReport {
    /// Check if every task succeeded
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Run every task on its own thread and wait for all of them
pub fn run_parallel(tasks: Vec<Task<'_>>, notifier: &Notifier) -> FanOutReport {
    let mut report = FanOutReport::default();

    thread::scope(|s| {
        let handles: Vec<_> = tasks
            .into_iter()
            .map(|task| {
                let Task { label, body } = task;
                (label, s.spawn(body))
            })
            .collect();

        for (label, handle) in handles {
            let failure = match handle.join() {
                Ok(Ok(())) => {
                    report.completed += 1;
                    continue;
                }
                Ok(Err(e)) => format!("{label}: {e}"),
                Err(payload) => format!("{label}: panicked: {}", panic_message(payload.as_ref())),
            };
            warn!("{failure}");
            notifier.notify(&failure);
            report.failures.push(failure);
        }
    });

    report
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.as_str()
    } else {
        "unknown panic"
    }
}
