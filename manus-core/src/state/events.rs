//! Events that trigger runner state transitions

/// Events that can trigger runner state transitions
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerEvent {
    /// A routine was accepted and the initial rest pass done
    Start,
    /// Every cycle ran to the end
    Finished,
    /// The stop token was observed
    StopObserved,
    /// The routine body failed
    Fault,
    /// The trailing rest pass returned the bank to rest
    Rested,
}

impl RunnerEvent {
    /// Check if this event ends the routine body
    pub fn ends_routine(&self) -> bool {
        matches!(
            self,
            RunnerEvent::Finished | RunnerEvent::StopObserved | RunnerEvent::Fault
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ends_routine() {
        assert!(RunnerEvent::Finished.ends_routine());
        assert!(RunnerEvent::StopObserved.ends_routine());
        assert!(RunnerEvent::Fault.ends_routine());
        assert!(!RunnerEvent::Start.ends_routine());
        assert!(!RunnerEvent::Rested.ends_routine());
    }
}
