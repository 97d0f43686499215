// Request epochs - discard responses that resolve after their screen moved on

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Ticket issued when a request starts; compared again when it resolves
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpochTicket(u64);

impl EpochTicket {
    pub fn value(self) -> u64 {
        self.0
    }
}

/// Generation counter owned by one screen instance.
///
/// Cloning shares the counter, so a fetch running on a cloned handle is still
/// invalidated by `advance()` on the owner.
#[derive(Debug, Clone, Default)]
pub struct RequestEpoch {
    current: Arc<AtomicU64>,
}

impl RequestEpoch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request in the current generation
    pub fn begin(&self) -> EpochTicket {
        EpochTicket(self.current.load(Ordering::SeqCst))
    }

    /// Invalidate every outstanding ticket and return a fresh one
    pub fn advance(&self) -> EpochTicket {
        EpochTicket(self.current.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, ticket: EpochTicket) -> bool {
        self.current.load(Ordering::SeqCst) == ticket.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_advance_invalidates_outstanding_tickets() {
        let epoch = RequestEpoch::new();
        let first = epoch.begin();
        assert!(epoch.is_current(first));

        let second = epoch.advance();
        assert!(!epoch.is_current(first));
        assert!(epoch.is_current(second));
    }

    #[test]
    fn test_clones_share_generation() {
        let epoch = RequestEpoch::new();
        let shared = epoch.clone();
        let ticket = shared.begin();

        epoch.advance();
        assert!(!shared.is_current(ticket));
    }
}
