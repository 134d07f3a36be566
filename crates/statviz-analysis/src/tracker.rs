//! Request generations: only the newest outstanding request may land.

use std::sync::atomic::{AtomicU64, Ordering};

use tracing::debug;

/// Handle for one started request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct RequestTicket {
    generation: u64,
}

impl RequestTicket {
    pub fn generation(self) -> u64 {
        self.generation
    }
}

/// Issues tickets and rejects responses from superseded requests.
#[derive(Debug, Default)]
pub struct RequestTracker {
    latest: AtomicU64,
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a request, superseding every earlier ticket.
    pub fn begin(&self) -> RequestTicket {
        let generation = self.latest.fetch_add(1, Ordering::SeqCst) + 1;
        RequestTicket { generation }
    }

    pub fn is_current(&self, ticket: RequestTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.generation
    }

    /// Hand back `value` only if `ticket` is still the newest request.
    pub fn accept<T>(&self, ticket: RequestTicket, value: T) -> Option<T> {
        if self.is_current(ticket) {
            Some(value)
        } else {
            debug!(generation = ticket.generation, "discarding superseded response");
            None
        }
    }

    /// Invalidate every outstanding ticket.
    pub fn cancel_all(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
    }
}
