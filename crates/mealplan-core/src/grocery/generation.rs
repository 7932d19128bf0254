use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies one aggregation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RunTicket(u64);

impl RunTicket {
    pub fn generation(self) -> u64 {
        self.0
    }
}

/// Monotonic generation counter for superseding in-flight runs.
///
/// Every [`begin`](Self::begin) issues a ticket newer than all earlier ones.
/// A run may apply its result only while its ticket is still current.
#[derive(Debug, Default)]
pub struct GenerationCounter {
    latest: AtomicU64,
}

impl GenerationCounter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new run, superseding every earlier ticket.
    pub fn begin(&self) -> RunTicket {
        RunTicket(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    /// Supersede every outstanding ticket without starting a run.
    pub fn invalidate(&self) {
        self.latest.fetch_add(1, Ordering::SeqCst);
    }

    pub fn is_current(&self, ticket: RunTicket) -> bool {
        self.latest.load(Ordering::SeqCst) == ticket.0
    }

    pub fn current(&self) -> u64 {
        self.latest.load(Ordering::SeqCst)
    }
}
