/// Produced/delivered counters that let a completed block be reported at most once.
///
/// Invariant: `delivered <= produced`. A block is delivered only when
/// `produced > delivered` at claim time, after which `delivered = produced`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SequenceGuard {
    produced: u64,
    delivered: u64,
}

impl SequenceGuard {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a newly completed block and return its sequence number (1-based).
    pub fn produce(&mut self) -> u64 {
        self.produced += 1;
        self.produced
    }

    /// Claim the latest produced block for delivery.
    ///
    /// Returns its sequence number, or `None` if it was already delivered.
    pub fn claim(&mut self) -> Option<u64> {
        if !self.has_pending() {
            return None;
        }
        self.delivered = self.produced;
        Some(self.delivered)
    }

    pub fn produced(&self) -> u64 {
        self.produced
    }

    pub fn delivered(&self) -> u64 {
        self.delivered
    }

    pub fn has_pending(&self) -> bool {
        self.produced > self.delivered
    }
}
