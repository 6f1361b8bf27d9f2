use std::time::{Duration, Instant};

/// Wait inserted after a completed block so deliveries follow real time.
///
/// Device buffers are much larger than a block, so reads arrive in bursts;
/// waiting out the rest of the block interval spreads the callbacks evenly.
/// The wait never drops below `floor`.
pub fn pace_delay(interval: Duration, elapsed: Duration, floor: Duration) -> Duration {
    interval.saturating_sub(elapsed).max(floor)
}

/// Pace calculator bound to one session's interval and floor.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Pacer {
    interval: Duration,
    floor: Duration,
}

impl Pacer {
    pub fn new(interval: Duration, floor: Duration) -> Self {
        Self { interval, floor }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn floor(&self) -> Duration {
        self.floor
    }

    /// Delay for an iteration that started at `started`.
    pub fn delay_since(&self, started: Instant) -> Duration {
        pace_delay(self.interval, started.elapsed(), self.floor)
    }
}
