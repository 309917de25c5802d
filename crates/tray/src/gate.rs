use std::time::{Duration, Instant};

/// Elapsed-time gate pacing graph pushes and redraws.
///
/// Fires once at least one period has elapsed since the previous firing and
/// then restarts from the firing instant, so the cadence tolerates tick
/// jitter without trying to correct for drift.
#[derive(Debug)]
pub struct RedrawGate {
    period: Duration,
    fired_at: Instant,
}

impl RedrawGate {
    pub fn new(period: Duration, now: Instant) -> Self {
        Self {
            period,
            fired_at: now,
        }
    }

    /// Check the gate at `now`; returns `true` (and resets) when due.
    pub fn poll(&mut self, now: Instant) -> bool {
        if now.duration_since(self.fired_at) >= self.period {
            self.fired_at = now;
            true
        } else {
            false
        }
    }
}
