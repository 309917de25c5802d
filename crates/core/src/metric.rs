use crate::error::Result;

/// A source of instantaneous metric readings, polled once per tick.
///
/// Implementations are constructed once at startup (construction failure is
/// fatal) and then sampled synchronously from the event-loop thread. A failed
/// read mid-run is recoverable: callers skip the tick and keep going.
pub trait MetricSource {
    /// Return the current reading as a percentage in `0.0..=100.0`.
    fn sample(&mut self) -> Result<f32>;
}
