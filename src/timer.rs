use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

use crate::histogram::{Histogram, HistogramSnapshot};
use crate::meter::{Meter, MeterSnapshot};
use crate::sample::ExpDecaySample;

/// Captures both the duration distribution and the rate of an event by
/// composing a [`Histogram`] and a [`Meter`].
///
/// Durations are recorded as whole nanoseconds. Each update feeds both
/// halves; both accept input independently and infallibly, so no
/// partially-recorded state is ever observable.
pub struct Timer {
    histogram: Histogram,
    meter: Meter,
}

impl Timer {
    /// Timer over the standard decaying sample (1028 entries, alpha
    /// 0.015 — the same bias as Unix load averages) and a fresh meter.
    /// Requires a tokio runtime, like [`Meter::new`].
    pub fn new() -> Self {
        Self::with_parts(
            Histogram::new(Box::new(ExpDecaySample::new(1028, 0.015))),
            Meter::new(),
        )
    }

    /// Timer over a caller-chosen histogram and meter.
    pub fn with_parts(histogram: Histogram, meter: Meter) -> Self {
        Self { histogram, meter }
    }

    /// Record one event of the given duration.
    pub fn update(&self, duration: Duration) {
        self.histogram.update(duration.as_nanos() as i64);
        self.meter.mark(1);
    }

    /// Record one event that started at `start` and ends now.
    pub fn update_since(&self, start: Instant) {
        self.update(start.elapsed());
    }

    /// Run `f`, recording its wall-clock elapsed time.
    pub fn time<T>(&self, f: impl FnOnce() -> T) -> T {
        let start = Instant::now();
        let out = f();
        self.update(start.elapsed());
        out
    }

    /// Await `fut`, recording its wall-clock elapsed time.
    pub async fn time_async<F: Future>(&self, fut: F) -> F::Output {
        let start = Instant::now();
        let out = fut.await;
        self.update(start.elapsed());
        out
    }

    /// The duration-distribution half.
    pub fn histogram(&self) -> &Histogram {
        &self.histogram
    }

    /// The event-rate half.
    pub fn meter(&self) -> &Meter {
        &self.meter
    }

    // ── Histogram accessors ─────────────────────────────────────

    /// Count of recorded events.
    pub fn count(&self) -> u64 {
        self.histogram.count()
    }

    /// Shortest recorded duration, in nanoseconds.
    pub fn min(&self) -> i64 {
        self.histogram.min()
    }

    /// Longest recorded duration, in nanoseconds.
    pub fn max(&self) -> i64 {
        self.histogram.max()
    }

    /// Mean recorded duration, in nanoseconds.
    pub fn mean(&self) -> f64 {
        self.histogram.mean()
    }

    /// Standard deviation of recorded durations, in nanoseconds.
    pub fn std_dev(&self) -> f64 {
        self.histogram.std_dev()
    }

    /// An arbitrary percentile of recorded durations, `p` in `[0, 1]`.
    pub fn percentile(&self, p: f64) -> f64 {
        self.histogram.percentile(p)
    }

    /// Several percentiles over one sorted snapshot.
    pub fn percentiles(&self, ps: &[f64]) -> Vec<f64> {
        self.histogram.percentiles(ps)
    }

    /// Summary of the duration distribution.
    pub fn histogram_snapshot(&self) -> HistogramSnapshot {
        self.histogram.snapshot()
    }

    // ── Meter accessors ─────────────────────────────────────────

    /// One-minute moving average event rate, events per second.
    pub async fn rate1(&self) -> f64 {
        self.meter.rate1().await
    }

    /// Five-minute moving average event rate, events per second.
    pub async fn rate5(&self) -> f64 {
        self.meter.rate5().await
    }

    /// Fifteen-minute moving average event rate, events per second.
    pub async fn rate15(&self) -> f64 {
        self.meter.rate15().await
    }

    /// Lifetime mean event rate, events per second.
    pub async fn rate_mean(&self) -> f64 {
        self.meter.rate_mean().await
    }

    /// Summary of the rate half.
    pub async fn meter_snapshot(&self) -> MeterSnapshot {
        self.meter.snapshot().await
    }
}

// ─── Tests ───────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn update_feeds_both_halves() {
        let t = Timer::new();
        t.update(Duration::from_millis(25));

        assert_eq!(t.count(), 1);
        assert_eq!(t.max(), 25_000_000);
        assert_eq!(t.meter().count().await, 1);
    }

    #[tokio::test]
    async fn zero_duration_is_recorded_as_given() {
        let t = Timer::new();
        t.update(Duration::ZERO);

        assert_eq!(t.count(), 1);
        assert_eq!(t.min(), 0);
        assert_eq!(t.max(), 0);
    }

    #[tokio::test]
    async fn time_measures_a_sleeping_closure() {
        let t = Timer::new();
        let out = t.time(|| {
            std::thread::sleep(Duration::from_millis(50));
            7
        });

        assert_eq!(out, 7);
        assert_eq!(t.count(), 1);
        let recorded = t.max();
        assert!(
            recorded >= 50_000_000 && recorded < 500_000_000,
            "recorded {recorded}ns"
        );
        assert_eq!(t.meter().count().await, 1);
    }

    #[tokio::test(start_paused = true)]
    async fn time_async_measures_a_sleeping_future() {
        let t = Timer::new();
        t.time_async(tokio::time::sleep(Duration::from_secs(2))).await;

        assert_eq!(t.count(), 1);
        assert_eq!(t.max(), 2_000_000_000);
        assert_eq!(t.meter().count().await, 1);
    }

    #[tokio::test]
    async fn update_since_records_elapsed_time() {
        let t = Timer::new();
        let start = Instant::now();
        std::thread::sleep(Duration::from_millis(20));
        t.update_since(start);

        assert_eq!(t.count(), 1);
        assert!(t.max() >= 20_000_000);
    }
}
