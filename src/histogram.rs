use parking_lot::RwLock;
use serde::Serialize;

use crate::sample::Sample;

// ─── Public types ────────────────────────────────────────────────

/// Distribution statistics over a reservoir of observed values.
///
/// Count, min, max, mean, and variance are running aggregates updated
/// in O(1) on every accepted value, so the historical extremes survive
/// even after the reservoir evicts the value that produced them. Only
/// the percentiles are computed from the sample's snapshot, by sorting
/// a copy on demand.
pub struct Histogram {
    sample: Box<dyn Sample>,
    stats: RwLock<RunningStats>,
}

/// Point-in-time summary of a histogram, ready for serialization.
#[derive(Debug, Clone, Serialize)]
pub struct HistogramSnapshot {
    pub count: u64,
    pub min: i64,
    pub max: i64,
    pub mean: f64,
    pub std_dev: f64,
    pub median: f64,
    pub p95: f64,
    pub p99: f64,
}

// ─── Internal state ──────────────────────────────────────────────

/// Welford accumulator plus extremes. Numerically stable under long
/// streams, unlike a raw sum-of-squares.
#[derive(Debug, Clone, Copy)]
struct RunningStats {
    count: u64,
    min: i64,
    max: i64,
    mean: f64,
    m2: f64,
}

impl RunningStats {
    fn new() -> Self {
        Self {
            count: 0,
            min: 0,
            max: 0,
            mean: 0.0,
            m2: 0.0,
        }
    }

    fn accept(&mut self, value: i64) {
        if self.count == 0 {
            self.min = value;
            self.max = value;
        } else {
            self.min = self.min.min(value);
            self.max = self.max.max(value);
        }
        self.count += 1;
        let delta = value as f64 - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (value as f64 - self.mean);
    }

    fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }
}

// ─── Histogram impl ──────────────────────────────────────────────

impl Histogram {
    /// Histogram over the given sampling strategy.
    pub fn new(sample: Box<dyn Sample>) -> Self {
        Self {
            sample,
            stats: RwLock::new(RunningStats::new()),
        }
    }

    /// Offer one new observation.
    pub fn update(&self, value: i64) {
        self.sample.update(value);
        self.stats.write().accept(value);
    }

    /// Reset the sample and every running aggregate.
    pub fn clear(&self) {
        self.sample.clear();
        *self.stats.write() = RunningStats::new();
    }

    /// Lifetime count of observed values.
    pub fn count(&self) -> u64 {
        self.stats.read().count
    }

    /// Minimal value ever seen, 0 before the first observation.
    pub fn min(&self) -> i64 {
        self.stats.read().min
    }

    /// Maximal value ever seen, 0 before the first observation.
    pub fn max(&self) -> i64 {
        self.stats.read().max
    }

    /// Mean of all values ever seen.
    pub fn mean(&self) -> f64 {
        self.stats.read().mean
    }

    /// Sample variance of all values ever seen, 0 below 2 samples.
    pub fn variance(&self) -> f64 {
        self.stats.read().variance()
    }

    /// Standard deviation of all values ever seen.
    pub fn std_dev(&self) -> f64 {
        self.variance().sqrt()
    }

    /// An arbitrary percentile of the currently retained values, `p` in
    /// `[0, 1]`. `p = 0` is the snapshot minimum, `p = 1` the maximum.
    pub fn percentile(&self, p: f64) -> f64 {
        self.percentiles(&[p])[0]
    }

    /// Several percentiles over one sorted snapshot.
    pub fn percentiles(&self, ps: &[f64]) -> Vec<f64> {
        let mut values = self.sample.values();
        values.sort_unstable();
        ps.iter().map(|&p| rank(&values, p)).collect()
    }

    /// Everything a reader usually wants, in one pass.
    pub fn snapshot(&self) -> HistogramSnapshot {
        let stats = *self.stats.read();
        let ps = self.percentiles(&[0.5, 0.95, 0.99]);
        HistogramSnapshot {
            count: stats.count,
            min: stats.min,
            max: stats.max,
            mean: stats.mean,
            std_dev: stats.variance().sqrt(),
            median: ps[0],
            p95: ps[1],
            p99: ps[2],
        }
    }
}

/// Linear interpolation between the two nearest ranks of a sorted
/// snapshot. An empty snapshot reads as 0.
fn rank(sorted: &[i64], p: f64) -> f64 {
    if sorted.is_empty() {
        return 0.0;
    }
    let pos = p * (sorted.len() + 1) as f64;
    if pos < 1.0 {
        sorted[0] as f64
    } else if pos >= sorted.len() as f64 {
        sorted[sorted.len() - 1] as f64
    } else {
        let lower = sorted[pos as usize - 1] as f64;
        let upper = sorted[pos as usize] as f64;
        lower + (pos - pos.floor()) * (upper - lower)
    }
}

// ─── Tests ───────────────────────────────────────────────────────
