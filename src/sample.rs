use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

use ordered_float::NotNan;
use parking_lot::RwLock;
use rand::distributions::OpenClosed01;
use rand::Rng;
use tracing::debug;

// ─── Configuration ───────────────────────────────────────────────

/// How long a decaying reservoir keeps one priority epoch before every
/// retained key is rewritten relative to a fresh one. Without the
/// rewrite the `exp(alpha · elapsed)` term in the keys grows without
/// bound and eventually overflows to infinity.
const RESCALE_THRESHOLD: Duration = Duration::from_secs(60 * 60);

// ─── Sample contract ─────────────────────────────────────────────

/// A bounded, statistically-representative selection of values from a
/// stream. All operations are infallible and safe to call from
/// arbitrary concurrent readers and writers; a reservoir size of zero
/// is a valid (always empty) configuration.
pub trait Sample: Send + Sync {
    /// Drop all retained values and start over.
    fn clear(&self);

    /// Current occupancy, at most the reservoir size.
    fn size(&self) -> usize;

    /// Offer one new observation.
    fn update(&self, value: i64);

    /// Snapshot of every retained value, order unspecified.
    fn values(&self) -> Vec<i64>;
}

// ─── Uniform reservoir ───────────────────────────────────────────

/// A fixed-size sample drawn uniformly from the whole stream using
/// Vitter's Algorithm R: after `n` observations every one of them has
/// probability `k/n` of being present, independent of arrival order.
pub struct UniformSample {
    reservoir_size: usize,
    inner: RwLock<UniformInner>,
}

struct UniformInner {
    /// Lifetime count of values ever offered, not just retained.
    count: u64,
    values: Vec<i64>,
}

impl UniformSample {
    pub fn new(reservoir_size: usize) -> Self {
        Self {
            reservoir_size,
            inner: RwLock::new(UniformInner {
                count: 0,
                values: Vec::with_capacity(reservoir_size),
            }),
        }
    }
}

impl Sample for UniformSample {
    fn clear(&self) {
        let mut inner = self.inner.write();
        inner.count = 0;
        inner.values.clear();
    }

    fn size(&self) -> usize {
        self.inner.read().values.len()
    }

    fn update(&self, value: i64) {
        let mut inner = self.inner.write();
        inner.count += 1;
        if inner.values.len() < self.reservoir_size {
            inner.values.push(value);
        } else {
            // Slot r is only overwritten when r lands inside the
            // reservoir, which happens with probability k/n.
            let r = rand::thread_rng().gen_range(0..inner.count);
            if (r as usize) < inner.values.len() {
                inner.values[r as usize] = value;
            }
        }
    }

    fn values(&self) -> Vec<i64> {
        self.inner.read().values.clone()
    }
}

// ─── Forward-decay reservoir ─────────────────────────────────────

/// An exponentially-decaying sample using a forward-decaying priority
/// reservoir. Each value is stored under a random priority key
/// `exp(alpha · (t − t0)) / u`, so recently arrived values carry higher
/// expected priority and are less likely to be evicted when the
/// minimum-priority entry is dropped to make room. The reservoir as a
/// whole weights recent data more heavily without ever discarding the
/// entire history at once.
pub struct ExpDecaySample {
    alpha: f64,
    reservoir_size: usize,
    inner: RwLock<ExpDecayInner>,
}

struct ExpDecayInner {
    /// Epoch the priority keys are relative to.
    t0: Instant,
    next_rescale: Instant,
    heap: BinaryHeap<Reverse<PrioritizedValue>>,
}

/// One reservoir entry. Ordered by key; the `Reverse` wrapper in the
/// heap turns the standard max-heap into the min-priority queue the
/// eviction policy needs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
struct PrioritizedValue {
    key: NotNan<f64>,
    value: i64,
}

impl ExpDecaySample {
    pub fn new(reservoir_size: usize, alpha: f64) -> Self {
        let now = Instant::now();
        Self {
            alpha,
            reservoir_size,
            inner: RwLock::new(ExpDecayInner {
                t0: now,
                next_rescale: now + RESCALE_THRESHOLD,
                heap: BinaryHeap::with_capacity(reservoir_size),
            }),
        }
    }

    /// Offer a value observed at `now`. Split out from `update` so a
    /// test can replay a stream against a synthetic clock.
    fn update_at(&self, now: Instant, value: i64) {
        if self.reservoir_size == 0 {
            return;
        }
        let mut inner = self.inner.write();

        let elapsed = now.duration_since(inner.t0).as_secs_f64();
        // The (0,1] draw keeps the divisor nonzero.
        let u: f64 = rand::thread_rng().sample(OpenClosed01);
        let key = match NotNan::new((self.alpha * elapsed).exp() / u) {
            Ok(key) => key,
            Err(_) => return,
        };

        if inner.heap.len() == self.reservoir_size {
            inner.heap.pop();
        }
        inner.heap.push(Reverse(PrioritizedValue { key, value }));

        if now >= inner.next_rescale {
            self.rescale(&mut inner, now);
        }
    }

    /// Rewrite every retained key relative to the epoch `now`.
    /// Multiplying all keys by the same positive factor preserves their
    /// relative order, so the heap invariant and the eviction behavior
    /// are unchanged.
    fn rescale(&self, inner: &mut ExpDecayInner, now: Instant) {
        let old_t0 = inner.t0;
        inner.t0 = now;
        inner.next_rescale = now + RESCALE_THRESHOLD;

        let factor = (-self.alpha * now.duration_since(old_t0).as_secs_f64()).exp();
        let rescaled: BinaryHeap<_> = inner
            .heap
            .drain()
            .filter_map(|Reverse(entry)| {
                let key = NotNan::new(entry.key.into_inner() * factor).ok()?;
                Some(Reverse(PrioritizedValue {
                    key,
                    value: entry.value,
                }))
            })
            .collect();
        inner.heap = rescaled;

        debug!(factor, retained = inner.heap.len(), "rescaled decaying reservoir");
    }
}

impl Sample for ExpDecaySample {
    fn clear(&self) {
        let mut inner = self.inner.write();
        let now = Instant::now();
        inner.t0 = now;
        inner.next_rescale = now + RESCALE_THRESHOLD;
        inner.heap.clear();
    }

    fn size(&self) -> usize {
        self.inner.read().heap.len()
    }

    fn update(&self, value: i64) {
        self.update_at(Instant::now(), value);
    }

    fn values(&self) -> Vec<i64> {
        self.inner
            .read()
            .heap
            .iter()
            .map(|Reverse(entry)| entry.value)
            .collect()
    }
}

// ─── Tests ───────────────────────────────────────────────────────
