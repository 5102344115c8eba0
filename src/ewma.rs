use std::time::Duration;

use crate::TICK_INTERVAL;

/// A single exponentially-weighted moving average, advanced on fixed
/// [`TICK_INTERVAL`] ticks.
///
/// Updates accumulate in an uncounted bucket and do not move the rate;
/// each tick consumes the bucket as that interval's instantaneous rate
/// and folds it into the blended average. The struct takes `&mut self`
/// everywhere — whoever owns one (the [`Meter`](crate::Meter) actor,
/// typically) is the single writer.
#[derive(Debug)]
pub struct Ewma {
    alpha: f64,
    rate: f64,
    uncounted: i64,
    initialized: bool,
}

impl Ewma {
    /// Average with an explicit smoothing constant in `[0, 1]`.
    pub fn new(alpha: f64) -> Self {
        Self {
            alpha,
            rate: 0.0,
            uncounted: 0,
            initialized: false,
        }
    }

    /// Average over an arbitrary decay window. A zero window degenerates
    /// to `alpha = 1`: the rate always equals the latest instantaneous
    /// tick, with no blending.
    pub fn with_window(window: Duration) -> Self {
        let interval = TICK_INTERVAL.as_secs_f64();
        Self::new(1.0 - (-interval / window.as_secs_f64()).exp())
    }

    /// One-minute moving average, the classic load-average decay.
    pub fn one_minute() -> Self {
        Self::with_window(Duration::from_secs(60))
    }

    /// Five-minute moving average.
    pub fn five_minutes() -> Self {
        Self::with_window(Duration::from_secs(300))
    }

    /// Fifteen-minute moving average.
    pub fn fifteen_minutes() -> Self {
        Self::with_window(Duration::from_secs(900))
    }

    /// Accept `n` new events. The rate does not move until the next tick.
    pub fn update(&mut self, n: i64) {
        self.uncounted += n;
    }

    /// Advance one tick interval, folding the events collected since the
    /// last tick into the blended rate.
    pub fn tick(&mut self) {
        let instant_rate = self.uncounted as f64 / TICK_INTERVAL.as_secs_f64();
        self.uncounted = 0;
        if self.initialized {
            self.rate += self.alpha * (instant_rate - self.rate);
        } else {
            // The very first tick seeds the average directly; blending
            // against the initial zero would bias a fresh meter low.
            self.rate = instant_rate;
            self.initialized = true;
        }
    }

    /// Current average in events per second.
    pub fn rate(&self) -> f64 {
        self.rate
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cold_start_is_not_blended() {
        let mut a = Ewma::one_minute();
        a.update(3);
        a.tick();
        assert!((a.rate() - 0.6).abs() < 1e-12);
    }

    #[test]
    fn one_minute_decay_matches_load_average() {
        // A burst of 3 events, then a minute of silence. Twelve empty
        // ticks multiply the seeded 0.6 events/sec by (1 - alpha)^12,
        // which is exp(-1) for the one-minute window.
        let mut a = Ewma::one_minute();
        a.update(3);
        a.tick();
        for _ in 0..12 {
            a.tick();
        }
        assert!((a.rate() - 0.6 * (-1.0f64).exp()).abs() < 1e-9);
    }

    #[test]
    fn steady_state_converges_to_input_rate() {
        let mut a = Ewma::one_minute();
        for _ in 0..1000 {
            a.update(5);
            a.tick();
        }
        assert!((a.rate() - 1.0).abs() < 1e-6);
    }

    #[test]
    fn updates_alone_do_not_move_the_rate() {
        let mut a = Ewma::five_minutes();
        a.update(1000);
        assert_eq!(a.rate(), 0.0);
    }

    #[test]
    fn zero_window_never_blends() {
        let mut a = Ewma::with_window(Duration::ZERO);
        a.update(10);
        a.tick();
        assert!((a.rate() - 2.0).abs() < 1e-12);

        a.tick();
        assert_eq!(a.rate(), 0.0);

        a.update(20);
        a.tick();
        assert!((a.rate() - 4.0).abs() < 1e-12);
    }
}
