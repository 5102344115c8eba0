use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::trace;

use crate::ewma::Ewma;
use crate::TICK_INTERVAL;

// ─── Public handle ───────────────────────────────────────────────

/// Counts events and keeps one-, five-, and fifteen-minute moving
/// average rates plus a lifetime mean rate.
///
/// All mutable state is owned by a dedicated background task; the
/// handle only enqueues commands, so no mutex is involved and readers
/// always see a fully-formed snapshot. [`mark`](Meter::mark) never
/// blocks; reads wait for one actor service step. Commands from one
/// handle are serviced in the order they were issued, so a `mark`
/// followed by a read observes the mark.
///
/// Construction spawns the actor and therefore requires a tokio
/// runtime. Cloning the handle shares the same underlying meter; the
/// actor exits once every handle is gone.
#[derive(Clone)]
pub struct Meter {
    tx: mpsc::UnboundedSender<Command>,
}

/// All values a reader can observe, captured atomically by the actor.
/// A fresh meter reads as all zeroes.
#[derive(Debug, Clone, Copy, Default, Serialize)]
pub struct MeterSnapshot {
    pub count: i64,
    pub rate1: f64,
    pub rate5: f64,
    pub rate15: f64,
    pub rate_mean: f64,
}

enum Command {
    Mark(i64),
    Read(oneshot::Sender<MeterSnapshot>),
}

impl Meter {
    /// Start a new meter and its owning actor task.
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        tokio::spawn(arbiter(rx));
        Self { tx }
    }

    /// Record the occurrence of `n` events. `mark(0)` is a legal no-op.
    pub fn mark(&self, n: i64) {
        let _ = self.tx.send(Command::Mark(n));
    }

    /// Lifetime count of events seen.
    pub async fn count(&self) -> i64 {
        self.snapshot().await.count
    }

    /// One-minute moving average rate, events per second.
    pub async fn rate1(&self) -> f64 {
        self.snapshot().await.rate1
    }

    /// Five-minute moving average rate, events per second.
    pub async fn rate5(&self) -> f64 {
        self.snapshot().await.rate5
    }

    /// Fifteen-minute moving average rate, events per second.
    pub async fn rate15(&self) -> f64 {
        self.snapshot().await.rate15
    }

    /// Lifetime mean rate, events per second.
    pub async fn rate_mean(&self) -> f64 {
        self.snapshot().await.rate_mean
    }

    /// Consistent view of the count and all four rates.
    pub async fn snapshot(&self) -> MeterSnapshot {
        let (reply, rx) = oneshot::channel();
        let _ = self.tx.send(Command::Read(reply));
        rx.await.unwrap_or_default()
    }
}

impl Default for Meter {
    fn default() -> Self {
        Self::new()
    }
}

// ─── Actor ───────────────────────────────────────────────────────

/// Owns the count, the three moving averages, and the cached output
/// snapshot. Services exactly one event per loop iteration: a command
/// from the queue or the tick timer.
async fn arbiter(mut rx: mpsc::UnboundedReceiver<Command>) {
    let mut count: i64 = 0;
    let mut a1 = Ewma::one_minute();
    let mut a5 = Ewma::five_minutes();
    let mut a15 = Ewma::fifteen_minutes();
    let started = Instant::now();
    let mut cached = MeterSnapshot::default();

    // First fire is one full interval out; an immediate tick would burn
    // the cold-start seeding on an empty interval.
    let mut ticker = time::interval_at(started + TICK_INTERVAL, TICK_INTERVAL);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

    trace!("meter actor started");
    loop {
        tokio::select! {
            cmd = rx.recv() => match cmd {
                Some(Command::Mark(n)) => {
                    count += n;
                    a1.update(n);
                    a5.update(n);
                    a15.update(n);
                    cached = snapshot_of(count, &a1, &a5, &a15, started);
                }
                Some(Command::Read(reply)) => {
                    let _ = reply.send(cached);
                }
                // Every handle is gone; nothing can mark or read again.
                None => break,
            },
            _ = ticker.tick() => {
                a1.tick();
                a5.tick();
                a15.tick();
                cached = snapshot_of(count, &a1, &a5, &a15, started);
            }
        }
    }
    trace!("meter actor stopped");
}

fn snapshot_of(count: i64, a1: &Ewma, a5: &Ewma, a15: &Ewma, started: Instant) -> MeterSnapshot {
    let elapsed = started.elapsed().as_secs_f64();
    MeterSnapshot {
        count,
        rate1: a1.rate(),
        rate5: a5.rate(),
        rate15: a15.rate(),
        rate_mean: if elapsed > 0.0 {
            count as f64 / elapsed
        } else {
            0.0
        },
    }
}

// ─── Tests ───────────────────────────────────────────────────────
