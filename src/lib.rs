//! In-process metrics instrumentation.
//!
//! Record counts, durations, and event rates cheaply from hot paths and
//! read statistically-sound summaries back out: reservoir-sampled
//! percentiles, exponentially-weighted moving-average rates, and lifetime
//! aggregates. Everything measures a single process over its own lifetime;
//! there is no transport, persistence, or cross-process aggregation here.
//!
//! The building blocks, leaves first:
//!
//! - [`Sample`] — a bounded reservoir of observed values, either uniform
//!   over the whole stream ([`UniformSample`]) or biased toward recent
//!   data ([`ExpDecaySample`]).
//! - [`Ewma`] — one moving average evaluated on fixed ticks.
//! - [`Histogram`] — distribution statistics over a sample.
//! - [`Meter`] — an event-rate actor keeping 1/5/15-minute averages.
//! - [`Timer`] — histogram + meter composed for timed operations.
//! - [`Registry`] — a name → [`Metric`] table for the six recognized
//!   kinds, including [`Counter`], [`Gauge`], and [`Healthcheck`].
//!
//! [`Meter`] (and therefore [`Timer`]) must be constructed inside a tokio
//! runtime; every other type is runtime-agnostic.

pub mod counter;
pub mod ewma;
pub mod gauge;
pub mod healthcheck;
pub mod histogram;
pub mod meter;
pub mod registry;
pub mod sample;
pub mod timer;

pub use counter::Counter;
pub use ewma::Ewma;
pub use gauge::Gauge;
pub use healthcheck::Healthcheck;
pub use histogram::{Histogram, HistogramSnapshot};
pub use meter::{Meter, MeterSnapshot};
pub use registry::{Metric, Registry, RegistryError};
pub use sample::{ExpDecaySample, Sample, UniformSample};
pub use timer::Timer;

use std::time::Duration;

/// How often the clock ticks for everything that carries a moving
/// average. A one-minute [`Ewma`] decays exactly like the classic Unix
/// one-minute load average when ticked at this interval.
pub const TICK_INTERVAL: Duration = Duration::from_secs(5);
