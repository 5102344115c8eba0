use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;
use thiserror::Error;

use crate::counter::Counter;
use crate::gauge::Gauge;
use crate::healthcheck::Healthcheck;
use crate::histogram::Histogram;
use crate::meter::Meter;
use crate::timer::Timer;

/// The closed set of metric kinds a registry accepts. Anything else is
/// unrepresentable, so kind checking happens in the type system rather
/// than at registration time.
#[derive(Clone)]
pub enum Metric {
    Counter(Arc<Counter>),
    Gauge(Arc<Gauge>),
    Healthcheck(Arc<Healthcheck>),
    Histogram(Arc<Histogram>),
    Meter(Arc<Meter>),
    Timer(Arc<Timer>),
}

impl Metric {
    /// The kind's name, for diagnostics and reporting.
    pub fn kind(&self) -> &'static str {
        match self {
            Metric::Counter(_) => "counter",
            Metric::Gauge(_) => "gauge",
            Metric::Healthcheck(_) => "healthcheck",
            Metric::Histogram(_) => "histogram",
            Metric::Meter(_) => "meter",
            Metric::Timer(_) => "timer",
        }
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// The name is taken; unregister it first.
    #[error("metric {0:?} is already registered")]
    DuplicateMetric(String),
}

/// A name → metric table, safe for concurrent registration, lookup,
/// removal, and iteration from arbitrary callers.
#[derive(Default)]
pub struct Registry {
    metrics: RwLock<HashMap<String, Metric>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `metric` under `name`. Duplicate names are rejected
    /// rather than silently replaced.
    pub fn register(
        &self,
        name: impl Into<String>,
        metric: Metric,
    ) -> Result<(), RegistryError> {
        let name = name.into();
        let mut metrics = self.metrics.write();
        if metrics.contains_key(&name) {
            return Err(RegistryError::DuplicateMetric(name));
        }
        metrics.insert(name, metric);
        Ok(())
    }

    /// Look up a metric by name.
    pub fn get(&self, name: &str) -> Option<Metric> {
        self.metrics.read().get(name).cloned()
    }

    /// Remove and return the metric registered under `name`, if any.
    pub fn unregister(&self, name: &str) -> Option<Metric> {
        self.metrics.write().remove(name)
    }

    /// Call `f` for every registered metric. Iterates a stable copy
    /// taken under the lock, so `f` may touch the registry itself.
    pub fn each(&self, mut f: impl FnMut(&str, &Metric)) {
        let snapshot: Vec<(String, Metric)> = self
            .metrics
            .read()
            .iter()
            .map(|(name, metric)| (name.clone(), metric.clone()))
            .collect();
        for (name, metric) in &snapshot {
            f(name, metric);
        }
    }

    /// Run every registered healthcheck. The checks execute after the
    /// name-table lock is released, so a check is free to register or
    /// unregister metrics without deadlocking the table.
    pub fn run_healthchecks(&self) {
        let checks: Vec<Arc<Healthcheck>> = self
            .metrics
            .read()
            .values()
            .filter_map(|metric| match metric {
                Metric::Healthcheck(check) => Some(check.clone()),
                _ => None,
            })
            .collect();
        for check in checks {
            check.check();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;

    #[test]
    fn register_get_unregister() {
        let registry = Registry::new();
        let counter = Arc::new(Counter::new());
        registry
            .register("requests", Metric::Counter(counter.clone()))
            .unwrap();

        counter.inc(3);
        match registry.get("requests") {
            Some(Metric::Counter(c)) => assert_eq!(c.count(), 3),
            _ => panic!("expected a counter under \"requests\""),
        }

        assert!(registry.unregister("requests").is_some());
        assert!(registry.get("requests").is_none());
        assert!(registry.unregister("requests").is_none());
    }

    #[test]
    fn duplicate_names_are_rejected() {
        let registry = Registry::new();
        registry
            .register("mem", Metric::Gauge(Arc::new(Gauge::new())))
            .unwrap();

        let err = registry
            .register("mem", Metric::Gauge(Arc::new(Gauge::new())))
            .unwrap_err();
        assert_eq!(err, RegistryError::DuplicateMetric("mem".into()));
    }

    #[tokio::test]
    async fn each_walks_every_kind() {
        let registry = Registry::new();
        registry
            .register("a", Metric::Counter(Arc::new(Counter::new())))
            .unwrap();
        registry
            .register("b", Metric::Meter(Arc::new(Meter::new())))
            .unwrap();
        registry
            .register("c", Metric::Timer(Arc::new(Timer::new())))
            .unwrap();

        let mut seen = Vec::new();
        registry.each(|name, metric| {
            seen.push(format!("{name}:{}", metric.kind()));
        });
        seen.sort();
        assert_eq!(seen, vec!["a:counter", "b:meter", "c:timer"]);
    }

    #[test]
    fn run_healthchecks_refreshes_every_check() {
        let registry = Registry::new();
        registry
            .register(
                "db",
                Metric::Healthcheck(Arc::new(Healthcheck::new(|h| h.healthy()))),
            )
            .unwrap();
        registry
            .register(
                "cache",
                Metric::Healthcheck(Arc::new(Healthcheck::new(|h| {
                    h.unhealthy(anyhow!("cache cold"))
                }))),
            )
            .unwrap();

        registry.run_healthchecks();

        let status = |name: &str| match registry.get(name) {
            Some(Metric::Healthcheck(h)) => h.error(),
            _ => panic!("expected a healthcheck under {name:?}"),
        };
        assert_eq!(status("db"), None);
        assert_eq!(status("cache").as_deref(), Some("cache cold"));
    }
}
