use anyhow::Error;
use parking_lot::Mutex;

/// An arbitrary up/down status: a nullable error plus the function that
/// refreshes it.
///
/// [`check`](Healthcheck::check) runs the supplied function, which
/// reports back through [`healthy`](Healthcheck::healthy) or
/// [`unhealthy`](Healthcheck::unhealthy) on the same instance. Status
/// is purely observational — callers poll it, nothing here drives
/// control flow.
pub struct Healthcheck {
    status: Mutex<Option<Error>>,
    check_fn: Box<dyn Fn(&Healthcheck) + Send + Sync>,
}

impl Healthcheck {
    /// Healthcheck refreshed by the given function.
    pub fn new(f: impl Fn(&Healthcheck) + Send + Sync + 'static) -> Self {
        Self {
            status: Mutex::new(None),
            check_fn: Box::new(f),
        }
    }

    /// Refresh the status by running the check function.
    pub fn check(&self) {
        (self.check_fn)(self);
    }

    /// Rendered text of the last recorded failure, `None` when healthy.
    pub fn error(&self) -> Option<String> {
        self.status.lock().as_ref().map(|e| e.to_string())
    }

    /// True when no failure is currently recorded.
    pub fn is_healthy(&self) -> bool {
        self.status.lock().is_none()
    }

    /// Mark the check healthy.
    pub fn healthy(&self) {
        *self.status.lock() = None;
    }

    /// Mark the check unhealthy. The error should say why.
    pub fn unhealthy(&self, err: impl Into<Error>) {
        *self.status.lock() = Some(err.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::anyhow;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::sync::Arc;

    #[test]
    fn check_runs_the_supplied_function() {
        let up = Arc::new(AtomicBool::new(true));
        let up_in_check = up.clone();
        let hc = Healthcheck::new(move |h| {
            if up_in_check.load(Ordering::Relaxed) {
                h.healthy();
            } else {
                h.unhealthy(anyhow!("backend down"));
            }
        });

        assert!(hc.is_healthy());
        hc.check();
        assert!(hc.is_healthy());
        assert_eq!(hc.error(), None);

        up.store(false, Ordering::Relaxed);
        hc.check();
        assert!(!hc.is_healthy());
        assert_eq!(hc.error().as_deref(), Some("backend down"));

        up.store(true, Ordering::Relaxed);
        hc.check();
        assert!(hc.is_healthy());
    }
}
