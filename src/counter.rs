use std::sync::atomic::{AtomicI64, Ordering};

/// A lock-free running count. Increments and decrements from arbitrary
/// threads are never lost; reads are instantaneous.
#[derive(Debug, Default)]
pub struct Counter {
    value: AtomicI64,
}

impl Counter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Increment by `n`.
    pub fn inc(&self, n: i64) {
        self.value.fetch_add(n, Ordering::Relaxed);
    }

    /// Decrement by `n`.
    pub fn dec(&self, n: i64) {
        self.value.fetch_sub(n, Ordering::Relaxed);
    }

    /// Current count.
    pub fn count(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }

    /// Reset to zero.
    pub fn clear(&self) {
        self.value.store(0, Ordering::Relaxed);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    #[test]
    fn inc_dec_clear() {
        let c = Counter::new();
        assert_eq!(c.count(), 0);

        c.inc(5);
        c.inc(2);
        assert_eq!(c.count(), 7);

        c.dec(3);
        assert_eq!(c.count(), 4);

        c.clear();
        assert_eq!(c.count(), 0);
    }

    #[test]
    fn concurrent_increments_are_never_lost() {
        let c = Arc::new(Counter::new());
        let handles: Vec<_> = (0..8)
            .map(|_| {
                let c = c.clone();
                std::thread::spawn(move || {
                    for _ in 0..1000 {
                        c.inc(1);
                    }
                })
            })
            .collect();
        for h in handles {
            h.join().unwrap();
        }

        assert_eq!(c.count(), 8000);
    }
}
