use std::sync::atomic::{AtomicI64, Ordering};

/// An instantaneous value: the last thing anyone wrote wins.
#[derive(Debug, Default)]
pub struct Gauge {
    value: AtomicI64,
}

impl Gauge {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overwrite the held value.
    pub fn update(&self, value: i64) {
        self.value.store(value, Ordering::Relaxed);
    }

    /// Most recently written value, 0 before the first write.
    pub fn value(&self) -> i64 {
        self.value.load(Ordering::Relaxed)
    }
}
