use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

/// Whole seconds since the session started. Clones share the counter.
#[derive(Debug, Clone, Default)]
pub struct SessionClock {
    elapsed: Arc<AtomicU64>,
}

impl SessionClock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Advance by one second and return the new count.
    pub fn tick(&self) -> u64 {
        self.elapsed.fetch_add(1, Ordering::Relaxed).wrapping_add(1)
    }

    pub fn elapsed_secs(&self) -> u64 {
        self.elapsed.load(Ordering::Relaxed)
    }
}
