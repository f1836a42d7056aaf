use serde::Serialize;
use std::sync::Mutex;

pub struct MetricsRecorder {
    inner: Mutex<SyncMetrics>,
}

/// Per-surface counters.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncMetrics {
    pub full_loads: usize,
    pub polls: usize,
    pub inserted: usize,
    pub duplicates: usize,
    pub failures: usize,
    pub discarded: usize,
}

impl MetricsRecorder {
    pub fn new() -> Self {
        Self {
            inner: Mutex::new(SyncMetrics::default()),
        }
    }

    pub fn record_full_load(&self) {
        self.update(|metrics| metrics.full_loads += 1);
    }

    pub fn record_poll(&self) {
        self.update(|metrics| metrics.polls += 1);
    }

    pub fn record_inserted(&self) {
        self.update(|metrics| metrics.inserted += 1);
    }

    pub fn record_duplicate(&self) {
        self.update(|metrics| metrics.duplicates += 1);
    }

    pub fn record_failure(&self) {
        self.update(|metrics| metrics.failures += 1);
    }

    pub fn record_discarded(&self) {
        self.update(|metrics| metrics.discarded += 1);
    }

    pub fn snapshot(&self) -> SyncMetrics {
        if let Ok(metrics) = self.inner.lock() {
            *metrics
        } else {
            SyncMetrics::default()
        }
    }

    fn update(&self, apply: impl FnOnce(&mut SyncMetrics)) {
        if let Ok(mut metrics) = self.inner.lock() {
            apply(&mut metrics);
        }
    }
}

impl Default for MetricsRecorder {
    fn default() -> Self {
        Self::new()
    }
}
