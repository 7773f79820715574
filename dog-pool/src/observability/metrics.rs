use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Live counters for one pool
#[derive(Debug, Default)]
pub struct PoolMetrics {
    jobs_submitted: AtomicU64,
    jobs_started: AtomicU64,
    jobs_fulfilled: AtomicU64,
    jobs_rejected: AtomicU64,
}

impl PoolMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn increment_jobs_submitted(&self) {
        self.jobs_submitted.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_jobs_started(&self) {
        self.jobs_started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_jobs_fulfilled(&self) {
        self.jobs_fulfilled.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_jobs_rejected(&self) {
        self.jobs_rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn jobs_submitted(&self) -> u64 {
        self.jobs_submitted.load(Ordering::Relaxed)
    }

    pub fn jobs_started(&self) -> u64 {
        self.jobs_started.load(Ordering::Relaxed)
    }

    pub fn jobs_fulfilled(&self) -> u64 {
        self.jobs_fulfilled.load(Ordering::Relaxed)
    }

    pub fn jobs_rejected(&self) -> u64 {
        self.jobs_rejected.load(Ordering::Relaxed)
    }

    /// Point-in-time view combined with the engine's gauges
    pub fn snapshot(&self, queued: usize, active: usize) -> MetricsSnapshot {
        MetricsSnapshot {
            submitted: self.jobs_submitted(),
            started: self.jobs_started(),
            fulfilled: self.jobs_fulfilled(),
            rejected: self.jobs_rejected(),
            queued,
            active,
        }
    }
}

/// Serializable metrics view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MetricsSnapshot {
    pub submitted: u64,
    pub started: u64,
    pub fulfilled: u64,
    pub rejected: u64,
    pub queued: usize,
    pub active: usize,
}

impl MetricsSnapshot {
    /// Jobs that produced an outcome
    pub fn completed(&self) -> u64 {
        self.fulfilled + self.rejected
    }

    /// Fraction of completed jobs that were fulfilled
    pub fn success_rate(&self) -> f64 {
        match self.completed() {
            0 => 1.0,
            total => self.fulfilled as f64 / total as f64,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counters() {
        let metrics = PoolMetrics::new();
        metrics.increment_jobs_submitted();
        metrics.increment_jobs_submitted();
        metrics.increment_jobs_started();
        metrics.increment_jobs_fulfilled();

        let snapshot = metrics.snapshot(1, 0);
        assert_eq!(snapshot.submitted, 2);
        assert_eq!(snapshot.started, 1);
        assert_eq!(snapshot.completed(), 1);
        assert_eq!(snapshot.queued, 1);
        assert_eq!(snapshot.success_rate(), 1.0);
    }

    #[test]
    fn test_success_rate_with_failures() {
        let metrics = PoolMetrics::new();
        metrics.increment_jobs_fulfilled();
        metrics.increment_jobs_rejected();
        assert_eq!(metrics.snapshot(0, 0).success_rate(), 0.5);
    }
}
