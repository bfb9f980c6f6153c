//! Counters and structured logging for the fusion runtime.

use std::sync::atomic::{AtomicU64, Ordering};

/// Lifetime counters for one runtime.
#[derive(Debug, Default)]
pub struct FusionMetrics {
    started: AtomicU64,
    rejected: AtomicU64,
    completed: AtomicU64,
    aborted: AtomicU64,
}

/// Plain copy of the counters for reporting.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, serde::Serialize)]
pub struct MetricsSnapshot {
    pub started: u64,
    pub rejected: u64,
    pub completed: u64,
    pub aborted: u64,
}

impl FusionMetrics {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_started(&self) {
        self.started.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_rejected(&self) {
        self.rejected.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_completed(&self) {
        self.completed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_aborted(&self) {
        self.aborted.fetch_add(1, Ordering::Relaxed);
    }

    #[must_use]
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            started: self.started.load(Ordering::Relaxed),
            rejected: self.rejected.load(Ordering::Relaxed),
            completed: self.completed.load(Ordering::Relaxed),
            aborted: self.aborted.load(Ordering::Relaxed),
        }
    }
}

/// Initialize tracing subscriber for logging.
///
/// Honours `RUST_LOG`; falls back to `default_level` otherwise.
pub fn init_logging(default_level: &str) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level));
    tracing::subscriber::set_global_default(
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .finish(),
    )
    .ok();
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = FusionMetrics::new();
        assert_eq!(metrics.snapshot(), MetricsSnapshot::default());
    }

    #[test]
    fn test_counters_accumulate() {
        let metrics = FusionMetrics::new();
        metrics.record_started();
        metrics.record_started();
        metrics.record_aborted();
        let snap = metrics.snapshot();
        assert_eq!(snap.started, 2);
        assert_eq!(snap.aborted, 1);
        assert_eq!(snap.completed, 0);
    }
}
