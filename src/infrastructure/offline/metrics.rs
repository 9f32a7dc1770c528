use crate::domain::entities::offline::DrainReport;
use serde::Serialize;
use std::sync::Mutex;
use std::sync::atomic::{AtomicU64, Ordering};

#[derive(Debug, Clone, Serialize, PartialEq, Eq, Default)]
#[serde(rename_all = "camelCase")]
pub struct ReplayMetricsSnapshot {
    pub cycles: u64,
    pub skipped_cycles: u64,
    pub total_synced: u64,
    pub total_failed: u64,
    pub total_deferred: u64,
    pub total_permanent_failures: u64,
    pub consecutive_failed_cycles: u64,
    pub last_trigger: Option<String>,
    pub last_duration_ms: Option<u64>,
    pub last_remaining: Option<u32>,
    pub last_finished_ms: Option<i64>,
}

#[derive(Default, Clone)]
struct LastCycle {
    trigger: Option<String>,
    duration_ms: Option<u64>,
    remaining: Option<u32>,
    finished_ms: Option<i64>,
}

/// Counters for drain cycles run by one replay engine.
#[derive(Default)]
pub struct ReplayMetrics {
    cycles: AtomicU64,
    skipped_cycles: AtomicU64,
    synced: AtomicU64,
    failed: AtomicU64,
    deferred: AtomicU64,
    permanent_failures: AtomicU64,
    consecutive_failed_cycles: AtomicU64,
    last: Mutex<LastCycle>,
}

impl ReplayMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn record_cycle(&self, report: &DrainReport) {
        self.cycles.fetch_add(1, Ordering::Relaxed);
        self.synced
            .fetch_add(u64::from(report.synced), Ordering::Relaxed);
        self.failed
            .fetch_add(u64::from(report.failed), Ordering::Relaxed);
        self.deferred
            .fetch_add(u64::from(report.deferred), Ordering::Relaxed);
        self.permanent_failures
            .fetch_add(report.permanently_failed.len() as u64, Ordering::Relaxed);

        // A cycle counts as failed when it delivered nothing but hit errors.
        if report.failed > 0 && report.synced == 0 {
            self.consecutive_failed_cycles
                .fetch_add(1, Ordering::Relaxed);
        } else if report.synced > 0 {
            self.consecutive_failed_cycles.store(0, Ordering::Relaxed);
        }

        if let Ok(mut guard) = self.last.lock() {
            let duration = report.finished_at - report.started_at;
            guard.trigger = Some(report.trigger.to_string());
            guard.duration_ms = u64::try_from(duration.num_milliseconds()).ok();
            guard.remaining = Some(report.remaining);
            guard.finished_ms = Some(report.finished_at.timestamp_millis());
        }
    }

    /// A request dropped by the single-flight guard.
    pub fn record_skipped(&self) {
        self.skipped_cycles.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> ReplayMetricsSnapshot {
        let last = self
            .last
            .lock()
            .map(|guard| guard.clone())
            .unwrap_or_default();

        ReplayMetricsSnapshot {
            cycles: self.cycles.load(Ordering::Relaxed),
            skipped_cycles: self.skipped_cycles.load(Ordering::Relaxed),
            total_synced: self.synced.load(Ordering::Relaxed),
            total_failed: self.failed.load(Ordering::Relaxed),
            total_deferred: self.deferred.load(Ordering::Relaxed),
            total_permanent_failures: self.permanent_failures.load(Ordering::Relaxed),
            consecutive_failed_cycles: self.consecutive_failed_cycles.load(Ordering::Relaxed),
            last_trigger: last.trigger,
            last_duration_ms: last.duration_ms,
            last_remaining: last.remaining,
            last_finished_ms: last.finished_ms,
        }
    }
}
