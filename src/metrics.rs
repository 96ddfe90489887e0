// Run metrics module
//
// Lightweight counters for cleaning runs, logged on shutdown

use crate::models::CleaningSummary;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Session-wide run metrics
///
/// Uses atomic operations so the controller can record from any task without locks.
#[derive(Debug)]
pub struct Metrics {
    /// Runs that produced a result
    pub runs_completed: AtomicUsize,

    /// Runs aborted by an error
    pub runs_failed: AtomicUsize,

    /// Raw candidates handed to the pipeline
    pub candidates_extracted: AtomicUsize,

    /// Emails that survived filtering
    pub emails_kept: AtomicUsize,

    /// Candidates removed by any step
    pub emails_removed: AtomicUsize,

    /// Export files written
    pub exports_written: AtomicUsize,

    /// Total run time in milliseconds
    pub total_run_time_ms: AtomicU64,

    start_time: Instant,
}

impl Metrics {
    pub fn new() -> Self {
        Self {
            runs_completed: AtomicUsize::new(0),
            runs_failed: AtomicUsize::new(0),
            candidates_extracted: AtomicUsize::new(0),
            emails_kept: AtomicUsize::new(0),
            emails_removed: AtomicUsize::new(0),
            exports_written: AtomicUsize::new(0),
            total_run_time_ms: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a completed run and its counts
    pub fn record_run_completed(&self, summary: &CleaningSummary, duration: Duration) {
        self.runs_completed.fetch_add(1, Ordering::Relaxed);
        self.candidates_extracted
            .fetch_add(summary.original, Ordering::Relaxed);
        self.emails_kept.fetch_add(summary.kept, Ordering::Relaxed);
        self.emails_removed
            .fetch_add(summary.total_removed(), Ordering::Relaxed);
        self.record_run_time(duration);
    }

    pub fn record_run_failed(&self, duration: Duration) {
        self.runs_failed.fetch_add(1, Ordering::Relaxed);
        self.record_run_time(duration);
    }

    pub fn record_export(&self) {
        self.exports_written.fetch_add(1, Ordering::Relaxed);
    }

    fn record_run_time(&self, duration: Duration) {
        self.total_run_time_ms
            .fetch_add(duration.as_millis() as u64, Ordering::Relaxed);
    }

    pub fn uptime(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Average run time in milliseconds over completed and failed runs
    pub fn avg_run_time_ms(&self) -> f64 {
        let total = self.total_run_time_ms.load(Ordering::Relaxed);
        let count = self.runs_completed.load(Ordering::Relaxed)
            + self.runs_failed.load(Ordering::Relaxed);
        if count > 0 {
            total as f64 / count as f64
        } else {
            0.0
        }
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Run Metrics Summary ===");
        tracing::info!("Uptime: {:.2}s", self.uptime().as_secs_f64());
        tracing::info!(
            "Runs: {} completed, {} failed (avg: {:.2}ms)",
            self.runs_completed.load(Ordering::Relaxed),
            self.runs_failed.load(Ordering::Relaxed),
            self.avg_run_time_ms()
        );
        tracing::info!(
            "Emails: {} extracted, {} kept, {} removed, {} exports written",
            self.candidates_extracted.load(Ordering::Relaxed),
            self.emails_kept.load(Ordering::Relaxed),
            self.emails_removed.load(Ordering::Relaxed),
            self.exports_written.load(Ordering::Relaxed)
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}
