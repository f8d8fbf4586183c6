//! Run counters in Prometheus text exposition format.

use std::fmt::Write;
use std::sync::atomic::{AtomicU64, Ordering};

/// Counters updated by the pipeline as runs start and finish.
#[derive(Debug, Default)]
pub struct RunMetrics {
    started: AtomicU64,
    succeeded: AtomicU64,
    failed: AtomicU64,
    cancelled: AtomicU64,
    active: AtomicU64,
}

/// One active run, see [`RunMetrics::start_run`].
#[derive(Debug)]
pub struct ActiveRun<'a> {
    metrics: &'a RunMetrics,
    recorded: bool,
}

impl ActiveRun<'_> {
    pub fn succeeded(mut self) {
        self.metrics.succeeded.fetch_add(1, Ordering::Relaxed);
        self.recorded = true;
    }

    pub fn failed(mut self) {
        self.metrics.failed.fetch_add(1, Ordering::Relaxed);
        self.recorded = true;
    }

    pub fn cancelled(self) {}
}

impl Drop for ActiveRun<'_> {
    fn drop(&mut self) {
        if !self.recorded {
            self.metrics.cancelled.fetch_add(1, Ordering::Relaxed);
        }
        self.metrics.active.fetch_sub(1, Ordering::Relaxed);
    }
}

/// Point-in-time copy of [`RunMetrics`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MetricsSnapshot {
    pub started: u64,
    pub succeeded: u64,
    pub failed: u64,
    pub cancelled: u64,
    pub active: u64,
}

impl RunMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    /// Count a new run as started and active.
    ///
    /// The run stays active until the returned guard is dropped. A guard
    /// dropped without an outcome counts as cancelled, so a run whose future
    /// is abandoned mid-await still leaves the gauge.
    pub fn start_run(&self) -> ActiveRun<'_> {
        self.started.fetch_add(1, Ordering::Relaxed);
        self.active.fetch_add(1, Ordering::Relaxed);
        ActiveRun {
            metrics: self,
            recorded: false,
        }
    }

    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            started: self.started.load(Ordering::Relaxed),
            succeeded: self.succeeded.load(Ordering::Relaxed),
            failed: self.failed.load(Ordering::Relaxed),
            cancelled: self.cancelled.load(Ordering::Relaxed),
            active: self.active.load(Ordering::Relaxed),
        }
    }

    /// Format all counters as Prometheus text.
    pub fn render(&self) -> String {
        let snap = self.snapshot();
        let mut output = String::new();

        writeln!(
            output,
            "# HELP riskwatch_runs_total Finished risk check runs by outcome"
        )
        .ok();
        writeln!(output, "# TYPE riskwatch_runs_total counter").ok();
        writeln!(
            output,
            "riskwatch_runs_total{{outcome=\"succeeded\"}} {}",
            snap.succeeded
        )
        .ok();
        writeln!(
            output,
            "riskwatch_runs_total{{outcome=\"failed\"}} {}",
            snap.failed
        )
        .ok();
        writeln!(
            output,
            "riskwatch_runs_total{{outcome=\"cancelled\"}} {}",
            snap.cancelled
        )
        .ok();

        writeln!(output).ok();
        writeln!(
            output,
            "# HELP riskwatch_runs_started_total Risk check runs started"
        )
        .ok();
        writeln!(output, "# TYPE riskwatch_runs_started_total counter").ok();
        writeln!(output, "riskwatch_runs_started_total {}", snap.started).ok();

        writeln!(output).ok();
        writeln!(
            output,
            "# HELP riskwatch_runs_active Risk check runs currently streaming"
        )
        .ok();
        writeln!(output, "# TYPE riskwatch_runs_active gauge").ok();
        writeln!(output, "riskwatch_runs_active {}", snap.active).ok();

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_render_empty() {
        let metrics = RunMetrics::new();
        let output = metrics.render();

        assert!(output.contains("riskwatch_runs_total{outcome=\"succeeded\"} 0"));
        assert!(output.contains("riskwatch_runs_active 0"));
    }

    #[test]
    fn test_counters_track_outcomes() {
        let metrics = RunMetrics::new();
        let first = metrics.start_run();
        let second = metrics.start_run();
        let _third = metrics.start_run();
        first.succeeded();
        second.failed();

        let snap = metrics.snapshot();
        assert_eq!(snap.started, 3);
        assert_eq!(snap.succeeded, 1);
        assert_eq!(snap.failed, 1);
        assert_eq!(snap.active, 1);
        assert!(metrics
            .render()
            .contains("riskwatch_runs_total{outcome=\"failed\"} 1"));
    }

    #[test]
    fn test_dropped_run_counts_as_cancelled() {
        let metrics = RunMetrics::new();
        {
            let _run = metrics.start_run();
            assert_eq!(metrics.snapshot().active, 1);
        }

        let snap = metrics.snapshot();
        assert_eq!(snap.cancelled, 1);
        assert_eq!(snap.active, 0);
    }
}
