//! Rolling per-backend statistics
//!
//! Execution samples live in a fixed-capacity window; health probes only keep
//! the latest result and a consecutive-failure counter.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

#[derive(Debug, Clone, Copy)]
struct ExecutionSample {
    success: bool,
    latency_ms: u64,
}

/// Fixed-capacity window of recent executions
#[derive(Debug, Clone)]
pub(crate) struct PerformanceWindow {
    capacity: usize,
    samples: VecDeque<ExecutionSample>,
    total_requests: u64,
}

impl PerformanceWindow {
    pub(crate) fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            capacity,
            samples: VecDeque::with_capacity(capacity),
            total_requests: 0,
        }
    }

    pub(crate) fn record(&mut self, success: bool, latency_ms: u64) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(ExecutionSample {
            success,
            latency_ms,
        });
        self.total_requests += 1;
    }

    pub(crate) fn snapshot(&self) -> PerformanceStats {
        let count = self.samples.len();
        if count == 0 {
            return PerformanceStats {
                total_requests: self.total_requests,
                ..PerformanceStats::default()
            };
        }

        let successes = self.samples.iter().filter(|s| s.success).count();
        let latency_sum: u64 = self.samples.iter().map(|s| s.latency_ms).sum();

        PerformanceStats {
            success_rate: Some(successes as f64 / count as f64),
            avg_latency_ms: Some(latency_sum as f64 / count as f64),
            window_requests: count,
            total_requests: self.total_requests,
        }
    }
}

/// Point-in-time view of a backend's execution performance
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct PerformanceStats {
    /// Success rate over the window (None without history)
    pub success_rate: Option<f64>,
    /// Average latency over the window
    pub avg_latency_ms: Option<f64>,
    /// Executions currently in the window
    pub window_requests: usize,
    /// Executions ever recorded
    pub total_requests: u64,
}

/// Latest health-probe state of a backend
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct HealthSnapshot {
    /// When the last probe completed
    pub last_checked: Option<DateTime<Utc>>,
    /// Result of the last probe
    pub last_healthy: Option<bool>,
    /// Probe failures since the last success
    pub consecutive_failures: u32,
    /// Message from the last failed probe
    pub last_error: Option<String>,
}

impl HealthSnapshot {
    pub(crate) fn record(&mut self, healthy: bool, at: DateTime<Utc>, error: Option<String>) {
        self.last_checked = Some(at);
        self.last_healthy = Some(healthy);
        if healthy {
            self.consecutive_failures = 0;
            self.last_error = None;
        } else {
            self.consecutive_failures = self.consecutive_failures.saturating_add(1);
            self.last_error = error;
        }
    }

    /// Whether the last probe succeeded no longer than `window` ago
    #[must_use]
    pub fn healthy_within(&self, window: chrono::Duration, now: DateTime<Utc>) -> bool {
        match (self.last_healthy, self.last_checked) {
            (Some(true), Some(at)) => now.signed_duration_since(at) <= window,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_window_has_no_rates() {
        let window = PerformanceWindow::new(10);
        let stats = window.snapshot();
        assert_eq!(stats.success_rate, None);
        assert_eq!(stats.avg_latency_ms, None);
        assert_eq!(stats.window_requests, 0);
    }

    #[test]
    fn test_window_is_bounded() {
        let mut window = PerformanceWindow::new(3);
        window.record(false, 100);
        window.record(true, 10);
        window.record(true, 20);
        window.record(true, 30);

        let stats = window.snapshot();
        assert_eq!(stats.window_requests, 3);
        assert_eq!(stats.total_requests, 4);
        assert_eq!(stats.success_rate, Some(1.0));
        assert_eq!(stats.avg_latency_ms, Some(20.0));
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let mut window = PerformanceWindow::new(0);
        window.record(true, 1);
        window.record(false, 1);
        assert_eq!(window.snapshot().success_rate, Some(0.0));
    }

    #[test]
    fn test_health_snapshot_counts_failures() {
        let now = Utc::now();
        let mut health = HealthSnapshot::default();
        health.record(false, now, Some("down".to_string()));
        health.record(false, now, Some("still down".to_string()));
        assert_eq!(health.consecutive_failures, 2);
        assert_eq!(health.last_error.as_deref(), Some("still down"));
        assert!(!health.healthy_within(chrono::Duration::seconds(60), now));

        health.record(true, now, None);
        assert_eq!(health.consecutive_failures, 0);
        assert!(health.healthy_within(chrono::Duration::seconds(60), now));
        assert!(!health.healthy_within(
            chrono::Duration::seconds(60),
            now + chrono::Duration::seconds(61)
        ));
    }
}
