//! Metrics collection for report processing

/// Counters collected while processing reports
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct LifecycleMetrics {
    /// Reports that reached `completed`
    pub completed: usize,

    /// Reports that reached `failed`
    pub failed: usize,

    /// Deliveries ignored because the report was not pending
    pub skipped: usize,

    /// Explicit operator retries
    pub retried: usize,

    /// Wall-clock time spent processing reports (milliseconds)
    pub total_processing_ms: u64,
}

impl LifecycleMetrics {
    /// Create new empty metrics
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a completed report
    pub fn record_completed(&mut self, elapsed_ms: u64) {
        self.completed += 1;
        self.total_processing_ms += elapsed_ms;
    }

    /// Record a failed report
    pub fn record_failed(&mut self, elapsed_ms: u64) {
        self.failed += 1;
        self.total_processing_ms += elapsed_ms;
    }

    /// Record an ignored delivery
    pub fn record_skipped(&mut self) {
        self.skipped += 1;
    }

    /// Record an operator retry
    pub fn record_retry(&mut self) {
        self.retried += 1;
    }

    /// Reports that reached a terminal state
    pub fn processed(&self) -> usize {
        self.completed + self.failed
    }

    /// Mean processing time per processed report (milliseconds)
    pub fn average_processing_ms(&self) -> u64 {
        match self.processed() {
            0 => 0,
            n => self.total_processing_ms / n as u64,
        }
    }

    /// Reset all metrics
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Generate a summary report of metrics
    pub fn summary(&self) -> String {
        [
            "Processing Metrics Summary".to_string(),
            "==========================".to_string(),
            format!("Completed: {}", self.completed),
            format!("Failed: {}", self.failed),
            format!("Skipped deliveries: {}", self.skipped),
            format!("Retries: {}", self.retried),
            format!(
                "Processing time: {}ms total, {}ms average",
                self.total_processing_ms,
                self.average_processing_ms()
            ),
        ]
        .join("\n")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_new() {
        let metrics = LifecycleMetrics::new();
        assert_eq!(metrics.processed(), 0);
        assert_eq!(metrics.average_processing_ms(), 0);
    }

    #[test]
    fn test_record_outcomes() {
        let mut metrics = LifecycleMetrics::new();
        metrics.record_completed(100);
        metrics.record_completed(300);
        metrics.record_failed(200);
        metrics.record_skipped();
        metrics.record_retry();

        assert_eq!(metrics.processed(), 3);
        assert_eq!(metrics.total_processing_ms, 600);
        assert_eq!(metrics.average_processing_ms(), 200);
        assert_eq!(metrics.skipped, 1);
        assert_eq!(metrics.retried, 1);
    }

    #[test]
    fn test_reset() {
        let mut metrics = LifecycleMetrics::new();
        metrics.record_failed(5);
        metrics.reset();
        assert_eq!(metrics, LifecycleMetrics::default());
    }

    #[test]
    fn test_summary() {
        let mut metrics = LifecycleMetrics::new();
        metrics.record_completed(40);
        metrics.record_failed(60);

        let summary = metrics.summary();
        assert!(summary.contains("Completed: 1"));
        assert!(summary.contains("Failed: 1"));
        assert!(summary.contains("100ms total, 50ms average"));
    }
}
