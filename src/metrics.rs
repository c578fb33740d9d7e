// Run metrics module
//
// Counts what a forwarding run did, for the summary logged at the end of a run

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

/// Forwarding run metrics
///
/// Uses atomic counters so the metrics can be recorded through a shared reference
/// from anywhere in the run without threading `&mut` through every service.
#[derive(Debug)]
pub struct Metrics {
    /// Plugins processed from the forwarding list
    pub plugins_processed: AtomicUsize,

    /// NPC overrides forwarded into the patch
    pub npcs_forwarded: AtomicUsize,

    /// Asset files copied into the output directory
    pub files_copied: AtomicUsize,

    /// Missing asset files that produced a warning
    pub files_missing: AtomicUsize,

    /// Missing asset files whose warning was suppressed
    pub warnings_suppressed: AtomicUsize,

    /// Asset paths skipped by the ignore list
    pub paths_ignored: AtomicUsize,

    /// Records duplicated into the patch while remapping dependencies
    pub records_duplicated: AtomicUsize,

    /// Run start time
    start_time: Instant,
}

impl Metrics {
    /// Create a new Metrics instance
    pub fn new() -> Self {
        Self {
            plugins_processed: AtomicUsize::new(0),
            npcs_forwarded: AtomicUsize::new(0),
            files_copied: AtomicUsize::new(0),
            files_missing: AtomicUsize::new(0),
            warnings_suppressed: AtomicUsize::new(0),
            paths_ignored: AtomicUsize::new(0),
            records_duplicated: AtomicUsize::new(0),
            start_time: Instant::now(),
        }
    }

    /// Record a processed plugin
    pub fn record_plugin_processed(&self) {
        self.plugins_processed.fetch_add(1, Ordering::Relaxed);
    }

    /// Record a forwarded NPC
    pub fn record_npc_forwarded(&self) {
        self.npcs_forwarded.fetch_add(1, Ordering::Relaxed);
    }

    /// Record the outcome of copying one NPC's assets
    pub fn record_copy(&self, copied: usize, missing: usize, suppressed: usize, ignored: usize) {
        self.files_copied.fetch_add(copied, Ordering::Relaxed);
        self.files_missing.fetch_add(missing, Ordering::Relaxed);
        self.warnings_suppressed
            .fetch_add(suppressed, Ordering::Relaxed);
        self.paths_ignored.fetch_add(ignored, Ordering::Relaxed);
    }

    /// Record records duplicated by a dependency remap
    pub fn record_duplicated(&self, count: usize) {
        self.records_duplicated.fetch_add(count, Ordering::Relaxed);
    }

    /// Time since the run started
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// Log metrics summary
    pub fn log_summary(&self) {
        tracing::info!("=== Forwarding Summary ===");
        tracing::info!("Elapsed: {:.2}s", self.elapsed().as_secs_f64());
        tracing::info!(
            "Plugins: {} processed, NPCs: {} forwarded, records duplicated: {}",
            self.plugins_processed.load(Ordering::Relaxed),
            self.npcs_forwarded.load(Ordering::Relaxed),
            self.records_duplicated.load(Ordering::Relaxed)
        );
        tracing::info!(
            "Files: {} copied, {} missing, {} missing (suppressed), {} ignored",
            self.files_copied.load(Ordering::Relaxed),
            self.files_missing.load(Ordering::Relaxed),
            self.warnings_suppressed.load(Ordering::Relaxed),
            self.paths_ignored.load(Ordering::Relaxed)
        );
    }
}

impl Default for Metrics {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_metrics_creation() {
        let metrics = Metrics::new();
        assert_eq!(metrics.npcs_forwarded.load(Ordering::Relaxed), 0);
        assert_eq!(metrics.files_copied.load(Ordering::Relaxed), 0);
    }

    #[test]
    fn test_record_forwarding_operations() {
        let metrics = Metrics::new();

        metrics.record_plugin_processed();
        metrics.record_npc_forwarded();
        metrics.record_npc_forwarded();
        metrics.record_duplicated(3);

        assert_eq!(metrics.plugins_processed.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.npcs_forwarded.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.records_duplicated.load(Ordering::Relaxed), 3);
    }

    #[test]
    fn test_record_copy_accumulates() {
        let metrics = Metrics::new();

        metrics.record_copy(2, 1, 0, 1);
        metrics.record_copy(3, 0, 2, 0);

        assert_eq!(metrics.files_copied.load(Ordering::Relaxed), 5);
        assert_eq!(metrics.files_missing.load(Ordering::Relaxed), 1);
        assert_eq!(metrics.warnings_suppressed.load(Ordering::Relaxed), 2);
        assert_eq!(metrics.paths_ignored.load(Ordering::Relaxed), 1);
    }
}
