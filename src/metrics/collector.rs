//! Metrics collection and registry.

use crate::session::ScanStats;
use prometheus::{Encoder, IntCounter, IntGauge, Registry, TextEncoder};
use thiserror::Error;

/// Errors that can occur during metrics operations.
#[derive(Debug, Error)]
pub enum MetricsError {
    /// Registering or encoding a metric failed.
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),
}

/// A snapshot of scan state for metrics update.
#[derive(Debug, Clone, Default)]
pub struct MetricsSnapshot {
    /// Whether a camera session is currently bound.
    pub camera_bound: bool,
    /// Frames delivered to the analyzer.
    pub frames_delivered: u64,
    /// Frames dropped because the analyzer was busy.
    pub frames_dropped: u64,
    /// Frames submitted to the decoder.
    pub frames_analyzed: u64,
    /// Frames skipped for lack of an image.
    pub frames_skipped: u64,
    /// Decoder failures.
    pub decode_failures: u64,
    /// Successful camera binds.
    pub camera_binds: u64,
    /// Failed camera binds.
    pub bind_failures: u64,
    /// Results reported (0 or 1 per screen).
    pub results_reported: u64,
}

/// Prometheus metrics registry for scan monitoring.
pub struct MetricsRegistry {
    registry: Registry,

    camera_bound: IntGauge,

    // Frame flow
    frames_delivered: IntCounter,
    frames_dropped: IntCounter,
    frames_analyzed: IntCounter,
    frames_skipped: IntCounter,
    decode_failures: IntCounter,

    // Session lifecycle
    camera_binds: IntCounter,
    bind_failures: IntCounter,
    results_reported: IntCounter,
}

impl MetricsRegistry {
    /// Creates a registry with every scan metric registered.
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let camera_bound = IntGauge::new(
            "qr_scan_camera_bound",
            "Whether a camera session is bound (1=bound, 0=unbound)",
        )?;
        let frames_delivered = IntCounter::new(
            "qr_scan_frames_delivered_total",
            "Frames delivered to the analyzer",
        )?;
        let frames_dropped = IntCounter::new(
            "qr_scan_frames_dropped_total",
            "Frames dropped while the analyzer was busy",
        )?;
        let frames_analyzed = IntCounter::new(
            "qr_scan_frames_analyzed_total",
            "Frames submitted to the decoder",
        )?;
        let frames_skipped = IntCounter::new(
            "qr_scan_frames_skipped_total",
            "Frames skipped because no image was available",
        )?;
        let decode_failures = IntCounter::new(
            "qr_scan_decode_failures_total",
            "Frames the decoder failed on",
        )?;
        let camera_binds =
            IntCounter::new("qr_scan_camera_binds_total", "Camera sessions bound")?;
        let bind_failures = IntCounter::new(
            "qr_scan_camera_bind_failures_total",
            "Camera binding attempts that failed",
        )?;
        let results_reported =
            IntCounter::new("qr_scan_results_reported_total", "Scan results reported")?;

        registry.register(Box::new(camera_bound.clone()))?;
        registry.register(Box::new(frames_delivered.clone()))?;
        registry.register(Box::new(frames_dropped.clone()))?;
        registry.register(Box::new(frames_analyzed.clone()))?;
        registry.register(Box::new(frames_skipped.clone()))?;
        registry.register(Box::new(decode_failures.clone()))?;
        registry.register(Box::new(camera_binds.clone()))?;
        registry.register(Box::new(bind_failures.clone()))?;
        registry.register(Box::new(results_reported.clone()))?;

        Ok(Self {
            registry,
            camera_bound,
            frames_delivered,
            frames_dropped,
            frames_analyzed,
            frames_skipped,
            decode_failures,
            camera_binds,
            bind_failures,
            results_reported,
        })
    }

    /// Updates all metrics from a snapshot of scan state.
    pub fn update(&self, snapshot: &MetricsSnapshot) {
        self.camera_bound
            .set(if snapshot.camera_bound { 1 } else { 0 });

        // Counters only move forward by the difference
        advance(&self.frames_delivered, snapshot.frames_delivered);
        advance(&self.frames_dropped, snapshot.frames_dropped);
        advance(&self.frames_analyzed, snapshot.frames_analyzed);
        advance(&self.frames_skipped, snapshot.frames_skipped);
        advance(&self.decode_failures, snapshot.decode_failures);
        advance(&self.camera_binds, snapshot.camera_binds);
        advance(&self.bind_failures, snapshot.bind_failures);
        advance(&self.results_reported, snapshot.results_reported);
    }

    /// Returns the underlying Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encodes all metrics in Prometheus text format.
    pub fn encode(&self) -> Result<String, MetricsError> {
        let encoder = TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8_lossy(&buffer).into_owned())
    }
}

fn advance(counter: &IntCounter, total: u64) {
    let current = counter.get();
    if total > current {
        counter.inc_by(total - current);
    }
}

impl MetricsSnapshot {
    /// Creates a snapshot from a screen's counters.
    pub fn from_stats(stats: &ScanStats) -> Self {
        Self {
            camera_bound: stats.is_bound(),
            frames_delivered: stats.frames_delivered(),
            frames_dropped: stats.frames_dropped(),
            frames_analyzed: stats.frames_analyzed(),
            frames_skipped: stats.frames_skipped(),
            decode_failures: stats.decode_failures(),
            camera_binds: stats.camera_binds(),
            bind_failures: stats.bind_failures(),
            results_reported: stats.results_reported(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_creation() {
        let registry = MetricsRegistry::new();
        assert!(registry.is_ok());
    }

    #[test]
    fn test_metrics_update() {
        let registry = MetricsRegistry::new().unwrap();

        let snapshot = MetricsSnapshot {
            camera_bound: true,
            frames_delivered: 12,
            frames_dropped: 3,
            frames_analyzed: 11,
            frames_skipped: 1,
            decode_failures: 2,
            camera_binds: 1,
            bind_failures: 0,
            results_reported: 1,
        };

        registry.update(&snapshot);
        // A stale snapshot must not move counters backwards
        registry.update(&MetricsSnapshot::default());

        let output = registry.encode().unwrap();
        assert!(output.contains("qr_scan_camera_bound 0"));
        assert!(output.contains("qr_scan_frames_delivered_total 12"));
        assert!(output.contains("qr_scan_decode_failures_total 2"));
        assert!(output.contains("qr_scan_results_reported_total 1"));
    }

    #[test]
    fn test_snapshot_from_stats() {
        let stats = ScanStats::default();
        stats.record_bind();
        stats.set_bound(true);
        stats.record_analyzed();

        let snapshot = MetricsSnapshot::from_stats(&stats);
        assert!(snapshot.camera_bound);
        assert_eq!(snapshot.camera_binds, 1);
        assert_eq!(snapshot.frames_analyzed, 1);
        assert_eq!(snapshot.results_reported, 0);
    }
}
