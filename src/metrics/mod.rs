//! Prometheus metrics exporter for scan monitoring.
//!
//! # Metrics Exposed
//!
//! - `qr_scan_camera_bound` - Whether a camera session is bound (1/0)
//! - `qr_scan_frames_delivered_total` - Frames delivered to the analyzer
//! - `qr_scan_frames_dropped_total` - Frames dropped while the analyzer was busy
//! - `qr_scan_frames_analyzed_total` - Frames submitted to the decoder
//! - `qr_scan_frames_skipped_total` - Frames without an image
//! - `qr_scan_decode_failures_total` - Decoder failures
//! - `qr_scan_camera_binds_total` - Camera sessions bound
//! - `qr_scan_camera_bind_failures_total` - Failed binding attempts
//! - `qr_scan_results_reported_total` - Results reported
//!
//! # Example
//!
//! ```no_run
//! use qr_scan::metrics::{MetricsRegistry, MetricsSnapshot};
//! use qr_scan::session::ScanStats;
//!
//! let registry = MetricsRegistry::new().expect("Failed to create registry");
//! let stats = ScanStats::default();
//!
//! registry.update(&MetricsSnapshot::from_stats(&stats));
//! ```

mod collector;
#[cfg(feature = "metrics")]
mod server;

pub use collector::{MetricsError, MetricsRegistry, MetricsSnapshot};
#[cfg(feature = "metrics")]
pub use server::{MetricsServer, MetricsServerConfig, ServerError};
