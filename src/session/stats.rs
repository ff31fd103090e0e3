//! Counters shared by the capture thread, the analysis worker and the UI loop.

use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Running totals for one screen instance.
#[derive(Debug, Default)]
pub struct ScanStats {
    frames_delivered: AtomicU64,
    frames_dropped: AtomicU64,
    frames_analyzed: AtomicU64,
    frames_skipped: AtomicU64,
    decode_failures: AtomicU64,
    camera_binds: AtomicU64,
    bind_failures: AtomicU64,
    results_reported: AtomicU64,
    bound: AtomicBool,
}

macro_rules! counter {
    ($record:ident, $read:ident, $what:literal) => {
        #[doc = concat!("Counts one more ", $what, ".")]
        pub fn $record(&self) {
            self.$read.fetch_add(1, Ordering::Relaxed);
        }

        #[doc = concat!("Total ", $what, " so far.")]
        pub fn $read(&self) -> u64 {
            self.$read.load(Ordering::Relaxed)
        }
    };
}

impl ScanStats {
    counter!(record_delivered, frames_delivered, "frames delivered to the analyzer");
    counter!(record_dropped, frames_dropped, "frames dropped while the analyzer was busy");
    counter!(record_analyzed, frames_analyzed, "frames submitted to the decoder");
    counter!(record_skipped, frames_skipped, "frames skipped for lack of an image");
    counter!(record_decode_failure, decode_failures, "decoder failures");
    counter!(record_bind, camera_binds, "successful camera binds");
    counter!(record_bind_failure, bind_failures, "failed camera binds");
    counter!(record_result, results_reported, "results accepted by the screen");

    /// Records whether the camera session is bound.
    pub fn set_bound(&self, bound: bool) {
        self.bound.store(bound, Ordering::Relaxed);
    }

    /// Whether a camera session is currently bound.
    pub fn is_bound(&self) -> bool {
        self.bound.load(Ordering::Relaxed)
    }
}
