//! Camera session binding.
//!
//! A bound session is one capture thread that owns the camera, pushes
//! every shot to the preview and offers shots to the analysis queue.
//! Starting a session always tears the previous one down first.

use super::{Preview, ScanStats};
use crate::capture::{
    Camera, CameraError, CaptureConfig, CapturedFrame, LensFacing, ReleaseTracker,
};
use crossbeam_channel::{Sender, TrySendError};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

/// Live binding: the capture thread hands the camera back when it stops.
struct Binding {
    stop: Arc<AtomicBool>,
    handle: JoinHandle<Box<dyn Camera>>,
}

/// Everything the capture thread needs besides the camera.
struct CaptureLoop {
    stop: Arc<AtomicBool>,
    analysis: Sender<CapturedFrame>,
    preview: Arc<Mutex<Box<dyn Preview>>>,
    tracker: Arc<ReleaseTracker>,
    stats: Arc<ScanStats>,
    frame_interval: Duration,
    max_in_flight: u64,
}

impl CaptureLoop {
    fn run(self, mut camera: Box<dyn Camera>) -> Box<dyn Camera> {
        let mut sequence = 0u64;

        while !self.stop.load(Ordering::Acquire) {
            let started = Instant::now();

            match camera.capture() {
                Ok(shot) => {
                    sequence += 1;
                    if let Some(image) = &shot.image {
                        if let Ok(mut preview) = self.preview.lock() {
                            preview.present(image);
                        }
                    }

                    // Hold back until the analyzer releases what it has.
                    if self.tracker.in_flight() >= self.max_in_flight {
                        self.stats.record_dropped();
                        tracing::trace!(sequence, "Analyzer busy, frame dropped");
                    } else {
                        let frame = CapturedFrame::deliver(
                            shot.image,
                            shot.rotation,
                            sequence,
                            Arc::clone(&self.tracker),
                        );
                        match self.analysis.try_send(frame) {
                            Ok(()) => self.stats.record_delivered(),
                            Err(TrySendError::Full(_)) => self.stats.record_dropped(),
                            Err(TrySendError::Disconnected(_)) => {
                                tracing::debug!("Analysis queue closed, stopping capture");
                                break;
                            }
                        }
                    }
                }
                Err(e) => {
                    tracing::warn!(error = %e, "Frame capture failed");
                }
            }

            if let Some(rest) = self.frame_interval.checked_sub(started.elapsed()) {
                thread::sleep(rest);
            }
        }

        camera
    }
}

/// Binds the camera to the screen's lifetime.
pub struct CameraSessionManager {
    camera: Option<Box<dyn Camera>>,
    config: CaptureConfig,
    queue_depth: usize,
    analysis: Option<Sender<CapturedFrame>>,
    preview: Arc<Mutex<Box<dyn Preview>>>,
    tracker: Arc<ReleaseTracker>,
    stats: Arc<ScanStats>,
    binding: Option<Binding>,
}

impl CameraSessionManager {
    /// Creates an unbound session. Frames go to `analysis` when it is set.
    pub fn new(
        camera: Box<dyn Camera>,
        config: CaptureConfig,
        queue_depth: usize,
        analysis: Option<Sender<CapturedFrame>>,
        preview: Box<dyn Preview>,
        stats: Arc<ScanStats>,
    ) -> Self {
        Self {
            camera: Some(camera),
            config,
            queue_depth: queue_depth.max(1),
            analysis,
            preview: Arc::new(Mutex::new(preview)),
            tracker: ReleaseTracker::new(),
            stats,
            binding: None,
        }
    }

    /// Unbinds any live session, then binds a fresh one.
    ///
    /// A binding failure is logged and leaves the screen without a
    /// preview; it is not retried.
    pub fn start_camera(&mut self) {
        self.unbind();

        if let Err(reason) = self.bind() {
            self.stats.record_bind_failure();
            tracing::error!(error = %reason, "Use case binding failed");
        }
    }

    fn bind(&mut self) -> Result<(), CameraError> {
        let analysis = self.analysis.clone().ok_or(CameraError::NotInitialized)?;
        let mut camera = self
            .camera
            .take()
            .ok_or_else(|| CameraError::DeviceNotFound("camera provider unavailable".into()))?;

        if self.config.lens != LensFacing::Back {
            tracing::info!(lens = ?self.config.lens, "Binding non-default lens");
        }
        if let Err(e) = camera.open(&self.config) {
            self.camera = Some(camera);
            return Err(e);
        }

        let stop = Arc::new(AtomicBool::new(false));
        let capture = CaptureLoop {
            stop: Arc::clone(&stop),
            analysis,
            preview: Arc::clone(&self.preview),
            tracker: Arc::clone(&self.tracker),
            stats: Arc::clone(&self.stats),
            frame_interval: Duration::from_secs(1) / self.config.fps.max(1),
            max_in_flight: self.queue_depth as u64,
        };

        // The camera moves into the closure; if the spawn fails it is gone
        // with it, so later binds report the provider as unavailable.
        let handle = thread::Builder::new()
            .name("camera-capture".into())
            .spawn(move || capture.run(camera))
            .map_err(|e| CameraError::OpenFailed(e.to_string()))?;

        self.binding = Some(Binding { stop, handle });
        self.stats.record_bind();
        self.stats.set_bound(true);
        tracing::info!(
            device = self.config.device_id,
            width = self.config.width,
            height = self.config.height,
            "Camera session bound"
        );
        Ok(())
    }

    /// Stops the capture thread and closes the camera. No-op when unbound.
    pub fn unbind(&mut self) {
        let Some(binding) = self.binding.take() else {
            return;
        };
        binding.stop.store(true, Ordering::Release);
        self.stats.set_bound(false);
        match binding.handle.join() {
            Ok(mut camera) => {
                camera.close();
                self.camera = Some(camera);
                tracing::info!("Camera session unbound");
            }
            Err(_) => tracing::error!("Capture thread panicked; camera lost"),
        }
    }

    /// Drops the analysis queue so the worker can drain.
    pub(crate) fn detach_analysis(&mut self) {
        self.analysis = None;
    }

    /// Whether a capture thread is running.
    pub fn is_bound(&self) -> bool {
        self.binding.is_some()
    }

    /// Release accounting for frames handed to the analyzer.
    pub fn tracker(&self) -> &Arc<ReleaseTracker> {
        &self.tracker
    }
}

impl Drop for CameraSessionManager {
    fn drop(&mut self) {
        self.unbind();
    }
}
