//! Per-frame analysis on a single background worker.

use super::{ResultReporter, ScanStats};
use crate::capture::CapturedFrame;
use crate::decode::{first_payload, Decoder, InputImage};
use crossbeam_channel::{bounded, Sender};
use std::sync::Arc;
use std::thread::{self, JoinHandle};

/// Feeds frames to the decoder and forwards the first payload.
///
/// Dependencies are injected at construction; the analyzer holds no
/// reference to the screen.
pub struct FrameAnalyzer {
    decoder: Arc<dyn Decoder>,
    reporter: Arc<ResultReporter>,
    stats: Arc<ScanStats>,
}

impl FrameAnalyzer {
    /// Creates an analyzer that reports through `reporter`.
    pub fn new(
        decoder: Arc<dyn Decoder>,
        reporter: Arc<ResultReporter>,
        stats: Arc<ScanStats>,
    ) -> Self {
        Self {
            decoder,
            reporter,
            stats,
        }
    }

    /// Analyzes one frame. The buffer is released on every path: right
    /// away when there is no image, otherwise when the decoder completes.
    pub fn analyze(&self, mut frame: CapturedFrame) {
        let Some(image) = frame.take_image() else {
            self.stats.record_skipped();
            tracing::trace!(sequence = frame.sequence(), "Frame has no image, skipping");
            frame.close();
            return;
        };

        self.stats.record_analyzed();
        let rotation = frame.rotation();
        let reporter = Arc::clone(&self.reporter);
        let stats = Arc::clone(&self.stats);

        self.decoder.process(
            InputImage {
                frame: image,
                rotation,
            },
            Box::new(move |outcome| {
                match outcome {
                    Ok(barcodes) => {
                        tracing::debug!(
                            sequence = frame.sequence(),
                            candidates = barcodes.len(),
                            "Processing barcodes"
                        );
                        if let Some(text) = first_payload(&barcodes) {
                            tracing::debug!(value = text, "Barcode value");
                            reporter.submit(text.to_owned());
                        }
                    }
                    Err(e) => {
                        stats.record_decode_failure();
                        tracing::warn!(sequence = frame.sequence(), error = %e, "Barcode failure");
                    }
                }
                frame.close();
            }),
        );
    }
}

/// The single-thread executor frames are analyzed on.
pub struct AnalysisWorker {
    frames: Option<Sender<CapturedFrame>>,
    handle: Option<JoinHandle<()>>,
}

impl AnalysisWorker {
    /// Starts the worker with room for `queue_depth` waiting frames.
    pub fn spawn(analyzer: FrameAnalyzer, queue_depth: usize) -> std::io::Result<Self> {
        let (tx, rx) = bounded::<CapturedFrame>(queue_depth.max(1));
        let handle = thread::Builder::new()
            .name("frame-analysis".into())
            .spawn(move || {
                for frame in rx {
                    analyzer.analyze(frame);
                }
                tracing::debug!("Analysis worker stopped");
            })?;

        Ok(Self {
            frames: Some(tx),
            handle: Some(handle),
        })
    }

    /// Queue the camera session pushes frames into.
    pub fn sender(&self) -> Option<Sender<CapturedFrame>> {
        self.frames.clone()
    }

    /// Whether the worker thread is still alive.
    pub fn is_running(&self) -> bool {
        self.frames.is_some()
    }

    /// Stops accepting frames and waits for the worker to drain.
    ///
    /// The worker exits once every sender, including the camera session's,
    /// is gone; unbind the camera first.
    pub fn shutdown(&mut self) {
        self.frames = None;
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                tracing::error!("Analysis worker panicked");
            }
        }
    }
}

impl Drop for AnalysisWorker {
    fn drop(&mut self) {
        self.shutdown();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{Frame, ReleaseTracker, Rotation};
    use crate::decode::{Barcode, BarcodeFormat, DecodeCallback, DecodeError};
    use crate::session::ScreenEvent;
    use crossbeam_channel::unbounded;

    struct FixedDecoder(Result<Vec<Barcode>, DecodeError>);

    impl Decoder for FixedDecoder {
        fn formats(&self) -> &[BarcodeFormat] {
            &[BarcodeFormat::QrCode]
        }

        fn process(&self, _image: InputImage, done: DecodeCallback) {
            done(self.0.clone());
        }
    }

    fn setup(
        outcome: Result<Vec<Barcode>, DecodeError>,
    ) -> (
        FrameAnalyzer,
        crossbeam_channel::Receiver<ScreenEvent>,
        Arc<ScanStats>,
        Arc<ReleaseTracker>,
    ) {
        let (tx, rx) = unbounded();
        let stats = Arc::new(ScanStats::default());
        let reporter = Arc::new(ResultReporter::new(tx));
        let analyzer =
            FrameAnalyzer::new(Arc::new(FixedDecoder(outcome)), reporter, Arc::clone(&stats));
        (analyzer, rx, stats, ReleaseTracker::new())
    }

    fn frame(tracker: &Arc<ReleaseTracker>, image: bool) -> CapturedFrame {
        let image = image.then(|| Frame::new(vec![0; 4], 2, 2, 1));
        CapturedFrame::deliver(image, Rotation::Deg90, 1, Arc::clone(tracker))
    }

    #[test]
    fn test_first_non_empty_candidate_reported() {
        let (analyzer, rx, _, tracker) =
            setup(Ok(vec![Barcode::qr_empty(), Barcode::qr("a"), Barcode::qr("b")]));
        analyzer.analyze(frame(&tracker, true));

        assert_eq!(rx.try_recv().unwrap(), ScreenEvent::ResultReady("a".into()));
        assert!(rx.try_recv().is_err());
        assert_eq!(tracker.released(), 1);
    }

    #[test]
    fn test_failure_releases_without_result() {
        let (analyzer, rx, stats, tracker) = setup(Err(DecodeError::Failed("blur".into())));
        analyzer.analyze(frame(&tracker, true));

        assert!(rx.try_recv().is_err());
        assert_eq!(stats.decode_failures(), 1);
        assert_eq!(tracker.released(), 1);
    }

    #[test]
    fn test_missing_image_skipped() {
        let (analyzer, rx, stats, tracker) = setup(Ok(vec![Barcode::qr("never")]));
        analyzer.analyze(frame(&tracker, false));

        assert!(rx.try_recv().is_err());
        assert_eq!(stats.frames_skipped(), 1);
        assert_eq!(stats.frames_analyzed(), 0);
        assert_eq!(tracker.released(), 1);
    }

    #[test]
    fn test_worker_drains_on_shutdown() {
        let (analyzer, rx, _, tracker) = setup(Ok(vec![]));
        let mut worker = AnalysisWorker::spawn(analyzer, 4).unwrap();
        let sender = worker.sender().unwrap();
        for _ in 0..3 {
            sender.send(frame(&tracker, true)).unwrap();
        }
        drop(sender);
        worker.shutdown();

        assert!(!worker.is_running());
        assert_eq!(tracker.delivered(), 3);
        assert_eq!(tracker.released(), 3);
        assert!(rx.try_recv().is_err());
    }
}
