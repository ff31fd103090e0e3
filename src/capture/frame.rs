//! Frame types: the captured image and the buffer handed to the analyzer.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

/// A single captured grayscale image.
#[derive(Clone)]
pub struct Frame {
    /// Raw 8-bit luma samples, row-major.
    pixels: Vec<u8>,
    /// Frame width in pixels.
    width: u32,
    /// Frame height in pixels.
    height: u32,
    /// Capture timestamp.
    timestamp: Instant,
    /// Monotonic sequence number.
    sequence: u64,
}

impl Frame {
    /// Creates a new frame with the given parameters.
    pub fn new(pixels: Vec<u8>, width: u32, height: u32, sequence: u64) -> Self {
        Self {
            pixels,
            width,
            height,
            timestamp: Instant::now(),
            sequence,
        }
    }

    /// Returns a reference to the raw pixel data.
    #[inline]
    pub fn pixels(&self) -> &[u8] {
        &self.pixels
    }

    /// Returns the frame width.
    #[inline]
    pub fn width(&self) -> u32 {
        self.width
    }

    /// Returns the frame height.
    #[inline]
    pub fn height(&self) -> u32 {
        self.height
    }

    /// Returns the capture timestamp.
    #[inline]
    pub fn timestamp(&self) -> Instant {
        self.timestamp
    }

    /// Returns the sequence number.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Returns the total number of pixels (width * height).
    #[inline]
    pub fn pixel_count(&self) -> usize {
        (self.width as usize) * (self.height as usize)
    }

    /// Validates that the pixel buffer size matches dimensions.
    pub fn is_valid(&self) -> bool {
        self.pixels.len() == self.pixel_count()
    }

    /// Returns the luma sample at `(x, y)`, or 0 outside the buffer.
    #[inline]
    pub fn luma(&self, x: usize, y: usize) -> u8 {
        self.pixels
            .get(y * self.width as usize + x)
            .copied()
            .unwrap_or(0)
    }
}

impl std::fmt::Debug for Frame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Frame")
            .field("width", &self.width)
            .field("height", &self.height)
            .field("sequence", &self.sequence)
            .field("pixel_bytes", &self.pixels.len())
            .finish()
    }
}

/// Clockwise rotation that brings the sensor image upright.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rotation {
    /// Upright.
    #[default]
    Deg0,
    /// Rotate 90 degrees clockwise to make upright.
    Deg90,
    /// Upside down.
    Deg180,
    /// Rotate 270 degrees clockwise to make upright.
    Deg270,
}

impl Rotation {
    /// Maps a degree value to a rotation; anything that is not a multiple
    /// of 90 falls back to upright.
    pub fn from_degrees(degrees: u32) -> Self {
        match degrees % 360 {
            90 => Rotation::Deg90,
            180 => Rotation::Deg180,
            270 => Rotation::Deg270,
            _ => Rotation::Deg0,
        }
    }

    /// Rotation in degrees.
    pub fn degrees(self) -> u32 {
        match self {
            Rotation::Deg0 => 0,
            Rotation::Deg90 => 90,
            Rotation::Deg180 => 180,
            Rotation::Deg270 => 270,
        }
    }
}

/// Counts buffers handed out by a capture pipeline and buffers given back.
///
/// The capture loop uses `in_flight()` for backpressure: a new frame is
/// not delivered for analysis until the previous one has been released.
#[derive(Debug, Default)]
pub struct ReleaseTracker {
    delivered: AtomicU64,
    released: AtomicU64,
}

impl ReleaseTracker {
    /// Creates a tracker with nothing delivered.
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Total buffers delivered to the consumer.
    pub fn delivered(&self) -> u64 {
        self.delivered.load(Ordering::Acquire)
    }

    /// Total buffers released back to the pipeline.
    pub fn released(&self) -> u64 {
        self.released.load(Ordering::Acquire)
    }

    /// Buffers currently held by the consumer.
    pub fn in_flight(&self) -> u64 {
        self.delivered().saturating_sub(self.released())
    }
}

/// One unit delivered to the analyzer.
///
/// The buffer goes back to the pipeline when this value is dropped or
/// [`close`](CapturedFrame::close)d. Ownership makes the release happen
/// exactly once.
pub struct CapturedFrame {
    image: Option<Frame>,
    rotation: Rotation,
    sequence: u64,
    tracker: Arc<ReleaseTracker>,
}

impl CapturedFrame {
    /// Wraps an image for delivery and counts it as outstanding.
    pub fn deliver(
        image: Option<Frame>,
        rotation: Rotation,
        sequence: u64,
        tracker: Arc<ReleaseTracker>,
    ) -> Self {
        tracker.delivered.fetch_add(1, Ordering::AcqRel);
        Self {
            image,
            rotation,
            sequence,
            tracker,
        }
    }

    /// Moves the image out, leaving the buffer handle behind.
    pub fn take_image(&mut self) -> Option<Frame> {
        self.image.take()
    }

    /// Rotation reported with the frame.
    #[inline]
    pub fn rotation(&self) -> Rotation {
        self.rotation
    }

    /// Capture sequence number.
    #[inline]
    pub fn sequence(&self) -> u64 {
        self.sequence
    }

    /// Releases the buffer back to the capture pipeline.
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for CapturedFrame {
    fn drop(&mut self) {
        self.tracker.released.fetch_add(1, Ordering::AcqRel);
        tracing::trace!(sequence = self.sequence, "Frame buffer released");
    }
}

impl std::fmt::Debug for CapturedFrame {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapturedFrame")
            .field("sequence", &self.sequence)
            .field("rotation", &self.rotation)
            .field("has_image", &self.image.is_some())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_frame_creation() {
        let pixels = vec![0u8; 640 * 480];
        let frame = Frame::new(pixels, 640, 480, 1);

        assert_eq!(frame.width(), 640);
        assert_eq!(frame.height(), 480);
        assert_eq!(frame.sequence(), 1);
        assert!(frame.is_valid());
    }

    #[test]
    fn test_frame_invalid_size() {
        let pixels = vec![0u8; 100]; // Wrong size
        let frame = Frame::new(pixels, 640, 480, 1);

        assert!(!frame.is_valid());
    }

    #[test]
    fn test_rotation_from_degrees() {
        assert_eq!(Rotation::from_degrees(90), Rotation::Deg90);
        assert_eq!(Rotation::from_degrees(450), Rotation::Deg90);
        assert_eq!(Rotation::from_degrees(45), Rotation::Deg0);
        assert_eq!(Rotation::Deg270.degrees(), 270);
    }

    #[test]
    fn test_captured_frame_released_once() {
        let tracker = ReleaseTracker::new();
        let mut captured = CapturedFrame::deliver(
            Some(Frame::new(vec![0; 4], 2, 2, 1)),
            Rotation::Deg0,
            1,
            Arc::clone(&tracker),
        );
        assert_eq!(tracker.in_flight(), 1);

        let image = captured.take_image();
        assert!(image.is_some());
        assert_eq!(tracker.in_flight(), 1);

        captured.close();
        assert_eq!(tracker.released(), 1);
        assert_eq!(tracker.in_flight(), 0);
    }

    #[test]
    fn test_dropped_frame_is_released() {
        let tracker = ReleaseTracker::new();
        {
            let _captured =
                CapturedFrame::deliver(None, Rotation::Deg90, 7, Arc::clone(&tracker));
        }
        assert_eq!(tracker.delivered(), 1);
        assert_eq!(tracker.released(), 1);
    }
}
