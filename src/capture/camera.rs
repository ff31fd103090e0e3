//! Camera abstraction for frame capture.
//!
//! Real hardware, still images and scripted test sources all sit behind
//! the same trait so the camera session never knows which one it drives.

use super::{CaptureConfig, Frame, Rotation};
use std::collections::VecDeque;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Errors that can occur during camera operations.
#[derive(Debug, Error)]
pub enum CameraError {
    /// No camera matches the configured device.
    #[error("camera device not found: {0}")]
    DeviceNotFound(String),
    /// The device refused to open.
    #[error("failed to open camera: {0}")]
    OpenFailed(String),
    /// The requested format could not be applied.
    #[error("failed to configure camera: {0}")]
    ConfigFailed(String),
    /// Reading a frame failed.
    #[error("failed to capture frame: {0}")]
    CaptureFailed(String),
    /// Capture was attempted before `open`.
    #[error("camera not initialized")]
    NotInitialized,
}

/// One delivery from a camera: an image (absent when the sensor produced
/// nothing usable) plus the rotation that makes it upright.
#[derive(Debug, Clone)]
pub struct Shot {
    /// Pixels, or `None` when the backend produced no image.
    pub image: Option<Frame>,
    /// Rotation that makes the image upright.
    pub rotation: Rotation,
}

impl Shot {
    /// A shot that needs no rotation.
    pub fn upright(frame: Frame) -> Self {
        Self {
            image: Some(frame),
            rotation: Rotation::Deg0,
        }
    }
}

/// Trait for camera implementations.
///
/// Cameras are moved onto the capture thread while a session is bound,
/// hence the `Send` bound.
pub trait Camera: Send {
    /// Opens and initializes the camera with the given configuration.
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError>;

    /// Captures a single frame.
    fn capture(&mut self) -> Result<Shot, CameraError>;

    /// Checks if the camera is currently open.
    fn is_open(&self) -> bool;

    /// Closes the camera and releases resources.
    fn close(&mut self);
}

/// Mock camera that replays a scripted list of shots, then repeats the
/// last one (or produces blank frames when the script is empty).
#[derive(Debug, Default)]
pub struct MockCamera {
    config: Option<CaptureConfig>,
    script: VecDeque<Shot>,
    last: Option<Shot>,
    sequence: u64,
    fail_open: bool,
}

impl MockCamera {
    /// Creates a camera that delivers blank frames.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a mock that delivers `shots` in order.
    pub fn scripted(shots: impl IntoIterator<Item = Shot>) -> Self {
        Self {
            script: shots.into_iter().collect(),
            ..Self::default()
        }
    }

    /// Creates a mock whose `open` always fails.
    pub fn failing() -> Self {
        Self {
            fail_open: true,
            ..Self::default()
        }
    }
}

impl Camera for MockCamera {
    fn open(&mut self, config: &CaptureConfig) -> Result<(), CameraError> {
        if self.fail_open {
            return Err(CameraError::OpenFailed("mock camera refused to open".into()));
        }
        config
            .validate()
            .map_err(|e| CameraError::ConfigFailed(e.to_string()))?;
        self.config = Some(config.clone());
        tracing::info!("MockCamera opened with config: {:?}", config);
        Ok(())
    }

    fn capture(&mut self) -> Result<Shot, CameraError> {
        let config = self.config.as_ref().ok_or(CameraError::NotInitialized)?;
        self.sequence += 1;

        if let Some(shot) = self.script.pop_front() {
            self.last = Some(shot.clone());
            return Ok(shot);
        }
        if let Some(shot) = &self.last {
            return Ok(shot.clone());
        }

        let len = frame_len(config.width, config.height).ok_or_else(|| {
            CameraError::ConfigFailed(format!(
                "{}x{} frame does not fit in memory",
                config.width, config.height
            ))
        })?;
        let pixels = vec![0u8; len];
        Ok(Shot::upright(Frame::new(
            pixels,
            config.width,
            config.height,
            self.sequence,
        )))
    }

    fn is_open(&self) -> bool {
        self.config.is_some()
    }

    fn close(&mut self) {
        self.config = None;
        tracing::info!("MockCamera closed");
    }
}

/// Luma buffer length for a frame, computed in `usize`.
fn frame_len(width: u32, height: u32) -> Option<usize> {
    (width as usize).checked_mul(height as usize)
}

/// Serves a still image from disk as a never-ending camera feed.
#[derive(Debug)]
pub struct ImageFileCamera {
    path: PathBuf,
    frame: Option<Frame>,
    sequence: u64,
}

impl ImageFileCamera {
    /// Camera that serves the image at `path` on every capture.
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
            frame: None,
            sequence: 0,
        }
    }
}

impl Camera for ImageFileCamera {
    fn open(&mut self, _config: &CaptureConfig) -> Result<(), CameraError> {
        let luma = image::open(&self.path)
            .map_err(|e| CameraError::OpenFailed(format!("{}: {}", self.path.display(), e)))?
            .to_luma8();
        let (width, height) = luma.dimensions();
        self.frame = Some(Frame::new(luma.into_raw(), width, height, 0));
        self.sequence = 0;
        tracing::info!(path = %self.path.display(), width, height, "Image source opened");
        Ok(())
    }

    fn capture(&mut self) -> Result<Shot, CameraError> {
        let frame = self.frame.as_ref().ok_or(CameraError::NotInitialized)?;
        self.sequence += 1;
        Ok(Shot::upright(Frame::new(
            frame.pixels().to_vec(),
            frame.width(),
            frame.height(),
            self.sequence,
        )))
    }

    fn is_open(&self) -> bool {
        self.frame.is_some()
    }

    fn close(&mut self) {
        self.frame = None;
        tracing::info!(path = %self.path.display(), "Image source closed");
    }
}
