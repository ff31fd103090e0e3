//! Camera input and frame handling.
//!
//! This module provides abstractions for capturing frames from a camera,
//! the buffer hand-off to the analyzer and the scan configuration.

mod camera;
mod config;
#[cfg(feature = "camera")]
mod device;
mod frame;

pub use camera::{Camera, CameraError, ImageFileCamera, MockCamera, Shot};
pub use config::{
    AnalysisConfig, CaptureConfig, ConfigError, FileConfig, LensFacing, OutputConfig,
    PermissionConfig,
};
#[cfg(feature = "camera")]
pub use device::NokhwaCamera;
pub use frame::{CapturedFrame, Frame, ReleaseTracker, Rotation};
