//! Scan configuration.
//!
//! The capture section selects the camera and frame geometry; the other
//! sections tune the permission gate, the analysis queue and the metrics
//! exporter.

use serde::{Deserialize, Serialize};
use std::path::Path;

/// Which physical lens to bind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LensFacing {
    /// Rear-facing camera, the default for scanning.
    #[default]
    Back,
    /// Front-facing camera.
    Front,
}

/// Configuration for camera capture.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CaptureConfig {
    /// Camera device index or identifier.
    pub device_id: u32,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Target frames per second.
    pub fps: u32,
    /// Lens to bind the session to.
    pub lens: LensFacing,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            device_id: 0,
            width: 640,
            height: 480,
            fps: 30,
            lens: LensFacing::Back,
        }
    }
}

impl CaptureConfig {
    /// Creates a new configuration with the specified dimensions.
    pub fn with_dimensions(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Default::default()
        }
    }

    /// Validates the configuration parameters.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.width == 0 || self.height == 0 {
            return Err(ConfigError::InvalidDimensions);
        }
        if self.fps == 0 || self.fps > 120 {
            return Err(ConfigError::InvalidFrameRate);
        }
        Ok(())
    }
}

/// Configuration validation errors.
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConfigError {
    /// Width or height is zero.
    #[error("invalid frame dimensions")]
    InvalidDimensions,
    /// Frame rate outside 1..=120.
    #[error("invalid frame rate (must be 1-120 fps)")]
    InvalidFrameRate,
    /// Analysis queue depth is zero.
    #[error("analysis queue depth must be at least 1")]
    InvalidQueueDepth,
    /// The file could not be read.
    #[error("failed to read config file: {0}")]
    FileReadError(String),
    /// The file is not valid TOML for this format.
    #[error("failed to parse config file: {0}")]
    ParseError(String),
}

/// Full configuration file format.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct FileConfig {
    /// Camera selection and frame geometry.
    #[serde(default)]
    pub capture: CaptureConfig,
    /// Permission gate.
    #[serde(default)]
    pub permission: PermissionConfig,
    /// Frame analysis.
    #[serde(default)]
    pub analysis: AnalysisConfig,
    /// Metrics exporter.
    #[serde(default)]
    pub output: OutputConfig,
}

/// Permission gate configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PermissionConfig {
    /// Treat camera access as already granted instead of asking.
    #[serde(default)]
    pub auto_grant: bool,
}

/// Frame analysis configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisConfig {
    /// Frames that may wait for the analysis worker.
    pub queue_depth: usize,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self { queue_depth: 1 }
    }
}

/// Output configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Metrics server port (0 to disable).
    pub metrics_port: u16,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self { metrics_port: 0 }
    }
}

impl FileConfig {
    /// Loads configuration from a TOML file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::FileReadError(e.to_string()))?;
        Self::from_toml(&content)
    }

    /// Parses and validates configuration from TOML text.
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: FileConfig =
            toml::from_str(content).map_err(|e| ConfigError::ParseError(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates every section.
    pub fn validate(&self) -> Result<(), ConfigError> {
        self.capture.validate()?;
        if self.analysis.queue_depth == 0 {
            return Err(ConfigError::InvalidQueueDepth);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_valid() {
        let config = CaptureConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.lens, LensFacing::Back);
    }

    #[test]
    fn test_zero_dimensions_invalid() {
        let mut config = CaptureConfig::default();
        config.width = 0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::InvalidDimensions)
        ));
    }

    #[test]
    fn test_parse_partial_file() {
        let config = FileConfig::from_toml(
            r#"
            [capture]
            device_id = 2
            lens = "front"

            [permission]
            auto_grant = true
            "#,
        )
        .unwrap();

        assert_eq!(config.capture.device_id, 2);
        assert_eq!(config.capture.width, 640);
        assert_eq!(config.capture.lens, LensFacing::Front);
        assert!(config.permission.auto_grant);
        assert_eq!(config.analysis.queue_depth, 1);
        assert_eq!(config.output.metrics_port, 0);
    }

    #[test]
    fn test_zero_queue_depth_rejected() {
        let result = FileConfig::from_toml("[analysis]\nqueue_depth = 0\n");
        assert!(matches!(result, Err(ConfigError::InvalidQueueDepth)));
    }

    #[test]
    fn test_garbage_rejected() {
        let result = FileConfig::from_toml("capture = 12");
        assert!(matches!(result, Err(ConfigError::ParseError(_))));
    }
}
