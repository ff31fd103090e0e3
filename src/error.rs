//! Crate-level errors surfaced to the binary.

use crate::capture::ConfigError;
use thiserror::Error;

/// Failures that prevent a scan from starting at all.
///
/// Everything that happens once the screen runs (denied permission,
/// binding failures, decode failures) is absorbed by the screen and seen
/// by the caller as a cancelled result.
#[derive(Debug, Error)]
pub enum ScanError {
    /// Configuration was rejected.
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),
    /// The analysis worker thread could not be started.
    #[error("failed to start analysis worker: {0}")]
    Worker(std::io::Error),
}
