//! Camera permission gate.
//!
//! Access is owned by the host: the screen asks the provider whether the
//! camera may be used and, if not, issues a request tagged with
//! [`REQUEST_CAMERA_PERMISSIONS`]. The answer comes back later, through a
//! [`PermissionResponder`], as a screen event.

mod provider;

pub use provider::{PermissionProvider, PermissionResponder, PromptPermission, StaticPermission};

/// Request code attached to camera permission requests.
pub const REQUEST_CAMERA_PERMISSIONS: i32 = 10;

/// Notice shown once when the user refuses camera access.
pub const PERMISSION_DENIED_NOTICE: &str = "Camera permission required";

/// Whether the camera may be used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionState {
    /// Camera access allowed.
    Granted,
    /// Camera access refused or not yet given.
    Denied,
}

impl PermissionState {
    /// Maps a yes/no answer to a state.
    pub fn from_granted(granted: bool) -> Self {
        if granted {
            PermissionState::Granted
        } else {
            PermissionState::Denied
        }
    }

    /// Whether the camera may be used.
    #[inline]
    pub fn is_granted(self) -> bool {
        self == PermissionState::Granted
    }
}
