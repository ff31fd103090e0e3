//! QR Scan Screen Library
//!
//! Opens a camera, scans frames for QR codes and hands the first decoded
//! payload back to the caller. The decoding and the camera are external
//! services behind traits; this crate mediates between them.
//!
//! # Architecture
//!
//! ```text
//! permission → camera session → frame analyzer → result reporter
//!                                  (worker)        (complete-once)
//!        ↑                                               ↓
//!        └──────────── screen state machine ◄────────────┘
//! ```
//!
//! # Design Principles
//!
//! - **One result per scan**: the reporter's atomic guard lets only the
//!   first payload through; later decodes and late completions do nothing
//! - **Every buffer released**: frames go back to the pipeline on every
//!   decode outcome, including missing images
//! - **Host-agnostic lifecycle**: host callbacks are events; transitions
//!   return effects instead of performing them
//! - **Failures stay local**: denied permission, binding failures and
//!   decode failures all look like "no value" to the caller
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use qr_scan::{
//!     capture::{FileConfig, ImageFileCamera},
//!     decode::RqrrDecoder,
//!     permission::StaticPermission,
//!     session::{LogPreview, ScanScreen, ScreenDeps, StderrNotifier},
//! };
//!
//! let deps = ScreenDeps {
//!     camera: Box::new(ImageFileCamera::new("code.png")),
//!     decoder: Arc::new(RqrrDecoder::new()),
//!     permission: Box::new(StaticPermission::granted()),
//!     notifier: Box::new(StderrNotifier),
//!     preview: Box::new(LogPreview::default()),
//! };
//!
//! let screen = ScanScreen::new(&FileConfig::default(), deps).unwrap();
//! let result = screen.run();
//!
//! if let Some(text) = result.parse() {
//!     println!("{}", text);
//! }
//! ```

#![warn(missing_docs)]
#![warn(rust_2018_idioms)]
#![deny(unsafe_code)]

pub mod capture;
pub mod contract;
pub mod decode;
pub mod error;
pub mod metrics;
pub mod permission;
pub mod session;

// Re-export commonly used types at crate root
pub use capture::{Camera, CaptureConfig, FileConfig, Frame, MockCamera};
pub use contract::{ActivityResult, ResultCode, ScanResult, EXTRA_QR_RESULT};
pub use decode::{Barcode, Decoder, RqrrDecoder};
pub use error::ScanError;
pub use permission::{PermissionProvider, PermissionState, REQUEST_CAMERA_PERMISSIONS};
pub use session::{ScanHandle, ScanScreen, ScreenDeps};

/// Library version.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
