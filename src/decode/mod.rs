//! Barcode decoding.
//!
//! The decoder is an external service: it takes an image plus a rotation
//! hint and reports candidates (or a failure) through a completion
//! callback, on whatever thread it likes. [`RqrrDecoder`] is the concrete
//! backend; tests plug in their own implementations.

mod barcode;
mod qr;

pub use barcode::{first_payload, Barcode, BarcodeFormat};
pub use qr::RqrrDecoder;

use crate::capture::{Frame, Rotation};
use thiserror::Error;

/// Errors reported by a decoder for a single image.
#[derive(Debug, Clone, Error)]
pub enum DecodeError {
    /// The frame could not be turned into a decoder image.
    #[error("image buffer is malformed: {0}")]
    InvalidImage(String),
    /// The decoder gave up on the frame.
    #[error("decoder failed: {0}")]
    Failed(String),
}

/// Image submitted for decoding.
#[derive(Debug, Clone)]
pub struct InputImage {
    /// Luma pixels.
    pub frame: Frame,
    /// Rotation that makes the frame upright.
    pub rotation: Rotation,
}

/// Completion callback invoked exactly once per submitted image.
pub type DecodeCallback = Box<dyn FnOnce(Result<Vec<Barcode>, DecodeError>) + Send + 'static>;

/// An asynchronous barcode decoder.
pub trait Decoder: Send + Sync {
    /// Formats this decoder reports.
    fn formats(&self) -> &[BarcodeFormat];

    /// Decodes `image` and hands the outcome to `done`.
    ///
    /// Implementations may call `done` inline or from another thread.
    fn process(&self, image: InputImage, done: DecodeCallback);
}
