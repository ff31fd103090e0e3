//! QR backend built on `rqrr`.

use super::{Barcode, BarcodeFormat, DecodeCallback, DecodeError, Decoder, InputImage};

/// Decodes QR codes from grayscale frames.
///
/// `rqrr` locates grids in any orientation, so the rotation hint is only
/// recorded. Decoding runs inline on the caller's thread.
#[derive(Debug, Default)]
pub struct RqrrDecoder;

impl RqrrDecoder {
    /// Creates a decoder.
    pub fn new() -> Self {
        Self
    }

    /// Synchronous decode used by [`Decoder::process`].
    pub fn decode(&self, image: &InputImage) -> Result<Vec<Barcode>, DecodeError> {
        let frame = &image.frame;
        if !frame.is_valid() {
            return Err(DecodeError::InvalidImage(format!(
                "{} bytes for {}x{}",
                frame.pixels().len(),
                frame.width(),
                frame.height()
            )));
        }

        let mut prepared = rqrr::PreparedImage::prepare_from_greyscale(
            frame.width() as usize,
            frame.height() as usize,
            |x, y| frame.luma(x, y),
        );
        let grids = prepared.detect_grids();

        let mut barcodes = Vec::with_capacity(grids.len());
        let mut last_error = None;
        for grid in &grids {
            match grid.decode() {
                Ok((_, content)) => {
                    tracing::trace!(chars = content.len(), "QR grid decoded");
                    barcodes.push(Barcode::qr(content));
                }
                Err(e) => {
                    tracing::debug!(error = %e, "QR grid could not be decoded");
                    last_error = Some(e);
                }
            }
        }

        match last_error {
            Some(e) if barcodes.is_empty() => Err(DecodeError::Failed(e.to_string())),
            _ => Ok(barcodes),
        }
    }
}

impl Decoder for RqrrDecoder {
    fn formats(&self) -> &[BarcodeFormat] {
        &[BarcodeFormat::QrCode]
    }

    fn process(&self, image: InputImage, done: DecodeCallback) {
        tracing::trace!(
            sequence = image.frame.sequence(),
            rotation = image.rotation.degrees(),
            "Decoding frame"
        );
        done(self.decode(&image));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::capture::{Frame, Rotation};
    use std::sync::{Arc, Mutex};

    fn input(frame: Frame) -> InputImage {
        InputImage {
            frame,
            rotation: Rotation::Deg0,
        }
    }

    #[test]
    fn test_blank_frame_has_no_candidates() {
        let decoder = RqrrDecoder::new();
        let result = decoder.decode(&input(Frame::new(vec![255u8; 64 * 64], 64, 64, 1)));
        assert!(result.unwrap().is_empty());
    }

    #[test]
    fn test_malformed_frame_fails() {
        let decoder = RqrrDecoder::new();
        let result = decoder.decode(&input(Frame::new(vec![0u8; 10], 64, 64, 1)));
        assert!(matches!(result, Err(DecodeError::InvalidImage(_))));
    }

    #[test]
    fn test_process_calls_completion_once() {
        let decoder = RqrrDecoder::new();
        let calls = Arc::new(Mutex::new(0));
        let counter = Arc::clone(&calls);
        decoder.process(
            input(Frame::new(vec![255u8; 16], 4, 4, 1)),
            Box::new(move |result| {
                assert!(result.is_ok());
                *counter.lock().unwrap() += 1;
            }),
        );
        assert_eq!(*calls.lock().unwrap(), 1);
        assert_eq!(decoder.formats(), &[BarcodeFormat::QrCode]);
    }
}
