//! Decoded barcode candidates.

/// Symbology of a decoded candidate.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BarcodeFormat {
    /// QR code.
    QrCode,
}

/// One symbol found in an image.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Barcode {
    /// Symbology the code was read as.
    pub format: BarcodeFormat,
    /// Raw text payload; `None` when the symbol carried no text.
    pub raw_value: Option<String>,
}

impl Barcode {
    /// A QR code carrying `text`.
    pub fn qr(text: impl Into<String>) -> Self {
        Self {
            format: BarcodeFormat::QrCode,
            raw_value: Some(text.into()),
        }
    }

    /// A QR candidate without a text payload.
    pub fn qr_empty() -> Self {
        Self {
            format: BarcodeFormat::QrCode,
            raw_value: None,
        }
    }

    /// Returns the payload if it is present and non-empty.
    pub fn text(&self) -> Option<&str> {
        self.raw_value.as_deref().filter(|s| !s.is_empty())
    }
}

/// Returns the first non-empty payload, in decoder order.
pub fn first_payload(barcodes: &[Barcode]) -> Option<&str> {
    barcodes.iter().find_map(Barcode::text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_first_payload_skips_empty() {
        let barcodes = vec![
            Barcode::qr_empty(),
            Barcode::qr(""),
            Barcode::qr("otpauth://totp/a"),
            Barcode::qr("second"),
        ];
        assert_eq!(first_payload(&barcodes), Some("otpauth://totp/a"));
    }

    #[test]
    fn test_first_payload_none() {
        assert_eq!(first_payload(&[]), None);
        assert_eq!(first_payload(&[Barcode::qr_empty()]), None);
    }

    proptest! {
        #[test]
        fn first_payload_is_first_non_empty(values in proptest::collection::vec(proptest::option::of(".{0,8}"), 0..8)) {
            let barcodes: Vec<Barcode> = values
                .iter()
                .map(|v| Barcode { format: BarcodeFormat::QrCode, raw_value: v.clone() })
                .collect();
            let expected = values
                .iter()
                .flatten()
                .find(|s| !s.is_empty())
                .map(String::as_str);
            prop_assert_eq!(first_payload(&barcodes), expected);
        }
    }
}
