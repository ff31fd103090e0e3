//! Caller-facing result contract.
//!
//! The scan takes no input. It completes with either a success code and
//! the decoded text under [`EXTRA_QR_RESULT`], or a cancellation code with
//! nothing attached. Denied permission, user cancel and teardown without a
//! result all look the same to the caller.

use std::collections::BTreeMap;

/// Extra key carrying the decoded payload.
pub const EXTRA_QR_RESULT: &str = "app.easytoken.extra.QR_RESULT";

/// Outcome of one scan invocation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ScanResult {
    /// First non-empty payload that was decoded.
    Scanned(String),
    /// No value: cancelled, permission denied, or closed early.
    Cancelled,
}

/// Completion code of a screen.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResultCode {
    /// A payload is attached.
    Ok,
    /// No payload.
    Canceled,
}

impl ResultCode {
    /// Host integer value (`-1` for success, `0` for cancellation).
    pub fn as_i32(self) -> i32 {
        match self {
            ResultCode::Ok => -1,
            ResultCode::Canceled => 0,
        }
    }
}

/// Completion signal handed back to whoever started the scan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActivityResult {
    /// Completion code.
    pub code: ResultCode,
    /// Named values attached to the result.
    pub extras: BTreeMap<String, String>,
}

impl ActivityResult {
    /// Cancellation with no extras.
    pub fn canceled() -> Self {
        Self {
            code: ResultCode::Canceled,
            extras: BTreeMap::new(),
        }
    }

    /// Success carrying `text` under [`EXTRA_QR_RESULT`].
    pub fn ok_with(text: impl Into<String>) -> Self {
        let mut extras = BTreeMap::new();
        extras.insert(EXTRA_QR_RESULT.to_string(), text.into());
        Self {
            code: ResultCode::Ok,
            extras,
        }
    }

    /// Reads the payload the way a caller does: any code other than
    /// [`ResultCode::Ok`] means no value.
    pub fn parse(&self) -> Option<&str> {
        if self.code != ResultCode::Ok {
            return None;
        }
        self.extras.get(EXTRA_QR_RESULT).map(String::as_str)
    }
}

impl From<ScanResult> for ActivityResult {
    fn from(result: ScanResult) -> Self {
        match result {
            ScanResult::Scanned(text) => ActivityResult::ok_with(text),
            ScanResult::Cancelled => ActivityResult::canceled(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scanned_result_carries_extra() {
        let result = ActivityResult::from(ScanResult::Scanned("https://example.com".into()));
        assert_eq!(result.code, ResultCode::Ok);
        assert_eq!(
            result.extras.get("app.easytoken.extra.QR_RESULT").map(String::as_str),
            Some("https://example.com")
        );
        assert_eq!(result.parse(), Some("https://example.com"));
    }

    #[test]
    fn test_cancelled_result_is_empty() {
        let result = ActivityResult::from(ScanResult::Cancelled);
        assert_eq!(result.code.as_i32(), 0);
        assert!(result.extras.is_empty());
        assert_eq!(result.parse(), None);
    }

    #[test]
    fn test_parse_ignores_extra_on_cancel() {
        let mut result = ActivityResult::ok_with("stale");
        result.code = ResultCode::Canceled;
        assert_eq!(result.parse(), None);
    }

    #[test]
    fn test_ok_without_extra() {
        let result = ActivityResult {
            code: ResultCode::Ok,
            extras: BTreeMap::new(),
        };
        assert_eq!(result.parse(), None);
    }
}
