//! User-visible outputs: the transient notice and the live preview.

use crate::capture::Frame;

/// Shows short, transient messages to the user.
pub trait Notifier: Send {
    fn show(&mut self, message: &str);
}

/// Receives every captured frame while the camera session is bound.
pub trait Preview: Send {
    fn present(&mut self, frame: &Frame);
}

/// Writes notices to standard error.
#[derive(Debug, Default)]
pub struct StderrNotifier;

impl Notifier for StderrNotifier {
    fn show(&mut self, message: &str) {
        eprintln!("{}", message);
    }
}

/// Preview that only logs frame arrival; used when there is no display.
#[derive(Debug, Default)]
pub struct LogPreview {
    presented: u64,
}

impl LogPreview {
    /// Frames presented so far.
    pub fn presented(&self) -> u64 {
        self.presented
    }
}

impl Preview for LogPreview {
    fn present(&mut self, frame: &Frame) {
        self.presented += 1;
        tracing::trace!(
            sequence = frame.sequence(),
            width = frame.width(),
            height = frame.height(),
            "Preview frame"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_preview_counts_frames() {
        let mut preview = LogPreview::default();
        preview.present(&Frame::new(vec![0; 4], 2, 2, 1));
        preview.present(&Frame::new(vec![0; 4], 2, 2, 2));
        assert_eq!(preview.presented(), 2);
    }
}
