//! Complete-once result reporting.

use super::ScreenEvent;
use crossbeam_channel::Sender;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

/// Hands the first decoded payload (or a cancellation) to the screen.
///
/// A single atomic exchange decides the winner. Every call after the
/// first, and every call after [`close`](ResultReporter::close), is a
/// no-op. Winning only queues the event; the screen decides whether
/// the payload is still accepted.
#[derive(Debug)]
pub struct ResultReporter {
    completed: AtomicBool,
    events: Sender<ScreenEvent>,
}

impl ResultReporter {
    /// Creates an open reporter that posts to the given screen queue.
    pub fn new(events: Sender<ScreenEvent>) -> Self {
        Self {
            completed: AtomicBool::new(false),
            events,
        }
    }

    fn claim(&self) -> bool {
        self.completed
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Submits a decoded payload. Returns `true` if this call won.
    pub fn submit(&self, text: String) -> bool {
        if !self.claim() {
            tracing::debug!("Result already reported, ignoring payload");
            return false;
        }
        tracing::info!(chars = text.len(), "Reporting scan result");
        let _ = self.events.send(ScreenEvent::ResultReady(text));
        true
    }

    /// Cancels the scan. Returns `true` if this call won.
    pub fn cancel(&self) -> bool {
        if !self.claim() {
            return false;
        }
        tracing::info!("Scan cancelled");
        let _ = self.events.send(ScreenEvent::CancelRequested);
        true
    }

    /// Marks the screen as finished so late completions are dropped.
    pub fn close(&self) {
        self.completed.store(true, Ordering::Release);
    }
}

/// Cloneable handle for cancelling a running scan from another thread.
#[derive(Debug, Clone)]
pub struct ScanHandle {
    reporter: Arc<ResultReporter>,
}

impl ScanHandle {
    pub(crate) fn new(reporter: Arc<ResultReporter>) -> Self {
        Self { reporter }
    }

    /// Requests cancellation; ignored once a result has been decided.
    pub fn cancel(&self) -> bool {
        self.reporter.cancel()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;
    use std::thread;

    #[test]
    fn test_first_submit_wins() {
        let (tx, rx) = unbounded();
        let reporter = ResultReporter::new(tx);

        assert!(reporter.submit("first".into()));
        assert!(!reporter.submit("second".into()));
        assert!(!reporter.cancel());

        assert_eq!(rx.try_recv().unwrap(), ScreenEvent::ResultReady("first".into()));
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_closed_reporter_ignores_submit() {
        let (tx, rx) = unbounded();
        let reporter = ResultReporter::new(tx);
        reporter.close();

        assert!(!reporter.submit("late".into()));
        assert!(!reporter.cancel());
        assert!(rx.try_recv().is_err());
    }

    #[test]
    fn test_concurrent_submits_report_once() {
        let (tx, rx) = unbounded();
        let reporter = Arc::new(ResultReporter::new(tx));

        let handles: Vec<_> = (0..8)
            .map(|i| {
                let reporter = Arc::clone(&reporter);
                thread::spawn(move || reporter.submit(format!("value-{}", i)))
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|won| *won)
            .count();

        assert_eq!(winners, 1);
        assert_eq!(rx.try_iter().count(), 1);
    }

    #[test]
    fn test_handle_cancels() {
        let (tx, rx) = unbounded();
        let reporter = Arc::new(ResultReporter::new(tx));
        let handle = ScanHandle::new(Arc::clone(&reporter));

        assert!(handle.cancel());
        assert!(!handle.cancel());
        assert_eq!(rx.try_recv().unwrap(), ScreenEvent::CancelRequested);
    }
}
