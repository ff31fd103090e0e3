//! Permission providers.

use super::PermissionState;
use crate::session::ScreenEvent;
use crossbeam_channel::{bounded, SendError, Sender};
use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread;

/// Delivers the user's answer to a permission request back to the screen.
#[derive(Debug)]
pub struct PermissionResponder {
    request_code: i32,
    events: Sender<ScreenEvent>,
}

impl PermissionResponder {
    pub(crate) fn new(request_code: i32, events: Sender<ScreenEvent>) -> Self {
        Self {
            request_code,
            events,
        }
    }

    /// Code of the request this responder answers.
    pub fn request_code(&self) -> i32 {
        self.request_code
    }

    /// Posts the answer. Does nothing if the screen is already gone.
    pub fn respond(self, permission: PermissionState) {
        let event = ScreenEvent::PermissionResult {
            request_code: self.request_code,
            permission,
        };
        if self.events.send(event).is_err() {
            tracing::debug!(
                request_code = self.request_code,
                "Permission answer arrived after the screen closed"
            );
        }
    }
}

/// Source of camera access decisions.
pub trait PermissionProvider: Send {
    /// Returns the current access state.
    fn check(&self) -> PermissionState;

    /// Asks the user for access. The answer is delivered through
    /// `responder`, possibly from another thread.
    fn request(&mut self, request_code: i32, responder: PermissionResponder);
}

/// Fixed answer, for hosts where access is decided up front.
#[derive(Debug, Clone, Copy)]
pub struct StaticPermission {
    state: PermissionState,
}

impl StaticPermission {
    /// Always allows the camera.
    pub fn granted() -> Self {
        Self {
            state: PermissionState::Granted,
        }
    }

    /// Always refuses the camera.
    pub fn denied() -> Self {
        Self {
            state: PermissionState::Denied,
        }
    }
}

impl PermissionProvider for StaticPermission {
    fn check(&self) -> PermissionState {
        self.state
    }

    fn request(&mut self, _request_code: i32, responder: PermissionResponder) {
        responder.respond(self.state);
    }
}

/// Asks on the terminal. The question runs on its own thread so the
/// screen keeps processing events while the user thinks.
#[derive(Debug, Default)]
pub struct PromptPermission {
    granted: Arc<AtomicBool>,
}

impl PromptPermission {
    /// Creates a prompt with access not yet granted.
    pub fn new() -> Self {
        Self::default()
    }
}

fn ask_on_terminal() -> bool {
    let mut stderr = std::io::stderr();
    let _ = write!(stderr, "Allow camera access? [y/N] ");
    let _ = stderr.flush();

    let mut answer = String::new();
    match std::io::stdin().lock().read_line(&mut answer) {
        Ok(_) => matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes"),
        Err(e) => {
            tracing::warn!(error = %e, "Could not read permission answer");
            false
        }
    }
}

type PromptJob = Box<dyn FnOnce() + Send>;

/// Runs `ask` on whatever `spawn` starts. The responder only moves to the
/// job once it is running, so a failed start still answers, as a denial.
fn start_prompt<S>(
    granted: Arc<AtomicBool>,
    responder: PermissionResponder,
    ask: fn() -> bool,
    spawn: S,
) where
    S: FnOnce(PromptJob) -> io::Result<()>,
{
    let request_code = responder.request_code();
    let (handoff_tx, handoff_rx) = bounded::<PermissionResponder>(1);
    let job: PromptJob = Box::new(move || {
        let Ok(responder) = handoff_rx.recv() else {
            return;
        };
        let answer = ask();
        granted.store(answer, Ordering::Release);
        responder.respond(PermissionState::from_granted(answer));
    });

    let responder = match spawn(job) {
        Ok(()) => match handoff_tx.send(responder) {
            Ok(()) => return,
            Err(SendError(responder)) => responder,
        },
        Err(e) => {
            tracing::error!(request_code, error = %e, "Failed to start permission prompt");
            responder
        }
    };
    responder.respond(PermissionState::Denied);
}

impl PermissionProvider for PromptPermission {
    fn check(&self) -> PermissionState {
        PermissionState::from_granted(self.granted.load(Ordering::Acquire))
    }

    fn request(&mut self, _request_code: i32, responder: PermissionResponder) {
        start_prompt(Arc::clone(&self.granted), responder, ask_on_terminal, |job| {
            thread::Builder::new()
                .name("permission-prompt".into())
                .spawn(job)
                .map(|_| ())
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crossbeam_channel::unbounded;

    #[test]
    fn test_static_permission_answers_immediately() {
        let (tx, rx) = unbounded();
        let mut provider = StaticPermission::denied();
        assert_eq!(provider.check(), PermissionState::Denied);

        provider.request(10, PermissionResponder::new(10, tx));
        match rx.try_recv().unwrap() {
            ScreenEvent::PermissionResult {
                request_code,
                permission,
            } => {
                assert_eq!(request_code, 10);
                assert_eq!(permission, PermissionState::Denied);
            }
            other => panic!("unexpected event {:?}", other),
        }
    }

    fn answered(rx: &crossbeam_channel::Receiver<ScreenEvent>) -> PermissionState {
        match rx.recv_timeout(std::time::Duration::from_secs(5)).unwrap() {
            ScreenEvent::PermissionResult { permission, .. } => permission,
            other => panic!("unexpected event {:?}", other),
        }
    }

    #[test]
    fn test_prompt_start_failure_answers_denied() {
        let (tx, rx) = unbounded();
        let granted = Arc::new(AtomicBool::new(false));
        start_prompt(
            Arc::clone(&granted),
            PermissionResponder::new(10, tx),
            || true,
            |_job| Err(io::Error::new(io::ErrorKind::Other, "no threads left")),
        );

        assert_eq!(answered(&rx), PermissionState::Denied);
        assert!(!granted.load(Ordering::Acquire));
    }

    #[test]
    fn test_prompt_answer_updates_check() {
        let (tx, rx) = unbounded();
        let provider = PromptPermission::new();
        start_prompt(
            Arc::clone(&provider.granted),
            PermissionResponder::new(10, tx),
            || true,
            |job| thread::Builder::new().spawn(job).map(|_| ()),
        );

        assert_eq!(answered(&rx), PermissionState::Granted);
        assert_eq!(provider.check(), PermissionState::Granted);
    }

    #[test]
    fn test_respond_after_close_is_silent() {
        let (tx, rx) = unbounded();
        drop(rx);
        PermissionResponder::new(10, tx).respond(PermissionState::Granted);
    }
}
