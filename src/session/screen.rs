//! The scan screen: event loop of the UI context.
//!
//! The screen owns the permission provider, the camera session, the
//! analysis worker and the reporter. Only the thread running the screen
//! mutates the session and worker handles; other threads talk to it
//! through [`ScreenEvent`]s.

use super::{
    transition, AnalysisWorker, CameraSessionManager, Effect, FrameAnalyzer, Notifier, Preview,
    ResultReporter, ScanHandle, ScanStats, ScreenEvent, ScreenState,
};
use crate::capture::{Camera, FileConfig};
use crate::contract::{ActivityResult, ScanResult};
use crate::decode::Decoder;
use crate::error::ScanError;
use crate::permission::{PermissionProvider, PermissionResponder, PermissionState};
use crossbeam_channel::{unbounded, Receiver, Sender};
use std::sync::Arc;

/// Host-provided collaborators of a screen.
pub struct ScreenDeps {
    /// Camera bound when access is granted.
    pub camera: Box<dyn Camera>,
    /// Barcode decoder shared with the analysis worker.
    pub decoder: Arc<dyn Decoder>,
    /// Source of camera access decisions.
    pub permission: Box<dyn PermissionProvider>,
    /// Shows short user-facing notices.
    pub notifier: Box<dyn Notifier>,
    /// Receives every captured frame.
    pub preview: Box<dyn Preview>,
}

/// One scan invocation.
pub struct ScanScreen {
    state: ScreenState,
    events_tx: Sender<ScreenEvent>,
    events_rx: Receiver<ScreenEvent>,
    permission: Box<dyn PermissionProvider>,
    notifier: Box<dyn Notifier>,
    session: CameraSessionManager,
    worker: AnalysisWorker,
    reporter: Arc<ResultReporter>,
    stats: Arc<ScanStats>,
    result: Option<ScanResult>,
}

impl ScanScreen {
    /// Creates the screen and starts its analysis worker.
    pub fn new(config: &FileConfig, deps: ScreenDeps) -> Result<Self, ScanError> {
        config.validate()?;

        let (events_tx, events_rx) = unbounded();
        let stats = Arc::new(ScanStats::default());
        let reporter = Arc::new(ResultReporter::new(events_tx.clone()));

        let analyzer = FrameAnalyzer::new(deps.decoder, Arc::clone(&reporter), Arc::clone(&stats));
        let worker = AnalysisWorker::spawn(analyzer, config.analysis.queue_depth)
            .map_err(ScanError::Worker)?;

        let session = CameraSessionManager::new(
            deps.camera,
            config.capture.clone(),
            config.analysis.queue_depth,
            worker.sender(),
            deps.preview,
            Arc::clone(&stats),
        );

        Ok(Self {
            state: ScreenState::Created,
            events_tx,
            events_rx,
            permission: deps.permission,
            notifier: deps.notifier,
            session,
            worker,
            reporter,
            stats,
            result: None,
        })
    }

    /// Current lifecycle state.
    pub fn state(&self) -> ScreenState {
        self.state
    }

    /// Counters shared with the session and the worker.
    pub fn stats(&self) -> &Arc<ScanStats> {
        &self.stats
    }

    /// The camera session this screen drives.
    pub fn session(&self) -> &CameraSessionManager {
        &self.session
    }

    /// Handle that cancels the scan from any thread.
    pub fn handle(&self) -> ScanHandle {
        ScanHandle::new(Arc::clone(&self.reporter))
    }

    /// Sender for posting host events to this screen.
    pub fn events(&self) -> Sender<ScreenEvent> {
        self.events_tx.clone()
    }

    /// Screen shown: checks permission and either starts the camera or
    /// asks for access.
    pub fn on_create(&mut self) {
        let permission = self.permission.check();
        self.dispatch(ScreenEvent::Start { permission });
    }

    /// The user answered a permission request. The answer only says that
    /// the dialog closed; access is re-checked with the provider.
    pub fn on_permission_result(&mut self, request_code: i32, permission: PermissionState) {
        self.dispatch(ScreenEvent::PermissionResult {
            request_code,
            permission,
        });
    }

    /// Host is destroying the screen.
    pub fn on_destroy(&mut self) {
        self.dispatch(ScreenEvent::Destroyed);
    }

    /// Feeds one event through the state machine and applies its effects.
    pub fn dispatch(&mut self, event: ScreenEvent) {
        let event = self.recheck(event);
        let next = transition(self.state, &event);
        if next.state != self.state {
            tracing::info!(from = ?self.state, to = ?next.state, "Screen state changed");
        }
        self.state = next.state;
        for effect in next.effects {
            self.apply(effect);
        }
    }

    fn recheck(&self, event: ScreenEvent) -> ScreenEvent {
        match event {
            ScreenEvent::PermissionResult {
                request_code,
                permission: answered,
            } => {
                let permission = self.permission.check();
                if permission != answered {
                    tracing::warn!(
                        request_code,
                        ?answered,
                        ?permission,
                        "Permission answer disagrees with provider"
                    );
                }
                ScreenEvent::PermissionResult {
                    request_code,
                    permission,
                }
            }
            other => other,
        }
    }

    fn apply(&mut self, effect: Effect) {
        match effect {
            Effect::RequestPermission { request_code } => {
                tracing::info!(request_code, "Requesting camera permission");
                let responder = PermissionResponder::new(request_code, self.events_tx.clone());
                self.permission.request(request_code, responder);
            }
            Effect::ShowNotice(message) => self.notifier.show(message),
            Effect::StartCamera => self.session.start_camera(),
            Effect::Finish(result) => {
                if matches!(result, ScanResult::Scanned(_)) {
                    self.stats.record_result();
                }
                self.result = Some(result);
                self.dispatch(ScreenEvent::Finished);
            }
            Effect::Teardown => self.teardown(),
        }
    }

    fn teardown(&mut self) {
        self.reporter.close();
        self.session.unbind();
        self.session.detach_analysis();
        self.worker.shutdown();
        tracing::info!(
            delivered = self.stats.frames_delivered(),
            analyzed = self.stats.frames_analyzed(),
            dropped = self.stats.frames_dropped(),
            "Screen torn down"
        );
    }

    /// Processes queued events without blocking.
    pub fn pump(&mut self) {
        while self.state != ScreenState::Terminated {
            match self.events_rx.try_recv() {
                Ok(event) => self.dispatch(event),
                Err(_) => break,
            }
        }
    }

    /// Runs the screen to completion on the calling thread.
    ///
    /// There is no timeout: without a frame that decodes, the screen waits
    /// until it is cancelled.
    pub fn run(mut self) -> ActivityResult {
        self.on_create();
        while self.state != ScreenState::Terminated {
            match self.events_rx.recv() {
                Ok(event) => self.dispatch(event),
                Err(_) => break,
            }
        }
        self.finish()
    }

    /// Ends the screen (destroying it if still running) and returns what
    /// the caller receives.
    pub fn finish(mut self) -> ActivityResult {
        if self.state != ScreenState::Terminated {
            self.on_destroy();
        }
        self.result
            .take()
            .unwrap_or(ScanResult::Cancelled)
            .into()
    }
}

impl Drop for ScanScreen {
    fn drop(&mut self) {
        if self.state != ScreenState::Terminated {
            self.on_destroy();
        }
    }
}
