//! Scan session: state machine, camera binding, frame analysis and
//! result reporting, tied together by [`ScanScreen`].
//!
//! # Flow
//!
//! ```text
//! permission gate → camera session → frame analyzer → result reporter
//!                        ↓                  ↑
//!                     preview       (single worker thread)
//! ```

mod analyzer;
mod binding;
mod reporter;
mod screen;
mod state;
mod stats;
mod surface;

pub use analyzer::{AnalysisWorker, FrameAnalyzer};
pub use binding::CameraSessionManager;
pub use reporter::{ResultReporter, ScanHandle};
pub use screen::{ScanScreen, ScreenDeps};
pub use state::{transition, Effect, ScreenEvent, ScreenState, Transition};
pub use stats::ScanStats;
pub use surface::{LogPreview, Notifier, Preview, StderrNotifier};
