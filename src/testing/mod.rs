//! Testing utilities and mock engine implementations.
//!
//! The mocks record every call so tests can assert on what the orchestrator
//! asked the engines to do, without a renderer or ffmpeg installed.
//!
//! # Example
//!
//! ```rust,ignore
//! use social_renderer::testing::{MockRenderer, MockStitcher, ProgressRecorder};
//!
//! let renderer = MockRenderer::new();
//! let stitcher = MockStitcher::new();
//! let recorder = ProgressRecorder::new();
//!
//! let orchestrator = VideoRenderOrchestrator::new(content, config, renderer, stitcher)
//!     .with_progress(recorder.factory());
//! ```

mod mock_renderer;
mod mock_stitcher;

use std::sync::{Arc, Mutex};

use crate::progress::{ProgressFactory, ProgressReporter};

pub use mock_renderer::{MockRenderer, RecordedQuery, RecordedRender};
pub use mock_stitcher::{MockStitcher, RecordedStitch};

#[derive(Debug, Default)]
struct ProgressLog {
    started: Option<u64>,
    updates: Vec<u64>,
    stopped: bool,
}

/// Progress reporter that remembers every call
#[derive(Debug, Clone, Default)]
pub struct RecordingProgress {
    log: Arc<Mutex<ProgressLog>>,
}

impl RecordingProgress {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn started_with(&self) -> Option<u64> {
        self.log.lock().map(|log| log.started).unwrap_or(None)
    }

    pub fn updates(&self) -> Vec<u64> {
        self.log.lock().map(|log| log.updates.clone()).unwrap_or_default()
    }

    pub fn is_stopped(&self) -> bool {
        self.log.lock().map(|log| log.stopped).unwrap_or(false)
    }
}

impl ProgressReporter for RecordingProgress {
    fn start(&self, total: u64) {
        if let Ok(mut log) = self.log.lock() {
            log.started = Some(total);
        }
    }

    fn update(&self, value: u64) {
        if let Ok(mut log) = self.log.lock() {
            log.updates.push(value);
        }
    }

    fn stop(&self) {
        if let Ok(mut log) = self.log.lock() {
            log.stopped = true;
        }
    }
}

/// Hands out [`RecordingProgress`] reporters and keeps them by label
#[derive(Debug, Clone, Default)]
pub struct ProgressRecorder {
    phases: Arc<Mutex<Vec<(String, RecordingProgress)>>>,
}

impl ProgressRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn factory(&self) -> ProgressFactory {
        let phases = Arc::clone(&self.phases);
        Box::new(move |label| {
            let reporter = RecordingProgress::new();
            if let Ok(mut phases) = phases.lock() {
                phases.push((label.to_string(), reporter.clone()));
            }
            Box::new(reporter)
        })
    }

    /// Reporters in creation order
    pub fn phases(&self) -> Vec<(String, RecordingProgress)> {
        self.phases.lock().map(|p| p.clone()).unwrap_or_default()
    }

    pub fn phase(&self, label: &str) -> Option<RecordingProgress> {
        self.phases()
            .into_iter()
            .find(|(name, _)| name == label)
            .map(|(_, reporter)| reporter)
    }
}
