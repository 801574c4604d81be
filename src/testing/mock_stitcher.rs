//! Mock frame stitcher for testing.

use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::engine::{FrameStitcher, StitchOptions};
use crate::error::EngineError;
use crate::progress::ProgressReporter;

/// A stitch recorded for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedStitch {
    pub options: StitchOptions,
    /// Number of frame files present in the frame directory at stitch time.
    pub frames_seen: usize,
}

/// Mock implementation of the FrameStitcher trait.
///
/// Writes a small placeholder file at the output location instead of encoding.
#[derive(Debug)]
pub struct MockStitcher {
    stitches: Arc<RwLock<Vec<RecordedStitch>>>,
    /// If set, the next stitch will fail with this error.
    next_error: Arc<RwLock<Option<EngineError>>>,
}

impl Default for MockStitcher {
    fn default() -> Self {
        Self::new()
    }
}

impl MockStitcher {
    pub fn new() -> Self {
        Self {
            stitches: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    /// Configure the next stitch to fail with the given error.
    pub async fn set_next_error(&self, error: EngineError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn recorded_stitches(&self) -> Vec<RecordedStitch> {
        self.stitches.read().await.clone()
    }

    pub async fn stitch_count(&self) -> usize {
        self.stitches.read().await.len()
    }
}

#[async_trait]
impl FrameStitcher for MockStitcher {
    fn name(&self) -> &str {
        "mock"
    }

    async fn stitch_frames_to_video(
        &self,
        options: StitchOptions,
        progress: &dyn ProgressReporter,
    ) -> Result<(), EngineError> {
        let mut frames_seen = 0;
        let mut entries = tokio::fs::read_dir(&options.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            if entry.file_type().await?.is_file() {
                frames_seen += 1;
            }
        }

        self.stitches.write().await.push(RecordedStitch {
            options: options.clone(),
            frames_seen,
        });

        if let Some(err) = self.next_error.write().await.take() {
            return Err(err);
        }

        if !options.force && tokio::fs::try_exists(&options.output_location).await? {
            return Err(EngineError::OutputExists {
                path: options.output_location,
            });
        }

        for frame in 1..=frames_seen as u64 {
            progress.update(frame);
        }

        let placeholder = format!("{}x{}@{}", options.width, options.height, options.fps);
        tokio::fs::write(&options.output_location, placeholder).await?;
        Ok(())
    }
}
