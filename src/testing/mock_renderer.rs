//! Mock frame renderer for testing.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::engine::{
    AssetsInfo, CompositionDescriptor, FrameRenderer, InputProps, RenderFramesOptions,
    RenderedFrames,
};
use crate::error::EngineError;
use crate::progress::ProgressReporter;

/// A composition lookup recorded for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedQuery {
    pub bundle: PathBuf,
    pub input_props: InputProps,
}

/// A render recorded for test assertions.
#[derive(Debug, Clone)]
pub struct RecordedRender {
    pub options: RenderFramesOptions,
    /// Whether the output directory existed when rendering began.
    pub output_dir_existed: bool,
}

/// Mock implementation of the FrameRenderer trait.
///
/// Writes `element-NNNN.<ext>` placeholder files into the output directory
/// and reports one progress update per frame.
///
/// # Example
///
/// ```rust,ignore
/// use social_renderer::testing::MockRenderer;
///
/// let renderer = MockRenderer::new();
/// renderer.set_compositions(vec![CompositionDescriptor::new("Intro")]).await;
///
/// // "Main" is gone, so execute() reports CompositionNotFound
/// assert_eq!(renderer.render_count().await, 0);
/// ```
#[derive(Debug)]
pub struct MockRenderer {
    compositions: Arc<RwLock<Vec<CompositionDescriptor>>>,
    frame_count: Arc<RwLock<u64>>,
    local_port: u16,
    queries: Arc<RwLock<Vec<RecordedQuery>>>,
    renders: Arc<RwLock<Vec<RecordedRender>>>,
    /// If set, the next render will fail with this error.
    next_error: Arc<RwLock<Option<EngineError>>>,
}

impl Default for MockRenderer {
    fn default() -> Self {
        Self::new()
    }
}

impl MockRenderer {
    /// Create a mock renderer exposing a single "Main" composition.
    pub fn new() -> Self {
        Self {
            compositions: Arc::new(RwLock::new(vec![CompositionDescriptor::new("Main")])),
            frame_count: Arc::new(RwLock::new(3)),
            local_port: 3000,
            queries: Arc::new(RwLock::new(Vec::new())),
            renders: Arc::new(RwLock::new(Vec::new())),
            next_error: Arc::new(RwLock::new(None)),
        }
    }

    pub async fn set_compositions(&self, compositions: Vec<CompositionDescriptor>) {
        *self.compositions.write().await = compositions;
    }

    pub async fn set_frame_count(&self, frame_count: u64) {
        *self.frame_count.write().await = frame_count;
    }

    /// Configure the next render to fail with the given error.
    pub async fn set_next_error(&self, error: EngineError) {
        *self.next_error.write().await = Some(error);
    }

    pub async fn recorded_queries(&self) -> Vec<RecordedQuery> {
        self.queries.read().await.clone()
    }

    pub async fn recorded_renders(&self) -> Vec<RecordedRender> {
        self.renders.read().await.clone()
    }

    pub async fn render_count(&self) -> usize {
        self.renders.read().await.len()
    }

    async fn take_error(&self) -> Option<EngineError> {
        self.next_error.write().await.take()
    }
}

#[async_trait]
impl FrameRenderer for MockRenderer {
    fn name(&self) -> &str {
        "mock"
    }

    async fn get_compositions(
        &self,
        bundle: &Path,
        input_props: &InputProps,
    ) -> Result<Vec<CompositionDescriptor>, EngineError> {
        self.queries.write().await.push(RecordedQuery {
            bundle: bundle.to_path_buf(),
            input_props: input_props.clone(),
        });
        Ok(self.compositions.read().await.clone())
    }

    async fn render_frames(
        &self,
        options: RenderFramesOptions,
        progress: &dyn ProgressReporter,
    ) -> Result<RenderedFrames, EngineError> {
        let output_dir_existed = options.output_dir.is_dir();
        self.renders.write().await.push(RecordedRender {
            options: options.clone(),
            output_dir_existed,
        });

        let frame_count = *self.frame_count.read().await;
        progress.start(frame_count);

        for frame in 0..frame_count {
            let name = format!("element-{:04}.{}", frame, options.image_format.extension());
            tokio::fs::write(options.output_dir.join(name), b"frame").await?;
            progress.update(frame + 1);
        }

        if let Some(err) = self.take_error().await {
            return Err(err);
        }

        Ok(RenderedFrames {
            assets_info: AssetsInfo::default(),
            frame_count,
            local_port: self.local_port,
        })
    }
}
