//! # Video Render Orchestrator
//!
//! Sequences a single render: find the composition in the bundle, render it to
//! frames in a scratch directory, stitch the frames into a platform-sized video
//! and clean up.

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use tempfile::TempDir;
use tracing::{debug, error, info, warn};

use crate::{
    config::Config,
    content::ContentDescriptor,
    destination::Destination,
    engine::{
        CompositionDescriptor, FrameRenderer, FrameStitcher, InputProps, RenderFramesOptions,
        StitchOptions,
    },
    error::Result,
    progress::{terminal_progress, ProgressFactory},
};

const COMPONENT: &str = "VideoRenderOrchestrator";
const RENDER_PHASE: &str = "VideoRenderOrchestrator render";
const STITCH_PHASE: &str = "VideoRenderOrchestrator stitch";

/// Result of a render that did not fail
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RenderOutcome {
    /// The video was written to this path
    Rendered(PathBuf),

    /// The bundle has no composition with the configured id
    CompositionNotFound { composition_id: String },
}

impl RenderOutcome {
    pub fn output_path(&self) -> Option<&Path> {
        match self {
            Self::Rendered(path) => Some(path),
            Self::CompositionNotFound { .. } => None,
        }
    }

    pub fn is_rendered(&self) -> bool {
        matches!(self, Self::Rendered(_))
    }
}

/// Scratch directory for one render's frames, removed when dropped
#[derive(Debug)]
pub struct FramesDir {
    dir: TempDir,
}

impl FramesDir {
    /// Create a fresh `frames-XXXXXX` directory under `root`
    pub async fn create(root: &Path) -> io::Result<Self> {
        let root = root.to_path_buf();
        let dir = tokio::task::spawn_blocking(move || {
            tempfile::Builder::new().prefix("frames-").tempdir_in(root)
        })
        .await
        .map_err(|e| io::Error::new(io::ErrorKind::Other, e))??;
        Ok(Self { dir })
    }

    pub fn path(&self) -> &Path {
        self.dir.path()
    }

    /// Remove the directory and everything in it, reporting failures
    pub async fn remove(self) -> io::Result<()> {
        tokio::task::spawn_blocking(move || self.dir.close())
            .await
            .map_err(|e| io::Error::new(io::ErrorKind::Other, e))?
    }
}

/// Renders one piece of content to video for a destination platform
///
/// The pipeline has four steps:
/// 1. Composition lookup - ask the renderer which compositions the bundle has
/// 2. Frame rendering - render the composition into a scratch directory
/// 3. Stitching - encode the frames at the destination's dimensions
/// 4. Cleanup - remove the scratch directory
pub struct VideoRenderOrchestrator {
    content: ContentDescriptor,
    config: Config,
    renderer: Arc<dyn FrameRenderer>,
    stitcher: Arc<dyn FrameStitcher>,
    progress: ProgressFactory,
}

impl VideoRenderOrchestrator {
    /// Create an orchestrator drawing progress bars on the terminal
    pub fn new(
        content: ContentDescriptor,
        config: Config,
        renderer: Arc<dyn FrameRenderer>,
        stitcher: Arc<dyn FrameStitcher>,
    ) -> Self {
        Self {
            content,
            config,
            renderer,
            stitcher,
            progress: terminal_progress(),
        }
    }

    /// Replace the progress reporting
    pub fn with_progress(mut self, progress: ProgressFactory) -> Self {
        self.progress = progress;
        self
    }

    pub fn content(&self) -> &ContentDescriptor {
        &self.content
    }

    /// Where the finished video for this content is written
    ///
    /// Creates the temp root if needed; the path is absolute with symlinks
    /// resolved, exactly as returned by [`execute`](Self::execute).
    pub async fn output_path(&self) -> Result<PathBuf> {
        let tmp_root = self.tmp_root().await?;
        Ok(tmp_root.join(self.content.output_file_name()))
    }

    async fn tmp_root(&self) -> io::Result<PathBuf> {
        let tmp_root = &self.config.paths.tmp_path;
        tokio::fs::create_dir_all(tmp_root).await?;
        tokio::fs::canonicalize(tmp_root).await
    }

    /// List the compositions in `bundle` as seen with this content's props
    pub async fn list_compositions<P: AsRef<Path>>(
        &self,
        bundle: P,
    ) -> Result<Vec<CompositionDescriptor>> {
        let bundle = bundle.as_ref();
        info!(component = COMPONENT, "Getting compositions from {}", bundle.display());

        let props = InputProps::new(self.content.timestamp.as_str());
        let compositions = self.renderer.get_compositions(bundle, &props).await?;
        debug!(component = COMPONENT, "Found {} compositions", compositions.len());
        Ok(compositions)
    }

    /// Render the content for `destination`
    ///
    /// # Arguments
    ///
    /// * `bundle` - Path to the prebuilt bundle, handed to the renderer as is
    /// * `destination` - Platform that decides the output size and intro
    pub async fn execute<P: AsRef<Path>>(
        &self,
        bundle: P,
        destination: Destination,
    ) -> Result<RenderOutcome> {
        let bundle = bundle.as_ref();
        self.content.validate()?;

        let composition_id = self.config.render.composition_id.as_str();
        let compositions = self.list_compositions(bundle).await?;
        let Some(composition) = compositions.into_iter().find(|c| c.id == composition_id) else {
            error!(component = COMPONENT, composition_id, "Video not found");
            return Ok(RenderOutcome::CompositionNotFound {
                composition_id: composition_id.to_string(),
            });
        };

        let tmp_root = self.tmp_root().await?;

        // Removed on every exit path from here on
        let frames_dir = FramesDir::create(&tmp_root).await?;
        let output_path = tmp_root.join(self.content.output_file_name());
        debug!(component = COMPONENT, "Frames go to {}", frames_dir.path().display());

        info!(component = COMPONENT, "Rendering frames");
        let image_format = self.config.render.image_format;
        let render_options = RenderFramesOptions {
            composition,
            bundle: bundle.to_path_buf(),
            input_props: InputProps::new(self.content.timestamp.as_str())
                .with_without_intro(destination.without_intro()),
            composition_id: composition_id.to_string(),
            image_format,
            parallelism: self.config.render.parallelism,
            output_dir: frames_dir.path().to_path_buf(),
        };

        let render_progress = (self.progress)(RENDER_PHASE);
        let rendered = self
            .renderer
            .render_frames(render_options, render_progress.as_ref())
            .await;
        render_progress.stop();
        let rendered = rendered?;
        debug!(
            component = COMPONENT,
            frame_count = rendered.frame_count,
            local_port = rendered.local_port,
            "Frames rendered"
        );

        info!(component = COMPONENT, "Stitching frames");
        let format = self.config.formats.get(destination);
        let stitch_options = StitchOptions {
            dir: frames_dir.path().to_path_buf(),
            fps: self.content.fps,
            width: format.width,
            height: format.height,
            output_location: output_path.clone(),
            force: true,
            image_format,
            assets_info: rendered.assets_info,
            local_port: rendered.local_port,
        };

        let stitch_progress = (self.progress)(STITCH_PHASE);
        stitch_progress.start(rendered.frame_count);
        let stitched = self
            .stitcher
            .stitch_frames_to_video(stitch_options, stitch_progress.as_ref())
            .await;
        stitch_progress.stop();
        stitched?;

        if let Err(e) = frames_dir.remove().await {
            warn!(component = COMPONENT, "Failed to remove frames directory: {}", e);
            return Err(e.into());
        }

        info!(
            component = COMPONENT,
            destination = %destination,
            "Video saved to {}",
            output_path.display()
        );
        Ok(RenderOutcome::Rendered(output_path))
    }
}
