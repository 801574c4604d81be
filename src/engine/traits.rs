//! Seams between the orchestrator and the engines doing the actual work.

use std::path::Path;

use async_trait::async_trait;

use super::types::{CompositionDescriptor, InputProps, RenderFramesOptions, RenderedFrames, StitchOptions};
use crate::error::EngineError;
use crate::progress::ProgressReporter;

/// Turns a composition inside a bundle into still frames.
#[async_trait]
pub trait FrameRenderer: Send + Sync {
    /// Returns the name of this renderer implementation.
    fn name(&self) -> &str;

    /// Lists the compositions available in `bundle`.
    async fn get_compositions(
        &self,
        bundle: &Path,
        input_props: &InputProps,
    ) -> Result<Vec<CompositionDescriptor>, EngineError>;

    /// Renders every frame of the composition into `options.output_dir`.
    ///
    /// Implementations call `progress.start` once the frame count is known and
    /// `progress.update` as frames complete.
    async fn render_frames(
        &self,
        options: RenderFramesOptions,
        progress: &dyn ProgressReporter,
    ) -> Result<RenderedFrames, EngineError>;
}

/// Encodes a directory of frames into a video file.
#[async_trait]
pub trait FrameStitcher: Send + Sync {
    /// Returns the name of this stitcher implementation.
    fn name(&self) -> &str;

    /// Writes the video to `options.output_location`, reporting encoded frames
    /// through `progress.update`.
    async fn stitch_frames_to_video(
        &self,
        options: StitchOptions,
        progress: &dyn ProgressReporter,
    ) -> Result<(), EngineError>;
}
