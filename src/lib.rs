//! # Social Renderer
//!
//! Render a composition out of a prebuilt bundle and stitch it into a video
//! sized for Instagram or YouTube.
//!
//! The crate does no rendering or encoding itself. It finds the composition,
//! manages a scratch directory for frames, picks the output dimensions for the
//! destination, reports progress and cleans up; the work is delegated to a
//! [`FrameRenderer`](engine::FrameRenderer) and a
//! [`FrameStitcher`](engine::FrameStitcher).
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use std::sync::Arc;
//!
//! use social_renderer::{
//!     config::Config,
//!     content::ContentDescriptor,
//!     destination::Destination,
//!     engine::{FfmpegStitcher, ProcessRenderer},
//!     RenderOutcome, VideoRenderOrchestrator,
//! };
//!
//! # #[tokio::main]
//! # async fn main() -> anyhow::Result<()> {
//! let config = Config::default();
//! let renderer = Arc::new(ProcessRenderer::new(config.render.renderer_command.clone()));
//! let stitcher = Arc::new(FfmpegStitcher::new(config.stitch.clone()));
//! let content = ContentDescriptor::new("1650000000", 30);
//!
//! let orchestrator = VideoRenderOrchestrator::new(content, config, renderer, stitcher);
//! match orchestrator.execute("build/bundle", Destination::Instagram).await? {
//!     RenderOutcome::Rendered(path) => println!("{}", path.display()),
//!     RenderOutcome::CompositionNotFound { composition_id } => {
//!         eprintln!("no {} composition in bundle", composition_id)
//!     }
//! }
//! # Ok(())
//! # }
//! ```
//!
//! ## Architecture
//!
//! - [`orchestrator`] - The render pipeline
//! - [`engine`] - Renderer and stitcher traits plus the shipped adapters
//! - [`progress`] - Progress reporting
//! - [`destination`] - Platforms and their dimensions
//! - [`config`] - Configuration management
//! - [`testing`] - Recording mocks of the engines

pub mod config;
pub mod content;
pub mod destination;
pub mod engine;
pub mod error;
pub mod orchestrator;
pub mod progress;
pub mod testing;

// Re-export commonly used types for convenience
pub use crate::{
    config::Config,
    content::ContentDescriptor,
    destination::{Destination, PlatformFormat},
    error::{RendererError, Result},
    orchestrator::{RenderOutcome, VideoRenderOrchestrator},
};
