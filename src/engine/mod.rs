//! # Engines
//!
//! The orchestrator delegates all rendering and encoding to a [`FrameRenderer`]
//! and a [`FrameStitcher`]. Two implementations ship with the crate: a bridge
//! to an external renderer program and an ffmpeg-based stitcher.

pub mod ffmpeg;
pub mod process;
pub mod traits;
pub mod types;

// Re-exports for convenience
pub use ffmpeg::FfmpegStitcher;
pub use process::ProcessRenderer;
pub use traits::{FrameRenderer, FrameStitcher};
pub use types::{
    AssetsInfo, AudioAsset, CompositionDescriptor, ImageFormat, InputProps, RenderFramesOptions,
    RenderedFrames, StitchOptions,
};
