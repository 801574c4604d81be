use std::fmt;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Image format for intermediate frames
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ImageFormat {
    #[default]
    Jpeg,
    Png,
}

impl ImageFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            Self::Jpeg => "jpeg",
            Self::Png => "png",
        }
    }

    /// Accepts both spellings of the jpeg extension
    pub fn matches_extension(&self, ext: &str) -> bool {
        match self {
            Self::Jpeg => ext.eq_ignore_ascii_case("jpeg") || ext.eq_ignore_ascii_case("jpg"),
            Self::Png => ext.eq_ignore_ascii_case("png"),
        }
    }
}

impl fmt::Display for ImageFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.extension())
    }
}

/// Properties handed to the bundle's own logic
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InputProps {
    pub filename: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub without_intro: Option<bool>,
}

impl InputProps {
    pub fn new<S: Into<String>>(filename: S) -> Self {
        Self {
            filename: filename.into(),
            without_intro: None,
        }
    }

    pub fn with_without_intro(mut self, without_intro: bool) -> Self {
        self.without_intro = Some(without_intro);
        self
    }
}

/// A composition as reported by the renderer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompositionDescriptor {
    pub id: String,

    #[serde(default)]
    pub width: Option<u32>,

    #[serde(default)]
    pub height: Option<u32>,

    #[serde(default)]
    pub fps: Option<f64>,

    #[serde(default)]
    pub duration_in_frames: Option<u64>,
}

impl CompositionDescriptor {
    pub fn new<S: Into<String>>(id: S) -> Self {
        Self {
            id: id.into(),
            width: None,
            height: None,
            fps: None,
            duration_in_frames: None,
        }
    }
}

/// An audio track the stitcher mixes under the frames
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioAsset {
    /// Local path of the downloaded asset
    pub src: PathBuf,

    /// Frame at which the asset starts playing
    #[serde(default)]
    pub start_frame: u64,

    #[serde(default = "default_volume")]
    pub volume: f32,
}

fn default_volume() -> f32 {
    1.0
}

/// Asset metadata produced by the frame renderer
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct AssetsInfo {
    pub audio: Vec<AudioAsset>,

    /// Index of the first frame file on disk
    pub first_frame_index: u64,

    /// printf-style frame file pattern, e.g. `element-%04d.jpeg`
    pub image_sequence_name: Option<String>,
}

/// Everything the renderer needs to produce frames
#[derive(Debug, Clone)]
pub struct RenderFramesOptions {
    pub composition: CompositionDescriptor,
    pub bundle: PathBuf,
    pub input_props: InputProps,
    pub composition_id: String,
    pub image_format: ImageFormat,
    /// `None` lets the engine pick
    pub parallelism: Option<usize>,
    pub output_dir: PathBuf,
}

/// What the renderer hands on to the stitcher
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RenderedFrames {
    #[serde(default)]
    pub assets_info: AssetsInfo,
    pub frame_count: u64,
    pub local_port: u16,
}

/// Everything the stitcher needs to produce a video
#[derive(Debug, Clone)]
pub struct StitchOptions {
    pub dir: PathBuf,
    pub fps: u32,
    pub width: u32,
    pub height: u32,
    pub output_location: PathBuf,
    /// Overwrite an existing output file
    pub force: bool,
    pub image_format: ImageFormat,
    pub assets_info: AssetsInfo,
    pub local_port: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_input_props_serialization() {
        let props = InputProps::new("1650000000");
        assert_eq!(serde_json::to_string(&props).unwrap(), r#"{"filename":"1650000000"}"#);

        let props = props.with_without_intro(true);
        assert_eq!(
            serde_json::to_string(&props).unwrap(),
            r#"{"filename":"1650000000","withoutIntro":true}"#
        );
    }

    #[test]
    fn test_composition_with_missing_metadata() {
        let parsed: Vec<CompositionDescriptor> =
            serde_json::from_str(r#"[{"id":"Main","width":1080,"durationInFrames":900},{"id":"Intro"}]"#)
                .unwrap();
        assert_eq!(parsed[0].id, "Main");
        assert_eq!(parsed[0].duration_in_frames, Some(900));
        assert_eq!(parsed[1], CompositionDescriptor::new("Intro"));
    }

    #[test]
    fn test_rendered_frames_defaults() {
        let parsed: RenderedFrames =
            serde_json::from_str(r#"{"frameCount":10,"localPort":3000,"assetsInfo":{"audio":[{"src":"/a.mp3"}]}}"#)
                .unwrap();
        assert_eq!(parsed.frame_count, 10);
        assert_eq!(parsed.assets_info.audio[0].volume, 1.0);
        assert_eq!(parsed.assets_info.first_frame_index, 0);
    }

    #[test]
    fn test_jpeg_extensions() {
        assert!(ImageFormat::Jpeg.matches_extension("JPG"));
        assert!(ImageFormat::Jpeg.matches_extension("jpeg"));
        assert!(!ImageFormat::Png.matches_extension("jpeg"));
    }
}
