use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    destination::FormatTable,
    engine::ImageFormat,
    error::{ConfigError, Result},
};

/// Main configuration for social-renderer
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Filesystem locations
    pub paths: PathsConfig,

    /// Frame rendering settings
    pub render: RenderConfig,

    /// Frame stitching settings
    pub stitch: StitchConfig,

    /// Output dimensions per destination
    pub formats: FormatTable,
}

impl Config {
    /// Load configuration from a TOML file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|_| ConfigError::FileNotFound { path: path.display().to_string() })?;

        let config: Config = toml::from_str(&content)
            .map_err(|e| ConfigError::ParseFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;
        Ok(config)
    }

    /// Save configuration to a TOML file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let content = toml::to_string_pretty(self)
            .map_err(|e| ConfigError::InvalidValue {
                key: "config".to_string(),
                value: e.to_string()
            })?;

        std::fs::write(path, content)?;
        Ok(())
    }

    /// Validate the configuration
    pub fn validate(&self) -> Result<()> {
        self.render.validate()?;
        self.stitch.validate()?;
        self.formats.validate()?;
        Ok(())
    }
}

/// Filesystem locations
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PathsConfig {
    /// Root for frame directories and finished videos
    pub tmp_path: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            tmp_path: PathBuf::from("tmp"),
        }
    }
}

/// Frame rendering configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Composition to render out of the bundle
    pub composition_id: String,

    /// Image format for intermediate frames
    pub image_format: ImageFormat,

    /// Renderer concurrency; unset leaves it to the engine
    #[serde(skip_serializing_if = "Option::is_none")]
    pub parallelism: Option<usize>,

    /// Program used by the process-backed renderer
    pub renderer_command: String,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            composition_id: "Main".to_string(),
            image_format: ImageFormat::Jpeg,
            parallelism: None,
            renderer_command: "remotion-bridge".to_string(),
        }
    }
}

impl RenderConfig {
    fn validate(&self) -> Result<()> {
        if self.composition_id.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "render.composition_id".to_string(),
                value: self.composition_id.clone()
            }.into());
        }

        if self.parallelism == Some(0) {
            return Err(ConfigError::InvalidValue {
                key: "render.parallelism".to_string(),
                value: "0".to_string()
            }.into());
        }

        if self.renderer_command.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "render.renderer_command".to_string(),
                value: self.renderer_command.clone()
            }.into());
        }

        Ok(())
    }
}

/// Frame stitching configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StitchConfig {
    /// Path to the ffmpeg binary
    pub ffmpeg_path: String,

    /// Video codec passed to ffmpeg
    pub codec: String,

    /// Constant rate factor (0-51, lower is better)
    pub crf: u8,
}

impl Default for StitchConfig {
    fn default() -> Self {
        Self {
            ffmpeg_path: "ffmpeg".to_string(),
            codec: "libx264".to_string(),
            crf: 18,
        }
    }
}

impl StitchConfig {
    fn validate(&self) -> Result<()> {
        if self.crf > 51 {
            return Err(ConfigError::InvalidValue {
                key: "stitch.crf".to_string(),
                value: self.crf.to_string()
            }.into());
        }

        if self.codec.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                key: "stitch.codec".to_string(),
                value: self.codec.clone()
            }.into());
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::destination::{Destination, PlatformFormat};
    use tempfile::tempdir;

    #[test]
    fn test_default_config_is_valid() {
        let config = Config::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.render.composition_id, "Main");
        assert_eq!(config.render.image_format, ImageFormat::Jpeg);
        assert!(config.render.parallelism.is_none());
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("test_config.toml");

        let mut original_config = Config::default();
        original_config.paths.tmp_path = dir.path().join("work");
        original_config.render.parallelism = Some(4);

        original_config.save_to_file(&file_path).unwrap();
        let loaded_config = Config::from_file(&file_path).unwrap();

        assert_eq!(original_config.paths.tmp_path, loaded_config.paths.tmp_path);
        assert_eq!(loaded_config.render.parallelism, Some(4));
        assert_eq!(original_config.formats, loaded_config.formats);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("partial.toml");
        std::fs::write(
            &file_path,
            "[formats.instagram]\nwidth = 1080\nheight = 1350\n",
        )
        .unwrap();

        let config = Config::from_file(&file_path).unwrap();
        assert_eq!(
            config.formats.get(Destination::Instagram),
            PlatformFormat::new(1080, 1350)
        );
        assert_eq!(
            config.formats.get(Destination::Youtube),
            PlatformFormat::new(1920, 1080)
        );
        assert_eq!(config.stitch.ffmpeg_path, "ffmpeg");
    }

    #[test]
    fn test_invalid_crf() {
        let mut config = Config::default();
        config.stitch.crf = 60;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_zero_parallelism_rejected() {
        let mut config = Config::default();
        config.render.parallelism = Some(0);
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_parse_error_names_the_bad_key() {
        let dir = tempdir().unwrap();
        let file_path = dir.path().join("bad.toml");
        std::fs::write(&file_path, "[stitch]\ncrf = \"high\"\n").unwrap();

        let err = Config::from_file(&file_path).unwrap_err();
        assert!(matches!(
            err,
            crate::RendererError::Config(ConfigError::ParseFailed { .. })
        ));
        assert!(err.to_string().contains("crf"));
    }

    #[test]
    fn test_missing_file() {
        let result = Config::from_file("/nonexistent/config.toml");
        assert!(result.is_err());
    }
}
