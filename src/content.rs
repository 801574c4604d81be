//! Content descriptors supplied by the caller for a single render.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{ContentError, Result};

/// What to render: the timestamp keys both the bundle's input props and the
/// output file name.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentDescriptor {
    pub timestamp: String,

    /// Output frame rate
    pub fps: u32,

    /// Any other fields of the content file, kept but unused here
    #[serde(flatten)]
    pub extra: BTreeMap<String, serde_json::Value>,
}

impl ContentDescriptor {
    pub fn new<S: Into<String>>(timestamp: S, fps: u32) -> Self {
        Self {
            timestamp: timestamp.into(),
            fps,
            extra: BTreeMap::new(),
        }
    }

    /// Load a content descriptor from a JSON file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path).map_err(|_| ContentError::FileNotFound {
            path: path.display().to_string(),
        })?;

        let content: ContentDescriptor =
            serde_json::from_str(&raw).map_err(|e| ContentError::ParseFailed {
                path: path.display().to_string(),
                reason: e.to_string(),
            })?;

        content.validate()?;
        Ok(content)
    }

    /// Validate the descriptor
    pub fn validate(&self) -> Result<()> {
        if self.timestamp.trim().is_empty() {
            return Err(ContentError::Invalid {
                reason: "timestamp is empty".to_string(),
            }
            .into());
        }

        // The timestamp becomes a file name under the temp root.
        if self.timestamp.contains(['/', '\\']) || self.timestamp.contains("..") {
            return Err(ContentError::Invalid {
                reason: format!("timestamp '{}' is not a valid file name", self.timestamp),
            }
            .into());
        }

        if self.fps == 0 {
            return Err(ContentError::Invalid {
                reason: "fps must be positive".to_string(),
            }
            .into());
        }

        Ok(())
    }

    /// File name of the rendered video
    pub fn output_file_name(&self) -> String {
        format!("{}.mp4", self.timestamp)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_load_from_json_keeps_extra_fields() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("content.json");
        std::fs::write(
            &path,
            r#"{"timestamp":"1650000000","fps":30,"title":"Weekly news","items":[1,2]}"#,
        )
        .unwrap();

        let content = ContentDescriptor::from_file(&path).unwrap();
        assert_eq!(content.timestamp, "1650000000");
        assert_eq!(content.fps, 30);
        assert_eq!(content.extra["title"], "Weekly news");
        assert_eq!(content.output_file_name(), "1650000000.mp4");
    }

    #[test]
    fn test_missing_file() {
        let err = ContentDescriptor::from_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(
            err,
            crate::RendererError::Content(ContentError::FileNotFound { .. })
        ));
    }

    #[test]
    fn test_zero_fps_rejected() {
        assert!(ContentDescriptor::new("123", 0).validate().is_err());
    }

    #[test]
    fn test_path_like_timestamp_rejected() {
        assert!(ContentDescriptor::new("../escape", 30).validate().is_err());
        assert!(ContentDescriptor::new("a/b", 30).validate().is_err());
        assert!(ContentDescriptor::new("  ", 30).validate().is_err());
        assert!(ContentDescriptor::new("2024-05-01", 30).validate().is_ok());
    }
}
