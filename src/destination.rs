//! Destination platforms and their output dimensions.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;

/// Platform a rendered video is published to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Destination {
    Instagram,
    Youtube,
}

impl Destination {
    pub const ALL: [Destination; 2] = [Destination::Instagram, Destination::Youtube];

    /// Lowercase key used in configuration and on the command line
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Instagram => "instagram",
            Self::Youtube => "youtube",
        }
    }

    /// Instagram posts skip the intro sequence.
    pub fn without_intro(&self) -> bool {
        matches!(self, Self::Instagram)
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Destination {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "instagram" => Ok(Self::Instagram),
            "youtube" => Ok(Self::Youtube),
            _ => Err(ConfigError::InvalidValue {
                key: "destination".to_string(),
                value: s.to_string(),
            }),
        }
    }
}

/// Output frame size for a destination
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlatformFormat {
    pub width: u32,
    pub height: u32,
}

impl PlatformFormat {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for PlatformFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// Destination → dimensions lookup table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormatTable {
    pub instagram: PlatformFormat,
    pub youtube: PlatformFormat,
}

impl Default for FormatTable {
    fn default() -> Self {
        Self {
            instagram: PlatformFormat::new(1080, 1080),
            youtube: PlatformFormat::new(1920, 1080),
        }
    }
}

impl FormatTable {
    pub fn get(&self, destination: Destination) -> PlatformFormat {
        match destination {
            Destination::Instagram => self.instagram,
            Destination::Youtube => self.youtube,
        }
    }

    pub(crate) fn validate(&self) -> Result<(), ConfigError> {
        for destination in Destination::ALL {
            let format = self.get(destination);
            // yuv420p needs even dimensions
            if format.width == 0
                || format.height == 0
                || format.width % 2 != 0
                || format.height % 2 != 0
            {
                return Err(ConfigError::InvalidValue {
                    key: format!("formats.{}", destination),
                    value: format.to_string(),
                });
            }
        }
        Ok(())
    }
}
