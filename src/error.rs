use std::path::PathBuf;

use thiserror::Error;

/// Main error type for the social-renderer library
#[derive(Error, Debug)]
pub enum RendererError {
    #[error("Engine error: {0}")]
    Engine(#[from] EngineError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Content error: {0}")]
    Content(#[from] ContentError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Errors raised by the rendering and stitching engines
#[derive(Error, Debug)]
pub enum EngineError {
    #[error("{tool} not found at '{path}'")]
    ToolNotFound { tool: String, path: String },

    #[error("{tool} exited with {status}: {stderr}")]
    ProcessFailed {
        tool: String,
        status: String,
        stderr: String,
    },

    #[error("Unexpected output from {tool}: {reason}")]
    Protocol { tool: String, reason: String },

    #[error("Output file already exists: {}", path.display())]
    OutputExists { path: PathBuf },

    #[error("No frames found in {}", dir.display())]
    NoFrames { dir: PathBuf },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to parse configuration file {path}: {reason}")]
    ParseFailed { path: String, reason: String },

    #[error("Invalid configuration value: {key} = {value}")]
    InvalidValue { key: String, value: String },

    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },
}

/// Content descriptor errors
#[derive(Error, Debug)]
pub enum ContentError {
    #[error("Content file not found: {path}")]
    FileNotFound { path: String },

    #[error("Failed to parse content file {path}: {reason}")]
    ParseFailed { path: String, reason: String },

    #[error("Invalid content: {reason}")]
    Invalid { reason: String },
}

/// Convenience type alias for Results using RendererError
pub type Result<T> = std::result::Result<T, RendererError>;

impl EngineError {
    pub fn protocol<T: Into<String>, R: Into<String>>(tool: T, reason: R) -> Self {
        Self::Protocol {
            tool: tool.into(),
            reason: reason.into(),
        }
    }
}

impl RendererError {
    /// Get a user-friendly error message
    pub fn user_message(&self) -> String {
        match self {
            Self::Engine(EngineError::ToolNotFound { tool, path }) => {
                format!("Could not run {} ('{}'). Please check it is installed and on your PATH.", tool, path)
            }
            Self::Config(ConfigError::FileNotFound { path }) => {
                format!("Configuration file '{}' not found.", path)
            }
            Self::Content(ContentError::FileNotFound { path }) => {
                format!("Content file '{}' not found.", path)
            }
            _ => self.to_string(),
        }
    }
}
