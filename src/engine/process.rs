//! Bridge to an external renderer program.
//!
//! The program is invoked once to list compositions and once per render:
//!
//! ```text
//! <cmd> compositions <bundle> --props <json>
//!     stdout: JSON array of compositions
//! <cmd> render <bundle> --composition <id> --output-dir <dir>
//!       --image-format <fmt> --props <json> [--concurrency <n>]
//!     stdout: JSON lines
//!       {"event":"start","frameCount":N}
//!       {"event":"frame","frame":i}
//!       {"event":"done","frameCount":N,"localPort":P,"assetsInfo":{...}}
//! ```

use std::ffi::OsString;
use std::path::Path;
use std::process::Stdio;

use async_trait::async_trait;
use serde::Deserialize;
use tokio::io::{AsyncBufReadExt, AsyncReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, warn};

use super::traits::FrameRenderer;
use super::types::{CompositionDescriptor, InputProps, RenderFramesOptions, RenderedFrames};
use crate::error::EngineError;
use crate::progress::ProgressReporter;

#[derive(Debug, Deserialize)]
#[serde(tag = "event", rename_all = "lowercase")]
enum RenderEvent {
    Start {
        #[serde(rename = "frameCount")]
        frame_count: u64,
    },
    Frame {
        frame: u64,
    },
    Done(RenderedFrames),
}

/// [`FrameRenderer`] backed by an external program
#[derive(Debug, Clone)]
pub struct ProcessRenderer {
    program: String,
    leading_args: Vec<OsString>,
}

impl ProcessRenderer {
    pub fn new<S: Into<String>>(program: S) -> Self {
        Self {
            program: program.into(),
            leading_args: Vec::new(),
        }
    }

    /// Arguments placed before the subcommand, e.g. a script for an interpreter
    pub fn with_args<I, A>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = A>,
        A: Into<OsString>,
    {
        self.leading_args = args.into_iter().map(Into::into).collect();
        self
    }

    fn command(&self) -> Command {
        let mut cmd = Command::new(&self.program);
        cmd.args(&self.leading_args)
            .stdin(Stdio::null())
            .kill_on_drop(true);
        cmd
    }

    fn spawn_error(&self, e: std::io::Error) -> EngineError {
        if e.kind() == std::io::ErrorKind::NotFound {
            EngineError::ToolNotFound {
                tool: "renderer".to_string(),
                path: self.program.clone(),
            }
        } else {
            EngineError::Io(e)
        }
    }

    fn props_json(props: &InputProps) -> Result<String, EngineError> {
        serde_json::to_string(props).map_err(|e| EngineError::protocol("renderer", e.to_string()))
    }
}

#[async_trait]
impl FrameRenderer for ProcessRenderer {
    fn name(&self) -> &str {
        "process"
    }

    async fn get_compositions(
        &self,
        bundle: &Path,
        input_props: &InputProps,
    ) -> Result<Vec<CompositionDescriptor>, EngineError> {
        let props = Self::props_json(input_props)?;
        debug!("Listing compositions via {} {:?}", self.program, bundle);

        let output = self
            .command()
            .arg("compositions")
            .arg(bundle)
            .arg("--props")
            .arg(&props)
            .output()
            .await
            .map_err(|e| self.spawn_error(e))?;

        if !output.status.success() {
            return Err(EngineError::ProcessFailed {
                tool: self.program.clone(),
                status: output.status.to_string(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        serde_json::from_slice(&output.stdout).map_err(|e| {
            EngineError::protocol(&self.program, format!("invalid composition list: {}", e))
        })
    }

    async fn render_frames(
        &self,
        options: RenderFramesOptions,
        progress: &dyn ProgressReporter,
    ) -> Result<RenderedFrames, EngineError> {
        let props = Self::props_json(&options.input_props)?;

        let mut cmd = self.command();
        cmd.arg("render")
            .arg(&options.bundle)
            .arg("--composition")
            .arg(&options.composition_id)
            .arg("--output-dir")
            .arg(&options.output_dir)
            .arg("--image-format")
            .arg(options.image_format.extension())
            .arg("--props")
            .arg(&props);
        if let Some(concurrency) = options.parallelism {
            cmd.arg("--concurrency").arg(concurrency.to_string());
        }

        let mut child = cmd
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| self.spawn_error(e))?;

        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| EngineError::protocol(&self.program, "stdout not captured"))?;
        let mut stderr = child
            .stderr
            .take()
            .ok_or_else(|| EngineError::protocol(&self.program, "stderr not captured"))?;

        // Drain stderr alongside stdout so a chatty renderer cannot block.
        let stderr_task = tokio::spawn(async move {
            let mut buf = String::new();
            let _ = stderr.read_to_string(&mut buf).await;
            buf
        });

        let mut lines = BufReader::new(stdout).lines();
        let mut rendered = None;

        while let Some(line) = lines.next_line().await? {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            match serde_json::from_str::<RenderEvent>(line) {
                Ok(RenderEvent::Start { frame_count }) => progress.start(frame_count),
                Ok(RenderEvent::Frame { frame }) => progress.update(frame),
                Ok(RenderEvent::Done(frames)) => rendered = Some(frames),
                Err(_) => warn!("Ignoring renderer output: {}", line),
            }
        }

        let status = child.wait().await?;
        let stderr_output = stderr_task.await.unwrap_or_default();

        if !status.success() {
            return Err(EngineError::ProcessFailed {
                tool: self.program.clone(),
                status: status.to_string(),
                stderr: stderr_output.trim().to_string(),
            });
        }

        rendered.ok_or_else(|| EngineError::protocol(&self.program, "render finished without a done event"))
    }
}
