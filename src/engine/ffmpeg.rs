use std::path::{Path, PathBuf};
use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tracing::{debug, info};

use super::traits::FrameStitcher;
use super::types::{AssetsInfo, ImageFormat, StitchOptions};
use crate::config::StitchConfig;
use crate::error::EngineError;
use crate::progress::ProgressReporter;

/// Numbered frame files found in a frame directory
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FrameSequence {
    /// printf-style pattern relative to the frame directory
    pub pattern: String,
    pub start_number: u64,
    pub count: u64,
}

/// Frame stitcher shelling out to the `ffmpeg` binary
#[derive(Debug, Clone)]
pub struct FfmpegStitcher {
    config: StitchConfig,
}

impl FfmpegStitcher {
    pub fn new(config: StitchConfig) -> Self {
        Self { config }
    }

    pub async fn is_available(&self) -> bool {
        Command::new(&self.config.ffmpeg_path)
            .arg("-version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|status| status.success())
            .unwrap_or(false)
    }

    /// Build the ffmpeg argument list for a stitch
    pub fn build_args(&self, options: &StitchOptions, sequence: &FrameSequence) -> Vec<String> {
        let mut args = vec![
            "-hide_banner".to_string(),
            "-loglevel".to_string(),
            "error".to_string(),
        ];
        if options.force {
            args.push("-y".to_string());
        } else {
            args.push("-n".to_string());
        }

        args.extend([
            "-framerate".to_string(),
            options.fps.to_string(),
            "-start_number".to_string(),
            sequence.start_number.to_string(),
            "-i".to_string(),
            options.dir.join(&sequence.pattern).display().to_string(),
        ]);

        let audio = &options.assets_info.audio;
        for asset in audio {
            args.extend(["-i".to_string(), asset.src.display().to_string()]);
        }

        let mut filter = format!(
            "[0:v]scale={}:{},format=yuv420p[vout]",
            options.width, options.height
        );
        for (i, asset) in audio.iter().enumerate() {
            let delay_ms = asset.start_frame.saturating_mul(1000) / u64::from(options.fps);
            filter.push_str(&format!(
                ";[{}:a]adelay={}|{},volume={}[a{}]",
                i + 1,
                delay_ms,
                delay_ms,
                asset.volume,
                i
            ));
        }
        if !audio.is_empty() {
            filter.push(';');
            for i in 0..audio.len() {
                filter.push_str(&format!("[a{}]", i));
            }
            filter.push_str(&format!("amix=inputs={}:dropout_transition=0[aout]", audio.len()));
        }

        args.extend(["-filter_complex".to_string(), filter]);
        args.extend(["-map".to_string(), "[vout]".to_string()]);
        if !audio.is_empty() {
            args.extend([
                "-map".to_string(),
                "[aout]".to_string(),
                "-c:a".to_string(),
                "aac".to_string(),
            ]);
        }

        let duration = sequence.count as f64 / f64::from(options.fps);
        args.extend([
            "-c:v".to_string(),
            self.config.codec.clone(),
            "-crf".to_string(),
            self.config.crf.to_string(),
            "-t".to_string(),
            format!("{:.3}", duration),
            "-progress".to_string(),
            "pipe:2".to_string(),
            "-nostats".to_string(),
            options.output_location.display().to_string(),
        ]);

        args
    }
}

#[async_trait]
impl FrameStitcher for FfmpegStitcher {
    fn name(&self) -> &str {
        "ffmpeg"
    }

    async fn stitch_frames_to_video(
        &self,
        options: StitchOptions,
        progress: &dyn ProgressReporter,
    ) -> Result<(), EngineError> {
        if !options.force && tokio::fs::try_exists(&options.output_location).await? {
            return Err(EngineError::OutputExists {
                path: options.output_location.clone(),
            });
        }

        let sequence =
            detect_sequence(&options.dir, options.image_format, &options.assets_info).await?;
        info!(
            "Stitching {} frames ({}) into {:?}",
            sequence.count, sequence.pattern, options.output_location
        );

        let args = self.build_args(&options, &sequence);
        debug!("ffmpeg {}", args.join(" "));

        let mut child = Command::new(&self.config.ffmpeg_path)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    EngineError::ToolNotFound {
                        tool: "ffmpeg".to_string(),
                        path: self.config.ffmpeg_path.clone(),
                    }
                } else {
                    EngineError::Io(e)
                }
            })?;

        let stderr = child
            .stderr
            .take()
            .ok_or_else(|| EngineError::protocol("ffmpeg", "stderr not captured"))?;
        let mut lines = BufReader::new(stderr).lines();
        let mut error_output = String::new();

        while let Some(line) = lines.next_line().await? {
            match parse_progress_frame(&line) {
                Some(frame) => progress.update(frame),
                None if is_progress_key(&line) => {}
                None => {
                    error_output.push_str(&line);
                    error_output.push('\n');
                }
            }
        }

        let status = child.wait().await?;
        if !status.success() {
            return Err(EngineError::ProcessFailed {
                tool: "ffmpeg".to_string(),
                status: status.to_string(),
                stderr: error_output.trim().to_string(),
            });
        }

        Ok(())
    }
}

/// `frame=42` from ffmpeg's `-progress` output
fn parse_progress_frame(line: &str) -> Option<u64> {
    line.trim().strip_prefix("frame=")?.trim().parse().ok()
}

fn is_progress_key(line: &str) -> bool {
    let Some((key, _)) = line.split_once('=') else {
        return false;
    };
    !key.is_empty() && key.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
}

/// Find the numbered frame files in `dir`
///
/// A pattern reported by the renderer wins; otherwise it is derived from the
/// file names, which must share a prefix and end in a zero-padded number.
pub async fn detect_sequence(
    dir: &Path,
    image_format: ImageFormat,
    assets_info: &AssetsInfo,
) -> Result<FrameSequence, EngineError> {
    let mut frames: Vec<PathBuf> = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        let matches = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| image_format.matches_extension(e))
            .unwrap_or(false);
        if matches {
            frames.push(path);
        }
    }

    if frames.is_empty() {
        return Err(EngineError::NoFrames {
            dir: dir.to_path_buf(),
        });
    }
    let count = frames.len() as u64;

    if let Some(pattern) = &assets_info.image_sequence_name {
        return Ok(FrameSequence {
            pattern: pattern.clone(),
            start_number: assets_info.first_frame_index,
            count,
        });
    }

    // Numeric order, not lexical: unpadded names sort f-10 before f-8
    let mut numbered = Vec::with_capacity(frames.len());
    for frame in &frames {
        numbered.push(split_frame_name(frame)?);
    }
    numbered.sort_by_key(|f| f.number);

    let first = &numbered[0];
    let padded = first.width > 1 && numbered.iter().all(|f| f.width == first.width);
    let pattern = if padded {
        format!("{}%0{}d.{}", first.prefix, first.width, first.ext)
    } else {
        format!("{}%d.{}", first.prefix, first.ext)
    };

    Ok(FrameSequence {
        pattern,
        start_number: first.number,
        count,
    })
}

struct FrameName {
    prefix: String,
    ext: String,
    number: u64,
    width: usize,
}

fn split_frame_name(path: &Path) -> Result<FrameName, EngineError> {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or_default();
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or_default();

    let width = stem.chars().rev().take_while(|c| c.is_ascii_digit()).count();
    if width == 0 {
        return Err(EngineError::protocol(
            "ffmpeg",
            format!("frame file {:?} is not numbered", path),
        ));
    }
    let (prefix, digits) = stem.split_at(stem.len() - width);
    let number = digits
        .parse()
        .map_err(|_| EngineError::protocol("ffmpeg", format!("bad frame number in {:?}", path)))?;

    Ok(FrameName {
        prefix: prefix.to_string(),
        ext: ext.to_string(),
        number,
        width,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::AudioAsset;
    use crate::testing::RecordingProgress;
    use tempfile::tempdir;

    fn options(dir: &Path, output: PathBuf) -> StitchOptions {
        StitchOptions {
            dir: dir.to_path_buf(),
            fps: 30,
            width: 1080,
            height: 1080,
            output_location: output,
            force: true,
            image_format: ImageFormat::Jpeg,
            assets_info: AssetsInfo::default(),
            local_port: 3000,
        }
    }

    fn write_frames(dir: &Path, names: &[&str]) {
        for name in names {
            std::fs::write(dir.join(name), b"frame").unwrap();
        }
    }

    #[tokio::test]
    async fn test_detect_sequence_from_file_names() {
        let dir = tempdir().unwrap();
        write_frames(
            dir.path(),
            &["element-0003.jpeg", "element-0001.jpeg", "element-0002.jpeg", "notes.txt"],
        );

        let sequence = detect_sequence(dir.path(), ImageFormat::Jpeg, &AssetsInfo::default())
            .await
            .unwrap();

        assert_eq!(
            sequence,
            FrameSequence {
                pattern: "element-%04d.jpeg".to_string(),
                start_number: 1,
                count: 3,
            }
        );
    }

    #[tokio::test]
    async fn test_detect_sequence_unpadded_names() {
        let dir = tempdir().unwrap();
        write_frames(dir.path(), &["f-10.jpeg", "f-8.jpeg", "f-11.jpeg", "f-9.jpeg"]);

        let sequence = detect_sequence(dir.path(), ImageFormat::Jpeg, &AssetsInfo::default())
            .await
            .unwrap();

        assert_eq!(
            sequence,
            FrameSequence {
                pattern: "f-%d.jpeg".to_string(),
                start_number: 8,
                count: 4,
            }
        );
    }

    #[tokio::test]
    async fn test_detect_sequence_rejects_unnumbered_frame() {
        let dir = tempdir().unwrap();
        write_frames(dir.path(), &["f-1.jpeg", "cover.jpeg"]);

        let result = detect_sequence(dir.path(), ImageFormat::Jpeg, &AssetsInfo::default()).await;
        assert!(matches!(result, Err(EngineError::Protocol { .. })));
    }

    #[tokio::test]
    async fn test_detect_sequence_prefers_reported_pattern() {
        let dir = tempdir().unwrap();
        write_frames(dir.path(), &["f-10.jpeg", "f-11.jpeg"]);
        let assets = AssetsInfo {
            image_sequence_name: Some("f-%02d.jpeg".to_string()),
            first_frame_index: 10,
            ..AssetsInfo::default()
        };

        let sequence = detect_sequence(dir.path(), ImageFormat::Jpeg, &assets).await.unwrap();
        assert_eq!(sequence.pattern, "f-%02d.jpeg");
        assert_eq!(sequence.start_number, 10);
        assert_eq!(sequence.count, 2);
    }

    #[tokio::test]
    async fn test_empty_frame_directory() {
        let dir = tempdir().unwrap();
        let result = detect_sequence(dir.path(), ImageFormat::Jpeg, &AssetsInfo::default()).await;
        assert!(matches!(result, Err(EngineError::NoFrames { .. })));
    }

    #[test]
    fn test_build_args_video_only() {
        let stitcher = FfmpegStitcher::new(StitchConfig::default());
        let dir = Path::new("/tmp/frames-abc");
        let sequence = FrameSequence {
            pattern: "element-%03d.jpeg".to_string(),
            start_number: 0,
            count: 90,
        };

        let args = stitcher.build_args(&options(dir, PathBuf::from("/tmp/42.mp4")), &sequence);

        let joined = args.join(" ");
        assert!(joined.contains("-y -framerate 30 -start_number 0 -i /tmp/frames-abc/element-%03d.jpeg"));
        assert!(joined.contains("[0:v]scale=1080:1080,format=yuv420p[vout]"));
        assert!(joined.contains("-c:v libx264 -crf 18 -t 3.000"));
        assert!(!joined.contains("amix"));
        assert_eq!(args.last().unwrap(), "/tmp/42.mp4");
    }

    #[test]
    fn test_build_args_mixes_audio() {
        let stitcher = FfmpegStitcher::new(StitchConfig::default());
        let dir = Path::new("/tmp/frames");
        let mut opts = options(dir, PathBuf::from("/tmp/out.mp4"));
        opts.force = false;
        opts.assets_info.audio = vec![
            AudioAsset {
                src: PathBuf::from("/assets/music.mp3"),
                start_frame: 0,
                volume: 0.5,
            },
            AudioAsset {
                src: PathBuf::from("/assets/voice.wav"),
                start_frame: 60,
                volume: 1.0,
            },
        ];
        let sequence = FrameSequence {
            pattern: "element-%03d.jpeg".to_string(),
            start_number: 0,
            count: 300,
        };

        let joined = stitcher.build_args(&opts, &sequence).join(" ");
        assert!(joined.contains(" -n "));
        assert!(joined.contains("-i /assets/music.mp3 -i /assets/voice.wav"));
        assert!(joined.contains("[1:a]adelay=0|0,volume=0.5[a0]"));
        assert!(joined.contains("[2:a]adelay=2000|2000,volume=1[a1]"));
        assert!(joined.contains("[a0][a1]amix=inputs=2:dropout_transition=0[aout]"));
        assert!(joined.contains("-map [aout] -c:a aac"));
    }

    #[test]
    fn test_build_args_huge_audio_offset() {
        let stitcher = FfmpegStitcher::new(StitchConfig::default());
        let mut opts = options(Path::new("/tmp/frames"), PathBuf::from("/tmp/out.mp4"));
        opts.assets_info.audio = vec![AudioAsset {
            src: PathBuf::from("/assets/late.mp3"),
            start_frame: u64::MAX,
            volume: 1.0,
        }];
        let sequence = FrameSequence {
            pattern: "element-%03d.jpeg".to_string(),
            start_number: 0,
            count: 30,
        };

        let joined = stitcher.build_args(&opts, &sequence).join(" ");
        let delay = u64::MAX / 30;
        assert!(joined.contains(&format!("adelay={}|{}", delay, delay)));
    }

    #[test]
    fn test_progress_parsing() {
        assert_eq!(parse_progress_frame("frame=120"), Some(120));
        assert_eq!(parse_progress_frame("fps=29.97"), None);
        assert!(is_progress_key("out_time_ms=100000"));
        assert!(!is_progress_key("Error opening input file"));
    }

    #[tokio::test]
    async fn test_existing_output_without_force() {
        let dir = tempdir().unwrap();
        let output = dir.path().join("out.mp4");
        std::fs::write(&output, b"old").unwrap();
        let mut opts = options(dir.path(), output);
        opts.force = false;

        let stitcher = FfmpegStitcher::new(StitchConfig::default());
        let result = stitcher.stitch_frames_to_video(opts, &RecordingProgress::new()).await;
        assert!(matches!(result, Err(EngineError::OutputExists { .. })));
    }

    #[tokio::test]
    async fn test_missing_ffmpeg() {
        let dir = tempdir().unwrap();
        write_frames(dir.path(), &["element-1.jpeg"]);
        let stitcher = FfmpegStitcher::new(StitchConfig {
            ffmpeg_path: "/nonexistent/ffmpeg".to_string(),
            ..StitchConfig::default()
        });

        assert!(!stitcher.is_available().await);
        let result = stitcher
            .stitch_frames_to_video(
                options(dir.path(), dir.path().join("out.mp4")),
                &RecordingProgress::new(),
            )
            .await;
        assert!(matches!(result, Err(EngineError::ToolNotFound { .. })));
    }
}
