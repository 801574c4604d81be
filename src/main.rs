use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use tracing::{error, info, warn, Level};
use tracing_subscriber::EnvFilter;

use social_renderer::{
    engine::{FfmpegStitcher, ProcessRenderer},
    Config, ContentDescriptor, Destination, RenderOutcome, VideoRenderOrchestrator,
};

#[derive(Parser)]
#[command(
    name = "social-renderer",
    version,
    about = "Render bundled compositions into videos for social platforms",
    long_about = "social-renderer renders the Main composition of a prebuilt bundle to frames and stitches them into an mp4 sized for Instagram or YouTube."
)]
struct Cli {
    /// Configuration file (optional)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Render a video for a destination
    Render {
        /// Path to the prebuilt bundle
        #[arg(short, long)]
        bundle: PathBuf,

        /// Target platform (instagram, youtube)
        #[arg(short, long)]
        destination: Destination,

        /// JSON file describing the content (timestamp, fps, ...)
        #[arg(long)]
        content: PathBuf,

        /// Hide progress bars
        #[arg(short, long)]
        quiet: bool,
    },

    /// List the compositions in a bundle
    Compositions {
        /// Path to the prebuilt bundle
        #[arg(short, long)]
        bundle: PathBuf,

        /// Timestamp passed to the bundle (defaults to now)
        #[arg(short, long)]
        timestamp: Option<String>,
    },

    /// Write the default configuration to a file
    InitConfig {
        /// Where to write the configuration
        path: PathBuf,
    },
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Initialize logging
    let log_level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(log_level.to_string()));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            let message = match e.downcast_ref::<social_renderer::RendererError>() {
                Some(err) => err.user_message(),
                None => format!("{:#}", e),
            };
            error!("{}", message);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    info!("Starting social-renderer v{}", env!("CARGO_PKG_VERSION"));

    // Load configuration
    let config = match &cli.config {
        Some(config_path) => {
            info!("Loading configuration from {:?}", config_path);
            Config::from_file(config_path)?
        }
        None => {
            info!("Using default configuration");
            Config::default()
        }
    };
    config.validate()?;

    match cli.command {
        Command::Render {
            bundle,
            destination,
            content,
            quiet,
        } => {
            let content = ContentDescriptor::from_file(&content)?;
            info!("Content: {} @ {} fps", content.timestamp, content.fps);
            info!("Destination: {} ({})", destination, config.formats.get(destination));

            let stitcher = FfmpegStitcher::new(config.stitch.clone());
            if !stitcher.is_available().await {
                warn!("{} does not respond to -version", config.stitch.ffmpeg_path);
            }
            let renderer = ProcessRenderer::new(config.render.renderer_command.clone());

            let mut orchestrator = VideoRenderOrchestrator::new(
                content,
                config,
                Arc::new(renderer),
                Arc::new(stitcher),
            );
            if quiet {
                orchestrator = orchestrator.with_progress(social_renderer::progress::no_progress());
            }

            match orchestrator.execute(&bundle, destination).await? {
                RenderOutcome::Rendered(path) => {
                    info!("Render complete! Output saved to: {:?}", path);
                    println!("{}", path.display());
                    Ok(ExitCode::SUCCESS)
                }
                RenderOutcome::CompositionNotFound { composition_id } => {
                    error!("Bundle {:?} has no '{}' composition", bundle, composition_id);
                    Ok(ExitCode::from(2))
                }
            }
        }

        Command::Compositions { bundle, timestamp } => {
            let timestamp = timestamp
                .unwrap_or_else(|| chrono::Local::now().format("%Y-%m-%d-%H-%M-%S").to_string());
            let renderer = ProcessRenderer::new(config.render.renderer_command.clone());
            let stitcher = FfmpegStitcher::new(config.stitch.clone());
            let orchestrator = VideoRenderOrchestrator::new(
                ContentDescriptor::new(timestamp, 30),
                config,
                Arc::new(renderer),
                Arc::new(stitcher),
            );

            for composition in orchestrator.list_compositions(&bundle).await? {
                let size = match (composition.width, composition.height) {
                    (Some(w), Some(h)) => format!("{}x{}", w, h),
                    _ => "-".to_string(),
                };
                let frames = composition
                    .duration_in_frames
                    .map_or_else(|| "-".to_string(), |f| f.to_string());
                println!("{}\t{}\t{} frames", composition.id, size, frames);
            }
            Ok(ExitCode::SUCCESS)
        }

        Command::InitConfig { path } => {
            config
                .save_to_file(&path)
                .with_context(|| format!("writing {:?}", path))?;
            info!("Configuration written to {:?}", path);
            Ok(ExitCode::SUCCESS)
        }
    }
}
