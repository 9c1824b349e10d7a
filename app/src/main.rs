//! ABOUTME: lookout binary entry point
//! ABOUTME: CLI parsing, configuration overrides, tracing setup and watcher wiring

use clap::{Args, Parser, Subcommand};
use lo_config::Config;
use lo_core::telemetry;
use lo_storage::{DebugLevel, LocalArtifactStore};
use lo_vision::MotionDetector;
use lo_watch::{RunSummary, Watcher};
use std::{path::PathBuf, process};

#[derive(Parser, Debug)]
#[command(name = "lookout", author, version, about = "Motion-triggered frame capture", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Watch a frame source and save frames that contain motion
    Run(RunArgs),
    /// Print the effective configuration as JSON and exit
    CheckConfig {
        /// Configuration file (toml, yaml, json)
        #[arg(short, long)]
        config: Option<PathBuf>,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// Configuration file (toml, yaml, json)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Replay image files from this directory instead of a camera
    #[arg(long, conflicts_with = "command")]
    source_dir: Option<PathBuf>,

    /// Directory that receives the artifacts
    #[arg(long)]
    save_dir: Option<String>,

    /// 0/off, 1/on_motion or 2/always
    #[arg(long)]
    debug_level: Option<DebugLevel>,

    /// Stop after this many analysed frames
    #[arg(long)]
    max_frames: Option<u64>,

    /// Capture command run once per frame, e.g. `-- libcamera-still -n -o -`
    #[arg(last = true)]
    command: Vec<String>,
}

impl RunArgs {
    fn apply(&self, config: &mut Config) {
        if let Some(dir) = &self.source_dir {
            config.capture.source_dir = Some(dir.display().to_string());
            config.capture.command.clear();
        }
        if !self.command.is_empty() {
            config.capture.command = self.command.clone();
            config.capture.source_dir = None;
        }
        if let Some(dir) = &self.save_dir {
            config.storage.save_dir = dir.clone();
        }
        if let Some(level) = self.debug_level {
            config.storage.debug_level = level;
        }
        if let Some(max_frames) = self.max_frames {
            config.watch.max_frames = max_frames;
        }
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    match cli.command {
        Command::CheckConfig { config } => {
            let config = load_config(config.as_deref());
            match config.to_json() {
                Ok(json) => println!("{}", json),
                Err(e) => {
                    tracing::error!("Failed to render configuration: {}", e);
                    process::exit(1);
                }
            }
        }
        Command::Run(args) => {
            let mut config = load_config(args.config.as_deref());
            args.apply(&mut config);
            if let Err(e) = config.check() {
                tracing::error!("Invalid configuration: {}", e);
                process::exit(1);
            }

            match run(config).await {
                Ok(Some(summary)) => {
                    tracing::info!(
                        frames_processed = summary.frames_processed,
                        motion_frames = summary.motion_frames,
                        artifacts_written = summary.artifacts_written,
                        stop_reason = ?summary.stop_reason,
                        "lookout finished"
                    );
                }
                Ok(None) => tracing::info!("lookout interrupted"),
                Err(e) => {
                    tracing::error!("lookout failed: {}", e);
                    process::exit(1);
                }
            }
        }
    }
}

/// Load configuration and start tracing; exit non-zero if the configuration is invalid
fn load_config(path: Option<&std::path::Path>) -> Config {
    match Config::load(path) {
        Ok(config) => {
            telemetry::init_tracing(&config.telemetry.env, "lookout");
            tracing::debug!(?config, "Configuration loaded successfully");
            config
        }
        Err(e) => {
            telemetry::init_tracing("development", "lookout");
            tracing::error!("Failed to load configuration: {}", e);
            process::exit(1);
        }
    }
}

async fn run(config: Config) -> lo_core::Result<Option<RunSummary>> {
    tracing::info!(
        save_dir = %config.storage.save_dir,
        file_limit = config.storage.file_limit,
        debug_level = %config.storage.debug_level,
        "lookout starting"
    );

    let store = LocalArtifactStore::new(&config.storage.save_dir);
    store.prepare(config.storage.create_dir).await?;

    let detector = MotionDetector::new(config.detector.clone())?;
    let source = lo_capture::build_source(&config.capture).await?;
    let mut watcher = Watcher::new(
        detector,
        source,
        store,
        &config.capture,
        &config.storage,
        config.watch.clone(),
    );

    tokio::select! {
        result = watcher.run() => result.map(Some),
        _ = tokio::signal::ctrl_c() => Ok(None),
    }
}
