use ar_data_logger::config::{LoggerConfig, PointSchema};
use ar_data_logger::data_loader::{load_points, load_poses, load_replay_frames};
use ar_data_logger::session::FrameUpdateOrchestrator;
use ar_data_logger::streamer::{POINT_FILE_NAME, POSE_FILE_NAME};
use ar_data_logger::util::{TrajectoryStats, format_elapsed};
use clap::{Parser, Subcommand};
use indicatif::{ProgressBar, ProgressStyle};
use std::path::{Path, PathBuf};
use std::time::Instant;

#[derive(Parser)]
#[command(version, about, author)]
struct ArdlCli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay recorded tracker frames through a logging session
    Replay {
        /// folder of per-frame json files
        frames: PathBuf,

        /// root folder for the session output, omit to record nothing
        #[arg(short, long)]
        output: Option<PathBuf>,

        /// logger config json
        #[arg(short, long)]
        config: Option<PathBuf>,

        #[arg(long, value_enum)]
        schema: Option<PointSchema>,

        /// minimum point confidence
        #[arg(long)]
        threshold: Option<f32>,
    },
    /// Print statistics of a recorded session folder
    Summary {
        session: PathBuf,

        #[arg(long, value_enum, default_value = "colored")]
        schema: PointSchema,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let cli = ArdlCli::parse();

    match cli.command {
        Commands::Replay {
            frames,
            output,
            config,
            schema,
            threshold,
        } => {
            let mut logger_config = match config {
                Some(path) => LoggerConfig::from_json_file(path)?,
                None => LoggerConfig::default(),
            };
            if let Some(schema) = schema {
                logger_config.point_schema = schema;
            }
            if let Some(threshold) = threshold {
                logger_config.confidence_threshold = threshold;
            }
            logger_config.validate()?;
            replay(&frames, output.as_deref(), logger_config)?;
        }
        Commands::Summary { session, schema } => summary(&session, schema)?,
    }
    Ok(())
}

fn replay(
    frames_dir: &Path,
    output_root: Option<&Path>,
    config: LoggerConfig,
) -> Result<(), Box<dyn std::error::Error>> {
    let frames = load_replay_frames(frames_dir, config.near_clip, config.far_clip)?;
    log::info!("loaded {} frames from {}", frames.len(), frames_dir.display());

    let mut orchestrator = FrameUpdateOrchestrator::new(config);
    orchestrator.set_start_failure_listener(|e| eprintln!("Cannot create files for tracking results: {}", e));
    let now = Instant::now();
    let session_dir = orchestrator.start(output_root)?;

    let pb = ProgressBar::new(frames.len() as u64);
    pb.set_style(ProgressStyle::with_template("{bar:40} {pos}/{len} {msg}")?);
    for frame in &frames {
        orchestrator.on_frame(frame);
        let status = orchestrator.status();
        let rate = status
            .update_rate
            .map(|r| format!("{:.1} Hz", r))
            .unwrap_or_else(|| "-".to_string());
        pb.set_message(format!("{} features, {}", status.feature_count, rate));
        pb.inc(1);
    }
    pb.finish();

    let summary = orchestrator.stop()?;
    println!("elapsed {}", format_elapsed(now.elapsed().as_secs()));
    println!(
        "frames recorded: {} (dropped {})",
        summary.frames_recorded, summary.dropped_frames
    );
    println!("distinct features: {}", summary.feature_count);
    if let Some(dir) = session_dir {
        println!("session: {}", dir.display());
    }
    Ok(())
}

fn summary(session_dir: &Path, schema: PointSchema) -> Result<(), Box<dyn std::error::Error>> {
    let poses = load_poses(session_dir.join(POSE_FILE_NAME))?;
    let stats = TrajectoryStats::from_poses(&poses);
    println!("{}", serde_json::to_string_pretty(&stats)?);

    let point_path = session_dir.join(POINT_FILE_NAME);
    if schema.tracks_points() && point_path.exists() {
        let points = load_points(&point_path, schema)?;
        println!("points: {}", points.len());
    }
    Ok(())
}
