//! Traffic metrics reporting CLI
//!
//! Loads a scene configuration (JSON) and a tracker log, runs the
//! trajectory aggregator, and prints the metrics report as JSON.

use std::fs::File;
use std::path::PathBuf;

use clap::Parser;
use serde::Serialize;
use tracing::{info, Level};
use tracing_subscriber::FmtSubscriber;

use scene_geometry::SceneConfig;
use track_model::load_track_log;
use traffic_metrics::{
    shortest_queue_m, ApproachQueue, QueueConfig, SignalTiming, TrafficReport,
    TrajectoryAggregator,
};

#[derive(Parser)]
#[command(name = "traffic-report")]
#[command(about = "Compute calibrated intersection traffic metrics from tracker output")]
#[command(version)]
struct Cli {
    /// Path to the scene configuration (JSON)
    #[arg(long)]
    scene: PathBuf,

    /// Path to the tracker output log
    #[arg(long)]
    tracks: PathBuf,

    /// Green-onset frame per approach, e.g. --green 0=1500 (repeatable)
    #[arg(long = "green", value_parser = parse_green)]
    green: Vec<(usize, u64)>,
}

fn parse_green(arg: &str) -> Result<(usize, u64), String> {
    let (approach, frame) = arg
        .split_once('=')
        .ok_or_else(|| format!("expected approach=frame, got {arg:?}"))?;
    let approach = approach
        .parse::<usize>()
        .map_err(|_| format!("approach index is not a number: {approach:?}"))?;
    let frame = frame
        .parse::<u64>()
        .map_err(|_| format!("frame index is not a number: {frame:?}"))?;
    Ok((approach, frame))
}

#[derive(Serialize)]
struct AnalysisOutput {
    meters_per_pixel: f64,
    report: TrafficReport,
    queues: Vec<ApproachQueue>,
    shortest_queue_m: Option<f64>,
}

/// Initialize logging
fn init_logging() {
    let subscriber = FmtSubscriber::builder()
        .with_max_level(Level::INFO)
        .with_target(true)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .expect("Failed to set tracing subscriber");
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();
    let cli = Cli::parse();

    let scene: SceneConfig = serde_json::from_reader(File::open(&cli.scene)?)?;
    let records = load_track_log(&cli.tracks)?;
    info!(
        records = records.len(),
        scene = %cli.scene.display(),
        "loaded inputs"
    );

    let mut aggregator = TrajectoryAggregator::from_scene(&scene, QueueConfig::default())?;
    let meters_per_pixel = aggregator.meters_per_pixel();
    aggregator.observe_all(&records);

    let timing: SignalTiming = cli.green.iter().copied().collect();
    let queues = if timing.is_empty() {
        Vec::new()
    } else {
        aggregator.queues_at_green(&records, &timing)?
    };
    let shortest_queue_m = shortest_queue_m(&queues);

    let output = AnalysisOutput {
        meters_per_pixel,
        report: aggregator.finish(),
        queues,
        shortest_queue_m,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
