use std::path::Path;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{info, warn};

use slam_viz::config::{AppConfig, SinkKind};
use slam_viz::io::EurocGroundTruth;
use slam_viz::system::{SharedState, spawn_replay};
use slam_viz::viz::{RerunSink, TracingSink, Visualizer, VisualizerHandle};

/// Config file picked up from the working directory when none is given.
const DEFAULT_CONFIG: &str = "slam_viz.yaml";

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("slam_viz=info")),
        )
        .init();

    let dataset_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "data/euroc/MH_01_easy/mav0".to_string());
    let config = load_config(std::env::args().nth(2))?;

    info!("Loading EuRoC ground truth from: {}", dataset_path);
    let mut groundtruth = EurocGroundTruth::load(&dataset_path)?;
    groundtruth.decimate(config.replay.decimate);
    info!(
        "Replaying {} poses ({:.1} Hz after decimation)",
        groundtruth.len(),
        groundtruth.rate_hz().unwrap_or(0.0)
    );

    let shared = SharedState::new();

    let mut visualizer = Visualizer::new(config.viz.clone());
    visualizer.set_pose_store(shared.pose_store());
    visualizer.set_loop_store(shared.loop_store());
    visualizer.enable();

    let viz_handle: VisualizerHandle = match config.sink {
        SinkKind::Rerun => {
            let sink = RerunSink::spawn("slam_viz", &config.viz.base_path)
                .context("Failed to spawn rerun viewer")?;
            visualizer.spawn(sink)?
        }
        SinkKind::Log => visualizer.spawn(TracingSink::new())?,
    };

    let replay = spawn_replay(shared.clone(), config.replay.clone(), groundtruth.entries)
        .context("Failed to spawn replay thread")?;
    let replay_result = replay.join();

    // Let the visualizer saturate the tail of the trajectory before exiting
    let linger = config.viz.republish_cap as f64 / config.viz.tick_rate_hz + 1.0;
    if !viz_handle.is_finished() {
        std::thread::sleep(Duration::from_secs_f64(linger));
    }

    shared.request_shutdown();
    viz_handle.stop();
    let viz_stats = viz_handle.join()?;

    match replay_result {
        Ok(Ok(stats)) => info!(
            "Replayed {} frames, {} keyframes, {} loop candidates",
            stats.frames, stats.keyframes, stats.loops
        ),
        Ok(Err(e)) => return Err(e.context("Replay failed")),
        Err(_) => warn!("Replay thread panicked"),
    }
    info!(
        "Done! {} ticks, {} frames and {} loop candidates published",
        viz_stats.ticks, viz_stats.frames_published, viz_stats.candidates_published
    );

    Ok(())
}

fn load_config(arg: Option<String>) -> Result<AppConfig> {
    if let Some(path) = arg {
        info!("Loading configuration from {}", path);
        return Ok(AppConfig::load(Path::new(&path))?);
    }
    if Path::new(DEFAULT_CONFIG).exists() {
        info!("Loading configuration from {}", DEFAULT_CONFIG);
        return Ok(AppConfig::load(Path::new(DEFAULT_CONFIG))?);
    }
    info!("Using default configuration");
    Ok(AppConfig::default())
}
