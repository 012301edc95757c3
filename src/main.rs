//! Face pose tracking demo over a synthetic capture sequence.

use anyhow::Result;
use clap::Parser;
use face_pose_tracker::{
    app::{FitterFactory, TrackingApp},
    config::Config,
    synthetic::{demo_blendshape, demo_mesh, orbiting_outcomes, CentroidFitter, ScriptedTracker, SyntheticCapture},
};
use log::info;
use std::sync::Arc;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Number of synthetic frames to process
    #[arg(short, long, default_value = "60")]
    frames: usize,

    /// Capture width in pixels
    #[arg(long, default_value = "896")]
    width: u32,

    /// Capture height in pixels
    #[arg(long, default_value = "504")]
    height: u32,

    /// Filter type for translation smoothing (none, exponential, moving_average, median)
    #[arg(long)]
    filter: Option<String>,

    /// Path to configuration file (YAML format)
    #[arg(short = 'C', long)]
    config: Option<String>,

    /// Enable debug output
    #[arg(short, long)]
    debug: bool,
}

fn main() -> Result<()> {
    let args = Args::parse();

    if args.debug {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("debug"));
    } else {
        env_logger::init_from_env(env_logger::Env::new().default_filter_or("info"));
    }

    info!("Face pose tracker demo");

    let mut config = if let Some(config_path) = &args.config {
        info!("Loading configuration from: {config_path}");
        match Config::from_file(config_path) {
            Ok(cfg) => cfg,
            Err(e) => {
                log::warn!("Failed to load config file: {e}. Using defaults.");
                Config::default()
            }
        }
    } else {
        Config::default()
    };
    if let Some(filter) = args.filter {
        config.filter.kind = filter;
    }

    // Synthetic rig standing in for the platform capture and tracker
    let mut capture = SyntheticCapture::new(args.width, args.height, (1.0, 1.78));
    capture.push_frames(args.frames);

    let tracker = Arc::new(ScriptedTracker::with_config(
        &config.tracker,
        orbiting_outcomes(
            args.frames,
            config.face.landmark_count,
            args.width,
            args.height,
        ),
    ));

    let neutral = demo_mesh(120);
    let blendshapes = vec![
        demo_blendshape(&neutral, 0.4),
        demo_blendshape(&neutral, -0.7),
    ];

    let factory: FitterFactory = Box::new(|setup| Box::new(CentroidFitter::from_setup(setup, 0.6)));

    let mut app = TrackingApp::new(config, capture, tracker, neutral, blendshapes, factory)?;
    app.handle_command("Show debug");
    app.run(100)?;

    if let Some(session) = app.session() {
        if let Some(pose) = session.pose() {
            info!(
                "Final pose: rotation {:?}, translation {:?}",
                pose.rotation, pose.translation
            );
        }
        info!(
            "{} landmarks tracked, {} blendshape weights",
            session.landmark_world().len(),
            session.blendshape_weights().len()
        );
    }

    Ok(())
}
