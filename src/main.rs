//! Krama player - runs a scripted motion sequence against the simulator
//!
//! Loads a TOML config (motion limits, start pose, script), then ticks the
//! sequencer and the simulated robot at the configured control rate until
//! the script drains or Ctrl-C stops it.

use krama_motion::config::AppConfig;
use krama_motion::error::{Error, Result};
use krama_motion::player::ScriptPlayer;
use krama_motion::script::total_duration;
use krama_motion::sim::{SimActuator, SimConfig};
use std::env;
use std::path::Path;
use std::time::{Duration, Instant};

/// Parse config path from command line arguments.
///
/// Supports:
/// - `krama-player <path>` (positional)
/// - `krama-player --config <path>` (flag-based)
/// - `krama-player -c <path>` (short flag)
///
/// Defaults to `krama.toml` if not specified.
fn parse_config_path() -> String {
    let args: Vec<String> = env::args().collect();

    // Look for --config or -c flag
    for i in 1..args.len() {
        if (args[i] == "--config" || args[i] == "-c") && i + 1 < args.len() {
            return args[i + 1].clone();
        }
    }

    // Fall back to first positional argument (if it doesn't start with -)
    if args.len() > 1 && !args[1].starts_with('-') {
        return args[1].clone();
    }

    "krama.toml".to_string()
}

fn main() -> Result<()> {
    let config_path = parse_config_path();
    let from_file = Path::new(&config_path).exists();
    let config = if from_file {
        AppConfig::from_file(&config_path)?
    } else {
        AppConfig::demo_defaults()
    };

    // Initialize logger
    let mut builder = env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or(config.logging.level.clone()),
    );
    if config.logging.output == "stderr" {
        builder.target(env_logger::Target::Stderr);
    } else {
        builder.target(env_logger::Target::Stdout);
    }
    builder.init();

    log::info!("KramaMotion v0.2.0 starting...");
    if from_file {
        log::info!("Using config: {}", config_path);
    } else {
        log::info!(
            "Config file {} not found, using built-in square demo",
            config_path
        );
    }

    if config.script.is_empty() {
        log::warn!("No script steps configured, nothing to do");
        return Ok(());
    }
    log::info!(
        "Script: {} step(s), ~{:.1}s total",
        config.script.len(),
        total_duration(&config.script).as_secs_f32()
    );

    // Simulated robot at the configured start pose
    let sim = SimActuator::new(
        SimConfig {
            drag: config.motion.drag,
            max_velocity: config.motion.max_velocity,
            sensor_range: config.motion.sensor_range,
        },
        config.start.pose(),
    );

    let mut player = ScriptPlayer::new(config.script.clone());
    player.init(Box::new(sim.clone()), config.motion.limits())?;

    // Ctrl-C cancels movement through the cross-thread stop handle
    let ctrlc_handle = player.stop_handle()?;
    ctrlc::set_handler(move || {
        log::info!("Received shutdown signal");
        if let Err(e) = ctrlc_handle.stop() {
            log::error!("Failed to stop movement: {}", e);
        }
    })
    .map_err(|e| Error::Other(format!("Error setting Ctrl-C handler: {}", e)))?;

    player.start()?;

    let stop_handle = player.stop_handle()?;
    let period = Duration::from_secs_f32(1.0 / config.player.rate_hz.max(1) as f32);
    let mut last = Instant::now();
    let mut last_progress = Instant::now();

    while !player.finished() && !stop_handle.is_stopped() {
        std::thread::sleep(period);
        let now = Instant::now();
        let delta = now - last;
        last = now;

        sim.step(delta.as_secs_f32());
        if let Err(e) = player.tick(delta) {
            log::error!("Sequencer error: {}", e);
        }

        // Progress log, throttled to 1 Hz
        if last_progress.elapsed() >= Duration::from_secs(1) {
            let pose = player.pose()?;
            log::info!(
                "Pose: ({:.2}, {:.2}) heading {:.2}rad, speed {:.2}m/s",
                pose.x,
                pose.y,
                pose.theta,
                sim.speed()
            );
            last_progress = now;
        }
    }

    let pose = player.pose()?;
    if stop_handle.is_stopped() {
        log::info!(
            "Stopped before completion at ({:.2}, {:.2}) heading {:.2}rad",
            pose.x,
            pose.y,
            pose.theta
        );
    } else {
        log::info!(
            "Script complete at ({:.2}, {:.2}) heading {:.2}rad",
            pose.x,
            pose.y,
            pose.theta
        );
    }

    Ok(())
}
