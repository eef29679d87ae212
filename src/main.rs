use bevy::prelude::*;

use bevy::window::WindowResolution;

use steering::game::config::{Params, PARAMS_PATH};
use steering::game::GamePlugin;

use bevy::log::LogPlugin;
use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

const LOG_PREFIX: &str = "steering";
const LOGS_TO_KEEP: usize = 25;

fn setup_file_logging() -> std::io::Result<String> {
    let log_dir = PathBuf::from("logs");
    fs::create_dir_all(&log_dir)?;

    // Clean up old log files, keeping only the most recent ones
    cleanup_old_logs(&log_dir, LOGS_TO_KEEP);

    let now = chrono::Local::now();
    let log_filename = format!("{}_{}.log", LOG_PREFIX, now.format("%Y%m%d_%H%M%S"));
    let log_path_str = log_dir.join(&log_filename).to_string_lossy().to_string();

    let file_appender = RollingFileAppender::new(
        Rotation::NEVER, // One file per run
        &log_dir,
        &log_filename,
    );

    let file_layer = fmt::layer().with_writer(file_appender).with_ansi(false);

    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);

    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("wgpu=error,bevy_render=info,bevy_ecs=info,steering=info"));

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .with(stdout_layer)
        .init();

    Ok(log_path_str)
}

fn cleanup_old_logs(log_dir: &Path, keep_count: usize) {
    let Ok(entries) = fs::read_dir(log_dir) else { return };

    let mut log_files: Vec<_> = entries
        .filter_map(|e| e.ok())
        .filter(|e| {
            e.path()
                .file_name()
                .and_then(|n| n.to_str())
                .is_some_and(|s| s.starts_with(LOG_PREFIX) && s.ends_with(".log"))
        })
        .collect();

    // Oldest first
    log_files.sort_by_key(|e| e.metadata().ok().and_then(|m| m.modified().ok()));

    if log_files.len() > keep_count {
        for file in log_files.iter().take(log_files.len() - keep_count) {
            let _ = fs::remove_file(file.path());
        }
    }
}

fn main() -> ExitCode {
    let log_file = match setup_file_logging() {
        Ok(path) => path,
        Err(err) => {
            eprintln!("Could not set up logging: {err}");
            return ExitCode::FAILURE;
        }
    };

    println!("╔══════════════════════════════════════════════════════════╗");
    println!("║  Steering Behaviours - Logging to file                  ║");
    println!("╠══════════════════════════════════════════════════════════╣");
    println!("║  Log file: {:<45} ║", log_file);
    println!("╚══════════════════════════════════════════════════════════╝");

    let params = match Params::load(PARAMS_PATH) {
        Ok(params) => params,
        Err(err) => {
            error!("{err}");
            return ExitCode::FAILURE;
        }
    };

    App::new()
        .add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: "Steering Behaviours".into(),
                        resolution: WindowResolution::new(params.world_width as u32, params.world_height as u32),
                        resizable: false,
                        ..default()
                    }),
                    ..default()
                })
                .build()
                .disable::<LogPlugin>(), // Logging is set up above
        )
        .insert_resource(params)
        .add_plugins(GamePlugin)
        .run();

    ExitCode::SUCCESS
}
