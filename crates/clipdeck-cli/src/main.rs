// crates/clipdeck-cli/src/main.rs
//
// clipdeck: probe, thumbnail and play media files from the terminal.
//
// Every subcommand builds its own MediaPool over the chosen backend
// (FFmpeg, or the in-memory synthetic one with --synthetic) and closes its
// session before returning.

mod cli;
mod config;
mod helpers;
mod output;
mod paths;
mod player;

use std::path::Path;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::debug;

use clipdeck_core::helpers::time::format_duration;
use clipdeck_media::{
    FfmpegBackend, MediaBackend, MediaPool, OpenParams, SyntheticBackend, SyntheticMedia,
};

use cli::{Cli, Command};
use config::PlayerConfig;

fn main() -> Result<()> {
    let cli = Cli::parse();

    let log_file = cli.log_file.then(paths::log_file_path);
    helpers::log::init(log_file.as_deref())?;

    let config_path = cli.config.clone().unwrap_or_else(paths::default_config_path);
    let config = PlayerConfig::load(&config_path)?;
    debug!(path = %config_path.display(), "effective config");

    match cli.synthetic {
        Some(secs) => {
            let mut backend = SyntheticBackend::new();
            if let Some(file) = cli.command.file() {
                backend.insert(file, SyntheticMedia::new(secs));
            }
            run(backend, cli.command, config, &config_path)
        }
        None => {
            let backend = FfmpegBackend::new().context("initialise FFmpeg")?;
            run(backend, cli.command, config, &config_path)
        }
    }
}

fn run<B>(backend: B, command: Command, mut config: PlayerConfig, config_path: &Path) -> Result<()>
where
    B: MediaBackend + 'static,
{
    match command {
        Command::Probe { file } => probe(backend, &file, &config),

        Command::Thumb { file, at, box_size, output } => {
            let box_size = box_size.map(Into::into).unwrap_or(config.thumb_box);
            thumb(backend, &file, at, box_size, &output, &config)
        }

        Command::Play { file, from, to, no_audio, fps } => {
            if no_audio {
                config.open.disable_audio = true;
            }
            if let Some(fps) = fps {
                config.tick_hz = fps.clamp(1, 1000);
            }
            player::play(backend, &file, from, to, &config)
        }

        Command::Config { write } => {
            println!("{}", serde_json::to_string_pretty(&config)?);
            if write {
                config.save(config_path)?;
                println!("wrote {}", config_path.display());
            }
            Ok(())
        }
    }
}

fn probe<B: MediaBackend>(backend: B, file: &Path, config: &PlayerConfig) -> Result<()> {
    let mut pool = MediaPool::new(backend, config.pool.clone());
    let handle = pool
        .open(file, &config.open)
        .with_context(|| format!("open {}", file.display()))?;

    let total = pool.total_seconds(handle).unwrap_or(0.0);
    println!("file:     {}", pool.file_name(handle).unwrap_or_default());
    println!(
        "video:    {}x{}",
        pool.width(handle).unwrap_or(0),
        pool.height(handle).unwrap_or(0)
    );
    println!("duration: {} ({total:.3}s)", format_duration(total));
    match (pool.has_audio(handle), pool.audio_format(handle)) {
        (Some(true), Some(format)) => {
            println!("audio:    {} Hz, {} ch (resampled)", format.sample_rate, format.channels);
        }
        _ => println!("audio:    none"),
    }

    pool.close(handle);
    Ok(())
}

fn thumb<B: MediaBackend>(
    backend:  B,
    file:     &Path,
    at:       f64,
    box_size: (u32, u32),
    output:   &Path,
    config:   &PlayerConfig,
) -> Result<()> {
    let mut pool = MediaPool::new(backend, config.pool.clone());
    // No audio needed for a still frame.
    let params = OpenParams { disable_audio: true, ..config.open.clone() };
    let handle = pool
        .open(file, &params)
        .with_context(|| format!("open {}", file.display()))?;

    let thumbnail = pool
        .make_thumbnail(handle, at, box_size)
        .with_context(|| format!("extract frame at {at:.3}s"))?;
    thumbnail.save_png(output)?;
    println!("{} ({}x{})", output.display(), thumbnail.width, thumbnail.height);

    pool.close(handle);
    Ok(())
}
