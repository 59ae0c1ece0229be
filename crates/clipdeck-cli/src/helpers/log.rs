// crates/clipdeck-cli/src/helpers/log.rs
//
// Logging setup for the binary. The library crates only emit `tracing`
// events; this is the one place a subscriber is installed.
//
// Filter: RUST_LOG if set, otherwise `info`.
// With --log-file, events also go to %TEMP%/clipdeck.log (append-only, no
// ANSI colours) so a run started without a terminal still leaves a trace.

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use tracing_subscriber::fmt;
use tracing_subscriber::prelude::*;
use tracing_subscriber::EnvFilter;

pub fn init(log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let stderr = fmt::layer().with_writer(std::io::stderr).with_target(false);

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("open log file {}", path.display()))?;
            Some(fmt::layer().with_writer(Mutex::new(file)).with_ansi(false))
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(stderr)
        .with(file_layer)
        .try_init()
        .context("install tracing subscriber")?;
    Ok(())
}
