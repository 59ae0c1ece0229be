// crates/clipdeck-cli/src/config.rs
//
// PlayerConfig: everything the CLI passes to the media pool, plus its own
// tick rate and default thumbnail box. Stored as JSON; every field is
// optional in the file.
//
// Precedence: command-line flag > config file > built-in default.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use tracing::debug;

use clipdeck_core::{OpenParams, PoolConfig};

pub const DEFAULT_TICK_HZ: u32 = 60;
pub const DEFAULT_THUMB_BOX: (u32, u32) = (320, 180);

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    pub open:      OpenParams,
    pub pool:      PoolConfig,
    /// Playback ticks per second.
    pub tick_hz:   u32,
    pub thumb_box: (u32, u32),
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            open:      OpenParams::default(),
            pool:      PoolConfig::default(),
            tick_hz:   DEFAULT_TICK_HZ,
            thumb_box: DEFAULT_THUMB_BOX,
        }
    }
}

impl PlayerConfig {
    /// Load from `path`. A missing file is not an error: defaults are used.
    /// A file that exists but does not parse is.
    pub fn load(path: &Path) -> Result<Self> {
        let text = match std::fs::read_to_string(path) {
            Ok(t) => t,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file, using defaults");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(e).with_context(|| format!("read config {}", path.display()));
            }
        };
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("parse config {}", path.display()))?;
        debug!(path = %path.display(), "config loaded");
        Ok(config.sanitized())
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)
                .with_context(|| format!("create {}", dir.display()))?;
        }
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json).with_context(|| format!("write config {}", path.display()))
    }

    /// Clamp values a hand-edited file could get wrong.
    fn sanitized(mut self) -> Self {
        self.tick_hz = self.tick_hz.clamp(1, 1000);
        self.thumb_box = (self.thumb_box.0.max(1), self.thumb_box.1.max(1));
        self
    }

    pub fn tick_interval(&self) -> std::time::Duration {
        std::time::Duration::from_secs_f64(1.0 / f64::from(self.tick_hz.max(1)))
    }
}
