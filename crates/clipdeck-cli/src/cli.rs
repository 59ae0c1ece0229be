// crates/clipdeck-cli/src/cli.rs
//
// Command-line surface. Parsing only; main.rs dispatches.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(name = "clipdeck")]
#[command(author, version, about = "Decode, scrub and play back video files")]
pub struct Cli {
    /// Path to config file (default: ~/.config/clipdeck/config.json)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Also append logs to clipdeck.log in the temp directory
    #[arg(long, global = true)]
    pub log_file: bool,

    /// Serve FILE from an in-memory test clip of SECS seconds instead of
    /// decoding it
    #[arg(
        long,
        global = true,
        value_name = "SECS",
        num_args = 0..=1,
        default_missing_value = "10"
    )]
    pub synthetic: Option<f64>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Open a file and print its properties
    Probe {
        file: PathBuf,
    },

    /// Extract one frame as a PNG
    Thumb {
        file: PathBuf,

        /// Position in seconds
        #[arg(long, default_value_t = 0.0)]
        at: f64,

        /// Bounding box, e.g. 320x180 (default from config)
        #[arg(long = "box", value_name = "WxH")]
        box_size: Option<BoxSize>,

        /// Output PNG path
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Play a file in real time, with audio on the default output device
    Play {
        file: PathBuf,

        /// Start position in seconds
        #[arg(long, default_value_t = 0.0)]
        from: f64,

        /// Stop position in seconds (default: end of file)
        #[arg(long)]
        to: Option<f64>,

        /// Ignore the audio track
        #[arg(long)]
        no_audio: bool,

        /// Tick rate in Hz (default from config)
        #[arg(long)]
        fps: Option<u32>,
    },

    /// Print the effective configuration as JSON
    Config {
        /// Also write it to the config path
        #[arg(long)]
        write: bool,
    },
}

impl Command {
    /// The media file the command operates on, if any.
    pub fn file(&self) -> Option<&Path> {
        match self {
            Command::Probe { file } | Command::Thumb { file, .. } | Command::Play { file, .. } => Some(file.as_path()),
            Command::Config { .. } => None,
        }
    }
}

/// `WxH` thumbnail bounding box.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BoxSize {
    pub width:  u32,
    pub height: u32,
}

impl FromStr for BoxSize {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (w, h) = s
            .split_once(['x', 'X'])
            .ok_or_else(|| format!("expected WxH, got '{s}'"))?;
        let parse = |v: &str| -> Result<u32, String> {
            match v.trim().parse::<u32>() {
                Ok(0) => Err(format!("box side must be positive in '{s}'")),
                Ok(n) => Ok(n),
                Err(e) => Err(format!("bad box side '{v}': {e}")),
            }
        };
        Ok(Self { width: parse(w)?, height: parse(h)? })
    }
}

impl From<BoxSize> for (u32, u32) {
    fn from(b: BoxSize) -> Self {
        (b.width, b.height)
    }
}
