// crates/clipdeck-core/src/params.rs
//
// Caller-facing knobs. Both structs deserialize from partial JSON: any field
// left out falls back to its default.

use serde::{Deserialize, Serialize};

use crate::audio::{AudioFormat, DEFAULT_CHANNELS, DEFAULT_SAMPLE_RATE};
use crate::pool::DEFAULT_CAPACITY;
use crate::queue::DEFAULT_LOW_WATER;

/// Default |dt| above which a tick is treated as a seek.
pub const DEFAULT_SEEK_EPSILON_SECS: f64 = 0.1;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OpenParams {
    pub disable_audio:        bool,
    pub target_sample_rate:   u32,
    pub target_channel_count: u16,
}

impl OpenParams {
    /// Same defaults with the audio track ignored.
    pub fn video_only() -> Self {
        Self { disable_audio: true, ..Self::default() }
    }

    /// The format the resampler produces. Channel count is limited to mono or
    /// stereo.
    pub fn audio_format(&self) -> AudioFormat {
        AudioFormat::clamped(self.target_sample_rate, self.target_channel_count)
    }
}

impl Default for OpenParams {
    fn default() -> Self {
        Self {
            disable_audio:        false,
            target_sample_rate:   DEFAULT_SAMPLE_RATE,
            target_channel_count: DEFAULT_CHANNELS,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Maximum simultaneously open sessions.
    pub capacity:          usize,
    /// Packets buffered per track by each refill pass.
    pub queue_low_water:   usize,
    pub seek_epsilon_secs: f64,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            capacity:          DEFAULT_CAPACITY,
            queue_low_water:   DEFAULT_LOW_WATER,
            seek_epsilon_secs: DEFAULT_SEEK_EPSILON_SECS,
        }
    }
}
