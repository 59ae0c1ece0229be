// crates/clipdeck-cli/src/player.rs
//
// Real-time playback: a crossbeam tick channel drives MediaPool::tick at the
// configured rate while cpal pulls audio from the session's AudioTap on its
// own thread.
//
// The playback position is wall-clock time since the first tick plus the
// start offset, so a slow tick shows up as a larger step (or, past the seek
// epsilon, as a seek) rather than as drift.

use std::path::Path;
use std::time::Instant;

use anyhow::{Context, Result};
use tracing::{debug, info, warn};

use clipdeck_media::{MediaBackend, MediaPool, TickOutcome};

use crate::config::PlayerConfig;
use crate::output::OutputDevice;

pub fn play<B>(backend: B, file: &Path, from: f64, to: Option<f64>, config: &PlayerConfig) -> Result<()>
where
    B: MediaBackend + 'static,
{
    // Device first: the session resamples to whatever it runs at.
    let mut params = config.open.clone();
    let device = if params.disable_audio {
        None
    } else {
        match OutputDevice::open_default() {
            Ok(device) => {
                params.target_sample_rate   = device.sample_rate();
                params.target_channel_count = device.channels().min(2);
                Some(device)
            }
            Err(e) => {
                warn!(error = %e, "no audio output, playing video only");
                params.disable_audio = true;
                None
            }
        }
    };

    let mut pool = MediaPool::new(backend, config.pool.clone());
    let handle = pool
        .open(file, &params)
        .with_context(|| format!("open {}", file.display()))?;

    let total = pool.total_seconds(handle).unwrap_or(0.0);
    let (start, end) = play_range(from, to, total);

    let stream = match (&device, pool.audio_tap(handle)) {
        (Some(device), Some(tap)) => match device.play(tap) {
            Ok(stream) => Some(stream),
            Err(e) => {
                warn!(error = %e, "audio output failed, playing video only");
                None
            }
        },
        _ => None,
    };

    info!(
        file  = %file.display(),
        start,
        end,
        hz    = config.tick_hz,
        audio = stream.is_some(),
        "playing"
    );

    let ticker = crossbeam_channel::tick(config.tick_interval());
    let started = Instant::now();
    let mut stats = PlaybackStats::default();
    loop {
        let now = ticker.recv().context("tick channel closed")?;
        let position = (start + now.saturating_duration_since(started).as_secs_f64()).min(end);
        let outcome = pool.tick(handle, position)?;
        if let Some(pts) = outcome.presented_secs {
            debug!(pts, position, "frame");
        }
        stats.record(&outcome);
        if position >= end {
            break;
        }
    }

    // The stream owns a tap; stop pulling before the session goes away.
    drop(stream);
    pool.close(handle);

    info!(
        ticks     = stats.ticks,
        presented = stats.presented,
        seeks     = stats.seeks,
        "playback finished"
    );
    println!("{} ticks, {} frames presented, {} seeks", stats.ticks, stats.presented, stats.seeks);
    Ok(())
}

/// Clamp the requested range to the file: `0 ≤ start ≤ end ≤ total`.
fn play_range(from: f64, to: Option<f64>, total: f64) -> (f64, f64) {
    let end = to.unwrap_or(total).clamp(0.0, total);
    let start = from.clamp(0.0, end);
    (start, end)
}

#[derive(Debug, Default, PartialEq, Eq)]
struct PlaybackStats {
    ticks:     u64,
    presented: u64,
    seeks:     u64,
}

impl PlaybackStats {
    fn record(&mut self, outcome: &TickOutcome) {
        self.ticks += 1;
        if outcome.presented_secs.is_some() {
            self.presented += 1;
        }
        if outcome.seeked {
            self.seeks += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn range_defaults_to_whole_file() {
        assert_eq!(play_range(0.0, None, 12.5), (0.0, 12.5));
    }

    #[test]
    fn range_is_clamped_and_ordered() {
        assert_eq!(play_range(-3.0, Some(99.0), 10.0), (0.0, 10.0));
        assert_eq!(play_range(8.0, Some(4.0), 10.0), (4.0, 4.0));
    }

    #[test]
    fn stats_count_frames_and_seeks() {
        let mut stats = PlaybackStats::default();
        stats.record(&TickOutcome { position_secs: 0.0, seeked: false, presented_secs: Some(0.0) });
        stats.record(&TickOutcome { position_secs: 0.01, seeked: false, presented_secs: None });
        stats.record(&TickOutcome { position_secs: 5.0, seeked: true, presented_secs: Some(5.0) });
        assert_eq!(stats, PlaybackStats { ticks: 3, presented: 2, seeks: 1 });
    }
}
