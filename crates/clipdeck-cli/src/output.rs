// crates/clipdeck-cli/src/output.rs
//
// cpal speaker output fed from one session's AudioTap.
//
// The device is opened first so the session can be asked to resample to the
// device rate; the session then renders interleaved f32 in its own channel
// count and the callback maps that onto the device channels:
//   mono session   → copied to every device channel
//   stereo session → first two device channels, the rest silent
//
// The callback allocates nothing after warm-up: the scratch buffer only grows
// when the device asks for a larger period than any before.

use anyhow::{anyhow, Context, Result};
use cpal::traits::{DeviceTrait, HostTrait, StreamTrait};
use cpal::{Device, FromSample, SampleFormat, SizedSample, Stream, StreamConfig};
use tracing::{error, info, warn};

use clipdeck_media::{AudioTap, MediaBackend};

/// The default output device and the format it runs at.
pub struct OutputDevice {
    device: Device,
    config: StreamConfig,
    format: SampleFormat,
}

impl OutputDevice {
    pub fn open_default() -> Result<Self> {
        let host = cpal::default_host();
        let device = host
            .default_output_device()
            .ok_or_else(|| anyhow!("no audio output device available"))?;
        let name = device.name().unwrap_or_else(|_| "unknown".into());
        let supported = device
            .default_output_config()
            .context("query default output config")?;
        info!(
            device      = %name,
            sample_rate = supported.sample_rate().0,
            channels    = supported.channels(),
            format      = ?supported.sample_format(),
            "output device"
        );
        Ok(Self {
            format: supported.sample_format(),
            config: supported.config(),
            device,
        })
    }

    pub fn sample_rate(&self) -> u32 { self.config.sample_rate.0 }

    pub fn channels(&self) -> u16 { self.config.channels }

    /// Start a stream that pulls from `tap` until the returned value is dropped.
    pub fn play<B>(&self, tap: AudioTap<B>) -> Result<Stream>
    where
        B: MediaBackend + 'static,
    {
        let stream = match self.format {
            SampleFormat::I16 => self.build::<i16, B>(tap)?,
            SampleFormat::U16 => self.build::<u16, B>(tap)?,
            SampleFormat::F32 => self.build::<f32, B>(tap)?,
            other => {
                warn!(format = ?other, "unusual device sample format, requesting f32");
                self.build::<f32, B>(tap)?
            }
        };
        stream.play().context("start audio stream")?;
        info!("audio playback started");
        Ok(stream)
    }

    fn build<S, B>(&self, tap: AudioTap<B>) -> Result<Stream>
    where
        S: SizedSample + FromSample<f32>,
        B: MediaBackend + 'static,
    {
        let device_channels  = usize::from(self.config.channels.max(1));
        let session_channels = usize::from(tap.format().channels.max(1));
        let mut scratch = vec![0.0f32; self.config.sample_rate.0 as usize / 10 * session_channels];

        let callback = move |output: &mut [S], _: &cpal::OutputCallbackInfo| {
            let frames = output.len() / device_channels;
            let needed = frames * session_channels;
            if scratch.len() < needed {
                scratch.resize(needed, 0.0);
            }
            let scratch = &mut scratch[..needed];
            tap.render(scratch);
            map_channels(scratch, session_channels, output, device_channels);
        };

        self.device
            .build_output_stream(
                &self.config,
                callback,
                |err| error!(%err, "audio output stream error"),
                None,
            )
            .context("build audio output stream")
    }
}

/// Spread interleaved `src` (`src_channels` wide) over interleaved `dst`
/// (`dst_channels` wide), frame by frame.
fn map_channels<S>(src: &[f32], src_channels: usize, dst: &mut [S], dst_channels: usize)
where
    S: FromSample<f32>,
{
    for (in_frame, out_frame) in src.chunks_exact(src_channels).zip(dst.chunks_exact_mut(dst_channels)) {
        for (ch, out) in out_frame.iter_mut().enumerate() {
            let v = match src_channels {
                1 => in_frame[0],
                _ => in_frame.get(ch).copied().unwrap_or(0.0),
            };
            *out = S::from_sample_(v);
        }
    }
    // A trailing partial frame (device period not a multiple of its channel
    // count) is silence.
    let tail = dst.len() - dst.len() % dst_channels;
    for out in &mut dst[tail..] {
        *out = S::from_sample_(0.0);
    }
}
