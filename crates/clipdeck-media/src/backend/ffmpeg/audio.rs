// crates/clipdeck-media/src/backend/ffmpeg/audio.rs
//
// Audio decoder + resampler, driven from the audio callback thread.
//
// Every source is converted to planar f32 at the session's target rate and
// layout. The resampler is built at open time (not lazily on the first
// frame) so a bad source layout fails the open instead of the playback.
// Mono sources are declared as MONO explicitly or swr misreads the layout.
//
// A flush drains swr's delay line too, so no pre-seek samples lead the first
// chunk decoded after a seek.

use ffmpeg_the_third as ffmpeg;
use ffmpeg::format::sample::{Sample, Type as SampleType};
use ffmpeg::software::resampling;
use ffmpeg::util::channel_layout::{ChannelLayout, ChannelLayoutMask};
use ffmpeg::util::frame::audio::Audio as AudioFrame;
use tracing::debug;

use clipdeck_core::{AudioFormat, DecodeError, OpenError, PlanarBuffer};

use super::demux::FfmpegDemuxer;
use crate::backend::{AudioDecode, StreamInfo};

const OUT_FMT: Sample = Sample::F32(SampleType::Planar);

/// Output capacity of one drain. swr's filter delay is far below this.
const DRAIN_SAMPLES: usize = 8192;

// Field order is drop order: decoder before resampler.
pub struct FfmpegAudio {
    decoder:   ffmpeg::decoder::Audio,
    resampler: resampling::Context,
    frame:     AudioFrame,
    channels:  usize,
}

// The session hands this to the audio callback thread behind a mutex; it is
// never used from two threads at once.
unsafe impl Send for FfmpegAudio {}

impl FfmpegAudio {
    pub(crate) fn open(
        demuxer: &FfmpegDemuxer,
        stream:  &StreamInfo,
        target:  AudioFormat,
    ) -> Result<Self, OpenError> {
        let unsupported = |e: ffmpeg::Error| {
            OpenError::UnsupportedAudioCodec(format!("{} ({e})", stream.codec))
        };

        let av_stream = demuxer.input().stream(stream.index)
            .ok_or_else(|| OpenError::StreamProbeFailed(format!("stream {} vanished", stream.index)))?;
        let dec_ctx = ffmpeg::codec::context::Context::from_parameters(av_stream.parameters())
            .map_err(unsupported)?;
        let decoder = dec_ctx.decoder().audio().map_err(unsupported)?;

        let out_layout = if target.channels >= 2 { ChannelLayout::STEREO } else { ChannelLayout::MONO };
        let resampler = {
            let src_layout = if decoder.ch_layout().channels() >= 2 {
                decoder.ch_layout()
            } else {
                ChannelLayout::MONO
            };
            resampling::Context::get2(
                decoder.format(), src_layout, decoder.rate(),
                OUT_FMT,          out_layout, target.sample_rate,
            ).map_err(|e| OpenError::ResamplerInitFailed(format!(
                "{} {}Hz → {}ch {}Hz: {e}",
                stream.codec, decoder.rate(), target.channels, target.sample_rate,
            )))?
        };

        Ok(Self {
            decoder,
            resampler,
            frame:    AudioFrame::empty(),
            channels: target.channels as usize,
        })
    }

    fn append_resampled(&mut self, out: &mut PlanarBuffer) -> Result<usize, DecodeError> {
        let mut resampled = AudioFrame::empty();
        self.resampler.run(&self.frame, &mut resampled)
            .map_err(|e| DecodeError::Resample(e.to_string()))?;
        let n = resampled.samples();
        if n == 0 {
            return Ok(0);
        }
        let planes = self.channels.min(out.channels());
        out.append_with(n, |ch, dst| {
            // FLTP: one plane per channel, n f32 samples each.
            let plane = resampled.data(ch.min(planes.saturating_sub(1)));
            let src = unsafe { std::slice::from_raw_parts(plane.as_ptr() as *const f32, n) };
            dst.copy_from_slice(src);
        });
        Ok(n)
    }
}

impl AudioDecode for FfmpegAudio {
    type Packet = ffmpeg::Packet;

    fn decode(&mut self, packet: &ffmpeg::Packet, out: &mut PlanarBuffer) -> Result<usize, DecodeError> {
        self.decoder.send_packet(packet).map_err(|e| DecodeError::SendPacket(e.to_string()))?;
        let mut total = 0;
        while self.decoder.receive_frame(&mut self.frame).is_ok() {
            total += self.append_resampled(out)?;
        }
        Ok(total)
    }

    fn flush(&mut self) {
        self.decoder.flush();
        drain_resampler(&mut self.resampler, self.channels);
    }
}

/// Pull whatever swr still buffers and throw it away.
fn drain_resampler(resampler: &mut resampling::Context, channels: usize) {
    let mask = if channels >= 2 { ChannelLayoutMask::STEREO } else { ChannelLayoutMask::MONO };
    let mut discard = AudioFrame::new(OUT_FMT, DRAIN_SAMPLES, mask);
    discard.set_rate(resampler.output().rate);
    let mut drained = 0;
    loop {
        match resampler.flush(&mut discard) {
            Ok(Some(_)) if discard.samples() > 0 => drained += discard.samples(),
            Ok(_) => break,
            Err(e) => {
                debug!(error = %e, "resampler drain failed");
                break;
            }
        }
    }
    if drained > 0 {
        debug!(samples = drained, "resampler drained");
    }
}
