// crates/clipdeck-media/src/session.rs
//
// One open media file.
//
// A Session exclusively owns its demuxer, decoders, converter, resampler and
// presentation image. The audio decoder/resampler live behind AudioTrack's
// lock because the audio callback drives them; everything else is touched by
// the tick thread only.
//
// Teardown order is the field declaration order of the native resources:
//   video decoder (+ converter) → audio decoder → resampler → demuxer → image
// so no resource is released while a later one in the chain could still
// reference it. The queues and plain data drop after that.
//
// Behaviour is split by concern:
//   probe.rs      open + rollback
//   decode.rs     tick: clock step, refill, decode, seek
//   thumbnail.rs  one-shot extraction

use std::path::{Path, PathBuf};

use tracing::debug;

use clipdeck_core::{
    AudioFormat, ClockState, PacketQueue, PlaybackClock, PresentationImage,
};

use crate::audio::{AudioTap, AudioTrack};
use crate::backend::{MediaBackend, StreamInfo, VideoDecode};

pub(crate) struct Session<B: MediaBackend> {
    // ── Native resources, in teardown order ──────────────────────────────────
    pub(crate) video:          B::VideoDecoder,
    pub(crate) audio:          Option<AudioTrack<B>>,
    pub(crate) demux:          B::Demuxer,
    pub(crate) image:          PresentationImage,

    // ── Stream selection ─────────────────────────────────────────────────────
    pub(crate) path:           PathBuf,
    pub(crate) video_stream:   StreamInfo,
    pub(crate) audio_stream:   Option<StreamInfo>,
    /// Format render_audio produces, even when the file has no audio track.
    pub(crate) output_format:  AudioFormat,

    // ── Demux / decode state ─────────────────────────────────────────────────
    pub(crate) video_queue:    PacketQueue<B::Packet>,
    /// A video packet read while the video queue was full.
    pub(crate) pending_video:  Option<B::Packet>,
    pub(crate) demux_eof:      bool,
    /// EOF was sent to the video decoder; only buffered frames remain.
    pub(crate) drained:        bool,
    pub(crate) read_errors:    u32,
    /// Audio packets older than this (audio stream ticks) are stale after a seek.
    pub(crate) audio_floor_ts: Option<i64>,

    pub(crate) clock:          PlaybackClock,
}

impl<B: MediaBackend> Session<B> {
    pub(crate) fn path(&self) -> &Path { &self.path }

    pub(crate) fn file_name(&self) -> String {
        self.path.file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default()
    }

    pub(crate) fn width(&self) -> u32 { self.video.width() }
    pub(crate) fn height(&self) -> u32 { self.video.height() }

    pub(crate) fn total_secs(&self) -> f64 { self.clock.total_secs() }
    pub(crate) fn position_secs(&self) -> f64 { self.clock.position_secs() }
    pub(crate) fn next_swap_secs(&self) -> f64 { self.clock.next_swap_secs() }
    pub(crate) fn clock_state(&self) -> ClockState { self.clock.state() }

    pub(crate) fn image(&self) -> &PresentationImage { &self.image }

    pub(crate) fn has_audio(&self) -> bool { self.audio.is_some() }

    pub(crate) fn output_format(&self) -> AudioFormat { self.output_format }

    pub(crate) fn audio_tap(&self) -> Option<AudioTap<B>> {
        self.audio.as_ref().map(AudioTrack::tap)
    }

    /// Render interleaved audio into `out`. Silence when the session has no
    /// audio track.
    pub(crate) fn render_audio(&self, out: &mut [f32]) {
        match &self.audio {
            Some(track) => track.render(out),
            None => out.fill(0.0),
        }
    }
}

impl<B: MediaBackend> Drop for Session<B> {
    fn drop(&mut self) {
        debug!(path = %self.path.display(), "releasing session resources");
    }
}
