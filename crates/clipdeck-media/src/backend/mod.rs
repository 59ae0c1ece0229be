// crates/clipdeck-media/src/backend/mod.rs
//
// The native boundary. Everything above this module (session, decode, audio,
// thumbnail, pool) is written against these traits and never names ffmpeg.
//
// To add a backend:
//   1. Implement MediaBackend + the three per-stream traits
//   2. Gate it behind a cargo feature if it links a native library
//   3. Re-export it below
//
// Timestamps crossing this boundary are always in the owning stream's time
// base (see StreamInfo::time_base). Seconds conversion happens above it.

use std::path::Path;

use clipdeck_core::helpers::time::TimeBase;
use clipdeck_core::{AudioFormat, DecodeError, OpenError, PlanarBuffer};

#[cfg(feature = "ffmpeg")]
pub mod ffmpeg;
pub mod synthetic;

// ── Probe results ─────────────────────────────────────────────────────────────

#[derive(Clone, Debug, PartialEq)]
pub enum StreamKind {
    Video { width: u32, height: u32 },
    Audio { sample_rate: u32, channels: u16 },
    Other,
}

#[derive(Clone, Debug, PartialEq)]
pub struct StreamInfo {
    pub index:               usize,
    pub kind:                StreamKind,
    pub time_base:           TimeBase,
    /// First timestamp of the stream, 0 when the container doesn't say.
    pub start_ts:            i64,
    /// Nominal duration of one video frame. 0.0 for non-video streams.
    pub frame_duration_secs: f64,
    /// Codec name, for error messages and logs.
    pub codec:               String,
}

impl StreamInfo {
    pub fn ts_to_secs(&self, ts: i64) -> f64 {
        self.time_base.ts_to_secs(ts - self.start_ts)
    }

    pub fn secs_to_ts(&self, secs: f64) -> i64 {
        self.start_ts + self.time_base.secs_to_ts(secs)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct ContainerInfo {
    pub duration_secs: f64,
    pub streams:       Vec<StreamInfo>,
}

impl ContainerInfo {
    /// First video stream in container order.
    pub fn first_video(&self) -> Option<&StreamInfo> {
        self.streams.iter().find(|s| matches!(s.kind, StreamKind::Video { .. }))
    }

    /// First audio stream in container order.
    pub fn first_audio(&self) -> Option<&StreamInfo> {
        self.streams.iter().find(|s| matches!(s.kind, StreamKind::Audio { .. }))
    }
}

/// One compressed packet, tagged with the stream it belongs to.
pub struct DemuxedPacket<P> {
    pub stream: usize,
    pub pts:    Option<i64>,
    pub packet: P,
}

// ── Backend traits ────────────────────────────────────────────────────────────

pub trait MediaBackend {
    type Packet:       Send + 'static;
    type Demuxer:      Demux<Packet = Self::Packet>;
    type VideoDecoder: VideoDecode<Packet = Self::Packet>;
    type AudioDecoder: AudioDecode<Packet = Self::Packet> + Send + 'static;

    fn open_container(&self, path: &Path) -> Result<Self::Demuxer, OpenError>;

    fn probe(&self, demuxer: &mut Self::Demuxer) -> Result<ContainerInfo, OpenError>;

    /// Open a decoder for `stream` plus an RGBA8 converter at native size.
    fn open_video(
        &self,
        demuxer: &Self::Demuxer,
        stream:  &StreamInfo,
    ) -> Result<Self::VideoDecoder, OpenError>;

    /// Open a decoder for `stream` plus a resampler producing planar f32 in
    /// `target`.
    fn open_audio(
        &self,
        demuxer: &Self::Demuxer,
        stream:  &StreamInfo,
        target:  AudioFormat,
    ) -> Result<Self::AudioDecoder, OpenError>;
}

pub trait Demux {
    type Packet;

    /// Next packet in file order, or `None` at end of stream.
    fn read_packet(&mut self) -> Result<Option<DemuxedPacket<Self::Packet>>, DecodeError>;

    /// Reposition on the last keyframe of `stream` at or before `ts`.
    fn seek_backward(&mut self, stream: usize, ts: i64) -> Result<(), DecodeError>;
}

pub trait VideoDecode {
    type Packet;

    fn width(&self) -> u32;
    fn height(&self) -> u32;

    fn send_packet(&mut self, packet: &Self::Packet) -> Result<(), DecodeError>;

    /// Signal end of stream so buffered frames can be drained.
    fn send_eof(&mut self) -> Result<(), DecodeError>;

    /// Pull the next decoded frame and keep it as the current frame.
    /// `Ok(None)` means the decoder needs more input (or is fully drained).
    /// Returns the frame's pts in stream ticks.
    fn receive_frame(&mut self) -> Result<Option<i64>, DecodeError>;

    /// Color-convert the current frame to tightly packed RGBA8 at `width ×
    /// height` into `dst` (`width * height * 4` bytes).
    fn convert_into(&mut self, dst: &mut [u8], width: u32, height: u32) -> Result<(), DecodeError>;

    /// Drop all buffered state (reference frames, pending output).
    fn flush(&mut self);
}

pub trait AudioDecode {
    type Packet;

    /// Decode one packet and append its resampled output to `out`. Returns
    /// the number of frames (samples per channel) appended.
    fn decode(&mut self, packet: &Self::Packet, out: &mut PlanarBuffer) -> Result<usize, DecodeError>;

    fn flush(&mut self);
}
