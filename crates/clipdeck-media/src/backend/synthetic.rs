// crates/clipdeck-media/src/backend/synthetic.rs
//
// Deterministic in-memory backend.
//
// A SyntheticMedia describes a container: duration, frame rate, keyframe
// spacing, frame size, an optional audio track, and failures to inject. The
// backend lays it out as a packet list in file order (sorted by time, then
// stream index), the way a real muxer interleaves tracks.
//
// The video decoder behaves like an inter-frame codec: a non-keyframe only
// decodes if the previous frame was decoded into the reference slot. A seek
// that does not land on a keyframe, or a corrupt packet, therefore makes
// every following frame fail until the next keyframe. Pixel content is a pure
// function of the frame index so tests can check exactly which frame is on
// screen.
//
// Every demuxer/decoder/resampler carries a LiveToken; the backend counts
// live tokens and logs drops in order, which is how tests check rollback and
// teardown order.

use std::collections::{HashMap, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use parking_lot::Mutex;

use clipdeck_core::helpers::time::TimeBase;
use clipdeck_core::{AudioFormat, DecodeError, OpenError, PlanarBuffer};

use super::{
    AudioDecode, ContainerInfo, Demux, DemuxedPacket, MediaBackend, StreamInfo, StreamKind,
    VideoDecode,
};

/// Level of every synthetic audio sample.
pub const AUDIO_LEVEL: f32 = 0.5;

/// Sample level of audio packet `index` when the track is tagged. Exact in
/// f32 for any realistic packet count, and never zero.
pub fn audio_packet_level(index: u64) -> f32 {
    (index + 1) as f32 / 1024.0
}

// ── Media description ─────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SyntheticFailure {
    ContainerOpen,
    Probe,
    VideoCodec,
    AudioCodec,
    Resampler,
    Seek,
    /// Every demux read fails once `after` packets were read since open or
    /// the last seek.
    Read { after: usize },
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SyntheticAudio {
    pub sample_rate:   u32,
    pub channels:      u16,
    /// Samples per channel in each packet.
    pub packet_frames: u32,
    /// Decode packet `k` to `audio_packet_level(k)` instead of AUDIO_LEVEL.
    pub tagged:        bool,
}

impl Default for SyntheticAudio {
    fn default() -> Self {
        Self { sample_rate: 44_100, channels: 2, packet_frames: 1024, tagged: false }
    }
}

#[derive(Clone, Debug)]
pub struct SyntheticMedia {
    pub duration_secs:          f64,
    pub fps:                    u32,
    pub keyframe_interval_secs: f64,
    pub width:                  u32,
    pub height:                 u32,
    pub video:                  bool,
    pub audio:                  Option<SyntheticAudio>,
    /// Puts a data stream ahead of the a/v streams in the stream list.
    pub data_stream:            bool,
    /// Frames the video decoder holds back before producing output.
    pub decoder_delay:          usize,
    pub corrupt_video_frames:   Vec<u64>,
    pub corrupt_audio_packets:  Vec<u64>,
    pub failure:                Option<SyntheticFailure>,
}

impl SyntheticMedia {
    /// 25 fps, 1 s keyframe spacing, 64×36, 44.1 kHz stereo audio.
    pub fn new(duration_secs: f64) -> Self {
        Self {
            duration_secs,
            fps:                    25,
            keyframe_interval_secs: 1.0,
            width:                  64,
            height:                 36,
            video:                  true,
            audio:                  Some(SyntheticAudio::default()),
            data_stream:            false,
            decoder_delay:          0,
            corrupt_video_frames:   Vec::new(),
            corrupt_audio_packets:  Vec::new(),
            failure:                None,
        }
    }

    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width;
        self.height = height;
        self
    }

    pub fn fps(mut self, fps: u32) -> Self {
        self.fps = fps.max(1);
        self
    }

    pub fn keyframe_interval(mut self, secs: f64) -> Self {
        self.keyframe_interval_secs = secs;
        self
    }

    pub fn audio(mut self, sample_rate: u32, channels: u16) -> Self {
        self.audio = Some(SyntheticAudio { sample_rate, channels, ..SyntheticAudio::default() });
        self
    }

    /// Make each decoded audio packet identifiable by its sample level.
    pub fn tag_audio_packets(mut self) -> Self {
        if let Some(a) = self.audio.as_mut() {
            a.tagged = true;
        }
        self
    }

    pub fn without_audio(mut self) -> Self {
        self.audio = None;
        self
    }

    pub fn without_video(mut self) -> Self {
        self.video = false;
        self
    }

    pub fn with_data_stream(mut self) -> Self {
        self.data_stream = true;
        self
    }

    pub fn decoder_delay(mut self, frames: usize) -> Self {
        self.decoder_delay = frames;
        self
    }

    pub fn corrupt_video_frame(mut self, index: u64) -> Self {
        self.corrupt_video_frames.push(index);
        self
    }

    pub fn corrupt_audio_packet(mut self, index: u64) -> Self {
        self.corrupt_audio_packets.push(index);
        self
    }

    pub fn fail(mut self, failure: SyntheticFailure) -> Self {
        self.failure = Some(failure);
        self
    }

    pub fn frame_count(&self) -> u64 {
        if !self.video { return 0; }
        (self.duration_secs * self.fps as f64 + 1e-9).floor().max(0.0) as u64
    }

    pub fn frame_duration_secs(&self) -> f64 {
        1.0 / self.fps as f64
    }

    /// Video pts of frame `index`, in the 1/1000 video time base.
    pub fn frame_pts(&self, index: u64) -> i64 {
        (index as f64 * 1000.0 / self.fps as f64).round() as i64
    }

    pub fn frame_pts_secs(&self, index: u64) -> f64 {
        self.frame_pts(index) as f64 / 1000.0
    }

    fn keyframe_every(&self) -> u64 {
        ((self.keyframe_interval_secs * self.fps as f64).round() as u64).max(1)
    }

    pub fn is_keyframe(&self, index: u64) -> bool {
        index % self.keyframe_every() == 0
    }

    /// Expected RGBA of frame `index` at source pixel (`sx`, `sy`).
    pub fn pixel(&self, index: u64, sx: u32, sy: u32) -> [u8; 4] {
        frame_pixel(index, sx, sy, self.width, self.height)
    }

    fn stream_ids(&self) -> (Option<usize>, Option<usize>, Option<usize>) {
        let mut next = 0;
        let mut take = |present: bool| {
            present.then(|| {
                let id = next;
                next += 1;
                id
            })
        };
        let data  = take(self.data_stream);
        let video = take(self.video);
        let audio = take(self.audio.is_some());
        (data, video, audio)
    }

    fn info(&self) -> ContainerInfo {
        let (data, video, audio) = self.stream_ids();
        let mut streams = Vec::new();
        if let Some(index) = data {
            streams.push(StreamInfo {
                index,
                kind:                StreamKind::Other,
                time_base:           TimeBase::MILLIS,
                start_ts:            0,
                frame_duration_secs: 0.0,
                codec:               "synthetic-data".into(),
            });
        }
        if let Some(index) = video {
            streams.push(StreamInfo {
                index,
                kind:                StreamKind::Video { width: self.width, height: self.height },
                time_base:           TimeBase::MILLIS,
                start_ts:            0,
                frame_duration_secs: self.frame_duration_secs(),
                codec:               "synthetic-video".into(),
            });
        }
        if let (Some(index), Some(a)) = (audio, self.audio) {
            streams.push(StreamInfo {
                index,
                kind:                StreamKind::Audio { sample_rate: a.sample_rate, channels: a.channels },
                time_base:           TimeBase::new(1, a.sample_rate.max(1) as i32),
                start_ts:            0,
                frame_duration_secs: 0.0,
                codec:               "synthetic-audio".into(),
            });
        }
        ContainerInfo { duration_secs: self.duration_secs, streams }
    }

    /// Every packet in file order.
    fn layout(&self) -> Vec<DemuxedPacket<SyntheticPacket>> {
        let (data, video, audio) = self.stream_ids();
        let mut timed: Vec<(f64, DemuxedPacket<SyntheticPacket>)> = Vec::new();

        if let Some(stream) = video {
            for i in 0..self.frame_count() {
                timed.push((self.frame_pts_secs(i), DemuxedPacket {
                    stream,
                    pts:    Some(self.frame_pts(i)),
                    packet: SyntheticPacket {
                        kind:     PacketKind::Video,
                        index:    i,
                        keyframe: self.is_keyframe(i),
                        corrupt:  self.corrupt_video_frames.contains(&i),
                        frames:   0,
                    },
                }));
            }
        }

        if let (Some(stream), Some(a)) = (audio, self.audio) {
            let total = (self.duration_secs * a.sample_rate as f64).floor().max(0.0) as u64;
            let per   = a.packet_frames.max(1) as u64;
            let mut k = 0u64;
            while k * per < total {
                let start = k * per;
                let frames = per.min(total - start) as u32;
                timed.push((start as f64 / a.sample_rate as f64, DemuxedPacket {
                    stream,
                    pts:    Some(start as i64),
                    packet: SyntheticPacket {
                        kind:     PacketKind::Audio,
                        index:    k,
                        keyframe: true,
                        corrupt:  self.corrupt_audio_packets.contains(&k),
                        frames,
                    },
                }));
                k += 1;
            }
        }

        if let Some(stream) = data {
            let mut i = 0u64;
            while (i as f64) < self.duration_secs {
                timed.push((i as f64, DemuxedPacket {
                    stream,
                    pts:    Some(i as i64 * 1000),
                    packet: SyntheticPacket {
                        kind: PacketKind::Data, index: i, keyframe: true, corrupt: false, frames: 0,
                    },
                }));
                i += 1;
            }
        }

        timed.sort_by(|a, b| a.0.total_cmp(&b.0).then(a.1.stream.cmp(&b.1.stream)));
        timed.into_iter().map(|(_, p)| p).collect()
    }
}

/// Pixel pattern shared by the decoder and tests: red encodes the frame index,
/// green and blue encode the source position.
pub fn frame_pixel(index: u64, sx: u32, sy: u32, width: u32, height: u32) -> [u8; 4] {
    let g = (sx as u64 * 255 / width.max(1) as u64) as u8;
    let b = (sy as u64 * 255 / height.max(1) as u64) as u8;
    [(index % 256) as u8, g, b, 255]
}

// ── Packets ───────────────────────────────────────────────────────────────────

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PacketKind {
    Video,
    Audio,
    Data,
}

#[derive(Clone, Debug)]
pub struct SyntheticPacket {
    pub kind:     PacketKind,
    /// Frame index (video) or packet index (audio / data).
    pub index:    u64,
    pub keyframe: bool,
    pub corrupt:  bool,
    /// Samples per channel (audio only).
    pub frames:   u32,
}

// ── Resource tracking ─────────────────────────────────────────────────────────

#[derive(Default)]
struct Tracker {
    live:  AtomicUsize,
    drops: Mutex<Vec<&'static str>>,
}

struct LiveToken {
    tracker: Arc<Tracker>,
    name:    &'static str,
}

impl LiveToken {
    fn new(tracker: &Arc<Tracker>, name: &'static str) -> Self {
        tracker.live.fetch_add(1, Ordering::SeqCst);
        Self { tracker: Arc::clone(tracker), name }
    }
}

impl Drop for LiveToken {
    fn drop(&mut self) {
        self.tracker.live.fetch_sub(1, Ordering::SeqCst);
        self.tracker.drops.lock().push(self.name);
    }
}

// ── Backend ───────────────────────────────────────────────────────────────────

/// Clones share resource tracking, so a test can keep one to inspect after
/// the pool that owns the other is gone.
#[derive(Clone, Default)]
pub struct SyntheticBackend {
    media:   HashMap<PathBuf, SyntheticMedia>,
    tracker: Arc<Tracker>,
}

impl SyntheticBackend {
    pub fn new() -> Self { Self::default() }

    /// Register `media` under `path`. Opening any other path fails like a
    /// missing file.
    pub fn insert(&mut self, path: impl Into<PathBuf>, media: SyntheticMedia) -> &mut Self {
        self.media.insert(path.into(), media);
        self
    }

    pub fn with(mut self, path: impl Into<PathBuf>, media: SyntheticMedia) -> Self {
        self.insert(path, media);
        self
    }

    pub fn media(&self, path: &Path) -> Option<&SyntheticMedia> {
        self.media.get(path)
    }

    /// Demuxers, decoders and resamplers currently alive.
    pub fn live_resources(&self) -> usize {
        self.tracker.live.load(Ordering::SeqCst)
    }

    /// Names of released resources, oldest first.
    pub fn drop_log(&self) -> Vec<&'static str> {
        self.tracker.drops.lock().clone()
    }

    pub fn clear_drop_log(&self) {
        self.tracker.drops.lock().clear();
    }
}

impl MediaBackend for SyntheticBackend {
    type Packet       = SyntheticPacket;
    type Demuxer      = SyntheticDemuxer;
    type VideoDecoder = SyntheticVideo;
    type AudioDecoder = SyntheticAudioDecoder;

    fn open_container(&self, path: &Path) -> Result<SyntheticDemuxer, OpenError> {
        let media = self.media.get(path).ok_or_else(|| OpenError::ContainerOpenFailed {
            path:   path.to_path_buf(),
            reason: "No such file or directory".into(),
        })?;
        if media.failure == Some(SyntheticFailure::ContainerOpen) {
            return Err(OpenError::ContainerOpenFailed {
                path:   path.to_path_buf(),
                reason: "Invalid data found when processing input".into(),
            });
        }
        Ok(SyntheticDemuxer {
            media:   media.clone(),
            packets: media.layout(),
            cursor:  0,
            reads:   0,
            _live:   LiveToken::new(&self.tracker, "demux"),
        })
    }

    fn probe(&self, demuxer: &mut SyntheticDemuxer) -> Result<ContainerInfo, OpenError> {
        let info = demuxer.media.info();
        if demuxer.media.failure == Some(SyntheticFailure::Probe) || info.streams.is_empty() {
            return Err(OpenError::StreamProbeFailed("could not find codec parameters".into()));
        }
        Ok(info)
    }

    fn open_video(&self, demuxer: &SyntheticDemuxer, stream: &StreamInfo) -> Result<SyntheticVideo, OpenError> {
        let media = &demuxer.media;
        if media.failure == Some(SyntheticFailure::VideoCodec) {
            return Err(OpenError::UnsupportedVideoCodec(format!("{} (decoder not found)", stream.codec)));
        }
        Ok(SyntheticVideo {
            media:     media.clone(),
            reference: None,
            pending:   VecDeque::new(),
            current:   None,
            eof_sent:  false,
            _live:     LiveToken::new(&self.tracker, "video"),
        })
    }

    fn open_audio(
        &self,
        demuxer: &SyntheticDemuxer,
        stream:  &StreamInfo,
        target:  AudioFormat,
    ) -> Result<SyntheticAudioDecoder, OpenError> {
        let media = &demuxer.media;
        match media.failure {
            Some(SyntheticFailure::AudioCodec) => {
                return Err(OpenError::UnsupportedAudioCodec(format!("{} (decoder not found)", stream.codec)));
            }
            Some(SyntheticFailure::Resampler) => {
                return Err(OpenError::ResamplerInitFailed("invalid channel layout".into()));
            }
            _ => {}
        }
        let source = media.audio.unwrap_or_default();
        // Same acquisition order as a real backend: decoder, then resampler.
        let decoder_live   = LiveToken::new(&self.tracker, "audio-decoder");
        let resampler_live = LiveToken::new(&self.tracker, "resampler");
        Ok(SyntheticAudioDecoder {
            _decoder:   decoder_live,
            _resampler: resampler_live,
            source_rate: source.sample_rate.max(1),
            tagged:      source.tagged,
            target,
        })
    }
}

// ── Demuxer ───────────────────────────────────────────────────────────────────

pub struct SyntheticDemuxer {
    media:   SyntheticMedia,
    packets: Vec<DemuxedPacket<SyntheticPacket>>,
    cursor:  usize,
    reads:   usize,
    _live:   LiveToken,
}

impl Demux for SyntheticDemuxer {
    type Packet = SyntheticPacket;

    fn read_packet(&mut self) -> Result<Option<DemuxedPacket<SyntheticPacket>>, DecodeError> {
        if let Some(SyntheticFailure::Read { after }) = self.media.failure {
            if self.reads >= after {
                return Err(DecodeError::Demux("Input/output error".into()));
            }
        }
        let Some(p) = self.packets.get(self.cursor) else { return Ok(None) };
        self.cursor += 1;
        self.reads += 1;
        Ok(Some(DemuxedPacket { stream: p.stream, pts: p.pts, packet: p.packet.clone() }))
    }

    fn seek_backward(&mut self, stream: usize, ts: i64) -> Result<(), DecodeError> {
        if self.media.failure == Some(SyntheticFailure::Seek) {
            return Err(DecodeError::Seek("Operation not permitted".into()));
        }
        let landing = self.packets.iter()
            .enumerate()
            .filter(|(_, p)| p.stream == stream && p.packet.keyframe)
            .take_while(|(_, p)| p.pts.unwrap_or(0) <= ts)
            .last()
            .map(|(i, _)| i);
        // Before the first keyframe: rewind to the start of the file.
        self.cursor = landing.unwrap_or(0);
        self.reads = 0;
        Ok(())
    }
}

// ── Video decoder ─────────────────────────────────────────────────────────────

pub struct SyntheticVideo {
    media:     SyntheticMedia,
    reference: Option<u64>,
    pending:   VecDeque<u64>,
    current:   Option<u64>,
    eof_sent:  bool,
    _live:     LiveToken,
}

impl VideoDecode for SyntheticVideo {
    type Packet = SyntheticPacket;

    fn width(&self) -> u32 { self.media.width }
    fn height(&self) -> u32 { self.media.height }

    fn send_packet(&mut self, packet: &SyntheticPacket) -> Result<(), DecodeError> {
        if self.eof_sent {
            return Err(DecodeError::SendPacket("End of file".into()));
        }
        if packet.kind != PacketKind::Video {
            return Err(DecodeError::SendPacket(format!("not a video packet: {:?}", packet.kind)));
        }
        let i = packet.index;
        if packet.corrupt {
            self.reference = None;
            return Err(DecodeError::SendPacket(format!("Invalid data in frame {i}")));
        }
        if !packet.keyframe && (i == 0 || self.reference != Some(i - 1)) {
            self.reference = None;
            return Err(DecodeError::SendPacket(format!("missing reference for frame {i}")));
        }
        self.reference = Some(i);
        self.pending.push_back(i);
        Ok(())
    }

    fn send_eof(&mut self) -> Result<(), DecodeError> {
        self.eof_sent = true;
        Ok(())
    }

    fn receive_frame(&mut self) -> Result<Option<i64>, DecodeError> {
        let ready = self.pending.len() > self.media.decoder_delay
            || (self.eof_sent && !self.pending.is_empty());
        if !ready {
            return Ok(None);
        }
        let index = match self.pending.pop_front() {
            Some(i) => i,
            None => return Ok(None),
        };
        self.current = Some(index);
        Ok(Some(self.media.frame_pts(index)))
    }

    fn convert_into(&mut self, dst: &mut [u8], width: u32, height: u32) -> Result<(), DecodeError> {
        let index = self.current.ok_or_else(|| DecodeError::Convert("no decoded frame".into()))?;
        let expected = width as usize * height as usize * 4;
        if dst.len() != expected {
            return Err(DecodeError::Convert(format!(
                "destination is {} bytes, {width}x{height} RGBA needs {expected}", dst.len()
            )));
        }
        let (src_w, src_h) = (self.media.width, self.media.height);
        for y in 0..height {
            let sy = (y as u64 * src_h as u64 / height.max(1) as u64) as u32;
            for x in 0..width {
                let sx = (x as u64 * src_w as u64 / width.max(1) as u64) as u32;
                let o = (y as usize * width as usize + x as usize) * 4;
                dst[o..o + 4].copy_from_slice(&frame_pixel(index, sx, sy, src_w, src_h));
            }
        }
        Ok(())
    }

    fn flush(&mut self) {
        self.reference = None;
        self.pending.clear();
        self.eof_sent = false;
    }
}

// ── Audio decoder ─────────────────────────────────────────────────────────────

// Field order is drop order: decoder before resampler.
pub struct SyntheticAudioDecoder {
    _decoder:    LiveToken,
    _resampler:  LiveToken,
    source_rate: u32,
    tagged:      bool,
    target:      AudioFormat,
}

impl AudioDecode for SyntheticAudioDecoder {
    type Packet = SyntheticPacket;

    fn decode(&mut self, packet: &SyntheticPacket, out: &mut PlanarBuffer) -> Result<usize, DecodeError> {
        if packet.kind != PacketKind::Audio {
            return Err(DecodeError::SendPacket(format!("not an audio packet: {:?}", packet.kind)));
        }
        if packet.corrupt {
            return Err(DecodeError::SendPacket(format!("Invalid data in audio packet {}", packet.index)));
        }
        let n = (packet.frames as u64 * self.target.sample_rate as u64 / self.source_rate as u64) as usize;
        let level = if self.tagged { audio_packet_level(packet.index) } else { AUDIO_LEVEL };
        out.append_with(n, |_, dst| dst.fill(level));
        Ok(n)
    }

    fn flush(&mut self) {}
}
