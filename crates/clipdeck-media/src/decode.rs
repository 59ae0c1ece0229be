// crates/clipdeck-media/src/decode.rs
//
// The tick path: clock step → queue refill → decode → convert → present.
//
// Refill
//   One demux read yields one packet of one track. The loop keeps reading
//   while either queue is below its low-water mark. The audio queue has
//   headroom for the packets interleaved with video read-ahead; past that
//   they are dropped so video is never starved. A video packet read while
//   the video queue is full is parked in `pending_video` and the pass ends.
//   Packets of streams we did not select are discarded.
//
// Advance (Sequential, position reached next_swap)
//   Decode forward until a frame covers the position. Intermediate frames
//   are decoded but never converted; only the last one is uploaded.
//
// Seek
//   Flush both queues, the audio cursor and both decoders, backward-seek the
//   demuxer to the keyframe before the target (video time base), then decode
//   forward until pts ≥ target. Hitting end of stream first presents the last
//   frame decoded. Cost is bounded by the keyframe interval.
//
// A packet the decoder rejects is logged and dropped; playback continues.

use tracing::{debug, trace, warn};

use clipdeck_core::ClockStep;

use crate::backend::{Demux, DemuxedPacket, MediaBackend, VideoDecode};
use crate::helpers::seek::seek_backward;
use crate::session::Session;

/// Consecutive demux read failures after which the stream is treated as ended.
const MAX_READ_ERRORS: u32 = 8;

/// Result of one tick.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TickOutcome {
    /// Effective (clamped) position after the tick.
    pub position_secs:  f64,
    /// The tick was classified as a seek.
    pub seeked:         bool,
    /// Presentation time of the frame uploaded by this tick, if any.
    pub presented_secs: Option<f64>,
}

impl<B: MediaBackend> Session<B> {
    pub(crate) fn tick(&mut self, requested_secs: f64) -> TickOutcome {
        let step = self.clock.step(requested_secs);
        let position = self.clock.position_secs();

        let presented = match step {
            ClockStep::Hold => {
                self.refill();
                None
            }
            ClockStep::Advance => {
                self.refill();
                self.advance(position)
            }
            ClockStep::Seek { target_secs } => {
                let presented = self.seek(target_secs);
                self.clock.finish_seek();
                presented
            }
        };

        if let Some(audio) = &self.audio {
            audio.set_eligible(self.clock.audio_eligible());
        }

        TickOutcome {
            position_secs:  position,
            seeked:         matches!(step, ClockStep::Seek { .. }),
            presented_secs: presented,
        }
    }

    // ── Refill ────────────────────────────────────────────────────────────────

    pub(crate) fn refill(&mut self) {
        if self.demux_eof {
            return;
        }
        if let Some(packet) = self.pending_video.take() {
            if let Err(packet) = self.video_queue.push(packet) {
                self.pending_video = Some(packet);
            }
        }

        loop {
            // Nowhere to put another video packet.
            if self.pending_video.is_some() {
                break;
            }
            let video_wants = self.video_queue.wants_more();
            let audio_wants = self.audio.as_ref().is_some_and(|a| a.wants_packets());
            if !video_wants && !audio_wants {
                break;
            }

            match self.demux.read_packet() {
                Ok(Some(packet)) => {
                    self.read_errors = 0;
                    self.route(packet);
                }
                Ok(None) => {
                    debug!(path = %self.path.display(), "end of stream");
                    self.demux_eof = true;
                    break;
                }
                Err(e) => {
                    self.read_errors += 1;
                    warn!(path = %self.path.display(), error = %e, attempt = self.read_errors, "demux read failed");
                    if self.read_errors >= MAX_READ_ERRORS {
                        self.demux_eof = true;
                    }
                    break;
                }
            }
        }
    }

    fn route(&mut self, demuxed: DemuxedPacket<B::Packet>) {
        if demuxed.stream == self.video_stream.index {
            if let Err(packet) = self.video_queue.push(demuxed.packet) {
                self.pending_video = Some(packet);
            }
            return;
        }

        let Some(audio) = &self.audio else { return };
        if demuxed.stream != audio.stream() {
            return;
        }
        if let (Some(floor), Some(pts)) = (self.audio_floor_ts, demuxed.pts) {
            if pts < floor {
                trace!(pts, floor, "stale audio packet skipped");
                return;
            }
        }
        if !audio.push(demuxed.packet) {
            trace!("audio queue full, packet dropped");
        }
    }

    fn next_video_packet(&mut self) -> Option<B::Packet> {
        if let Some(packet) = self.video_queue.pop() {
            return Some(packet);
        }
        if let Some(packet) = self.pending_video.take() {
            return Some(packet);
        }
        self.refill();
        self.video_queue.pop().or_else(|| self.pending_video.take())
    }

    // ── Decode ────────────────────────────────────────────────────────────────

    /// Decode the next video frame (kept inside the decoder as its current
    /// frame) and return its pts. `None` when the stream is exhausted.
    pub(crate) fn next_frame(&mut self) -> Option<i64> {
        loop {
            match self.video.receive_frame() {
                Ok(Some(pts)) => return Some(pts),
                Ok(None) => {}
                Err(e) => warn!(path = %self.path.display(), error = %e, "video frame dropped"),
            }
            if self.drained {
                return None;
            }
            match self.next_video_packet() {
                Some(packet) => {
                    if let Err(e) = self.video.send_packet(&packet) {
                        warn!(path = %self.path.display(), error = %e, "video packet dropped");
                    }
                }
                None if self.demux_eof => {
                    if let Err(e) = self.video.send_eof() {
                        warn!(path = %self.path.display(), error = %e, "decoder drain failed");
                    }
                    self.drained = true;
                }
                None => return None,
            }
        }
    }

    fn advance(&mut self, position: f64) -> Option<f64> {
        let frame_duration = self.video_stream.frame_duration_secs;
        let mut latest = None;
        while let Some(pts) = self.next_frame() {
            let secs = self.video_stream.ts_to_secs(pts);
            latest = Some(secs);
            if secs + frame_duration > position {
                break;
            }
        }
        self.present(latest?)
    }

    /// Convert the decoder's current frame into the presentation image.
    pub(crate) fn present(&mut self, pts_secs: f64) -> Option<f64> {
        let video = &mut self.video;
        match self.image.upload_with(|pixels, w, h| video.convert_into(pixels, w, h)) {
            Ok(revision) => {
                self.clock.frame_presented(pts_secs, self.video_stream.frame_duration_secs);
                trace!(pts = pts_secs, revision, "frame presented");
                Some(pts_secs)
            }
            Err(e) => {
                warn!(path = %self.path.display(), error = %e, "frame conversion failed");
                None
            }
        }
    }

    // ── Seek ──────────────────────────────────────────────────────────────────

    fn seek(&mut self, target_secs: f64) -> Option<f64> {
        let pts = self.seek_and_scan(target_secs, "playback")?;
        self.present(self.video_stream.ts_to_secs(pts))
    }

    /// Flush, seek to the keyframe before `target_secs`, and decode forward to
    /// the first frame at or past it (or the last frame before end of
    /// stream). Leaves that frame current in the decoder; uploads nothing.
    pub(crate) fn seek_and_scan(&mut self, target_secs: f64, label: &str) -> Option<i64> {
        let dropped = self.video_queue.flush() + usize::from(self.pending_video.take().is_some());
        if let Some(audio) = &self.audio {
            audio.flush();
        }
        self.video.flush();
        self.demux_eof   = false;
        self.drained     = false;
        self.read_errors = 0;

        let target_ts = self.video_stream.secs_to_ts(target_secs);
        seek_backward(&mut self.demux, self.video_stream.index, target_ts, label);
        self.audio_floor_ts = self.audio_stream.as_ref().map(|s| s.secs_to_ts(target_secs));

        debug!(
            path   = %self.path.display(),
            target = target_secs,
            ts     = target_ts,
            dropped,
            label,
            "seek"
        );

        let mut last = None;
        while let Some(pts) = self.next_frame() {
            last = Some(pts);
            if pts >= target_ts {
                break;
            }
        }
        last
    }
}
