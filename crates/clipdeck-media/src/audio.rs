// crates/clipdeck-media/src/audio.rs
//
// The cross-thread half of a session.
//
// AudioShared is the one critical section shared between the tick thread and
// the audio callback. It holds exactly:
//   - the audio packet queue      (tick pushes, callback pops)
//   - the decoded-audio cursor    (callback only, flushed by the tick on seek)
//   - the audio decoder/resampler (callback decodes, tick flushes / releases)
//   - the eligibility flag        (tick writes after every clock step)
//
// Tick-side critical sections are push, flush, and the eligibility write.
// Callback-side work is bounded by the requested sample count: it stops
// decoding as soon as the output buffer is full.
//
// AudioTrack is the session's owning handle. Dropping it takes the lock and
// releases decoder then resampler, so an AudioTap that outlives its session
// just renders silence.

use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, warn};

use clipdeck_core::{AudioCursor, AudioFormat, PacketQueue, PlanarBuffer};

use crate::backend::{AudioDecode, MediaBackend};

/// Audio packets are much shorter than video frames, so while video reads
/// ahead to its low-water mark the audio queue may take this many times its
/// own before dropping.
const AUDIO_HEADROOM: usize = 8;

pub(crate) struct AudioShared<B: MediaBackend> {
    decoder:  Option<B::AudioDecoder>,
    queue:    PacketQueue<B::Packet>,
    cursor:   AudioCursor,
    planar:   PlanarBuffer,
    eligible: bool,
}

impl<B: MediaBackend> AudioShared<B> {
    /// Fill `out` with interleaved samples. Whatever could not be produced
    /// (underrun, ineligible, no decoder, decode failure) is zero-filled.
    fn render(&mut self, out: &mut [f32]) {
        let mut written = 0;
        if self.eligible {
            if let Some(decoder) = self.decoder.as_mut() {
                while written < out.len() {
                    written += self.cursor.copy_into(&mut out[written..]);
                    if written == out.len() {
                        break;
                    }
                    let Some(packet) = self.queue.pop() else { break };
                    self.planar.clear();
                    match decoder.decode(&packet, &mut self.planar) {
                        Ok(_) => self.cursor.load(&self.planar),
                        Err(e) => {
                            warn!(error = %e, "audio packet dropped");
                            self.cursor.clear();
                            break;
                        }
                    }
                }
            }
        }
        out[written..].fill(0.0);
    }

    fn flush(&mut self) -> usize {
        let dropped = self.queue.flush();
        self.cursor.clear();
        self.planar.clear();
        if let Some(decoder) = self.decoder.as_mut() {
            decoder.flush();
        }
        self.eligible = false;
        dropped
    }
}

// ── Session side ──────────────────────────────────────────────────────────────

pub(crate) struct AudioTrack<B: MediaBackend> {
    shared: Arc<Mutex<AudioShared<B>>>,
    format: AudioFormat,
    stream: usize,
}

impl<B: MediaBackend> AudioTrack<B> {
    pub(crate) fn new(
        decoder:   B::AudioDecoder,
        stream:    usize,
        format:    AudioFormat,
        low_water: usize,
    ) -> Self {
        let low_water = low_water.max(1);
        let shared = AudioShared {
            decoder:  Some(decoder),
            queue:    PacketQueue::with_headroom(low_water, low_water * AUDIO_HEADROOM),
            cursor:   AudioCursor::new(),
            planar:   PlanarBuffer::for_one_second(format),
            eligible: false,
        };
        Self { shared: Arc::new(Mutex::new(shared)), format, stream }
    }

    pub(crate) fn stream(&self) -> usize { self.stream }

    pub(crate) fn wants_packets(&self) -> bool {
        self.shared.lock().queue.wants_more()
    }

    /// Enqueue a packet. Returns false (and drops the packet) when the queue
    /// is past its headroom.
    pub(crate) fn push(&self, packet: B::Packet) -> bool {
        self.shared.lock().queue.push(packet).is_ok()
    }

    pub(crate) fn flush(&self) {
        let dropped = self.shared.lock().flush();
        if dropped > 0 {
            debug!(dropped, "audio queue flushed");
        }
    }

    pub(crate) fn set_eligible(&self, eligible: bool) {
        self.shared.lock().eligible = eligible;
    }

    pub(crate) fn render(&self, out: &mut [f32]) {
        self.shared.lock().render(out);
    }

    pub(crate) fn tap(&self) -> AudioTap<B> {
        AudioTap { shared: Arc::clone(&self.shared), format: self.format }
    }

    #[cfg(test)]
    pub(crate) fn queued(&self) -> usize {
        self.shared.lock().queue.len()
    }
}

impl<B: MediaBackend> Drop for AudioTrack<B> {
    fn drop(&mut self) {
        let mut shared = self.shared.lock();
        shared.queue.flush();
        shared.cursor.clear();
        shared.eligible = false;
        // Decoder first, then its resampler (field order inside the decoder).
        shared.decoder = None;
    }
}

// ── Callback side ─────────────────────────────────────────────────────────────

/// Handle for the audio callback context. Cloning is cheap. Once the session
/// is closed every render produces silence.
pub struct AudioTap<B: MediaBackend> {
    shared: Arc<Mutex<AudioShared<B>>>,
    format: AudioFormat,
}

impl<B: MediaBackend> Clone for AudioTap<B> {
    fn clone(&self) -> Self {
        Self { shared: Arc::clone(&self.shared), format: self.format }
    }
}

impl<B: MediaBackend> AudioTap<B> {
    pub fn format(&self) -> AudioFormat { self.format }

    /// Fill `out` with interleaved f32 samples in `format()`. Never blocks on
    /// I/O; the lock is held only for this call.
    pub fn render(&self, out: &mut [f32]) {
        self.shared.lock().render(out);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::synthetic::{
        PacketKind, SyntheticBackend, SyntheticMedia, SyntheticPacket, AUDIO_LEVEL,
    };
    use crate::backend::StreamKind;
    use std::path::Path;

    fn track(backend: &SyntheticBackend) -> AudioTrack<SyntheticBackend> {
        let mut d = backend.open_container(Path::new("a.mp4")).unwrap();
        let info = backend.probe(&mut d).unwrap();
        let stream = info.first_audio().unwrap().clone();
        assert!(matches!(stream.kind, StreamKind::Audio { .. }));
        let format = AudioFormat::clamped(48_000, 2);
        let dec = backend.open_audio(&d, &stream, format).unwrap();
        AudioTrack::new(dec, stream.index, format, 4)
    }

    fn packet(index: u64) -> SyntheticPacket {
        SyntheticPacket { kind: PacketKind::Audio, index, keyframe: true, corrupt: false, frames: 480 }
    }

    fn backend() -> SyntheticBackend {
        SyntheticBackend::new().with("a.mp4", SyntheticMedia::new(1.0).audio(48_000, 2))
    }

    #[test]
    fn ineligible_renders_zeros_without_consuming() {
        let b = backend();
        let t = track(&b);
        assert!(t.push(packet(0)));
        let mut out = vec![1.0f32; 64];
        t.render(&mut out);
        assert!(out.iter().all(|s| *s == 0.0));
        assert_eq!(t.queued(), 1);
    }

    #[test]
    fn eligible_render_decodes_and_spans_callbacks() {
        let b = backend();
        let t = track(&b);
        t.push(packet(0)); // 480 frames → 960 interleaved samples
        t.set_eligible(true);
        let mut out = vec![0.0f32; 600];
        t.render(&mut out);
        assert!(out.iter().all(|s| *s == AUDIO_LEVEL));
        let mut out = vec![9.0f32; 600];
        t.render(&mut out);
        assert!(out[..360].iter().all(|s| *s == AUDIO_LEVEL));
        assert!(out[360..].iter().all(|s| *s == 0.0), "underrun tail must be silent");
    }

    #[test]
    fn underrun_on_empty_queue_is_silent() {
        let b = backend();
        let t = track(&b);
        t.set_eligible(true);
        let mut out = vec![3.0f32; 128];
        t.render(&mut out);
        assert!(out.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn full_queue_rejects_push() {
        let b = backend();
        let t = track(&b);
        for i in 0..4 {
            assert!(t.push(packet(i)));
        }
        assert!(!t.wants_packets());
        for i in 4..4 * AUDIO_HEADROOM as u64 {
            assert!(t.push(packet(i)), "headroom keeps packet {i}");
        }
        assert!(!t.push(packet(99)));
    }

    #[test]
    fn corrupt_packet_degrades_to_silence() {
        let b = backend();
        let t = track(&b);
        let mut bad = packet(0);
        bad.corrupt = true;
        t.push(bad);
        t.push(packet(1));
        t.set_eligible(true);
        let mut out = vec![5.0f32; 32];
        t.render(&mut out);
        assert!(out.iter().all(|s| *s == 0.0));
        // The next callback picks up the good packet.
        t.render(&mut out);
        assert!(out.iter().all(|s| *s == AUDIO_LEVEL));
    }

    #[test]
    fn flush_clears_cursor_and_eligibility() {
        let b = backend();
        let t = track(&b);
        t.push(packet(0));
        t.set_eligible(true);
        let mut out = vec![0.0f32; 10];
        t.render(&mut out);
        t.flush();
        assert_eq!(t.queued(), 0);
        let mut out = vec![1.0f32; 10];
        t.render(&mut out);
        assert!(out.iter().all(|s| *s == 0.0));
    }

    #[test]
    fn tap_outliving_track_is_silent_and_decoder_released() {
        let b = backend();
        let t = track(&b);
        t.push(packet(0));
        t.set_eligible(true);
        let tap = t.tap();
        b.clear_drop_log();
        drop(t);
        assert_eq!(b.drop_log(), vec!["audio-decoder", "resampler"]);
        let mut out = vec![1.0f32; 16];
        tap.render(&mut out);
        assert!(out.iter().all(|s| *s == 0.0));
    }
}
