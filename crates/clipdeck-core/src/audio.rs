// crates/clipdeck-core/src/audio.rs
//
// Sample-level plumbing for the audio callback path.
//
//   AudioFormat   target rate / channel count every session resamples to.
//   PlanarBuffer  one-second planar f32 scratch the resampler writes into.
//   AudioCursor   the interleaved chunk currently being played out, plus how
//                 far into it the callback has got. Survives across callbacks.
//
// Interleaving happens exactly once per decoded chunk (`AudioCursor::load`),
// never per copy. Copies out of the cursor are plain slice copies.

use serde::{Deserialize, Serialize};

pub const DEFAULT_SAMPLE_RATE: u32 = 48_000;
pub const DEFAULT_CHANNELS: u16 = 2;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct AudioFormat {
    pub sample_rate: u32,
    pub channels:    u16,
}

impl AudioFormat {
    /// Build a format the pipeline can produce: mono or stereo, non-zero rate.
    pub fn clamped(sample_rate: u32, channels: u16) -> Self {
        Self {
            sample_rate: sample_rate.max(1),
            channels:    channels.clamp(1, 2),
        }
    }
}

impl Default for AudioFormat {
    fn default() -> Self {
        Self { sample_rate: DEFAULT_SAMPLE_RATE, channels: DEFAULT_CHANNELS }
    }
}

/// Planar f32 scratch: one Vec per channel, `frames` valid samples in each.
pub struct PlanarBuffer {
    planes: Vec<Vec<f32>>,
    frames: usize,
}

impl PlanarBuffer {
    /// Pre-allocate one second of audio at `format`.
    pub fn for_one_second(format: AudioFormat) -> Self {
        let per_channel = format.sample_rate as usize;
        Self {
            planes: (0..format.channels).map(|_| Vec::with_capacity(per_channel)).collect(),
            frames: 0,
        }
    }

    pub fn channels(&self) -> usize { self.planes.len() }

    pub fn frames(&self) -> usize { self.frames }

    pub fn clear(&mut self) {
        for plane in &mut self.planes {
            plane.clear();
        }
        self.frames = 0;
    }

    /// Append `frames` samples to every plane. `fill(channel, dst)` writes
    /// exactly `dst.len()` samples for that channel.
    pub fn append_with(&mut self, frames: usize, mut fill: impl FnMut(usize, &mut [f32])) {
        for (ch, plane) in self.planes.iter_mut().enumerate() {
            let start = plane.len();
            plane.resize(start + frames, 0.0);
            fill(ch, &mut plane[start..]);
        }
        self.frames += frames;
    }

    pub fn plane(&self, channel: usize) -> &[f32] {
        &self.planes[channel][..self.frames]
    }
}

/// Interleave `planar` into `out` (cleared first). L R L R … for stereo.
pub fn interleave(planar: &PlanarBuffer, out: &mut Vec<f32>) {
    let channels = planar.channels();
    let frames   = planar.frames();
    out.clear();
    out.resize(frames * channels, 0.0);
    for ch in 0..channels {
        let src = planar.plane(ch);
        for (i, s) in src.iter().enumerate() {
            out[i * channels + ch] = *s;
        }
    }
}

/// Partially consumed interleaved chunk.
#[derive(Default)]
pub struct AudioCursor {
    chunk:  Vec<f32>,
    offset: usize,
}

impl AudioCursor {
    pub fn new() -> Self { Self::default() }

    /// Samples (not frames) still waiting to be copied out.
    pub fn remaining(&self) -> usize { self.chunk.len() - self.offset }

    pub fn offset(&self) -> usize { self.offset }

    /// Replace the chunk with a freshly interleaved copy of `planar` and
    /// rewind to the start. The chunk's allocation is reused.
    pub fn load(&mut self, planar: &PlanarBuffer) {
        interleave(planar, &mut self.chunk);
        self.offset = 0;
    }

    /// Copy as many samples as fit into `out`. Returns how many were written.
    pub fn copy_into(&mut self, out: &mut [f32]) -> usize {
        let n = self.remaining().min(out.len());
        out[..n].copy_from_slice(&self.chunk[self.offset..self.offset + n]);
        self.offset += n;
        n
    }

    /// Forget the current chunk (seek / flush).
    pub fn clear(&mut self) {
        self.chunk.clear();
        self.offset = 0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn stereo_ramp(frames: usize) -> PlanarBuffer {
        let mut p = PlanarBuffer::for_one_second(AudioFormat::clamped(100, 2));
        p.append_with(frames, |ch, dst| {
            for (i, s) in dst.iter_mut().enumerate() {
                *s = if ch == 0 { i as f32 } else { -(i as f32) };
            }
        });
        p
    }

    #[test]
    fn clamped_format_limits_channels() {
        assert_eq!(AudioFormat::clamped(44_100, 6).channels, 2);
        assert_eq!(AudioFormat::clamped(44_100, 0).channels, 1);
        assert_eq!(AudioFormat::clamped(0, 1).sample_rate, 1);
    }

    #[test]
    fn planar_preallocates_one_second() {
        let p = PlanarBuffer::for_one_second(AudioFormat::clamped(48_000, 2));
        assert_eq!(p.channels(), 2);
        assert!(p.planes.iter().all(|pl| pl.capacity() >= 48_000));
    }

    #[test]
    fn interleave_stereo() {
        let p = stereo_ramp(3);
        let mut out = Vec::new();
        interleave(&p, &mut out);
        assert_eq!(out, vec![0.0, -0.0, 1.0, -1.0, 2.0, -2.0]);
    }

    #[test]
    fn interleave_mono_is_identity() {
        let mut p = PlanarBuffer::for_one_second(AudioFormat::clamped(10, 1));
        p.append_with(4, |_, dst| dst.copy_from_slice(&[0.1, 0.2, 0.3, 0.4]));
        let mut out = Vec::new();
        interleave(&p, &mut out);
        assert_eq!(out, vec![0.1, 0.2, 0.3, 0.4]);
    }

    #[test]
    fn append_accumulates_frames() {
        let mut p = stereo_ramp(2);
        p.append_with(2, |_, dst| dst.fill(9.0));
        assert_eq!(p.frames(), 4);
        assert_eq!(p.plane(0), &[0.0, 1.0, 9.0, 9.0]);
        p.clear();
        assert_eq!(p.frames(), 0);
    }

    #[test]
    fn cursor_spans_multiple_copies() {
        let mut c = AudioCursor::new();
        c.load(&stereo_ramp(3)); // 6 samples
        let mut a = [0.0f32; 4];
        assert_eq!(c.copy_into(&mut a), 4);
        assert_eq!(a, [0.0, -0.0, 1.0, -1.0]);
        assert_eq!(c.remaining(), 2);
        let mut b = [7.0f32; 4];
        assert_eq!(c.copy_into(&mut b), 2);
        assert_eq!(&b[..2], &[2.0, -2.0]);
        assert_eq!(&b[2..], &[7.0, 7.0], "copy must not touch the tail");
        assert_eq!(c.remaining(), 0);
    }

    #[test]
    fn load_rewinds_cursor() {
        let mut c = AudioCursor::new();
        c.load(&stereo_ramp(2));
        let mut sink = [0.0f32; 3];
        c.copy_into(&mut sink);
        c.load(&stereo_ramp(1));
        assert_eq!(c.offset(), 0);
        assert_eq!(c.remaining(), 2);
    }

    #[test]
    fn clear_empties_cursor() {
        let mut c = AudioCursor::new();
        c.load(&stereo_ramp(5));
        c.clear();
        assert_eq!(c.remaining(), 0);
        let mut out = [1.0f32; 2];
        assert_eq!(c.copy_into(&mut out), 0);
    }
}
