// crates/clipdeck-media/src/helpers/seek.rs
//
// Backward keyframe seek with soft-fail.
//
// A failed seek is logged and otherwise ignored: the demuxer keeps reading
// from wherever it is, and the forward scan still stops at the first frame
// at or past the target. On a stream that cannot seek at all that means
// decoding forward from the current position (or nothing, past it) instead
// of failing the tick.

use tracing::warn;

use crate::backend::Demux;

/// Seek `demux` so the next packet of `stream` is the keyframe at or before
/// `ts` (stream ticks). Returns false if the seek failed.
pub fn seek_backward<D: Demux>(demux: &mut D, stream: usize, ts: i64, label: &str) -> bool {
    match demux.seek_backward(stream, ts) {
        Ok(()) => true,
        Err(e) => {
            warn!(label, stream, ts, error = %e, "seek soft-fail; decoding from current position");
            false
        }
    }
}
