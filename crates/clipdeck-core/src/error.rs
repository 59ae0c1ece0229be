// crates/clipdeck-core/src/error.rs
//
// Error taxonomy for the session engine.
//
//   OpenError     open failed; nothing was leaked and no slot was consumed.
//   DecodeError   one packet/frame could not be processed; callers log and
//                 drop it, playback continues.
//   PoolError     the pool itself refused an operation.
//   SessionError  an operation on an existing handle could not be served.
//
// Audio-callback failures are never surfaced as errors at all; the audio
// path turns them into silence.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OpenError {
    #[error("session pool exhausted, close unused sessions first")]
    PoolExhausted,
    #[error("failed to open container '{}': {reason}", path.display())]
    ContainerOpenFailed { path: PathBuf, reason: String },
    #[error("failed to find stream info: {0}")]
    StreamProbeFailed(String),
    #[error("no video stream")]
    NoVideoStream,
    #[error("unsupported video codec: {0}")]
    UnsupportedVideoCodec(String),
    #[error("unsupported audio codec: {0}")]
    UnsupportedAudioCodec(String),
    #[error("failed to create audio resampler: {0}")]
    ResamplerInitFailed(String),
}

impl From<PoolError> for OpenError {
    fn from(e: PoolError) -> Self {
        match e {
            PoolError::Exhausted => OpenError::PoolExhausted,
        }
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DecodeError {
    #[error("demux read failed: {0}")]
    Demux(String),
    #[error("decoder rejected packet: {0}")]
    SendPacket(String),
    #[error("decoder failed to produce a frame: {0}")]
    ReceiveFrame(String),
    #[error("pixel conversion failed: {0}")]
    Convert(String),
    #[error("audio resample failed: {0}")]
    Resample(String),
    #[error("seek failed: {0}")]
    Seek(String),
}

#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum PoolError {
    #[error("pool exhausted")]
    Exhausted,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SessionError {
    /// The handle was freed (or never issued). Never aliases a newer session.
    #[error("stale or invalid session handle")]
    StaleHandle,
    /// The stream ran out before any frame could be decoded.
    #[error("no frame decoded at {at_secs:.3}s")]
    NoFrame { at_secs: f64 },
    #[error(transparent)]
    Decode(#[from] DecodeError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pool_exhaustion_maps_into_open_error() {
        let e: OpenError = PoolError::Exhausted.into();
        assert!(matches!(e, OpenError::PoolExhausted));
    }

    #[test]
    fn container_error_names_the_path() {
        let e = OpenError::ContainerOpenFailed {
            path:   PathBuf::from("/tmp/missing.mp4"),
            reason: "No such file or directory".into(),
        };
        let msg = e.to_string();
        assert!(msg.contains("/tmp/missing.mp4"));
        assert!(msg.contains("No such file"));
    }
}
