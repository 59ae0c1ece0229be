// crates/clipdeck-media/src/lib.rs
//
// Media sessions: open a file, tick it to a playback position, pull audio
// from the callback thread, extract thumbnails. No UI, no audio device.
//
// Layout:
//   backend/      native boundary (ffmpeg, synthetic)
//   probe.rs      session open + rollback
//   decode.rs     tick: refill, decode, seek
//   audio.rs      cross-thread audio critical section
//   thumbnail.rs  one-shot frame extraction
//   pool.rs       MediaPool, the public API

pub mod audio;
pub mod backend;
pub mod decode;
pub mod pool;
pub mod thumbnail;

mod helpers;
mod probe;
mod session;

pub use audio::AudioTap;
pub use backend::synthetic::{SyntheticBackend, SyntheticMedia};
pub use backend::MediaBackend;
pub use decode::TickOutcome;
pub use pool::MediaPool;
pub use thumbnail::Thumbnail;

#[cfg(feature = "ffmpeg")]
pub use backend::ffmpeg::FfmpegBackend;

// Re-export the core types callers need alongside the pool.
pub use clipdeck_core::{
    AudioFormat, ClockState, OpenError, OpenParams, PoolConfig, PresentationImage, RgbaImage,
    SessionError, SessionHandle,
};
