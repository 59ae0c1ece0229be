// crates/clipdeck-core/src/lib.rs
//
// Plain data and pure logic shared by clipdeck-media and clipdeck-cli.
// No ffmpeg, no audio device, no threads. Everything here is unit-testable
// without a media file.

pub mod audio;
pub mod clock;
pub mod error;
pub mod geometry;
pub mod handle;
pub mod helpers;
pub mod image;
pub mod params;
pub mod pool;
pub mod queue;

pub use audio::{AudioCursor, AudioFormat, PlanarBuffer};
pub use clock::{ClockState, ClockStep, PlaybackClock};
pub use error::{DecodeError, OpenError, PoolError, SessionError};
pub use handle::SessionHandle;
pub use image::{PresentationImage, RgbaImage};
pub use params::{OpenParams, PoolConfig};
pub use pool::Pool;
pub use queue::PacketQueue;
