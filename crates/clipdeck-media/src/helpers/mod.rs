// crates/clipdeck-media/src/helpers/mod.rs
//
// Internal helper modules for clipdeck-media.

#[cfg_attr(not(feature = "ffmpeg"), allow(dead_code))]
pub mod rgba;
pub mod seek;
