// crates/clipdeck-media/tests/common/mod.rs
//
// Shared fixtures for the integration tests. Everything runs against the
// synthetic backend, so no media files are needed.

#![allow(dead_code)]

use clipdeck_media::{MediaPool, OpenParams, PoolConfig, SessionHandle, SyntheticBackend, SyntheticMedia};

pub const CLIP: &str = "clip.mp4";

/// A pool over `backend` with default config. The backend is cloned so the
/// caller keeps a handle on resource tracking.
pub fn pool_over(backend: &SyntheticBackend) -> MediaPool<SyntheticBackend> {
    MediaPool::new(backend.clone(), PoolConfig::default())
}

/// Backend serving `media` as CLIP, a pool over it, and an open handle.
pub fn open_clip(
    media:  SyntheticMedia,
    params: &OpenParams,
) -> (SyntheticBackend, MediaPool<SyntheticBackend>, SessionHandle) {
    let backend = SyntheticBackend::new().with(CLIP, media);
    let mut pool = pool_over(&backend);
    let handle = pool.open(CLIP, params).expect("open synthetic clip");
    (backend, pool, handle)
}

/// Frame index currently in the presentation image (red channel of the
/// top-left pixel).
pub fn shown_frame(pool: &MediaPool<SyntheticBackend>, handle: SessionHandle) -> u8 {
    pool.image(handle).expect("live handle").pixels()[0]
}

pub fn revision(pool: &MediaPool<SyntheticBackend>, handle: SessionHandle) -> u64 {
    pool.image(handle).expect("live handle").revision()
}

/// Tick to `secs`, panicking on a stale handle.
pub fn tick(pool: &mut MediaPool<SyntheticBackend>, handle: SessionHandle, secs: f64) -> clipdeck_media::TickOutcome {
    pool.tick(handle, secs).expect("tick on live handle")
}

pub fn assert_close(actual: f64, expected: f64) {
    assert!((actual - expected).abs() < 1e-9, "expected {expected}, got {actual}");
}
