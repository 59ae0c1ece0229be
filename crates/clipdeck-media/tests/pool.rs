// crates/clipdeck-media/tests/pool.rs
//
// Session lifecycle through MediaPool: open failures and rollback, handle
// generations, exhaustion, teardown order and the mark/sweep protocol.

mod common;

use clipdeck_media::backend::synthetic::SyntheticFailure;
use clipdeck_media::{
    MediaPool, OpenError, OpenParams, PoolConfig, SessionError, SessionHandle, SyntheticBackend,
    SyntheticMedia,
};
use common::{open_clip, pool_over, tick, CLIP};

// Demuxer, video decoder, audio decoder, resampler.
const RESOURCES_WITH_AUDIO: usize = 4;

fn failing(failure: SyntheticFailure) -> SyntheticBackend {
    SyntheticBackend::new().with(CLIP, SyntheticMedia::new(2.0).fail(failure))
}

#[test]
fn every_open_failure_rolls_back_completely() {
    let cases: [(SyntheticFailure, fn(&OpenError) -> bool); 5] = [
        (SyntheticFailure::ContainerOpen, |e| matches!(e, OpenError::ContainerOpenFailed { .. })),
        (SyntheticFailure::Probe,         |e| matches!(e, OpenError::StreamProbeFailed(_))),
        (SyntheticFailure::VideoCodec,    |e| matches!(e, OpenError::UnsupportedVideoCodec(_))),
        (SyntheticFailure::AudioCodec,    |e| matches!(e, OpenError::UnsupportedAudioCodec(_))),
        (SyntheticFailure::Resampler,     |e| matches!(e, OpenError::ResamplerInitFailed(_))),
    ];
    for (failure, expected) in cases {
        let backend = failing(failure);
        let mut pool = pool_over(&backend);
        let err = pool.open(CLIP, &OpenParams::default()).unwrap_err();
        assert!(expected(&err), "{failure:?} gave {err:?}");
        assert_eq!(pool.live_count(), 0, "{failure:?} consumed a slot");
        assert_eq!(backend.live_resources(), 0, "{failure:?} leaked resources");
    }
}

#[test]
fn missing_file_fails_to_open() {
    let backend = SyntheticBackend::new();
    let mut pool = pool_over(&backend);
    let err = pool.open("nope.mp4", &OpenParams::default()).unwrap_err();
    assert!(matches!(err, OpenError::ContainerOpenFailed { .. }));
    assert!(err.to_string().contains("nope.mp4"));
}

#[test]
fn audio_failures_are_skipped_when_audio_is_disabled() {
    for failure in [SyntheticFailure::AudioCodec, SyntheticFailure::Resampler] {
        let backend = failing(failure);
        let mut pool = pool_over(&backend);
        let h = pool.open(CLIP, &OpenParams::video_only()).unwrap();
        assert_eq!(pool.has_audio(h), Some(false));
        assert_eq!(backend.live_resources(), 2);
    }
}

#[test]
fn audio_only_file_is_rejected() {
    let backend = SyntheticBackend::new().with(CLIP, SyntheticMedia::new(2.0).without_video());
    let mut pool = pool_over(&backend);
    assert!(matches!(pool.open(CLIP, &OpenParams::default()), Err(OpenError::NoVideoStream)));
    assert_eq!(backend.live_resources(), 0);
}

#[test]
fn exhausted_pool_fails_fast_and_recovers_after_close() {
    let backend = SyntheticBackend::new().with(CLIP, SyntheticMedia::new(1.0));
    let mut pool = MediaPool::new(backend.clone(), PoolConfig { capacity: 2, ..PoolConfig::default() });

    let a = pool.open(CLIP, &OpenParams::default()).unwrap();
    let _b = pool.open(CLIP, &OpenParams::default()).unwrap();
    let before = backend.live_resources();
    assert!(matches!(pool.open(CLIP, &OpenParams::default()), Err(OpenError::PoolExhausted)));
    assert_eq!(backend.live_resources(), before, "exhaustion must not touch the file");

    pool.close(a);
    let c = pool.open(CLIP, &OpenParams::default()).unwrap();
    assert_eq!(pool.live_count(), 2);
    assert_ne!(a, c);
}

#[test]
fn handles_to_a_reused_slot_stay_dead() {
    let (_backend, mut pool, a) = open_clip(SyntheticMedia::new(2.0), &OpenParams::default());
    assert!(pool.close(a));
    let b = pool.open(CLIP, &OpenParams::default()).unwrap();
    assert_eq!(a.slot(), b.slot());
    assert_ne!(a.generation(), b.generation());

    assert!(!pool.contains(a));
    assert!(matches!(pool.tick(a, 0.0), Err(SessionError::StaleHandle)));
    assert!(matches!(pool.make_thumbnail(a, 0.0, (10, 10)), Err(SessionError::StaleHandle)));
    assert_eq!(pool.total_seconds(a), None);
    assert!(!pool.close(a), "double close is a no-op");
    assert!(pool.contains(b));
}

#[test]
fn invalid_handle_never_resolves() {
    let (_backend, mut pool, _h) = open_clip(SyntheticMedia::new(2.0), &OpenParams::default());
    assert!(!pool.contains(SessionHandle::INVALID));
    assert!(!pool.close(SessionHandle::INVALID));
    assert!(pool.tick(SessionHandle::INVALID, 0.0).is_err());
}

#[test]
fn close_releases_in_teardown_order() {
    let (backend, mut pool, h) = open_clip(SyntheticMedia::new(2.0), &OpenParams::default());
    tick(&mut pool, h, 0.0);
    assert_eq!(backend.live_resources(), RESOURCES_WITH_AUDIO);

    backend.clear_drop_log();
    assert!(pool.close(h));
    assert_eq!(backend.drop_log(), vec!["video", "audio-decoder", "resampler", "demux"]);
    assert_eq!(backend.live_resources(), 0);
}

#[test]
fn dropping_the_pool_closes_every_session() {
    let backend = SyntheticBackend::new().with(CLIP, SyntheticMedia::new(1.0));
    {
        let mut pool = pool_over(&backend);
        for _ in 0..3 {
            pool.open(CLIP, &OpenParams::default()).unwrap();
        }
        assert_eq!(backend.live_resources(), 3 * RESOURCES_WITH_AUDIO);
    }
    assert_eq!(backend.live_resources(), 0);
}

#[test]
fn sweep_closes_only_unmarked_sessions() {
    let backend = SyntheticBackend::new().with(CLIP, SyntheticMedia::new(1.0));
    let mut pool = pool_over(&backend);
    let keep_a = pool.open(CLIP, &OpenParams::default()).unwrap();
    let doomed = pool.open(CLIP, &OpenParams::default()).unwrap();
    let keep_b = pool.open(CLIP, &OpenParams::default()).unwrap();

    pool.clear_marks();
    assert!(pool.mark(keep_a));
    assert!(pool.mark(keep_b));
    assert_eq!(pool.sweep(), 1);

    assert!(pool.contains(keep_a) && pool.contains(keep_b));
    assert!(!pool.contains(doomed));
    assert!(!pool.mark(doomed));
    assert_eq!(backend.live_resources(), 2 * RESOURCES_WITH_AUDIO);

    // Without a fresh round of marks the survivors stay protected.
    assert_eq!(pool.sweep(), 0);

    pool.clear_marks();
    assert_eq!(pool.sweep(), 2);
    assert_eq!(pool.live_count(), 0);
    assert_eq!(backend.live_resources(), 0);
}

#[test]
fn accessors_report_session_metadata() {
    let media = SyntheticMedia::new(3.0).size(320, 180);
    let backend = SyntheticBackend::new().with("/media/holiday.mkv", media);
    let mut pool = pool_over(&backend);
    let h = pool.open("/media/holiday.mkv", &OpenParams::default()).unwrap();

    assert_eq!(pool.width(h), Some(320));
    assert_eq!(pool.height(h), Some(180));
    assert_eq!(pool.total_seconds(h), Some(3.0));
    assert_eq!(pool.position_seconds(h), Some(0.0));
    assert_eq!(pool.next_swap_seconds(h), Some(0.0));
    assert_eq!(pool.file_name(h).as_deref(), Some("holiday.mkv"));
    assert_eq!(pool.file_path(h).map(|p| p.to_string_lossy().into_owned()).as_deref(), Some("/media/holiday.mkv"));
    assert_eq!(pool.has_audio(h), Some(true));

    let image = pool.image(h).unwrap();
    assert_eq!((image.width(), image.height()), (320, 180));
    assert_eq!(image.pixels().len(), 320 * 180 * 4);
    assert_eq!(image.revision(), 0);
}
