// crates/clipdeck-media/tests/playback.rs
//
// Tick-driven video playback: sequential advance, seeks, clamping, decoder
// delay and corrupt-packet recovery.

mod common;

use clipdeck_media::{ClockState, OpenParams, SyntheticMedia};
use common::{assert_close, open_clip, revision, shown_frame, tick};

fn ten_seconds() -> SyntheticMedia {
    SyntheticMedia::new(10.0)
}

#[test]
fn first_tick_presents_frame_zero() {
    let (_b, mut pool, h) = open_clip(ten_seconds(), &OpenParams::default());
    assert_eq!(revision(&pool, h), 0);

    let out = tick(&mut pool, h, 0.0);
    assert!(!out.seeked);
    assert_eq!(out.presented_secs, Some(0.0));
    assert_eq!(shown_frame(&pool, h), 0);
    assert_eq!(revision(&pool, h), 1);
    assert_close(pool.next_swap_seconds(h).unwrap(), 0.04);
}

#[test]
fn seek_near_end_then_back_to_start() {
    let (_b, mut pool, h) = open_clip(ten_seconds(), &OpenParams::default());
    tick(&mut pool, h, 0.0);
    let first = pool.image(h).unwrap().pixels().to_vec();

    let out = tick(&mut pool, h, 9.99);
    assert!(out.seeked);
    assert_close(out.presented_secs.unwrap(), 9.96);
    assert_eq!(shown_frame(&pool, h), 249);
    assert_eq!(pool.clock_state(h), Some(ClockState::Sequential));

    let out = tick(&mut pool, h, 0.0);
    assert!(out.seeked);
    assert_eq!(pool.image(h).unwrap().pixels(), &first[..]);
}

#[test]
fn repeated_seek_to_same_position_shows_same_frame() {
    let (_b, mut pool, h) = open_clip(ten_seconds(), &OpenParams::default());
    tick(&mut pool, h, 0.0);

    tick(&mut pool, h, 5.5);
    let a = pool.image(h).unwrap().pixels().to_vec();
    assert_eq!(shown_frame(&pool, h), 138);

    tick(&mut pool, h, 9.0);
    tick(&mut pool, h, 5.5);
    assert_eq!(pool.image(h).unwrap().pixels(), &a[..]);
    assert_eq!(shown_frame(&pool, h), 138);
}

#[test]
fn positions_are_clamped_to_the_clip() {
    let (_b, mut pool, h) = open_clip(ten_seconds(), &OpenParams::default());
    tick(&mut pool, h, 0.0);

    let out = tick(&mut pool, h, 42.0);
    assert_close(out.position_secs, 10.0);
    assert_close(pool.position_seconds(h).unwrap(), 10.0);
    assert_eq!(shown_frame(&pool, h), 249);

    let out = tick(&mut pool, h, -5.0);
    assert!(out.seeked);
    assert_close(out.position_secs, 0.0);
    assert_eq!(shown_frame(&pool, h), 0);
}

#[test]
fn sixty_hz_ticks_never_seek_and_next_swap_only_grows() {
    let media = ten_seconds();
    let (_b, mut pool, h) = open_clip(media.clone(), &OpenParams::default());

    let mut last_swap = 0.0;
    for i in 0..=300u32 {
        let pos = f64::from(i) / 60.0;
        let out = tick(&mut pool, h, pos);
        assert!(!out.seeked, "tick {i} at {pos} seeked");

        let swap = pool.next_swap_seconds(h).unwrap();
        assert!(swap >= last_swap, "next_swap went back at tick {i}");
        assert!(swap > pos, "next_swap {swap} not ahead of {pos}");
        last_swap = swap;

        let frame = u64::from(shown_frame(&pool, h));
        assert!(media.frame_pts_secs(frame) <= pos + 1e-9, "frame {frame} shown early at {pos}");
    }
}

#[test]
fn ticks_between_frames_hold_the_image() {
    let (_b, mut pool, h) = open_clip(ten_seconds(), &OpenParams::default());
    tick(&mut pool, h, 0.0);
    let rev = revision(&pool, h);

    let out = tick(&mut pool, h, 0.01);
    assert_eq!(out.presented_secs, None);
    let out = tick(&mut pool, h, 0.03);
    assert_eq!(out.presented_secs, None);
    assert_eq!(revision(&pool, h), rev);

    let out = tick(&mut pool, h, 0.06);
    assert_close(out.presented_secs.unwrap(), 0.04);
    assert_eq!(shown_frame(&pool, h), 1);
}

#[test]
fn paused_tick_does_not_touch_the_image() {
    let (_b, mut pool, h) = open_clip(ten_seconds(), &OpenParams::default());
    tick(&mut pool, h, 0.0);
    tick(&mut pool, h, 0.06);
    let rev = revision(&pool, h);

    for _ in 0..5 {
        let out = tick(&mut pool, h, 0.06);
        assert!(!out.seeked);
        assert_eq!(out.presented_secs, None);
    }
    assert_eq!(revision(&pool, h), rev);
}

#[test]
fn small_backward_step_is_not_a_seek() {
    let (_b, mut pool, h) = open_clip(ten_seconds(), &OpenParams::default());
    tick(&mut pool, h, 0.0);
    tick(&mut pool, h, 0.09);
    let out = tick(&mut pool, h, 0.05);
    assert!(!out.seeked);
    assert_eq!(pool.clock_state(h), Some(ClockState::Sequential));
}

#[test]
fn decoder_delay_is_drained_at_end_of_stream() {
    let media = ten_seconds().decoder_delay(3);
    let (_b, mut pool, h) = open_clip(media, &OpenParams::default());

    tick(&mut pool, h, 0.0);
    assert_eq!(shown_frame(&pool, h), 0);

    tick(&mut pool, h, 9.99);
    assert_eq!(shown_frame(&pool, h), 249);

    // And a seek after draining starts cleanly.
    tick(&mut pool, h, 2.0);
    assert_eq!(shown_frame(&pool, h), 50);
}

#[test]
fn corrupt_frame_skips_to_next_keyframe() {
    let media = ten_seconds().corrupt_video_frame(10);
    let (_b, mut pool, h) = open_clip(media, &OpenParams::default());
    tick(&mut pool, h, 0.0);

    // Frames 10..25 cannot be decoded; the scan lands on keyframe 25.
    let out = tick(&mut pool, h, 0.42);
    assert!(out.seeked);
    assert_eq!(shown_frame(&pool, h), 25);
    assert_close(out.presented_secs.unwrap(), 1.0);

    for k in 1..=40u32 {
        tick(&mut pool, h, 0.42 + f64::from(k) * 0.04);
    }
    assert_eq!(shown_frame(&pool, h), 50);
}

#[test]
fn extra_streams_do_not_confuse_selection() {
    let media = SyntheticMedia::new(2.0).with_data_stream();
    let (_b, mut pool, h) = open_clip(media, &OpenParams::default());
    assert_eq!(pool.has_audio(h), Some(true));

    tick(&mut pool, h, 0.0);
    assert_eq!(shown_frame(&pool, h), 0);
    tick(&mut pool, h, 1.5);
    assert_eq!(shown_frame(&pool, h), 38);
}

#[test]
fn failed_seek_falls_back_to_scanning_forward() {
    let media = ten_seconds().fail(clipdeck_media::backend::synthetic::SyntheticFailure::Seek);
    let (_b, mut pool, h) = open_clip(media, &OpenParams::default());
    tick(&mut pool, h, 0.0);

    let out = tick(&mut pool, h, 5.0);
    assert!(out.seeked);
    assert_eq!(shown_frame(&pool, h), 125);
}

#[test]
fn nan_position_is_treated_as_no_movement() {
    let (_b, mut pool, h) = open_clip(ten_seconds(), &OpenParams::default());
    tick(&mut pool, h, 0.0);
    tick(&mut pool, h, 0.02);
    let out = tick(&mut pool, h, f64::NAN);
    assert!(!out.seeked);
    assert_close(out.position_secs, 0.02);
}

#[test]
fn persistent_read_errors_end_the_stream_until_a_seek() {
    use clipdeck_media::backend::synthetic::SyntheticFailure;

    let media = ten_seconds().without_audio().fail(SyntheticFailure::Read { after: 30 });
    let (_b, mut pool, h) = open_clip(media, &OpenParams::default());

    tick(&mut pool, h, 0.0);
    let mut last = None;
    for i in 1..=50 {
        last = Some(tick(&mut pool, h, f64::from(i) * 0.04));
    }
    // Only frames 0..=29 were ever read; the rest of the clip reads as ended.
    assert_eq!(last.and_then(|o| o.presented_secs), None);
    assert_eq!(shown_frame(&pool, h), 29);

    let out = tick(&mut pool, h, 5.0);
    assert!(out.seeked);
    assert_eq!(out.presented_secs, Some(5.0));
    assert_eq!(shown_frame(&pool, h), 125);
}
