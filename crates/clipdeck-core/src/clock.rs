// crates/clipdeck-core/src/clock.rs
//
// Playback clock and seek classifier.
//
// Two states:
//   Sequential  the default. Small steps (|dt| ≤ epsilon, either direction)
//               just move the position; a decode is due only once the
//               position reaches `next_swap_secs`, so repeated ticks between
//               frame boundaries cost nothing.
//   Seeking     entered for any larger jump, or after `invalidate()` when
//               something else moved the demux cursor (thumbnail extraction).
//               The owner flushes, seeks, decodes forward, then calls
//               `finish_seek()` to return to Sequential.
//
// `next_swap_secs` is the time at which the presented frame stops being
// current (its pts plus one frame duration). It is reset to zero on every
// seek and only ever grows between seeks.
//
// Audio is eligible to play only after a Sequential step with dt ≠ 0: a
// seek tick and a zero-delta (paused) tick are both silent.

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockState {
    Sequential,
    Seeking,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ClockStep {
    /// The presented frame is still current.
    Hold,
    /// The presented frame expired. Decode forward until one covers the position.
    Advance,
    /// Discontinuity. Flush queues and decoders, then seek to `target_secs`.
    Seek { target_secs: f64 },
}

#[derive(Clone, Debug)]
pub struct PlaybackClock {
    position_secs:  f64,
    next_swap_secs: f64,
    total_secs:     f64,
    state:          ClockState,
    seek_epsilon:   f64,
    last_dt:        f64,
    audio_eligible: bool,
    resync_pending: bool,
}

impl PlaybackClock {
    pub fn new(total_secs: f64, seek_epsilon: f64) -> Self {
        Self {
            position_secs:  0.0,
            next_swap_secs: 0.0,
            total_secs:     if total_secs.is_finite() { total_secs.max(0.0) } else { 0.0 },
            state:          ClockState::Sequential,
            seek_epsilon:   if seek_epsilon.is_finite() { seek_epsilon.max(0.0) } else { 0.0 },
            last_dt:        0.0,
            audio_eligible: false,
            resync_pending: false,
        }
    }

    pub fn position_secs(&self) -> f64 { self.position_secs }
    pub fn next_swap_secs(&self) -> f64 { self.next_swap_secs }
    pub fn total_secs(&self) -> f64 { self.total_secs }
    pub fn state(&self) -> ClockState { self.state }
    pub fn seek_epsilon(&self) -> f64 { self.seek_epsilon }
    pub fn last_dt(&self) -> f64 { self.last_dt }
    pub fn audio_eligible(&self) -> bool { self.audio_eligible }

    /// Clamp a requested position into `[0, total_secs]`. NaN maps to the
    /// current position so a bad caller value reads as "no movement".
    pub fn clamp(&self, requested_secs: f64) -> f64 {
        if requested_secs.is_nan() {
            return self.position_secs;
        }
        requested_secs.clamp(0.0, self.total_secs)
    }

    /// Classify one tick. Updates position, dt and audio eligibility.
    pub fn step(&mut self, requested_secs: f64) -> ClockStep {
        let p  = self.clamp(requested_secs);
        let dt = p - self.position_secs;
        self.last_dt = dt;
        self.position_secs = p;

        if self.resync_pending || dt.abs() > self.seek_epsilon {
            self.resync_pending = false;
            self.state = ClockState::Seeking;
            self.next_swap_secs = 0.0;
            self.audio_eligible = false;
            return ClockStep::Seek { target_secs: p };
        }

        self.audio_eligible = dt != 0.0;
        if p >= self.next_swap_secs {
            ClockStep::Advance
        } else {
            ClockStep::Hold
        }
    }

    /// Record that a frame with presentation time `pts_secs` is now on screen.
    pub fn frame_presented(&mut self, pts_secs: f64, frame_duration_secs: f64) {
        let due = pts_secs + frame_duration_secs.max(0.0);
        if due.is_finite() && due > self.next_swap_secs {
            self.next_swap_secs = due;
        }
    }

    /// Leave the Seeking state after the forward decode completed.
    pub fn finish_seek(&mut self) {
        self.state = ClockState::Sequential;
    }

    /// Force the next `step` to be treated as a seek, whatever its dt.
    pub fn invalidate(&mut self) {
        self.resync_pending = true;
        self.audio_eligible = false;
    }

    pub fn needs_resync(&self) -> bool { self.resync_pending }
}

#[cfg(test)]
mod tests {
    use super::*;

    const EPS: f64 = 0.1;
    const FRAME: f64 = 0.04;

    #[test]
    fn starts_sequential_at_zero() {
        let c = PlaybackClock::new(10.0, EPS);
        assert_eq!(c.position_secs(), 0.0);
        assert_eq!(c.state(), ClockState::Sequential);
        assert!(!c.audio_eligible());
    }

    #[test]
    fn first_tick_at_zero_decodes() {
        let mut c = PlaybackClock::new(10.0, EPS);
        assert_eq!(c.step(0.0), ClockStep::Advance);
    }

    #[test]
    fn negative_request_clamps_to_zero() {
        let mut c = PlaybackClock::new(10.0, EPS);
        c.step(-5.0);
        assert_eq!(c.position_secs(), 0.0);
    }

    #[test]
    fn past_end_clamps_to_total() {
        let mut c = PlaybackClock::new(10.0, EPS);
        c.step(99.0);
        assert_eq!(c.position_secs(), 10.0);
    }

    #[test]
    fn nan_request_is_no_movement() {
        let mut c = PlaybackClock::new(10.0, EPS);
        c.step(0.05);
        c.step(f64::NAN);
        assert_eq!(c.position_secs(), 0.05);
        assert_eq!(c.last_dt(), 0.0);
    }

    #[test]
    fn large_jump_either_direction_is_a_seek() {
        let mut c = PlaybackClock::new(10.0, EPS);
        assert_eq!(c.step(5.0), ClockStep::Seek { target_secs: 5.0 });
        assert_eq!(c.state(), ClockState::Seeking);
        c.finish_seek();
        assert_eq!(c.step(1.0), ClockStep::Seek { target_secs: 1.0 });
    }

    #[test]
    fn seek_resets_next_swap_and_silences_audio() {
        let mut c = PlaybackClock::new(10.0, EPS);
        c.step(0.0);
        c.frame_presented(0.0, FRAME);
        assert!(c.next_swap_secs() > 0.0);
        c.step(4.0);
        assert_eq!(c.next_swap_secs(), 0.0);
        assert!(!c.audio_eligible());
    }

    #[test]
    fn holds_between_frame_boundaries() {
        let mut c = PlaybackClock::new(10.0, EPS);
        assert_eq!(c.step(0.0), ClockStep::Advance);
        c.frame_presented(0.0, FRAME);
        assert_eq!(c.step(0.01), ClockStep::Hold);
        assert_eq!(c.step(0.02), ClockStep::Hold);
        assert_eq!(c.step(0.04), ClockStep::Advance);
    }

    #[test]
    fn paused_tick_is_silent_and_free() {
        let mut c = PlaybackClock::new(10.0, EPS);
        c.step(0.0);
        c.frame_presented(0.0, FRAME);
        assert_eq!(c.step(0.0), ClockStep::Hold);
        assert!(!c.audio_eligible());
    }

    #[test]
    fn small_backward_step_is_sequential_and_audible() {
        let mut c = PlaybackClock::new(10.0, EPS);
        c.step(0.0);
        c.frame_presented(0.0, FRAME);
        assert_eq!(c.step(0.05), ClockStep::Advance);
        c.frame_presented(0.04, FRAME);
        assert_eq!(c.step(0.03), ClockStep::Hold);
        assert_eq!(c.state(), ClockState::Sequential);
        assert!(c.audio_eligible());
    }

    #[test]
    fn next_swap_is_monotonic_under_forward_ticks() {
        let mut c = PlaybackClock::new(10.0, EPS);
        let mut last = c.next_swap_secs();
        let mut pts = 0.0;
        for i in 0..200 {
            let t = i as f64 / 60.0;
            if c.step(t) == ClockStep::Advance {
                // Pretend the decoder produced frames until one covers `t`.
                while pts + FRAME <= t {
                    pts += FRAME;
                }
                c.frame_presented(pts, FRAME);
            }
            assert!(c.next_swap_secs() >= last);
            last = c.next_swap_secs();
        }
    }

    #[test]
    fn out_of_order_pts_does_not_regress_next_swap() {
        let mut c = PlaybackClock::new(10.0, EPS);
        c.frame_presented(1.0, FRAME);
        c.frame_presented(0.5, FRAME);
        assert!((c.next_swap_secs() - 1.04).abs() < 1e-9);
    }

    #[test]
    fn invalidate_forces_seek_on_zero_delta() {
        let mut c = PlaybackClock::new(10.0, EPS);
        c.step(2.0);
        c.finish_seek();
        c.invalidate();
        assert!(c.needs_resync());
        assert_eq!(c.step(2.0), ClockStep::Seek { target_secs: 2.0 });
        assert!(!c.needs_resync());
    }

    #[test]
    fn bad_epsilon_means_every_move_seeks() {
        for eps in [-1.0, f64::NAN, f64::INFINITY] {
            let c = PlaybackClock::new(10.0, eps);
            assert_eq!(c.seek_epsilon(), 0.0, "epsilon {eps}");
        }
        let mut c = PlaybackClock::new(10.0, -1.0);
        c.step(0.0);
        c.frame_presented(0.0, FRAME);
        assert_eq!(c.step(0.01), ClockStep::Seek { target_secs: 0.01 });
    }

    #[test]
    fn unknown_duration_pins_position_at_zero() {
        let mut c = PlaybackClock::new(f64::NAN, EPS);
        c.step(3.0);
        assert_eq!(c.position_secs(), 0.0);
    }
}
