// crates/clipdeck-core/src/helpers/time.rs
//
// Stream time bases and human-readable durations.
//
// Every demuxed timestamp is an integer count of `num/den` second ticks.
// Conversions go through f64 seconds, which is what the clock works in.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeBase {
    pub num: i32,
    pub den: i32,
}

impl TimeBase {
    /// Millisecond ticks.
    pub const MILLIS: TimeBase = TimeBase { num: 1, den: 1000 };

    pub const fn new(num: i32, den: i32) -> Self {
        Self { num, den }
    }

    /// A time base with a zero numerator or denominator cannot convert anything.
    pub fn is_valid(&self) -> bool {
        self.num != 0 && self.den != 0
    }

    pub fn as_f64(&self) -> f64 {
        if self.is_valid() { self.num as f64 / self.den as f64 } else { 0.0 }
    }

    /// Seconds → stream ticks, rounded down.
    ///
    /// ```
    /// use clipdeck_core::helpers::time::TimeBase;
    /// assert_eq!(TimeBase::new(1, 90_000).secs_to_ts(2.0), 180_000);
    /// assert_eq!(TimeBase::MILLIS.secs_to_ts(9.99), 9_990);
    /// assert_eq!(TimeBase::new(0, 1).secs_to_ts(5.0), 0);
    /// ```
    pub fn secs_to_ts(&self, secs: f64) -> i64 {
        if !self.is_valid() || !secs.is_finite() {
            return 0;
        }
        // Nudge by a micro-tick so 9.99 * 1000 doesn't land on 9989.999…
        (secs * self.den as f64 / self.num as f64 + 1e-6).floor() as i64
    }

    /// Stream ticks → seconds.
    ///
    /// ```
    /// use clipdeck_core::helpers::time::TimeBase;
    /// assert_eq!(TimeBase::new(1, 25).ts_to_secs(50), 2.0);
    /// ```
    pub fn ts_to_secs(&self, ts: i64) -> f64 {
        ts as f64 * self.as_f64()
    }
}

impl Default for TimeBase {
    fn default() -> Self {
        TimeBase::MILLIS
    }
}

/// Format a duration in seconds as a compact human-readable string.
///
/// | Range         | Format       | Example   |
/// |---------------|--------------|-----------|
/// | ≥ 3600 s      | `H:MM:SS`    | `1:04:35` |
/// | ≥ 60 s        | `M:SS`       | `3:07`    |
/// | < 60 s        | `S.Xs`       | `4.2s`    |
///
/// ```
/// use clipdeck_core::helpers::time::format_duration;
/// assert_eq!(format_duration(4.2),    "4.2s");
/// assert_eq!(format_duration(187.0),  "3:07");
/// assert_eq!(format_duration(3875.0), "1:04:35");
/// ```
pub fn format_duration(secs: f64) -> String {
    let whole = secs.max(0.0) as u64;
    if secs >= 3600.0 {
        format!("{}:{:02}:{:02}", whole / 3600, (whole % 3600) / 60, whole % 60)
    } else if secs >= 60.0 {
        format!("{}:{:02}", whole / 60, whole % 60)
    } else {
        format!("{:.1}s", secs.max(0.0))
    }
}
