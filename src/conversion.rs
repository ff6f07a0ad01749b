//! Conversion between seconds and stream presentation timestamps.
//!
//! Every stream counts time in its own integer ticks: a PTS of `n` means
//! `(n - start_pts) * time_base` seconds from the start of the stream. The
//! functions here move between the two representations. They are pure and
//! keep the time base as an exact [`Rational`]; only the caller-supplied
//! seconds are floating point, so [`seconds_to_pts`] is exact up to the
//! precision of `seconds * denominator / numerator` in an `f64`.

use std::cmp::Ordering;
use std::fmt::{Display, Formatter, Result as FmtResult};

use ffmpeg_next::Rational;

/// A presentation timestamp in stream ticks, or "the end of the stream".
///
/// `Infinite` orders after every finite tick count, so window checks like
/// `pts <= end` work unchanged for open-ended requests.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Timestamp {
    /// A finite tick count in the stream's time base.
    Ticks(i64),
    /// Positive infinity: no upper bound.
    Infinite,
}

impl Timestamp {
    /// The tick count, or `None` for [`Timestamp::Infinite`].
    pub fn ticks(self) -> Option<i64> {
        match self {
            Timestamp::Ticks(ticks) => Some(ticks),
            Timestamp::Infinite => None,
        }
    }

    /// Returns `true` for [`Timestamp::Infinite`].
    pub fn is_infinite(self) -> bool {
        matches!(self, Timestamp::Infinite)
    }
}

impl From<i64> for Timestamp {
    fn from(ticks: i64) -> Self {
        Timestamp::Ticks(ticks)
    }
}

impl PartialEq<i64> for Timestamp {
    fn eq(&self, other: &i64) -> bool {
        *self == Timestamp::Ticks(*other)
    }
}

impl PartialOrd<i64> for Timestamp {
    fn partial_cmp(&self, other: &i64) -> Option<Ordering> {
        Some(self.cmp(&Timestamp::Ticks(*other)))
    }
}

impl Display for Timestamp {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            Timestamp::Ticks(ticks) => write!(f, "{ticks}"),
            Timestamp::Infinite => write!(f, "inf"),
        }
    }
}

/// Convert a time in seconds to a PTS in the given time base.
///
/// Computes `floor(seconds / time_base) + start_pts`. Positive infinity maps
/// to [`Timestamp::Infinite`]. NaN is treated as zero seconds and negative
/// infinity saturates at `i64::MIN`.
pub fn seconds_to_pts(seconds: f64, time_base: Rational, start_pts: i64) -> Timestamp {
    if seconds == f64::INFINITY {
        return Timestamp::Infinite;
    }
    if seconds.is_nan() || time_base.numerator() == 0 {
        return Timestamp::Ticks(start_pts);
    }

    let ticks = (seconds * f64::from(time_base.denominator()) / f64::from(time_base.numerator()))
        .floor();
    // `as` saturates out-of-range floats.
    Timestamp::Ticks((ticks as i64).saturating_add(start_pts))
}

/// Convert a PTS in the given time base back to seconds.
///
/// Computes `(pts - start_pts) * time_base`. [`Timestamp::Infinite`] maps to
/// positive infinity.
pub fn pts_to_seconds(pts: Timestamp, time_base: Rational, start_pts: i64) -> f64 {
    match pts {
        Timestamp::Infinite => f64::INFINITY,
        Timestamp::Ticks(ticks) => {
            ticks_to_seconds(i128::from(ticks) - i128::from(start_pts), time_base)
        }
    }
}

/// Convert a tick count (a length, not a position) to seconds.
///
/// Used for header durations, which count ticks from the stream start.
pub fn duration_to_seconds(ticks: i64, time_base: Rational) -> f64 {
    ticks_to_seconds(i128::from(ticks), time_base)
}

fn ticks_to_seconds(ticks: i128, time_base: Rational) -> f64 {
    if time_base.denominator() == 0 {
        return 0.0;
    }
    let scaled = ticks * i128::from(time_base.numerator());
    scaled as f64 / f64::from(time_base.denominator())
}

/// Duration of one tick in seconds.
pub fn tick_seconds(time_base: Rational) -> f64 {
    ticks_to_seconds(1, time_base)
}

/// Convert a [`Rational`] rate (frames or samples per second) to `f64`.
///
/// Returns `0.0` for a zero denominator.
pub fn rational_to_f64(rate: Rational) -> f64 {
    if rate.denominator() == 0 {
        0.0
    } else {
        f64::from(rate.numerator()) / f64::from(rate.denominator())
    }
}
