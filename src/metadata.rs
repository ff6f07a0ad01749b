//! Stream header types.
//!
//! Headers are read once when a container is opened and never change
//! afterwards. They carry everything the clip extractor needs to move
//! between seconds and stream ticks without touching the decoder.

use std::fmt::{Display, Formatter, Result as FmtResult};

use ffmpeg_next::Rational;

use crate::conversion::{self, Timestamp};

/// Which kind of elementary stream an operation targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StreamKind {
    /// A video stream.
    Video,
    /// An audio stream.
    Audio,
}

impl Display for StreamKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        match self {
            StreamKind::Video => write!(f, "video"),
            StreamKind::Audio => write!(f, "audio"),
        }
    }
}

/// Metadata shared by every stream kind.
#[derive(Debug, Clone)]
pub struct StreamHeader {
    /// Container-level index of the stream.
    pub index: usize,
    /// Seconds per PTS tick.
    pub time_base: Rational,
    /// First valid PTS. Zero when the container does not report one.
    pub start_pts: i64,
    /// Stream length in ticks, when the container header carries it.
    pub duration: Option<i64>,
    /// Codec name (e.g. `"h264"`, `"aac"`).
    pub codec: String,
}

impl StreamHeader {
    /// Create a header with no start offset and no known duration.
    pub fn new(index: usize, time_base: Rational) -> Self {
        Self {
            index,
            time_base,
            start_pts: 0,
            duration: None,
            codec: "unknown".to_string(),
        }
    }

    /// Set the start PTS. `None` keeps the default of zero.
    #[must_use]
    pub fn with_start_pts(mut self, start_pts: Option<i64>) -> Self {
        self.start_pts = start_pts.unwrap_or(0);
        self
    }

    /// Set the header duration in ticks.
    #[must_use]
    pub fn with_duration(mut self, duration: Option<i64>) -> Self {
        self.duration = duration;
        self
    }

    /// Set the codec name.
    #[must_use]
    pub fn with_codec(mut self, codec: impl Into<String>) -> Self {
        self.codec = codec.into();
        self
    }

    /// Convert seconds (from the stream start) to a PTS in this stream.
    pub fn to_pts(&self, seconds: f64) -> Timestamp {
        conversion::seconds_to_pts(seconds, self.time_base, self.start_pts)
    }

    /// Convert a PTS in this stream to seconds from the stream start.
    pub fn to_seconds(&self, pts: Timestamp) -> f64 {
        conversion::pts_to_seconds(pts, self.time_base, self.start_pts)
    }

    /// PTS bounds for a `[start, end]` request in seconds.
    pub fn window(&self, start_seconds: f64, end_seconds: f64) -> (Timestamp, Timestamp) {
        (self.to_pts(start_seconds), self.to_pts(end_seconds))
    }

    /// Header duration in seconds, if known.
    pub fn duration_seconds(&self) -> Option<f64> {
        self.duration
            .map(|ticks| conversion::duration_to_seconds(ticks, self.time_base))
    }
}

/// Header of a video stream.
#[derive(Debug, Clone)]
pub struct VideoHeader {
    /// Timing and codec information.
    pub stream: StreamHeader,
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// Average frames per second (`0.0` when unknown).
    pub frames_per_second: f64,
}

/// Header of an audio stream.
#[derive(Debug, Clone)]
pub struct AudioHeader {
    /// Timing and codec information.
    pub stream: StreamHeader,
    /// Sample rate in hertz.
    pub sample_rate: u32,
    /// Channel count of the decoded audio (before down-mixing).
    pub channels: u16,
}
