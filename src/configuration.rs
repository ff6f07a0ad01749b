//! Options for opening videos and writing clips.
//!
//! Both option types are builders: start from `new()` (or `Default`) and
//! chain `with_*` calls.
//!
//! ```no_run
//! use encoded_video::{ClipOptions, EncodedVideo, WriterOptions};
//!
//! let options = ClipOptions::new()
//!     .with_decode_audio(false)
//!     .with_video_name("lecture");
//! let video = EncodedVideo::open_with_options("lecture.mp4", options)?;
//!
//! let writer_options = WriterOptions::new(25.0)
//!     .with_video_codec("libx264")
//!     .with_video_option("crf", "18");
//! # Ok::<(), encoded_video::ClipError>(())
//! ```

use crate::decoder::SEEK_MARGIN;

/// How an [`EncodedVideo`](crate::EncodedVideo) is opened.
#[derive(Debug, Clone)]
pub struct ClipOptions {
    /// Decode audio alongside video. When `false` the audio stream is never
    /// inspected and clips carry no audio.
    pub decode_audio: bool,
    /// Label for the video. Defaults to the file name for path-based opens.
    pub video_name: Option<String>,
    /// Ticks to seek before a requested window so that decoding starts on a
    /// keyframe at or before it.
    pub seek_margin: i64,
}

impl Default for ClipOptions {
    fn default() -> Self {
        Self {
            decode_audio: true,
            video_name: None,
            seek_margin: SEEK_MARGIN,
        }
    }
}

impl ClipOptions {
    /// Default options: audio on, no explicit name, 1024-tick seek margin.
    pub fn new() -> Self {
        Self::default()
    }

    /// Enable or disable audio decoding.
    #[must_use]
    pub fn with_decode_audio(mut self, decode_audio: bool) -> Self {
        self.decode_audio = decode_audio;
        self
    }

    /// Set the video label.
    #[must_use]
    pub fn with_video_name(mut self, name: impl Into<String>) -> Self {
        self.video_name = Some(name.into());
        self
    }

    /// Set the seek margin in stream ticks. Negative values are treated as
    /// zero.
    #[must_use]
    pub fn with_seek_margin(mut self, ticks: i64) -> Self {
        self.seek_margin = ticks.max(0);
        self
    }
}

/// Encoder settings for [`VideoWriter`](crate::VideoWriter).
///
/// Codec names and options are passed to FFmpeg unchanged.
#[derive(Debug, Clone)]
pub struct WriterOptions {
    /// Output frame rate. Rounded to the nearest integer when encoding.
    pub fps: f64,
    /// FFmpeg encoder name for video.
    pub video_codec: String,
    /// Private options for the video encoder (e.g. `crf`, `preset`).
    pub video_options: Vec<(String, String)>,
    /// FFmpeg encoder name for audio.
    pub audio_codec: String,
    /// Private options for the audio encoder.
    pub audio_options: Vec<(String, String)>,
    /// Sample rate of the audio handed to the writer. `None` uses the
    /// clip's own rate.
    pub audio_sample_rate: Option<u32>,
}

impl Default for WriterOptions {
    fn default() -> Self {
        Self::new(30.0)
    }
}

impl WriterOptions {
    /// `libx264` video and `aac` audio at `fps` frames per second.
    pub fn new(fps: f64) -> Self {
        Self {
            fps,
            video_codec: "libx264".to_string(),
            video_options: Vec::new(),
            audio_codec: "aac".to_string(),
            audio_options: Vec::new(),
            audio_sample_rate: None,
        }
    }

    /// Set the frame rate.
    #[must_use]
    pub fn with_fps(mut self, fps: f64) -> Self {
        self.fps = fps;
        self
    }

    /// Set the video encoder.
    #[must_use]
    pub fn with_video_codec(mut self, codec: impl Into<String>) -> Self {
        self.video_codec = codec.into();
        self
    }

    /// Add a video encoder option.
    #[must_use]
    pub fn with_video_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.video_options.push((key.into(), value.into()));
        self
    }

    /// Set the audio encoder.
    #[must_use]
    pub fn with_audio_codec(mut self, codec: impl Into<String>) -> Self {
        self.audio_codec = codec.into();
        self
    }

    /// Add an audio encoder option.
    #[must_use]
    pub fn with_audio_option(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.audio_options.push((key.into(), value.into()));
        self
    }

    /// Override the audio sample rate.
    #[must_use]
    pub fn with_audio_sample_rate(mut self, sample_rate: u32) -> Self {
        self.audio_sample_rate = Some(sample_rate);
        self
    }

    /// Frame rate as the integer the encoder uses.
    pub(crate) fn rounded_fps(&self) -> Option<i32> {
        let rounded = self.fps.round();
        (self.fps.is_finite() && rounded >= 1.0 && rounded <= f64::from(i32::MAX))
            .then_some(rounded as i32)
    }
}
