//! Error types for the `encoded-video` crate.
//!
//! This module defines [`ClipError`], the unified error type returned by all
//! fallible operations in the crate. Construction failures always surface
//! through it. Decode failures during clip extraction are caught by the
//! stream decoder and reported as
//! [`WindowDecode::Degraded`](crate::decoder::WindowDecode::Degraded)
//! instead, so [`EncodedVideo::get_clip`](crate::EncodedVideo::get_clip)
//! never returns one.

use std::io::Error as IoError;

use ffmpeg_next::Error as FfmpegError;
use image::ImageError;
use thiserror::Error;

use crate::metadata::StreamKind;

/// The unified error type for all `encoded-video` operations.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum ClipError {
    /// The media source could not be opened or parsed.
    #[error("Failed to open video {source_name}: {reason}")]
    Open {
        /// Label of the source (file name, path, or `"<memory>"`).
        source_name: String,
        /// Underlying reason the open failed.
        reason: String,
    },

    /// The source does not contain a video stream.
    #[error("Video stream not found")]
    NoVideoStream,

    /// The full decode pass used to discover the duration produced no video
    /// frames, so no clip can ever be extracted.
    #[error("Unable to decode video stream: no frames were produced")]
    NoDecodableFrames,

    /// The requested stream kind is not present in the container.
    #[error("No {0} stream in container")]
    MissingStream(StreamKind),

    /// The container was already closed.
    #[error("Container is closed")]
    Closed,

    /// A video frame could not be decoded.
    #[error("Failed to decode video frame: {0}")]
    VideoDecodeError(String),

    /// Audio data could not be decoded.
    #[error("Failed to decode audio: {0}")]
    AudioDecodeError(String),

    /// Seeking within a stream failed.
    #[error("Failed to seek {kind} stream to pts {pts}: {reason}")]
    SeekError {
        /// Stream that was being sought.
        kind: StreamKind,
        /// Target timestamp, in stream time-base ticks.
        pts: i64,
        /// Underlying reason.
        reason: String,
    },

    /// A clip handed to the writer is unusable (zero frames, bad frame rate).
    #[error("Invalid clip: {0}")]
    InvalidClip(String),

    /// Video encoding failed.
    #[error("Video encoding error: {0}")]
    VideoEncodeError(String),

    /// Writing the output container failed.
    #[error("Video write error: {0}")]
    VideoWriteError(String),

    /// Audio encoding failed.
    #[error("Failed to encode audio: {0}")]
    AudioEncodeError(String),

    /// An error originating from the FFmpeg libraries.
    #[error("FFmpeg error: {0}")]
    FfmpegError(String),

    /// An I/O error occurred while reading or writing files.
    #[error("I/O error: {0}")]
    IoError(#[from] IoError),

    /// An error from the `image` crate while exporting a frame.
    #[error("Image processing error: {0}")]
    ImageError(#[from] ImageError),
}

impl From<FfmpegError> for ClipError {
    fn from(error: FfmpegError) -> Self {
        ClipError::FfmpegError(error.to_string())
    }
}
