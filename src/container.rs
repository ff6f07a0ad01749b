//! The container abstraction the clip extractor decodes from.
//!
//! [`MediaContainer`] is the seam between the clip-extraction engine and
//! the codec library. It exposes per-stream headers, a backward seek to the
//! nearest keyframe, and sequential decoding of one stream. The production
//! implementation is [`FfmpegContainer`](crate::FfmpegContainer); any other
//! source of frames (for instance a scripted container in tests) can stand
//! in for it.

use std::ops::ControlFlow;

use crate::{
    error::ClipError,
    metadata::{AudioHeader, StreamKind, VideoHeader},
};

/// A decoded unit from one stream.
#[derive(Debug, Clone)]
pub struct Frame {
    /// Presentation timestamp in the stream's time base.
    pub pts: i64,
    /// Decoded payload.
    pub data: FrameData,
}

/// Payload of a decoded [`Frame`].
#[derive(Debug, Clone)]
pub enum FrameData {
    /// A video picture converted to packed RGB24.
    Rgb(RgbFrame),
    /// A block of audio samples.
    Samples(SampleBuffer),
}

/// A tightly packed RGB24 picture (no row padding).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RgbFrame {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// `width * height * 3` bytes, row-major, R-G-B order.
    pub pixels: Vec<u8>,
}

impl RgbFrame {
    /// Wrap a packed RGB24 buffer.
    ///
    /// Returns `None` if `pixels` is not exactly `width * height * 3` bytes.
    pub fn new(width: u32, height: u32, pixels: Vec<u8>) -> Option<Self> {
        let expected = (width as usize) * (height as usize) * 3;
        (pixels.len() == expected).then_some(Self {
            width,
            height,
            pixels,
        })
    }
}

/// Interleaved `f32` audio samples.
#[derive(Debug, Clone, PartialEq)]
pub struct SampleBuffer {
    /// Number of interleaved channels.
    pub channels: u16,
    /// Samples laid out as `[c0, c1, .., c0, c1, ..]`.
    pub samples: Vec<f32>,
}

impl SampleBuffer {
    /// Number of samples per channel.
    pub fn frames(&self) -> usize {
        match self.channels {
            0 => 0,
            channels => self.samples.len() / usize::from(channels),
        }
    }

    /// Average the channels of every sample frame into one mono sample.
    ///
    /// Stereo (or wider) separation is discarded. A trailing partial frame
    /// is dropped.
    pub fn to_mono(&self) -> Vec<f32> {
        match self.channels {
            0 => Vec::new(),
            1 => self.samples.clone(),
            channels => {
                let width = usize::from(channels);
                self.samples
                    .chunks_exact(width)
                    .map(|frame| frame.iter().sum::<f32>() / width as f32)
                    .collect()
            }
        }
    }
}

/// An opened media source.
///
/// The container owns the demuxer cursor. `seek` and `decode` move it, so
/// both take `&mut self`; callers that share a container across threads
/// must serialise access themselves.
pub trait MediaContainer {
    /// Header of the primary video stream, if the source has one.
    fn video_header(&self) -> Option<&VideoHeader>;

    /// Header of the primary audio stream, if the source has one.
    fn audio_header(&self) -> Option<&AudioHeader>;

    /// Seek `kind`'s stream backward to the nearest keyframe at or before
    /// `pts` (in that stream's time base).
    fn seek(&mut self, kind: StreamKind, pts: i64) -> Result<(), ClipError>;

    /// Decode `kind`'s stream from the current position, handing each frame
    /// to `visitor` until the stream ends or the visitor breaks.
    fn decode(
        &mut self,
        kind: StreamKind,
        visitor: &mut dyn FnMut(Frame) -> ControlFlow<()>,
    ) -> Result<(), ClipError>;

    /// Release decoder resources. Calling it again is a no-op.
    fn close(&mut self);

    /// Returns `true` once [`close`](MediaContainer::close) has run.
    fn is_closed(&self) -> bool;
}

impl<C: MediaContainer + ?Sized> MediaContainer for Box<C> {
    fn video_header(&self) -> Option<&VideoHeader> {
        (**self).video_header()
    }

    fn audio_header(&self) -> Option<&AudioHeader> {
        (**self).audio_header()
    }

    fn seek(&mut self, kind: StreamKind, pts: i64) -> Result<(), ClipError> {
        (**self).seek(kind, pts)
    }

    fn decode(
        &mut self,
        kind: StreamKind,
        visitor: &mut dyn FnMut(Frame) -> ControlFlow<()>,
    ) -> Result<(), ClipError> {
        (**self).decode(kind, visitor)
    }

    fn close(&mut self) {
        (**self).close()
    }

    fn is_closed(&self) -> bool {
        (**self).is_closed()
    }
}
