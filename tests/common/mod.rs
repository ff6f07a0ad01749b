//! Shared helpers for integration tests.
//!
//! [`ScriptedContainer`] is an in-memory [`MediaContainer`] that replays a
//! fixed list of frames per stream and records every seek and decode, so
//! the clip extractor can be tested without FFmpeg or fixture files.

#![allow(dead_code)]

use std::ops::ControlFlow;

use encoded_video::{
    AudioHeader, ClipError, Frame, FrameData, MediaContainer, RgbFrame, SampleBuffer,
    StreamHeader, StreamKind, VideoHeader,
};
use ffmpeg_next::Rational;

pub const FRAME_WIDTH: u32 = 4;
pub const FRAME_HEIGHT: u32 = 2;

/// One scripted stream: frames in decode order plus a keyframe interval.
#[derive(Debug, Clone, Default)]
struct ScriptedStream {
    frames: Vec<Frame>,
    keyframe_every: usize,
    cursor: usize,
}

impl ScriptedStream {
    fn seek(&mut self, target: i64) {
        let every = self.keyframe_every.max(1);
        self.cursor = self
            .frames
            .iter()
            .enumerate()
            .filter(|(index, frame)| index % every == 0 && frame.pts <= target)
            .map(|(index, _)| index)
            .last()
            .unwrap_or(0);
    }
}

#[derive(Debug, Default)]
pub struct ScriptedContainer {
    video_header: Option<VideoHeader>,
    audio_header: Option<AudioHeader>,
    video: ScriptedStream,
    audio: ScriptedStream,
    pub seeks: Vec<(StreamKind, i64)>,
    pub decode_calls: usize,
    pub frames_yielded: usize,
    pub fail_decode: Option<StreamKind>,
    pub fail_seek: Option<StreamKind>,
    pub close_calls: usize,
    closed: bool,
}

impl ScriptedContainer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_video(mut self, header: VideoHeader, frames: Vec<Frame>, keyframe_every: usize) -> Self {
        self.video_header = Some(header);
        self.video = ScriptedStream {
            frames,
            keyframe_every,
            cursor: 0,
        };
        self
    }

    pub fn with_audio(mut self, header: AudioHeader, frames: Vec<Frame>) -> Self {
        self.audio_header = Some(header);
        self.audio = ScriptedStream {
            frames,
            keyframe_every: 1,
            cursor: 0,
        };
        self
    }

    pub fn failing_decode(mut self, kind: StreamKind) -> Self {
        self.fail_decode = Some(kind);
        self
    }

    pub fn failing_seek(mut self, kind: StreamKind) -> Self {
        self.fail_seek = Some(kind);
        self
    }

    fn stream_mut(&mut self, kind: StreamKind) -> &mut ScriptedStream {
        match kind {
            StreamKind::Video => &mut self.video,
            StreamKind::Audio => &mut self.audio,
        }
    }

    fn has_stream(&self, kind: StreamKind) -> bool {
        match kind {
            StreamKind::Video => self.video_header.is_some(),
            StreamKind::Audio => self.audio_header.is_some(),
        }
    }
}

impl MediaContainer for ScriptedContainer {
    fn video_header(&self) -> Option<&VideoHeader> {
        self.video_header.as_ref()
    }

    fn audio_header(&self) -> Option<&AudioHeader> {
        self.audio_header.as_ref()
    }

    fn seek(&mut self, kind: StreamKind, pts: i64) -> Result<(), ClipError> {
        if self.closed {
            return Err(ClipError::Closed);
        }
        if !self.has_stream(kind) {
            return Err(ClipError::MissingStream(kind));
        }
        self.seeks.push((kind, pts));
        if self.fail_seek == Some(kind) {
            return Err(ClipError::SeekError {
                kind,
                pts,
                reason: "scripted seek failure".to_string(),
            });
        }
        self.stream_mut(kind).seek(pts);
        Ok(())
    }

    fn decode(
        &mut self,
        kind: StreamKind,
        visitor: &mut dyn FnMut(Frame) -> ControlFlow<()>,
    ) -> Result<(), ClipError> {
        if self.closed {
            return Err(ClipError::Closed);
        }
        if !self.has_stream(kind) {
            return Err(ClipError::MissingStream(kind));
        }
        self.decode_calls += 1;
        if self.fail_decode == Some(kind) {
            return Err(match kind {
                StreamKind::Video => ClipError::VideoDecodeError("scripted failure".to_string()),
                StreamKind::Audio => ClipError::AudioDecodeError("scripted failure".to_string()),
            });
        }

        let mut yielded = 0;
        let stream = self.stream_mut(kind);
        while stream.cursor < stream.frames.len() {
            let frame = stream.frames[stream.cursor].clone();
            stream.cursor += 1;
            yielded += 1;
            if visitor(frame).is_break() {
                break;
            }
        }
        self.frames_yielded += yielded;
        Ok(())
    }

    fn close(&mut self) {
        self.close_calls += 1;
        self.closed = true;
    }

    fn is_closed(&self) -> bool {
        self.closed
    }
}

pub fn video_header(time_base: Rational, duration: Option<i64>, frames_per_second: f64) -> VideoHeader {
    VideoHeader {
        stream: StreamHeader::new(0, time_base)
            .with_duration(duration)
            .with_codec("h264"),
        width: FRAME_WIDTH,
        height: FRAME_HEIGHT,
        frames_per_second,
    }
}

pub fn audio_header(sample_rate: u32, duration: Option<i64>, channels: u16) -> AudioHeader {
    AudioHeader {
        stream: StreamHeader::new(1, Rational::new(1, sample_rate as i32))
            .with_duration(duration)
            .with_codec("aac"),
        sample_rate,
        channels,
    }
}

/// A solid 4x2 frame whose every byte is `value`.
pub fn rgb_frame(pts: i64, value: u8) -> Frame {
    Frame {
        pts,
        data: FrameData::Rgb(RgbFrame {
            width: FRAME_WIDTH,
            height: FRAME_HEIGHT,
            pixels: vec![value; (FRAME_WIDTH * FRAME_HEIGHT * 3) as usize],
        }),
    }
}

/// `samples` stereo sample frames with constant left/right values.
pub fn stereo_frame(pts: i64, samples: usize, left: f32, right: f32) -> Frame {
    Frame {
        pts,
        data: FrameData::Samples(SampleBuffer {
            channels: 2,
            samples: std::iter::repeat([left, right]).take(samples).flatten().collect(),
        }),
    }
}

/// `count` video frames at `pts = i * step`.
pub fn video_frames(count: usize, step: i64) -> Vec<Frame> {
    (0..count)
        .map(|index| rgb_frame(index as i64 * step, (index % 256) as u8))
        .collect()
}

/// `count` stereo frames of `samples` each at `pts = i * samples`.
pub fn audio_frames(count: usize, samples: usize) -> Vec<Frame> {
    (0..count)
        .map(|index| stereo_frame((index * samples) as i64, samples, 0.5, 0.25))
        .collect()
}

/// Ten seconds of 30 fps video (time base 1/15360, keyframe every second)
/// and 48 kHz stereo audio in 1024-sample frames, both with header
/// durations.
pub fn ten_second_container() -> ScriptedContainer {
    ScriptedContainer::new()
        .with_video(
            video_header(Rational::new(1, 15360), Some(153_600), 30.0),
            video_frames(300, 512),
            30,
        )
        .with_audio(audio_header(48_000, Some(480_000), 2), audio_frames(469, 1024))
}

/// Three seconds of 30 fps video in time base 1/30 with no header
/// durations, plus matching audio.
pub fn headerless_container() -> ScriptedContainer {
    ScriptedContainer::new()
        .with_video(video_header(Rational::new(1, 30), None, 30.0), video_frames(90, 1), 30)
        .with_audio(audio_header(48_000, None, 2), audio_frames(141, 1024))
}
