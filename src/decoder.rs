//! Windowed decoding of one stream.
//!
//! Seeking lands on a keyframe, which is usually some way before the
//! requested start, and containers are imprecise about where that keyframe
//! actually is. [`decode_window`] therefore seeks a fixed margin of ticks
//! before the window, decodes forward, keeps only frames whose PTS falls
//! inside `[start, end]`, and stops as soon as a frame lands past `end`.
//!
//! Failures never escape: a seek or decode error turns into
//! [`WindowDecode::Degraded`], which callers treat as "nothing in this
//! window".

use std::ops::ControlFlow;

use crate::{
    container::{FrameData, MediaContainer, RgbFrame},
    conversion::Timestamp,
    error::ClipError,
    metadata::StreamKind,
    track::DecodedTrack,
};

/// Default number of ticks to seek before the start of a window.
pub const SEEK_MARGIN: i64 = 1024;

/// Frames collected from one window.
#[derive(Debug, Clone)]
pub struct DecodedWindow<T> {
    /// Frames with `start <= pts <= end`, keyed by PTS.
    pub track: DecodedTrack<T>,
    /// Largest PTS decoded, including frames outside the window.
    pub max_pts: Option<i64>,
}

impl<T> Default for DecodedWindow<T> {
    fn default() -> Self {
        Self {
            track: DecodedTrack::new(),
            max_pts: None,
        }
    }
}

/// Outcome of [`decode_window`].
#[derive(Debug)]
pub enum WindowDecode<T> {
    /// Decoding ran to the end of the window (or of the stream).
    Decoded(DecodedWindow<T>),
    /// Seeking or decoding failed; the window should be treated as empty.
    Degraded(ClipError),
}

impl<T> WindowDecode<T> {
    /// Returns `true` if decoding failed.
    pub fn is_degraded(&self) -> bool {
        matches!(self, WindowDecode::Degraded(_))
    }

    /// The collected frames, or an empty track for a degraded decode.
    pub fn into_track(self) -> DecodedTrack<T> {
        match self {
            WindowDecode::Decoded(window) => window.track,
            WindowDecode::Degraded(_) => DecodedTrack::new(),
        }
    }

    /// Largest PTS decoded, or `None` for a degraded or empty decode.
    pub fn max_pts(&self) -> Option<i64> {
        match self {
            WindowDecode::Decoded(window) => window.max_pts,
            WindowDecode::Degraded(_) => None,
        }
    }

    /// The failure, if decoding degraded.
    pub fn error(&self) -> Option<&ClipError> {
        match self {
            WindowDecode::Decoded(_) => None,
            WindowDecode::Degraded(error) => Some(error),
        }
    }
}

/// Decode the frames of `kind` whose PTS lies in `[start, end]`.
///
/// Seeks backward to `max(start - margin, 0)` and decodes forward.
/// `convert` maps each frame payload to the stored type; returning `None`
/// skips the frame without affecting the running maximum PTS.
pub fn decode_window<C, T, F>(
    container: &mut C,
    kind: StreamKind,
    start: Timestamp,
    end: Timestamp,
    margin: i64,
    mut convert: F,
) -> WindowDecode<T>
where
    C: MediaContainer + ?Sized,
    F: FnMut(FrameData) -> Option<T>,
{
    let Timestamp::Ticks(start_pts) = start else {
        return WindowDecode::Decoded(DecodedWindow::default());
    };

    let mut window = DecodedWindow::default();
    match collect_window(container, kind, start_pts, end, margin, &mut convert, &mut window) {
        Ok(()) => {
            log::trace!(
                "Decoded {} {kind} frames in [{start}, {end}] (max pts {:?})",
                window.track.len(),
                window.max_pts,
            );
            WindowDecode::Decoded(window)
        }
        Err(error) => {
            log::debug!("Failed to decode {kind} window [{start}, {end}]: {error}");
            WindowDecode::Degraded(error)
        }
    }
}

fn collect_window<C, T, F>(
    container: &mut C,
    kind: StreamKind,
    start_pts: i64,
    end: Timestamp,
    margin: i64,
    convert: &mut F,
    window: &mut DecodedWindow<T>,
) -> Result<(), ClipError>
where
    C: MediaContainer + ?Sized,
    F: FnMut(FrameData) -> Option<T>,
{
    let seek_pts = start_pts.saturating_sub(margin.max(0)).max(0);
    container.seek(kind, seek_pts)?;

    container.decode(kind, &mut |frame| {
        let Some(payload) = convert(frame.data) else {
            return ControlFlow::Continue(());
        };

        window.max_pts = Some(window.max_pts.map_or(frame.pts, |max| max.max(frame.pts)));

        if Timestamp::Ticks(frame.pts) > end {
            return ControlFlow::Break(());
        }
        if frame.pts >= start_pts {
            window.track.insert(frame.pts, payload);
        }
        ControlFlow::Continue(())
    })
}

/// Decode the video frames in `[start, end]`.
pub fn decode_video_window<C: MediaContainer + ?Sized>(
    container: &mut C,
    start: Timestamp,
    end: Timestamp,
    margin: i64,
) -> WindowDecode<RgbFrame> {
    decode_window(container, StreamKind::Video, start, end, margin, |data| match data {
        FrameData::Rgb(frame) => Some(frame),
        FrameData::Samples(_) => None,
    })
}

/// Decode the audio in `[start, end]`, down-mixed to mono.
pub fn decode_audio_window<C: MediaContainer + ?Sized>(
    container: &mut C,
    start: Timestamp,
    end: Timestamp,
    margin: i64,
) -> WindowDecode<Vec<f32>> {
    decode_window(container, StreamKind::Audio, start, end, margin, |data| match data {
        FrameData::Samples(buffer) => Some(buffer.to_mono()),
        FrameData::Rgb(_) => None,
    })
}
