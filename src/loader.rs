//! Whole-video helpers.
//!
//! [`read_video`] and [`bytes_to_video`] decode an entire source in one
//! call and return the clip together with the timing metadata needed to
//! write it back out.

use std::path::Path;

use crate::{
    clip::Clip,
    configuration::ClipOptions,
    container::MediaContainer,
    encoded_video::EncodedVideo,
    error::ClipError,
};

/// A fully decoded video.
#[derive(Debug, Clone)]
pub struct LoadedVideo {
    /// Every frame and sample of the source.
    pub clip: Clip,
    /// Length in seconds.
    pub duration: f64,
    /// Average frame rate of the video stream.
    pub frames_per_second: f64,
    /// Audio sample rate, when the source has audio.
    pub audio_sample_rate: Option<u32>,
}

impl LoadedVideo {
    fn load<C: MediaContainer>(mut video: EncodedVideo<C>) -> Self {
        let clip = video.get_clip(0.0, f64::INFINITY);
        let loaded = Self {
            clip,
            duration: video.duration(),
            frames_per_second: video.frames_per_second(),
            audio_sample_rate: video.audio_sample_rate(),
        };
        video.close();
        loaded
    }
}

/// Decode a whole video file.
///
/// # Errors
///
/// Fails if the file cannot be opened; see
/// [`EncodedVideo::open_with_options`].
pub fn read_video<P: AsRef<Path>>(path: P) -> Result<LoadedVideo, ClipError> {
    let video = EncodedVideo::open_with_options(path, ClipOptions::default())?;
    Ok(LoadedVideo::load(video))
}

/// Decode a whole in-memory video.
///
/// # Errors
///
/// Fails if the buffer cannot be opened; see [`EncodedVideo::from_bytes`].
pub fn bytes_to_video(bytes: &[u8]) -> Result<LoadedVideo, ClipError> {
    let video = EncodedVideo::from_bytes(bytes, ClipOptions::default())?;
    Ok(LoadedVideo::load(video))
}

/// Decode everything an already opened container holds.
///
/// # Errors
///
/// See [`EncodedVideo::from_container`].
pub fn load_container<C: MediaContainer>(
    container: C,
    options: ClipOptions,
) -> Result<LoadedVideo, ClipError> {
    let video = EncodedVideo::from_container(container, options)?;
    Ok(LoadedVideo::load(video))
}
