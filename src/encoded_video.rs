//! The clip extractor.
//!
//! [`EncodedVideo`] owns an opened container and answers
//! [`get_clip`](EncodedVideo::get_clip) requests for arbitrary
//! `[start, end]` second ranges.
//!
//! # Decode modes
//!
//! The mode is fixed when the handle is built:
//!
//! - **Selective**: at least one of the video or audio headers reports a
//!   duration. Every clip request seeks and decodes only the requested
//!   window of each stream.
//! - **Cached**: neither header reports a duration. The whole video (and
//!   audio) stream is decoded once up front, the duration is read off the
//!   last decoded frame, and clip requests only filter the cached frames.
//!
//! # Example
//!
//! ```no_run
//! use encoded_video::EncodedVideo;
//!
//! let mut video = EncodedVideo::open("input.mp4")?;
//! println!("{:?} lasts {:.2}s", video.name(), video.duration());
//!
//! let clip = video.get_clip(2.0, 4.0);
//! if let Some(frames) = &clip.video {
//!     println!("video shape: {:?}", frames.shape());
//! }
//! if let Some(audio) = &clip.audio {
//!     println!("{} audio samples", audio.len());
//! }
//! # Ok::<(), encoded_video::ClipError>(())
//! ```

use std::path::Path;

use crate::{
    clip::{AudioClip, Clip, VideoClip},
    configuration::ClipOptions,
    container::MediaContainer,
    conversion::Timestamp,
    decoder::{decode_audio_window, decode_video_window},
    demuxer::FfmpegContainer,
    error::ClipError,
    metadata::{AudioHeader, VideoHeader},
    track::{AudioTrack, VideoTrack},
};

/// How frames are obtained for a clip request.
#[derive(Debug)]
enum DecodeMode {
    /// Decode each requested window on demand.
    Selective,
    /// Whole streams decoded at construction.
    Cached {
        video: VideoTrack,
        audio: Option<AudioTrack>,
    },
}

/// An encoded video opened for clip extraction.
///
/// Generic over the [`MediaContainer`] it reads from; the default is the
/// FFmpeg-backed [`FfmpegContainer`]. The container is closed when
/// [`close`](EncodedVideo::close) is called or the handle is dropped.
#[derive(Debug)]
pub struct EncodedVideo<C: MediaContainer = FfmpegContainer> {
    container: C,
    name: Option<String>,
    video: VideoHeader,
    audio: Option<AudioHeader>,
    mode: DecodeMode,
    duration: f64,
    seek_margin: i64,
}

impl EncodedVideo<FfmpegContainer> {
    /// Open a video file with default [`ClipOptions`].
    ///
    /// # Errors
    ///
    /// See [`open_with_options`](EncodedVideo::open_with_options).
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ClipError> {
        Self::open_with_options(path, ClipOptions::default())
    }

    /// Open a video file.
    ///
    /// The name defaults to the file name when `options.video_name` is
    /// unset.
    ///
    /// # Errors
    ///
    /// Returns [`ClipError::Open`] if the file cannot be parsed,
    /// [`ClipError::NoVideoStream`] if it has no video stream, or
    /// [`ClipError::NoDecodableFrames`] if it has no header durations and
    /// decoding it yields no video frames.
    pub fn open_with_options<P: AsRef<Path>>(
        path: P,
        mut options: ClipOptions,
    ) -> Result<Self, ClipError> {
        let path = path.as_ref();
        if options.video_name.is_none() {
            options.video_name = path
                .file_name()
                .map(|name| name.to_string_lossy().into_owned());
        }
        let container = FfmpegContainer::open(path)?;
        Self::from_container(container, options)
    }

    /// Open an encoded video held in memory.
    ///
    /// # Errors
    ///
    /// Same as [`open_with_options`](EncodedVideo::open_with_options).
    pub fn from_bytes(bytes: &[u8], options: ClipOptions) -> Result<Self, ClipError> {
        let container = FfmpegContainer::from_bytes(bytes)?;
        Self::from_container(container, options)
    }
}

impl<C: MediaContainer> EncodedVideo<C> {
    /// Build a handle over an already opened container.
    ///
    /// Reads the stream headers, picks the decode mode, and in cached mode
    /// decodes the whole source.
    ///
    /// # Errors
    ///
    /// Returns [`ClipError::NoVideoStream`] if the container has no video
    /// stream, or [`ClipError::NoDecodableFrames`] if cached mode decodes no
    /// video frames.
    pub fn from_container(mut container: C, options: ClipOptions) -> Result<Self, ClipError> {
        let label = options.video_name.as_deref().unwrap_or("<unnamed>");

        let video = container
            .video_header()
            .cloned()
            .ok_or(ClipError::NoVideoStream)?;
        let audio = if options.decode_audio {
            container.audio_header().cloned()
        } else {
            None
        };
        let seek_margin = options.seek_margin.max(0);

        let mut video_duration = video.stream.duration_seconds();
        let mut audio_duration = audio
            .as_ref()
            .and_then(|header| header.stream.duration_seconds());

        let mode = if video_duration.is_none() && audio_duration.is_none() {
            log::debug!("No header duration for {label}; decoding the whole stream");

            let video_track = decode_video_window(
                &mut container,
                video.stream.to_pts(0.0),
                Timestamp::Infinite,
                seek_margin,
            )
            .into_track();
            let Some(last_pts) = video_track.last_pts() else {
                return Err(ClipError::NoDecodableFrames);
            };
            video_duration = Some(video.stream.to_seconds(Timestamp::Ticks(last_pts)));

            let audio_track = audio.as_ref().and_then(|header| {
                let track = decode_audio_window(
                    &mut container,
                    header.stream.to_pts(0.0),
                    Timestamp::Infinite,
                    seek_margin,
                )
                .into_track();
                let last_pts = track.last_pts()?;
                audio_duration = Some(header.stream.to_seconds(Timestamp::Ticks(last_pts)));
                Some(track)
            });

            DecodeMode::Cached {
                video: video_track,
                audio: audio_track,
            }
        } else {
            DecodeMode::Selective
        };

        let duration = match (video_duration, audio_duration) {
            (Some(video), Some(audio)) => video.max(audio),
            (Some(video), None) => video,
            (None, Some(audio)) => audio,
            (None, None) => 0.0,
        };

        log::info!(
            "Opened video {label}: duration={duration:.3}s, audio={}, selective={}",
            audio.is_some(),
            matches!(mode, DecodeMode::Selective),
        );

        Ok(Self {
            container,
            name: options.video_name,
            video,
            audio,
            mode,
            duration,
            seek_margin,
        })
    }

    /// Frames and samples presented between `start_seconds` and
    /// `end_seconds`, inclusive.
    ///
    /// Times are measured from the start of each stream. Pass
    /// `f64::INFINITY` as the end to read to the end of the video. A
    /// modality with nothing in range (or that failed to decode) is `None`;
    /// this method never fails.
    pub fn get_clip(&mut self, start_seconds: f64, end_seconds: f64) -> Clip {
        let video_window = self.video.stream.window(start_seconds, end_seconds);
        let audio_window = self
            .audio
            .as_ref()
            .map(|header| header.stream.window(start_seconds, end_seconds));

        let (video_track, audio_track) = match &self.mode {
            DecodeMode::Cached { video, audio } => {
                return self.assemble(
                    video,
                    audio.as_ref(),
                    video_window,
                    audio_window,
                    (start_seconds, end_seconds),
                );
            }
            DecodeMode::Selective => {
                let video = decode_video_window(
                    &mut self.container,
                    video_window.0,
                    video_window.1,
                    self.seek_margin,
                )
                .into_track();
                let audio = audio_window.map(|(start, end)| {
                    decode_audio_window(&mut self.container, start, end, self.seek_margin)
                        .into_track()
                });
                (video, audio)
            }
        };

        self.assemble(
            &video_track,
            audio_track.as_ref(),
            video_window,
            audio_window,
            (start_seconds, end_seconds),
        )
    }

    fn assemble(
        &self,
        video_track: &VideoTrack,
        audio_track: Option<&AudioTrack>,
        video_window: (Timestamp, Timestamp),
        audio_window: Option<(Timestamp, Timestamp)>,
        (start_seconds, end_seconds): (f64, f64),
    ) -> Clip {
        let stream = &self.video.stream;
        let video = VideoClip::from_frames(
            video_track
                .range(video_window.0, video_window.1)
                .map(|(pts, frame)| (stream.to_seconds(Timestamp::Ticks(*pts)), frame)),
        );
        if video.is_none() {
            log::debug!(
                "No video found within {start_seconds} and {end_seconds} seconds. \
                 Video starts at time 0 and ends at {}.",
                self.duration,
            );
        }

        let audio = match (audio_track, &self.audio, audio_window) {
            (Some(track), Some(header), Some((start, end))) => AudioClip::from_chunks(
                track.range(start, end).map(|(_, samples)| samples),
                header.sample_rate,
            ),
            _ => None,
        };

        Clip { video, audio }
    }

    /// The video label, if one was given or derived from the file name.
    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    /// Length of the video in seconds: the longer of the video and audio
    /// streams.
    pub fn duration(&self) -> f64 {
        self.duration
    }

    /// Returns `true` if clips can carry audio: the source has an audio
    /// stream and audio decoding was requested.
    pub fn has_audio(&self) -> bool {
        self.audio.is_some()
    }

    /// Returns `true` if clips are decoded on demand rather than from a
    /// fully decoded cache.
    pub fn is_selective(&self) -> bool {
        matches!(self.mode, DecodeMode::Selective)
    }

    /// Average frame rate reported by the video header.
    pub fn frames_per_second(&self) -> f64 {
        self.video.frames_per_second
    }

    /// Audio sample rate, when [`has_audio`](EncodedVideo::has_audio).
    pub fn audio_sample_rate(&self) -> Option<u32> {
        self.audio.as_ref().map(|header| header.sample_rate)
    }

    /// Header of the video stream.
    pub fn video_header(&self) -> &VideoHeader {
        &self.video
    }

    /// Header of the audio stream, when [`has_audio`](EncodedVideo::has_audio).
    pub fn audio_header(&self) -> Option<&AudioHeader> {
        self.audio.as_ref()
    }

    /// Fully decoded video frames, in cached mode.
    pub fn cached_video_track(&self) -> Option<&VideoTrack> {
        match &self.mode {
            DecodeMode::Cached { video, .. } => Some(video),
            DecodeMode::Selective => None,
        }
    }

    /// Fully decoded mono audio, in cached mode with audio present.
    pub fn cached_audio_track(&self) -> Option<&AudioTrack> {
        match &self.mode {
            DecodeMode::Cached { audio, .. } => audio.as_ref(),
            DecodeMode::Selective => None,
        }
    }

    /// The underlying container.
    pub fn container(&self) -> &C {
        &self.container
    }

    /// Close the container. Safe to call more than once.
    ///
    /// In selective mode later clip requests return empty clips; cached
    /// frames stay available.
    pub fn close(&mut self) {
        self.container.close();
    }
}

impl<C: MediaContainer> Drop for EncodedVideo<C> {
    fn drop(&mut self) {
        self.container.close();
    }
}
