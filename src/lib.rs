//! # encoded-video
//!
//! Extract time-bounded clips (RGB frames plus mono audio) from encoded
//! video files, decoding only what each request needs.
//!
//! [`EncodedVideo`] reads the stream headers when it opens a file. When
//! they carry a duration, every [`get_clip`](EncodedVideo::get_clip) call
//! seeks to the nearest keyframe before the requested window and decodes
//! just that window. When they do not, the whole file is decoded once and
//! later requests are served from memory.
//!
//! Decoding is done by FFmpeg via the
//! [`ffmpeg-next`](https://crates.io/crates/ffmpeg-next) crate.
//!
//! ## Quick Start
//!
//! ### Extract a clip
//!
//! ```no_run
//! use encoded_video::EncodedVideo;
//!
//! let mut video = EncodedVideo::open("input.mp4")?;
//! let clip = video.get_clip(2.0, 4.0);
//!
//! if let Some(frames) = &clip.video {
//!     let [t, h, w, c] = frames.shape();
//!     println!("{t} frames of {w}x{h}x{c}");
//!     frames.frame_image(0).map(|image| image.save("first.png"));
//! }
//! # Ok::<(), encoded_video::ClipError>(())
//! ```
//!
//! ### Load a whole video and write part of it back
//!
//! ```no_run
//! use encoded_video::{WriterOptions, read_video, write_video};
//!
//! let loaded = read_video("input.mp4")?;
//! if let Some(frames) = &loaded.clip.video {
//!     let options = WriterOptions::new(loaded.frames_per_second);
//!     write_video("copy.mp4", frames, loaded.clip.audio.as_ref(), options)?;
//! }
//! # Ok::<(), encoded_video::ClipError>(())
//! ```
//!
//! ### Bring your own frames
//!
//! Anything implementing [`MediaContainer`] can back an [`EncodedVideo`]
//! through [`EncodedVideo::from_container`].
//!
//! ## Requirements
//!
//! FFmpeg development libraries must be installed on your system.

pub mod clip;
pub mod configuration;
pub mod container;
pub mod conversion;
pub mod decoder;
pub mod demuxer;
pub mod encode;
pub mod encoded_video;
pub mod error;
pub mod ffmpeg;
pub mod loader;
pub mod metadata;
pub mod track;

pub use clip::{AudioClip, Clip, VideoClip};
pub use configuration::{ClipOptions, WriterOptions};
pub use container::{Frame, FrameData, MediaContainer, RgbFrame, SampleBuffer};
pub use conversion::{Timestamp, pts_to_seconds, seconds_to_pts};
pub use decoder::{
    DecodedWindow, SEEK_MARGIN, WindowDecode, decode_audio_window, decode_video_window,
    decode_window,
};
pub use demuxer::FfmpegContainer;
pub use encode::{VideoWriter, video_to_bytes, write_video};
pub use encoded_video::EncodedVideo;
pub use error::ClipError;
pub use ffmpeg::{FfmpegLogLevel, get_ffmpeg_log_level, set_ffmpeg_log_level};
pub use loader::{LoadedVideo, bytes_to_video, load_container, read_video};
pub use metadata::{AudioHeader, StreamHeader, StreamKind, VideoHeader};
pub use track::{AudioTrack, DecodedTrack, VideoTrack};
