//! Writing clips back to encoded video.
//!
//! [`VideoWriter`] encodes a [`VideoClip`] (and optionally a mono
//! [`AudioClip`]) into a container chosen from the output file extension.
//!
//! ```no_run
//! use encoded_video::{EncodedVideo, VideoWriter, WriterOptions};
//!
//! let mut video = EncodedVideo::open("input.mp4")?;
//! let clip = video.get_clip(1.0, 3.0);
//! if let Some(frames) = &clip.video {
//!     VideoWriter::new(WriterOptions::new(video.frames_per_second()))
//!         .write("excerpt.mp4", frames, clip.audio.as_ref())?;
//! }
//! # Ok::<(), encoded_video::ClipError>(())
//! ```

use std::path::Path;

use ffmpeg_next::{
    ChannelLayout, Dictionary, Packet, Rational,
    codec::{Codec, context::Context as CodecContext},
    encoder::{Audio as AudioEncoder, Video as VideoEncoder},
    format::{Flags as FormatFlags, Pixel, Sample, context::Output, sample::Type as SampleType},
    frame::{Audio as AudioFrame, Video as VideoFrame},
    software::{
        resampling::Context as ResamplingContext,
        scaling::{Context as ScalingContext, Flags as ScalingFlags},
    },
};

use crate::{
    clip::{AudioClip, VideoClip},
    configuration::WriterOptions,
    error::ClipError,
};

/// Samples per audio frame for encoders that accept any frame size.
const DEFAULT_AUDIO_FRAME_SIZE: usize = 1024;

/// Encodes clips to files or byte buffers.
#[derive(Debug, Clone, Default)]
pub struct VideoWriter {
    options: WriterOptions,
}

impl VideoWriter {
    /// Create a writer with the given encoder settings.
    pub fn new(options: WriterOptions) -> Self {
        Self { options }
    }

    /// The encoder settings.
    pub fn options(&self) -> &WriterOptions {
        &self.options
    }

    /// Encode `video` (and `audio`, if given and non-empty) to `path`.
    ///
    /// The container format is inferred from the file extension.
    ///
    /// # Errors
    ///
    /// - [`ClipError::InvalidClip`] for an empty clip or a frame rate that
    ///   rounds below one.
    /// - [`ClipError::VideoEncodeError`] / [`ClipError::AudioEncodeError`]
    ///   if an encoder is missing or rejects its settings.
    /// - [`ClipError::VideoWriteError`] if the output cannot be written.
    pub fn write<P: AsRef<Path>>(
        &self,
        path: P,
        video: &VideoClip,
        audio: Option<&AudioClip>,
    ) -> Result<(), ClipError> {
        let path = path.as_ref();

        if video.is_empty() || video.width() == 0 || video.height() == 0 {
            return Err(ClipError::InvalidClip("no video frames to write".to_string()));
        }
        let fps = self.options.rounded_fps().ok_or_else(|| {
            ClipError::InvalidClip(format!(
                "frame rate {} does not round to a positive integer",
                self.options.fps
            ))
        })?;
        let audio = audio.filter(|clip| !clip.is_empty());

        log::info!(
            "Writing {} frames to {} (codec={}, fps={fps}, audio={})",
            video.len(),
            path.display(),
            self.options.video_codec,
            audio.is_some(),
        );

        crate::ffmpeg::initialize()?;

        let mut output = ffmpeg_next::format::output(&path).map_err(|error| {
            ClipError::VideoWriteError(format!("cannot open output {}: {error}", path.display()))
        })?;
        let global_header = output.format().flags().contains(FormatFlags::GLOBAL_HEADER);

        let mut video_track =
            VideoTrackEncoder::add(&mut output, &self.options, video, fps, global_header)?;
        let mut audio_track = match audio {
            Some(clip) => {
                let sample_rate = self.options.audio_sample_rate.unwrap_or(clip.sample_rate());
                Some(AudioTrackEncoder::add(
                    &mut output,
                    &self.options,
                    sample_rate,
                    global_header,
                )?)
            }
            None => None,
        };

        output
            .write_header()
            .map_err(|error| ClipError::VideoWriteError(format!("cannot write header: {error}")))?;

        video_track.encode(&mut output, video)?;
        if let (Some(track), Some(clip)) = (audio_track.as_mut(), audio) {
            track.encode(&mut output, clip.samples())?;
        }

        output
            .write_trailer()
            .map_err(|error| ClipError::VideoWriteError(format!("cannot write trailer: {error}")))?;

        log::debug!("Finished writing {}", path.display());
        Ok(())
    }

    /// Encode to memory, using `extension` (e.g. `"mp4"`) to pick the
    /// container format.
    ///
    /// # Errors
    ///
    /// Same as [`write`](VideoWriter::write), plus [`ClipError::IoError`] if
    /// the scratch file cannot be created or read back.
    pub fn to_bytes(
        &self,
        video: &VideoClip,
        audio: Option<&AudioClip>,
        extension: &str,
    ) -> Result<Vec<u8>, ClipError> {
        let suffix = format!(".{}", extension.trim_start_matches('.'));
        let scratch = tempfile::Builder::new()
            .prefix("encoded-video-")
            .suffix(&suffix)
            .tempfile()?;

        self.write(scratch.path(), video, audio)?;
        Ok(std::fs::read(scratch.path())?)
    }
}

/// Encode `video` (and `audio`) to `path`.
///
/// Shorthand for [`VideoWriter::write`].
pub fn write_video<P: AsRef<Path>>(
    path: P,
    video: &VideoClip,
    audio: Option<&AudioClip>,
    options: WriterOptions,
) -> Result<(), ClipError> {
    VideoWriter::new(options).write(path, video, audio)
}

/// Encode `video` (and `audio`) to an in-memory `extension` file.
///
/// Shorthand for [`VideoWriter::to_bytes`].
pub fn video_to_bytes(
    video: &VideoClip,
    audio: Option<&AudioClip>,
    options: WriterOptions,
    extension: &str,
) -> Result<Vec<u8>, ClipError> {
    VideoWriter::new(options).to_bytes(video, audio, extension)
}

fn encoder_options(options: &[(String, String)]) -> Dictionary<'static> {
    let mut dictionary = Dictionary::new();
    for (key, value) in options {
        dictionary.set(key, value);
    }
    dictionary
}

fn stream_time_base(output: &Output, stream_index: usize) -> Result<Rational, ClipError> {
    output
        .stream(stream_index)
        .map(|stream| stream.time_base())
        .ok_or_else(|| ClipError::VideoWriteError(format!("output stream {stream_index} vanished")))
}

/// Pick YUV420P when the encoder takes it, else its first listed format.
fn video_pixel_format(codec: Codec) -> Pixel {
    let supported: Vec<Pixel> = codec
        .video()
        .ok()
        .and_then(|video| video.formats())
        .map(|formats| formats.collect())
        .unwrap_or_default();

    if supported.is_empty() || supported.contains(&Pixel::YUV420P) {
        Pixel::YUV420P
    } else {
        supported[0]
    }
}

fn audio_sample_format(codec: Codec) -> Sample {
    codec
        .audio()
        .ok()
        .and_then(|audio| audio.formats())
        .and_then(|mut formats| formats.next())
        .unwrap_or(Sample::F32(SampleType::Planar))
}

struct VideoTrackEncoder {
    encoder: VideoEncoder,
    scaler: ScalingContext,
    stream_index: usize,
    time_base: Rational,
    width: u32,
    height: u32,
}

impl VideoTrackEncoder {
    fn add(
        output: &mut Output,
        options: &WriterOptions,
        clip: &VideoClip,
        fps: i32,
        global_header: bool,
    ) -> Result<Self, ClipError> {
        let codec = ffmpeg_next::encoder::find_by_name(&options.video_codec).ok_or_else(|| {
            ClipError::VideoEncodeError(format!("encoder '{}' not available", options.video_codec))
        })?;
        let pixel_format = video_pixel_format(codec);
        let width = clip.width() as u32;
        let height = clip.height() as u32;
        let time_base = Rational::new(1, fps);

        let mut stream = output
            .add_stream(codec)
            .map_err(|error| ClipError::VideoWriteError(format!("cannot add video stream: {error}")))?;
        let stream_index = stream.index();

        let mut encoder = CodecContext::from_parameters(stream.parameters())
            .and_then(|context| context.encoder().video())
            .map_err(|error| {
                ClipError::VideoEncodeError(format!("cannot create video encoder: {error}"))
            })?;

        encoder.set_width(width);
        encoder.set_height(height);
        encoder.set_format(pixel_format);
        encoder.set_time_base(time_base);
        encoder.set_frame_rate(Some(Rational::new(fps, 1)));
        if global_header {
            unsafe {
                (*encoder.as_mut_ptr()).flags |= ffmpeg_sys_next::AV_CODEC_FLAG_GLOBAL_HEADER as i32;
            }
        }

        let encoder = encoder
            .open_as_with(codec, encoder_options(&options.video_options))
            .map_err(|error| {
                ClipError::VideoEncodeError(format!(
                    "cannot open encoder '{}': {error}",
                    options.video_codec
                ))
            })?;
        stream.set_parameters(&encoder);

        let scaler = ScalingContext::get(
            Pixel::RGB24,
            width,
            height,
            pixel_format,
            width,
            height,
            ScalingFlags::BILINEAR,
        )
        .map_err(|error| ClipError::VideoEncodeError(format!("cannot create scaler: {error}")))?;

        Ok(Self {
            encoder,
            scaler,
            stream_index,
            time_base,
            width,
            height,
        })
    }

    fn encode(&mut self, output: &mut Output, clip: &VideoClip) -> Result<(), ClipError> {
        let stream_time_base = stream_time_base(output, self.stream_index)?;
        let mut source = VideoFrame::new(Pixel::RGB24, self.width, self.height);
        let row_bytes = (self.width as usize) * 3;

        for index in 0..clip.len() {
            let Some(bytes) = clip.frame_bytes(index) else {
                continue;
            };

            let stride = source.stride(0);
            let plane = source.data_mut(0);
            for (row, pixels) in bytes.chunks_exact(row_bytes).enumerate() {
                let start = row * stride;
                plane[start..start + row_bytes].copy_from_slice(pixels);
            }

            let mut converted = VideoFrame::empty();
            self.scaler
                .run(&source, &mut converted)
                .map_err(|error| ClipError::VideoEncodeError(format!("scaling failed: {error}")))?;
            converted.set_pts(Some(index as i64));

            self.encoder
                .send_frame(&converted)
                .map_err(|error| ClipError::VideoEncodeError(format!("send_frame failed: {error}")))?;
            self.drain(output, stream_time_base)?;
        }

        self.encoder
            .send_eof()
            .map_err(|error| ClipError::VideoEncodeError(format!("send_eof failed: {error}")))?;
        self.drain(output, stream_time_base)
    }

    fn drain(&mut self, output: &mut Output, stream_time_base: Rational) -> Result<(), ClipError> {
        let mut packet = Packet::empty();
        while self.encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(self.stream_index);
            packet.rescale_ts(self.time_base, stream_time_base);
            packet
                .write_interleaved(output)
                .map_err(|error| ClipError::VideoWriteError(format!("write packet failed: {error}")))?;
        }
        Ok(())
    }
}

struct AudioTrackEncoder {
    encoder: AudioEncoder,
    resampler: ResamplingContext,
    stream_index: usize,
    time_base: Rational,
    sample_rate: u32,
    frame_size: usize,
}

impl AudioTrackEncoder {
    fn add(
        output: &mut Output,
        options: &WriterOptions,
        sample_rate: u32,
        global_header: bool,
    ) -> Result<Self, ClipError> {
        if sample_rate == 0 {
            return Err(ClipError::InvalidClip("audio sample rate is zero".to_string()));
        }

        let codec = ffmpeg_next::encoder::find_by_name(&options.audio_codec).ok_or_else(|| {
            ClipError::AudioEncodeError(format!("encoder '{}' not available", options.audio_codec))
        })?;
        let sample_format = audio_sample_format(codec);
        let time_base = Rational::new(1, sample_rate as i32);

        let mut stream = output
            .add_stream(codec)
            .map_err(|error| ClipError::VideoWriteError(format!("cannot add audio stream: {error}")))?;
        let stream_index = stream.index();

        let mut encoder = CodecContext::from_parameters(stream.parameters())
            .and_then(|context| context.encoder().audio())
            .map_err(|error| ClipError::AudioEncodeError(error.to_string()))?;

        encoder.set_rate(sample_rate as i32);
        encoder.set_channel_layout(ChannelLayout::MONO);
        encoder.set_format(sample_format);
        encoder.set_time_base(time_base);
        encoder.set_bit_rate(128_000);
        if global_header {
            unsafe {
                (*encoder.as_mut_ptr()).flags |= ffmpeg_sys_next::AV_CODEC_FLAG_GLOBAL_HEADER as i32;
            }
        }

        let encoder = encoder
            .open_as_with(codec, encoder_options(&options.audio_options))
            .map_err(|error| {
                ClipError::AudioEncodeError(format!(
                    "cannot open encoder '{}': {error}",
                    options.audio_codec
                ))
            })?;
        stream.set_parameters(&encoder);

        let frame_size = match encoder.frame_size() {
            0 => DEFAULT_AUDIO_FRAME_SIZE,
            size => size as usize,
        };

        let resampler = ResamplingContext::get(
            Sample::F32(SampleType::Packed),
            ChannelLayout::MONO,
            sample_rate,
            sample_format,
            ChannelLayout::MONO,
            sample_rate,
        )
        .map_err(|error| ClipError::AudioEncodeError(error.to_string()))?;

        Ok(Self {
            encoder,
            resampler,
            stream_index,
            time_base,
            sample_rate,
            frame_size,
        })
    }

    /// Encode mono samples, zero-padding the final frame.
    fn encode(&mut self, output: &mut Output, samples: &[f32]) -> Result<(), ClipError> {
        let stream_time_base = stream_time_base(output, self.stream_index)?;
        let mut samples_written: i64 = 0;

        for chunk in samples.chunks(self.frame_size) {
            let mut source = AudioFrame::new(
                Sample::F32(SampleType::Packed),
                self.frame_size,
                ChannelLayout::MONO,
            );
            source.set_rate(self.sample_rate);

            let plane = source.data_mut(0);
            plane.fill(0);
            for (slot, sample) in plane.chunks_exact_mut(4).zip(chunk) {
                slot.copy_from_slice(&sample.to_ne_bytes());
            }

            let mut converted = AudioFrame::empty();
            self.resampler
                .run(&source, &mut converted)
                .map_err(|error| ClipError::AudioEncodeError(error.to_string()))?;
            converted.set_pts(Some(samples_written));
            samples_written += converted.samples() as i64;

            self.encoder
                .send_frame(&converted)
                .map_err(|error| ClipError::AudioEncodeError(error.to_string()))?;
            self.drain(output, stream_time_base)?;
        }

        self.encoder
            .send_eof()
            .map_err(|error| ClipError::AudioEncodeError(error.to_string()))?;
        self.drain(output, stream_time_base)
    }

    fn drain(&mut self, output: &mut Output, stream_time_base: Rational) -> Result<(), ClipError> {
        let mut packet = Packet::empty();
        while self.encoder.receive_packet(&mut packet).is_ok() {
            packet.set_stream(self.stream_index);
            packet.rescale_ts(self.time_base, stream_time_base);
            packet
                .write_interleaved(output)
                .map_err(|error| ClipError::VideoWriteError(format!("write packet failed: {error}")))?;
        }
        Ok(())
    }
}
