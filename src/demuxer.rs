//! FFmpeg-backed [`MediaContainer`].
//!
//! [`FfmpegContainer`] opens a file (or an in-memory buffer) with FFmpeg,
//! reads the headers of the best video and audio streams, and decodes
//! frames on demand: video is converted to packed RGB24 at the header
//! resolution, audio to interleaved `f32`.

use std::{
    io::Write,
    ops::ControlFlow,
    path::{Path, PathBuf},
};

use ffmpeg_next::{
    codec::context::Context as CodecContext,
    decoder::{Audio as AudioDecoder, Video as VideoDecoder},
    format::{Pixel, Sample, context::Input, sample::Type as SampleType, stream::Stream},
    frame::{Audio as AudioFrame, Video as VideoFrame},
    media::Type,
    software::{
        resampling::Context as ResamplingContext,
        scaling::{Context as ScalingContext, Flags as ScalingFlags},
    },
};
use tempfile::NamedTempFile;

use crate::{
    container::{Frame, FrameData, MediaContainer, RgbFrame, SampleBuffer},
    conversion::rational_to_f64,
    error::ClipError,
    metadata::{AudioHeader, StreamHeader, StreamKind, VideoHeader},
};

/// Label used in errors and logs for sources opened from memory.
const MEMORY_SOURCE: &str = "<memory>";

/// A media file opened with FFmpeg.
pub struct FfmpegContainer {
    /// The demuxer. `None` once closed.
    input: Option<Input>,
    video: Option<VideoHeader>,
    audio: Option<AudioHeader>,
    format: String,
    source_name: String,
    /// On-disk copy of an in-memory source; must outlive `input`.
    spill: Option<NamedTempFile>,
}

impl std::fmt::Debug for FfmpegContainer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FfmpegContainer")
            .field("source_name", &self.source_name)
            .field("format", &self.format)
            .field("video", &self.video)
            .field("audio", &self.audio)
            .field("closed", &self.input.is_none())
            .finish_non_exhaustive()
    }
}

impl FfmpegContainer {
    /// Open a media file.
    ///
    /// # Errors
    ///
    /// Returns [`ClipError::Open`] if FFmpeg cannot initialise, cannot parse
    /// the file, or cannot build a decoder for one of the selected streams.
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self, ClipError> {
        let path = path.as_ref();
        Self::open_source(path, path.display().to_string(), None)
    }

    /// Open an encoded media buffer held in memory.
    ///
    /// The bytes are copied to a private temporary file that lives as long
    /// as the container.
    ///
    /// # Errors
    ///
    /// Returns [`ClipError::Open`] if the buffer cannot be staged or parsed.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self, ClipError> {
        let open_error = |reason: String| ClipError::Open {
            source_name: MEMORY_SOURCE.to_string(),
            reason,
        };

        let mut spill = NamedTempFile::new()
            .map_err(|error| open_error(format!("cannot stage buffer: {error}")))?;
        spill
            .write_all(bytes)
            .and_then(|()| spill.flush())
            .map_err(|error| open_error(format!("cannot stage buffer: {error}")))?;

        let path: PathBuf = spill.path().to_path_buf();
        log::debug!("Staged {} bytes at {}", bytes.len(), path.display());
        Self::open_source(&path, MEMORY_SOURCE.to_string(), Some(spill))
    }

    fn open_source(
        path: &Path,
        source_name: String,
        spill: Option<NamedTempFile>,
    ) -> Result<Self, ClipError> {
        log::debug!("Opening container: {source_name}");

        let open_error = |reason: String| ClipError::Open {
            source_name: source_name.clone(),
            reason,
        };

        crate::ffmpeg::initialize()
            .map_err(|error| open_error(format!("FFmpeg initialisation failed: {error}")))?;

        let input = ffmpeg_next::format::input(&path).map_err(|error| open_error(error.to_string()))?;

        let video = match input.streams().best(Type::Video) {
            Some(stream) => Some(read_video_header(&stream).map_err(|error| {
                open_error(format!(
                    "cannot read video stream {}: {error}",
                    stream.index()
                ))
            })?),
            None => None,
        };

        let audio = match input.streams().best(Type::Audio) {
            Some(stream) => Some(read_audio_header(&stream).map_err(|error| {
                open_error(format!(
                    "cannot read audio stream {}: {error}",
                    stream.index()
                ))
            })?),
            None => None,
        };

        let format = input.format().name().to_string();

        log::info!(
            "Opened container: {} (format={}, video={}, audio={})",
            source_name,
            format,
            video.is_some(),
            audio.is_some(),
        );
        if let Some(header) = &video {
            log::debug!(
                "Video stream: index={}, {}x{}, {:.2} fps, codec={}, time_base={}, start_pts={}, duration={:?}",
                header.stream.index,
                header.width,
                header.height,
                header.frames_per_second,
                header.stream.codec,
                header.stream.time_base,
                header.stream.start_pts,
                header.stream.duration,
            );
        }
        if let Some(header) = &audio {
            log::debug!(
                "Audio stream: index={}, {} Hz, {} ch, codec={}, time_base={}, start_pts={}, duration={:?}",
                header.stream.index,
                header.sample_rate,
                header.channels,
                header.stream.codec,
                header.stream.time_base,
                header.stream.start_pts,
                header.stream.duration,
            );
        }

        Ok(Self {
            input: Some(input),
            video,
            audio,
            format,
            source_name,
            spill,
        })
    }

    /// Container format name (e.g. `"mov,mp4,m4a,3gp,3g2,mj2"`, `"h264"`).
    pub fn format_name(&self) -> &str {
        &self.format
    }

    /// Path or label the container was opened from.
    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    fn stream_index(&self, kind: StreamKind) -> Result<usize, ClipError> {
        let index = match kind {
            StreamKind::Video => self.video.as_ref().map(|header| header.stream.index),
            StreamKind::Audio => self.audio.as_ref().map(|header| header.stream.index),
        };
        index.ok_or(ClipError::MissingStream(kind))
    }
}

impl MediaContainer for FfmpegContainer {
    fn video_header(&self) -> Option<&VideoHeader> {
        self.video.as_ref()
    }

    fn audio_header(&self) -> Option<&AudioHeader> {
        self.audio.as_ref()
    }

    fn seek(&mut self, kind: StreamKind, pts: i64) -> Result<(), ClipError> {
        let stream_index = self.stream_index(kind)?;
        let input = self.input.as_mut().ok_or(ClipError::Closed)?;

        log::trace!("Seeking {kind} stream {stream_index} to pts {pts}");

        // `Input::seek` only seeks in AV_TIME_BASE on the default stream, so
        // go through av_seek_frame to seek in the stream's own time base.
        let result = unsafe {
            ffmpeg_sys_next::av_seek_frame(
                input.as_mut_ptr(),
                stream_index as i32,
                pts,
                ffmpeg_sys_next::AVSEEK_FLAG_BACKWARD as i32,
            )
        };

        if result < 0 {
            return Err(ClipError::SeekError {
                kind,
                pts,
                reason: ffmpeg_next::Error::from(result).to_string(),
            });
        }
        Ok(())
    }

    fn decode(
        &mut self,
        kind: StreamKind,
        visitor: &mut dyn FnMut(Frame) -> ControlFlow<()>,
    ) -> Result<(), ClipError> {
        let stream_index = self.stream_index(kind)?;
        let target_size = self
            .video
            .as_ref()
            .map(|header| (header.width, header.height))
            .unwrap_or((0, 0));
        let input = self.input.as_mut().ok_or(ClipError::Closed)?;

        match kind {
            StreamKind::Video => decode_video(input, stream_index, target_size, visitor),
            StreamKind::Audio => decode_audio(input, stream_index, visitor),
        }
    }

    fn close(&mut self) {
        if self.input.take().is_some() {
            log::debug!("Closed container: {}", self.source_name);
        }
        self.spill = None;
    }

    fn is_closed(&self) -> bool {
        self.input.is_none()
    }
}

fn known_timestamp(value: i64) -> Option<i64> {
    (value != ffmpeg_sys_next::AV_NOPTS_VALUE).then_some(value)
}

fn stream_header(stream: &Stream<'_>) -> StreamHeader {
    StreamHeader::new(stream.index(), stream.time_base())
        .with_start_pts(known_timestamp(stream.start_time()))
        .with_duration(known_timestamp(stream.duration()).filter(|ticks| *ticks > 0))
        .with_codec(stream.parameters().id().name())
}

fn read_video_header(stream: &Stream<'_>) -> Result<VideoHeader, ffmpeg_next::Error> {
    let decoder = CodecContext::from_parameters(stream.parameters())?
        .decoder()
        .video()?;

    let mut frames_per_second = rational_to_f64(stream.avg_frame_rate());
    if frames_per_second <= 0.0 {
        frames_per_second = rational_to_f64(stream.rate());
    }

    Ok(VideoHeader {
        stream: stream_header(stream),
        width: decoder.width(),
        height: decoder.height(),
        frames_per_second,
    })
}

fn read_audio_header(stream: &Stream<'_>) -> Result<AudioHeader, ffmpeg_next::Error> {
    let decoder = CodecContext::from_parameters(stream.parameters())?
        .decoder()
        .audio()?;

    Ok(AudioHeader {
        stream: stream_header(stream),
        sample_rate: decoder.rate(),
        channels: decoder.channels(),
    })
}

fn video_error(error: ffmpeg_next::Error) -> ClipError {
    ClipError::VideoDecodeError(error.to_string())
}

fn audio_error(error: ffmpeg_next::Error) -> ClipError {
    ClipError::AudioDecodeError(error.to_string())
}

fn decode_video(
    input: &mut Input,
    stream_index: usize,
    target_size: (u32, u32),
    visitor: &mut dyn FnMut(Frame) -> ControlFlow<()>,
) -> Result<(), ClipError> {
    let stream = input
        .stream(stream_index)
        .ok_or(ClipError::MissingStream(StreamKind::Video))?;
    let mut decoder = CodecContext::from_parameters(stream.parameters())?
        .decoder()
        .video()
        .map_err(video_error)?;

    let mut converter = RgbConverter::new(target_size);
    let mut decoded = VideoFrame::empty();

    for (stream, packet) in input.packets() {
        if stream.index() != stream_index {
            continue;
        }
        decoder.send_packet(&packet).map_err(video_error)?;
        if drain_video(&mut decoder, &mut decoded, &mut converter, visitor)?.is_break() {
            return Ok(());
        }
    }

    decoder.send_eof().map_err(video_error)?;
    drain_video(&mut decoder, &mut decoded, &mut converter, visitor)?;
    Ok(())
}

fn drain_video(
    decoder: &mut VideoDecoder,
    decoded: &mut VideoFrame,
    converter: &mut RgbConverter,
    visitor: &mut dyn FnMut(Frame) -> ControlFlow<()>,
) -> Result<ControlFlow<()>, ClipError> {
    while decoder.receive_frame(decoded).is_ok() {
        let Some(pts) = decoded.pts().or_else(|| decoded.timestamp()) else {
            log::trace!("Skipping video frame without a timestamp");
            continue;
        };
        let rgb = converter.convert(decoded)?;
        if visitor(Frame {
            pts,
            data: FrameData::Rgb(rgb),
        })
        .is_break()
        {
            return Ok(ControlFlow::Break(()));
        }
    }
    Ok(ControlFlow::Continue(()))
}

/// Converts decoded pictures to packed RGB24 at a fixed output size,
/// rebuilding the scaler when the source format or size changes.
struct RgbConverter {
    target_size: (u32, u32),
    scaler: Option<((Pixel, u32, u32), ScalingContext)>,
    output: VideoFrame,
}

impl RgbConverter {
    fn new(target_size: (u32, u32)) -> Self {
        Self {
            target_size,
            scaler: None,
            output: VideoFrame::empty(),
        }
    }

    fn convert(&mut self, frame: &VideoFrame) -> Result<RgbFrame, ClipError> {
        let source = (frame.format(), frame.width(), frame.height());
        let (width, height) = match self.target_size {
            (0, _) | (_, 0) => (source.1, source.2),
            size => size,
        };

        let stale = !matches!(&self.scaler, Some((key, _)) if *key == source);
        if stale {
            let scaler = ScalingContext::get(
                source.0,
                source.1,
                source.2,
                Pixel::RGB24,
                width,
                height,
                ScalingFlags::BILINEAR,
            )
            .map_err(video_error)?;
            self.scaler = Some((source, scaler));
            self.output = VideoFrame::empty();
        }

        let Some((_, scaler)) = self.scaler.as_mut() else {
            return Err(ClipError::VideoDecodeError(
                "no scaler available for decoded frame".to_string(),
            ));
        };
        scaler.run(frame, &mut self.output).map_err(video_error)?;

        Ok(RgbFrame {
            width,
            height,
            pixels: packed_rgb(&self.output, width, height),
        })
    }
}

/// Copy an RGB24 plane into a buffer without FFmpeg's per-row padding.
fn packed_rgb(frame: &VideoFrame, width: u32, height: u32) -> Vec<u8> {
    let stride = frame.stride(0);
    let row_bytes = (width as usize) * 3;
    let data = frame.data(0);

    if stride == row_bytes {
        data[..row_bytes * (height as usize)].to_vec()
    } else {
        let mut buffer = Vec::with_capacity(row_bytes * (height as usize));
        for row in 0..(height as usize) {
            let start = row * stride;
            buffer.extend_from_slice(&data[start..start + row_bytes]);
        }
        buffer
    }
}

fn decode_audio(
    input: &mut Input,
    stream_index: usize,
    visitor: &mut dyn FnMut(Frame) -> ControlFlow<()>,
) -> Result<(), ClipError> {
    let stream = input
        .stream(stream_index)
        .ok_or(ClipError::MissingStream(StreamKind::Audio))?;
    let mut decoder = CodecContext::from_parameters(stream.parameters())?
        .decoder()
        .audio()
        .map_err(audio_error)?;

    let mut converter = SampleConverter::default();
    let mut decoded = AudioFrame::empty();

    for (stream, packet) in input.packets() {
        if stream.index() != stream_index {
            continue;
        }
        decoder.send_packet(&packet).map_err(audio_error)?;
        if drain_audio(&mut decoder, &mut decoded, &mut converter, visitor)?.is_break() {
            return Ok(());
        }
    }

    decoder.send_eof().map_err(audio_error)?;
    drain_audio(&mut decoder, &mut decoded, &mut converter, visitor)?;
    Ok(())
}

fn drain_audio(
    decoder: &mut AudioDecoder,
    decoded: &mut AudioFrame,
    converter: &mut SampleConverter,
    visitor: &mut dyn FnMut(Frame) -> ControlFlow<()>,
) -> Result<ControlFlow<()>, ClipError> {
    while decoder.receive_frame(decoded).is_ok() {
        let Some(pts) = decoded.pts().or_else(|| decoded.timestamp()) else {
            log::trace!("Skipping audio frame without a timestamp");
            continue;
        };
        let buffer = converter.convert(decoded)?;
        if visitor(Frame {
            pts,
            data: FrameData::Samples(buffer),
        })
        .is_break()
        {
            return Ok(ControlFlow::Break(()));
        }
    }
    Ok(ControlFlow::Continue(()))
}

/// Converts decoded audio of any sample format to interleaved `f32`,
/// keeping the source channel count and rate.
#[derive(Default)]
struct SampleConverter {
    resampler: Option<((Sample, u16, u32), ResamplingContext)>,
}

impl SampleConverter {
    fn convert(&mut self, frame: &AudioFrame) -> Result<SampleBuffer, ClipError> {
        let source = (frame.format(), frame.channels(), frame.rate());

        let stale = !matches!(&self.resampler, Some((key, _)) if *key == source);
        if stale {
            let resampler = ResamplingContext::get(
                frame.format(),
                frame.channel_layout(),
                frame.rate(),
                Sample::F32(SampleType::Packed),
                frame.channel_layout(),
                frame.rate(),
            )
            .map_err(audio_error)?;
            self.resampler = Some((source, resampler));
        }

        let Some((_, resampler)) = self.resampler.as_mut() else {
            return Err(ClipError::AudioDecodeError(
                "no resampler available for decoded frame".to_string(),
            ));
        };

        let mut resampled = AudioFrame::empty();
        resampler.run(frame, &mut resampled).map_err(audio_error)?;

        let channels = resampled.channels();
        let wanted = resampled.samples() * usize::from(channels) * 4;
        let data = resampled.data(0);
        let bytes = &data[..wanted.min(data.len())];

        let samples = bytes
            .chunks_exact(4)
            .map(|chunk| {
                let mut word = [0_u8; 4];
                word.copy_from_slice(chunk);
                f32::from_ne_bytes(word)
            })
            .collect();

        Ok(SampleBuffer { channels, samples })
    }
}
