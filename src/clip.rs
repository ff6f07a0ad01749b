//! Clip results.
//!
//! A [`Clip`] holds whatever modalities were found in a requested time
//! range. Video is stacked into a single `T × H × W × 3` array of `f32`
//! values in `[0, 255]`; audio is one flat mono sample sequence. A modality
//! with nothing in range is `None`, never an empty array.

use image::RgbImage;

use crate::container::RgbFrame;

/// Video frames and audio samples for one time range.
#[derive(Debug, Clone, Default)]
pub struct Clip {
    /// Stacked video frames, or `None` if no frame fell in range.
    pub video: Option<VideoClip>,
    /// Mono audio samples, or `None` if there is no audio in range.
    pub audio: Option<AudioClip>,
}

impl Clip {
    /// Returns `true` if neither video nor audio was found.
    pub fn is_empty(&self) -> bool {
        self.video.is_none() && self.audio.is_none()
    }
}

/// Stacked RGB frames, laid out time × height × width × channel.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoClip {
    frames: usize,
    height: usize,
    width: usize,
    data: Vec<f32>,
    timestamps: Vec<f64>,
}

impl VideoClip {
    /// Number of colour channels per pixel.
    pub const CHANNELS: usize = 3;

    /// Stack `(seconds, frame)` pairs in the order given.
    ///
    /// The first frame fixes the clip's dimensions; later frames with a
    /// different size are dropped with a warning. Returns `None` if there
    /// are no frames.
    pub fn from_frames<'a, I>(frames: I) -> Option<Self>
    where
        I: IntoIterator<Item = (f64, &'a RgbFrame)>,
    {
        let mut frames = frames.into_iter();
        let (first_seconds, first) = frames.next()?;

        let width = first.width as usize;
        let height = first.height as usize;
        let mut clip = Self {
            frames: 0,
            height,
            width,
            data: Vec::new(),
            timestamps: Vec::new(),
        };
        clip.push(first_seconds, first);

        for (seconds, frame) in frames {
            if frame.width as usize != width || frame.height as usize != height {
                log::warn!(
                    "Dropping {}x{} frame at {seconds:.3}s from a {width}x{height} clip",
                    frame.width,
                    frame.height,
                );
                continue;
            }
            clip.push(seconds, frame);
        }

        Some(clip)
    }

    fn push(&mut self, seconds: f64, frame: &RgbFrame) {
        self.data
            .extend(frame.pixels.iter().map(|&value| f32::from(value)));
        self.timestamps.push(seconds);
        self.frames += 1;
    }

    /// `[frames, height, width, channels]`.
    pub fn shape(&self) -> [usize; 4] {
        [self.frames, self.height, self.width, Self::CHANNELS]
    }

    /// Number of frames.
    pub fn len(&self) -> usize {
        self.frames
    }

    /// Returns `true` if the clip holds no frames.
    pub fn is_empty(&self) -> bool {
        self.frames == 0
    }

    /// Frame width in pixels.
    pub fn width(&self) -> usize {
        self.width
    }

    /// Frame height in pixels.
    pub fn height(&self) -> usize {
        self.height
    }

    /// The whole array, row-major in [`shape`](Self::shape) order.
    pub fn data(&self) -> &[f32] {
        &self.data
    }

    /// Presentation time of each frame, in seconds from the stream start.
    pub fn timestamps(&self) -> &[f64] {
        &self.timestamps
    }

    fn frame_len(&self) -> usize {
        self.height * self.width * Self::CHANNELS
    }

    /// The `H × W × 3` slice of frame `index`.
    pub fn frame(&self, index: usize) -> Option<&[f32]> {
        if index >= self.frames {
            return None;
        }
        let len = self.frame_len();
        self.data.get(index * len..(index + 1) * len)
    }

    /// Frame `index` as packed RGB24 bytes, values clamped to `[0, 255]`.
    pub fn frame_bytes(&self, index: usize) -> Option<Vec<u8>> {
        self.frame(index).map(|values| {
            values
                .iter()
                .map(|value| value.round().clamp(0.0, 255.0) as u8)
                .collect()
        })
    }

    /// Frame `index` as an [`RgbImage`].
    pub fn frame_image(&self, index: usize) -> Option<RgbImage> {
        let bytes = self.frame_bytes(index)?;
        RgbImage::from_raw(self.width as u32, self.height as u32, bytes)
    }
}

/// Mono audio samples.
#[derive(Debug, Clone, PartialEq)]
pub struct AudioClip {
    samples: Vec<f32>,
    sample_rate: u32,
}

impl AudioClip {
    /// Wrap mono samples recorded at `sample_rate` Hz.
    pub fn new(samples: Vec<f32>, sample_rate: u32) -> Self {
        Self {
            samples,
            sample_rate,
        }
    }

    /// Concatenate per-frame sample buffers in order.
    ///
    /// Returns `None` if the result would be empty.
    pub fn from_chunks<'a, I>(chunks: I, sample_rate: u32) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Vec<f32>>,
    {
        let samples: Vec<f32> = chunks.into_iter().flatten().copied().collect();
        (!samples.is_empty()).then(|| Self::new(samples, sample_rate))
    }

    /// The samples, in the decoder's native float range.
    pub fn samples(&self) -> &[f32] {
        &self.samples
    }

    /// Sample rate in hertz.
    pub fn sample_rate(&self) -> u32 {
        self.sample_rate
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Returns `true` if there are no samples.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    /// Length in seconds (`0.0` for an unknown sample rate).
    pub fn duration_seconds(&self) -> f64 {
        if self.sample_rate == 0 {
            0.0
        } else {
            self.samples.len() as f64 / f64::from(self.sample_rate)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solid(width: u32, height: u32, value: u8) -> RgbFrame {
        RgbFrame {
            width,
            height,
            pixels: vec![value; (width * height * 3) as usize],
        }
    }

    #[test]
    fn frames_stack_in_order() {
        let a = solid(2, 1, 10);
        let b = solid(2, 1, 200);
        let clip = VideoClip::from_frames([(0.0, &a), (0.5, &b)]).unwrap();

        assert_eq!(clip.shape(), [2, 1, 2, 3]);
        assert_eq!(clip.timestamps(), &[0.0, 0.5]);
        assert_eq!(clip.frame(1).unwrap(), &[200.0; 6]);
        assert!(clip.frame(2).is_none());
    }

    #[test]
    fn mismatched_frames_are_dropped() {
        let a = solid(2, 2, 1);
        let b = solid(4, 2, 1);
        let c = solid(2, 2, 3);
        let clip = VideoClip::from_frames([(0.0, &a), (1.0, &b), (2.0, &c)]).unwrap();

        assert_eq!(clip.len(), 2);
        assert_eq!(clip.timestamps(), &[0.0, 2.0]);
    }

    #[test]
    fn frame_image_round_trips_bytes() {
        let frame = RgbFrame {
            width: 1,
            height: 1,
            pixels: vec![1, 2, 3],
        };
        let clip = VideoClip::from_frames([(0.0, &frame)]).unwrap();
        let image = clip.frame_image(0).unwrap();
        assert_eq!(image.get_pixel(0, 0).0, [1, 2, 3]);
    }

    #[test]
    fn empty_audio_is_none() {
        let chunks: Vec<Vec<f32>> = vec![Vec::new(), Vec::new()];
        assert!(AudioClip::from_chunks(&chunks, 48_000).is_none());

        let chunks = vec![vec![0.5; 3], vec![0.25; 1]];
        let audio = AudioClip::from_chunks(&chunks, 4).unwrap();
        assert_eq!(audio.len(), 4);
        assert!((audio.duration_seconds() - 1.0).abs() < f64::EPSILON);
    }
}
