//! Windowed stream decoding tests over a scripted container.

mod common;

use common::{
    ScriptedContainer, audio_header, rgb_frame, stereo_frame, video_frames, video_header,
};
use encoded_video::{
    FrameData, SEEK_MARGIN, StreamKind, Timestamp, decode_audio_window, decode_video_window,
    decode_window,
};
use ffmpeg_next::Rational;

/// 100 frames at `pts = i * 100`, keyframe every 10 frames.
fn hundred_frames() -> ScriptedContainer {
    ScriptedContainer::new().with_video(
        video_header(Rational::new(1, 1000), Some(10_000), 10.0),
        video_frames(100, 100),
        10,
    )
}

#[test]
fn seek_lands_one_margin_before_the_window() {
    let mut container = hundred_frames();
    decode_video_window(
        &mut container,
        Timestamp::Ticks(5000),
        Timestamp::Ticks(6000),
        SEEK_MARGIN,
    );
    assert_eq!(container.seeks, vec![(StreamKind::Video, 3976)]);
}

#[test]
fn seek_target_is_clamped_at_zero() {
    let mut container = hundred_frames();
    decode_video_window(&mut container, Timestamp::Ticks(500), Timestamp::Ticks(900), SEEK_MARGIN);
    assert_eq!(container.seeks, vec![(StreamKind::Video, 0)]);
}

#[test]
fn window_is_inclusive_and_sorted() {
    let mut container = hundred_frames();
    let decode = decode_video_window(
        &mut container,
        Timestamp::Ticks(5000),
        Timestamp::Ticks(6000),
        SEEK_MARGIN,
    );

    assert!(!decode.is_degraded());
    let track = decode.into_track();
    let timestamps: Vec<i64> = track.iter().map(|(pts, _)| *pts).collect();
    assert_eq!(timestamps, (50..=60).map(|i| i * 100).collect::<Vec<_>>());
}

#[test]
fn decoding_stops_at_first_frame_past_the_window() {
    let mut container = hundred_frames();
    let decode = decode_video_window(
        &mut container,
        Timestamp::Ticks(5000),
        Timestamp::Ticks(6000),
        SEEK_MARGIN,
    );

    // Keyframe at pts 3000 through the first frame past the end (pts 6100).
    assert_eq!(container.frames_yielded, 32);
    assert_eq!(decode.max_pts(), Some(6100));
}

#[test]
fn unaligned_window_keeps_only_frames_inside() {
    let mut container = hundred_frames();
    let track = decode_video_window(
        &mut container,
        Timestamp::Ticks(5050),
        Timestamp::Ticks(5250),
        SEEK_MARGIN,
    )
    .into_track();

    assert_eq!(track.first_pts(), Some(5100));
    assert_eq!(track.last_pts(), Some(5200));
    assert_eq!(track.len(), 2);
}

#[test]
fn infinite_end_reads_to_end_of_stream() {
    let mut container = hundred_frames();
    let decode = decode_video_window(
        &mut container,
        Timestamp::Ticks(0),
        Timestamp::Infinite,
        SEEK_MARGIN,
    );
    assert_eq!(decode.max_pts(), Some(9900));
    assert_eq!(decode.into_track().len(), 100);
}

#[test]
fn infinite_start_decodes_nothing() {
    let mut container = hundred_frames();
    let decode = decode_video_window(
        &mut container,
        Timestamp::Infinite,
        Timestamp::Infinite,
        SEEK_MARGIN,
    );
    assert!(container.seeks.is_empty());
    assert!(decode.into_track().is_empty());
}

#[test]
fn duplicate_pts_keeps_the_last_frame() {
    let mut container = ScriptedContainer::new().with_video(
        video_header(Rational::new(1, 1000), Some(300), 10.0),
        vec![rgb_frame(0, 1), rgb_frame(100, 2), rgb_frame(100, 3), rgb_frame(200, 4)],
        10,
    );

    let track = decode_video_window(&mut container, Timestamp::Ticks(0), Timestamp::Ticks(200), 0)
        .into_track();

    assert_eq!(track.len(), 3);
    assert_eq!(track.get(100).map(|frame| frame.pixels[0]), Some(3));
}

#[test]
fn decode_failure_degrades_to_empty() {
    let mut container = hundred_frames().failing_decode(StreamKind::Video);
    let decode = decode_video_window(
        &mut container,
        Timestamp::Ticks(0),
        Timestamp::Ticks(1000),
        SEEK_MARGIN,
    );

    assert!(decode.is_degraded());
    assert!(decode.error().is_some());
    assert_eq!(decode.max_pts(), None);
    assert!(decode.into_track().is_empty());
}

#[test]
fn seek_failure_degrades_to_empty() {
    let mut container = hundred_frames().failing_seek(StreamKind::Video);
    let decode = decode_video_window(
        &mut container,
        Timestamp::Ticks(0),
        Timestamp::Ticks(1000),
        SEEK_MARGIN,
    );

    assert!(decode.is_degraded());
    assert_eq!(container.decode_calls, 0);
}

#[test]
fn missing_stream_degrades_to_empty() {
    let mut container = hundred_frames();
    let decode = decode_audio_window(&mut container, Timestamp::Ticks(0), Timestamp::Infinite, 0);
    assert!(decode.is_degraded());
}

#[test]
fn audio_is_averaged_to_mono() {
    let mut container = ScriptedContainer::new()
        .with_video(video_header(Rational::new(1, 30), Some(30), 30.0), video_frames(30, 1), 30)
        .with_audio(
            audio_header(8, Some(8), 2),
            vec![stereo_frame(0, 4, 1.0, 0.0), stereo_frame(4, 4, -0.5, 0.5)],
        );

    let track = decode_audio_window(&mut container, Timestamp::Ticks(0), Timestamp::Ticks(8), 0)
        .into_track();

    assert_eq!(track.get(0), Some(&vec![0.5; 4]));
    assert_eq!(track.get(4), Some(&vec![0.0; 4]));
}

#[test]
fn custom_conversion_can_skip_frames() {
    let mut container = hundred_frames();
    let decode = decode_window(
        &mut container,
        StreamKind::Video,
        Timestamp::Ticks(0),
        Timestamp::Ticks(900),
        0,
        |data| match data {
            FrameData::Rgb(frame) if frame.pixels[0] % 2 == 0 => Some(frame.pixels[0]),
            _ => None,
        },
    );

    let track = decode.into_track();
    let values: Vec<u8> = track.iter().map(|(_, value)| *value).collect();
    assert_eq!(values, vec![0, 2, 4, 6, 8]);
}
