//! Benchmarks for clip extraction.
//!
//! Run with: cargo bench
//!
//! The extraction benchmarks require fixture files from
//! `tests/fixtures/generate_fixtures.sh`.

use std::{hint::black_box, path::Path};

use criterion::Criterion;
use encoded_video::{
    EncodedVideo, FfmpegLogLevel, RgbFrame, VideoClip, pts_to_seconds, seconds_to_pts,
    set_ffmpeg_log_level,
};
use ffmpeg_next::Rational;

const SAMPLE_VIDEO: &str = "tests/fixtures/sample_video.mp4";
const SAMPLE_RAW_H264: &str = "tests/fixtures/sample_video.h264";

fn benchmark_time_conversion(criterion: &mut Criterion) {
    let time_base = Rational::new(1001, 30000);

    criterion.bench_function("seconds -> pts -> seconds", |bencher| {
        bencher.iter(|| {
            let pts = seconds_to_pts(black_box(1234.567), time_base, 3003);
            pts_to_seconds(pts, time_base, 3003)
        });
    });
}

fn benchmark_frame_stacking(criterion: &mut Criterion) {
    let frames: Vec<RgbFrame> = (0..60)
        .filter_map(|index| RgbFrame::new(320, 240, vec![index as u8; 320 * 240 * 3]))
        .collect();

    criterion.bench_function("stack 60 320x240 frames", |bencher| {
        bencher.iter(|| {
            VideoClip::from_frames(
                frames
                    .iter()
                    .enumerate()
                    .map(|(index, frame)| (index as f64 / 30.0, frame)),
            )
        });
    });
}

fn benchmark_selective_clip(criterion: &mut Criterion) {
    set_ffmpeg_log_level(FfmpegLogLevel::Error);

    if !Path::new(SAMPLE_VIDEO).exists() {
        eprintln!("Skipping benchmark: fixture not found");
        return;
    }

    criterion.bench_function("open + get_clip(1s, 2s)", |bencher| {
        bencher.iter(|| {
            let mut video = EncodedVideo::open(SAMPLE_VIDEO).unwrap();
            video.get_clip(1.0, 2.0)
        });
    });

    let mut video = EncodedVideo::open(SAMPLE_VIDEO).unwrap();
    criterion.bench_function("get_clip(3s, 3.5s) on open handle", |bencher| {
        bencher.iter(|| video.get_clip(black_box(3.0), black_box(3.5)));
    });

    let mut video = EncodedVideo::open(SAMPLE_VIDEO).unwrap();
    let duration = video.duration();
    let mut group = criterion.benchmark_group("full clip");
    group.sample_size(10);
    group.bench_function("get_clip(0, duration)", |bencher| {
        bencher.iter(|| video.get_clip(0.0, duration));
    });
    group.finish();
}

fn benchmark_cached_clip(criterion: &mut Criterion) {
    if !Path::new(SAMPLE_RAW_H264).exists() {
        return;
    }

    let mut group = criterion.benchmark_group("headerless");
    group.sample_size(10);
    group.bench_function("open raw h264 (full decode)", |bencher| {
        bencher.iter(|| EncodedVideo::open(SAMPLE_RAW_H264).unwrap());
    });
    group.finish();

    let mut video = EncodedVideo::open(SAMPLE_RAW_H264).unwrap();
    criterion.bench_function("get_clip(0.5s, 1.5s) from cache", |bencher| {
        bencher.iter(|| video.get_clip(black_box(0.5), black_box(1.5)));
    });
}

criterion::criterion_group!(
    benches,
    benchmark_time_conversion,
    benchmark_frame_stacking,
    benchmark_selective_clip,
    benchmark_cached_clip,
);

criterion::criterion_main!(benches);
