//! Option builder tests.

use encoded_video::{ClipOptions, SEEK_MARGIN, WriterOptions};

#[test]
fn clip_options_defaults() {
    let options = ClipOptions::default();
    assert!(options.decode_audio);
    assert_eq!(options.video_name, None);
    assert_eq!(options.seek_margin, SEEK_MARGIN);
    assert_eq!(SEEK_MARGIN, 1024);
}

#[test]
fn clip_options_builder_chain() {
    let options = ClipOptions::new()
        .with_decode_audio(false)
        .with_video_name("talk")
        .with_seek_margin(-5);

    assert!(!options.decode_audio);
    assert_eq!(options.video_name.as_deref(), Some("talk"));
    assert_eq!(options.seek_margin, 0);
}

#[test]
fn writer_options_defaults() {
    let options = WriterOptions::default();
    assert_eq!(options.fps, 30.0);
    assert_eq!(options.video_codec, "libx264");
    assert_eq!(options.audio_codec, "aac");
    assert!(options.video_options.is_empty());
    assert_eq!(options.audio_sample_rate, None);
}

#[test]
fn writer_options_builder_chain() {
    let options = WriterOptions::new(24.0)
        .with_fps(29.97)
        .with_video_codec("libx264rgb")
        .with_video_option("crf", "0")
        .with_video_option("preset", "ultrafast")
        .with_audio_codec("libopus")
        .with_audio_option("b", "96k")
        .with_audio_sample_rate(48_000);

    assert_eq!(options.fps, 29.97);
    assert_eq!(options.video_codec, "libx264rgb");
    assert_eq!(
        options.video_options,
        vec![
            ("crf".to_string(), "0".to_string()),
            ("preset".to_string(), "ultrafast".to_string()),
        ]
    );
    assert_eq!(options.audio_codec, "libopus");
    assert_eq!(options.audio_options.len(), 1);
    assert_eq!(options.audio_sample_rate, Some(48_000));
}
