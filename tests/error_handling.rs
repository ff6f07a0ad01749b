//! Error message and conversion tests.

use encoded_video::{ClipError, StreamKind};

#[test]
fn open_error_names_the_source() {
    let error = ClipError::Open {
        source_name: "clip.mp4".to_string(),
        reason: "Invalid data found when processing input".to_string(),
    };
    let message = error.to_string();
    assert!(message.contains("clip.mp4"));
    assert!(message.contains("Invalid data"));
}

#[test]
fn construction_errors_display() {
    assert_eq!(ClipError::NoVideoStream.to_string(), "Video stream not found");
    assert!(ClipError::NoDecodableFrames.to_string().contains("no frames"));
    assert_eq!(
        ClipError::MissingStream(StreamKind::Audio).to_string(),
        "No audio stream in container"
    );
}

#[test]
fn seek_error_reports_stream_and_target() {
    let error = ClipError::SeekError {
        kind: StreamKind::Video,
        pts: 3976,
        reason: "Operation not permitted".to_string(),
    };
    let message = error.to_string();
    assert!(message.contains("video"));
    assert!(message.contains("3976"));
}

#[test]
fn io_errors_convert() {
    let io = std::io::Error::new(std::io::ErrorKind::NotFound, "gone");
    let error: ClipError = io.into();
    assert!(matches!(error, ClipError::IoError(_)));
    assert!(error.to_string().contains("gone"));
}

#[test]
fn ffmpeg_errors_convert() {
    let error: ClipError = ffmpeg_next::Error::Eof.into();
    assert!(matches!(error, ClipError::FfmpegError(_)));
}

#[test]
fn errors_are_std_errors() {
    fn assert_error<E: std::error::Error + Send + Sync + 'static>() {}
    assert_error::<ClipError>();
}
