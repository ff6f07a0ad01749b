//! FFmpeg initialisation and console log level.
//!
//! FFmpeg writes its own diagnostics straight to stderr, independently of
//! the [`log`](https://crates.io/crates/log) facade used by this crate. The
//! first container opened lowers that output to [`FfmpegLogLevel::Error`];
//! call [`set_ffmpeg_log_level`] afterwards to change it.
//!
//! ```no_run
//! use encoded_video::{EncodedVideo, FfmpegLogLevel};
//!
//! let video = EncodedVideo::open("input.mp4")?;
//! encoded_video::set_ffmpeg_log_level(FfmpegLogLevel::Quiet);
//! # Ok::<(), encoded_video::ClipError>(())
//! ```

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use std::sync::Once;

use ffmpeg_next::util::log::Level;

/// FFmpeg console verbosity, from silent to most verbose.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FfmpegLogLevel {
    /// No output at all.
    Quiet,
    /// Only conditions that abort the process.
    Panic,
    /// Unrecoverable errors.
    Fatal,
    /// Recoverable errors.
    Error,
    /// Warnings (FFmpeg's own default).
    Warning,
    /// Informational messages.
    Info,
    /// Verbose informational messages.
    Verbose,
    /// Debugging messages.
    Debug,
    /// Everything.
    Trace,
}

impl FfmpegLogLevel {
    const ALL: [(FfmpegLogLevel, &'static str); 9] = [
        (FfmpegLogLevel::Quiet, "quiet"),
        (FfmpegLogLevel::Panic, "panic"),
        (FfmpegLogLevel::Fatal, "fatal"),
        (FfmpegLogLevel::Error, "error"),
        (FfmpegLogLevel::Warning, "warning"),
        (FfmpegLogLevel::Info, "info"),
        (FfmpegLogLevel::Verbose, "verbose"),
        (FfmpegLogLevel::Debug, "debug"),
        (FfmpegLogLevel::Trace, "trace"),
    ];

    fn to_ffmpeg_level(self) -> Level {
        match self {
            FfmpegLogLevel::Quiet => Level::Quiet,
            FfmpegLogLevel::Panic => Level::Panic,
            FfmpegLogLevel::Fatal => Level::Fatal,
            FfmpegLogLevel::Error => Level::Error,
            FfmpegLogLevel::Warning => Level::Warning,
            FfmpegLogLevel::Info => Level::Info,
            FfmpegLogLevel::Verbose => Level::Verbose,
            FfmpegLogLevel::Debug => Level::Debug,
            FfmpegLogLevel::Trace => Level::Trace,
        }
    }

    fn from_ffmpeg_level(level: Level) -> Self {
        match level {
            Level::Quiet => FfmpegLogLevel::Quiet,
            Level::Panic => FfmpegLogLevel::Panic,
            Level::Fatal => FfmpegLogLevel::Fatal,
            Level::Error => FfmpegLogLevel::Error,
            Level::Warning => FfmpegLogLevel::Warning,
            Level::Info => FfmpegLogLevel::Info,
            Level::Verbose => FfmpegLogLevel::Verbose,
            Level::Debug => FfmpegLogLevel::Debug,
            Level::Trace => FfmpegLogLevel::Trace,
        }
    }

    /// Lower-case name, as accepted by [`FromStr`].
    pub fn name(self) -> &'static str {
        Self::ALL
            .iter()
            .find(|(level, _)| *level == self)
            .map_or("error", |(_, name)| *name)
    }
}

impl Display for FfmpegLogLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.name())
    }
}

impl FromStr for FfmpegLogLevel {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().to_ascii_lowercase();
        Self::ALL
            .iter()
            .find(|(_, name)| *name == wanted)
            .map(|(level, _)| *level)
            .ok_or_else(|| {
                let names: Vec<&str> = Self::ALL.iter().map(|(_, name)| *name).collect();
                format!("unknown FFmpeg log level '{value}' (expected one of: {})", names.join(", "))
            })
    }
}

/// Set FFmpeg's console verbosity. Does not affect the `log` facade.
pub fn set_ffmpeg_log_level(level: FfmpegLogLevel) {
    ffmpeg_next::util::log::set_level(level.to_ffmpeg_level());
}

/// Current FFmpeg console verbosity, if it maps to a known level.
pub fn get_ffmpeg_log_level() -> Option<FfmpegLogLevel> {
    ffmpeg_next::util::log::get_level()
        .ok()
        .map(FfmpegLogLevel::from_ffmpeg_level)
}

static QUIET_CONSOLE: Once = Once::new();

/// Initialise FFmpeg. The first call also lowers FFmpeg's console output
/// to errors only.
pub(crate) fn initialize() -> Result<(), ffmpeg_next::Error> {
    ffmpeg_next::init()?;
    QUIET_CONSOLE.call_once(|| set_ffmpeg_log_level(FfmpegLogLevel::Error));
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn level_names_parse_back() {
        for (level, name) in FfmpegLogLevel::ALL {
            assert_eq!(level.to_string(), name);
            assert_eq!(name.parse::<FfmpegLogLevel>(), Ok(level));
        }
        assert_eq!(" Warning ".parse::<FfmpegLogLevel>(), Ok(FfmpegLogLevel::Warning));
        assert!("loud".parse::<FfmpegLogLevel>().is_err());
    }
}
