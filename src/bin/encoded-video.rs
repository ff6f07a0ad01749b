use std::{
    fs,
    path::{Path, PathBuf},
};

use clap::{CommandFactory, Parser, Subcommand};
use clap_complete::Shell;
use colored::Colorize;
use encoded_video::{ClipOptions, EncodedVideo, FfmpegLogLevel, VideoWriter, WriterOptions};
use indicatif::{ProgressBar, ProgressStyle};
use serde_json::json;

const CLI_AFTER_HELP: &str = "Examples:\n  encoded-video info input.mp4 --json\n  encoded-video clip input.mp4 --start 0:02 --end 0:04 --out excerpt.mp4\n  encoded-video frames input.mp4 --start 2 --end 3 --out frames --ext jpg\n  encoded-video completions zsh > _encoded-video";

#[derive(Debug, Parser)]
#[command(
    name = "encoded-video",
    version,
    about = "Extract time-bounded clips from encoded video files",
    after_help = CLI_AFTER_HELP
)]
struct Cli {
    #[command(flatten)]
    global: GlobalOptions,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Parser, Clone, Default)]
struct GlobalOptions {
    /// Show additional logging output.
    #[arg(long, global = true)]
    verbose: bool,

    /// Allow overwriting existing output files.
    #[arg(long, global = true)]
    overwrite: bool,

    /// Ignore the audio stream.
    #[arg(long, global = true)]
    no_audio: bool,

    /// FFmpeg log level (quiet, panic, fatal, error, warning, info, verbose, debug, trace).
    #[arg(long, global = true)]
    log_level: Option<FfmpegLogLevel>,
}

#[derive(Debug, Subcommand)]
enum Commands {
    /// Print stream headers and duration.
    #[command(
        about = "Print video information",
        visible_alias = "probe",
        after_help = "Examples:\n  encoded-video info input.mp4\n  encoded-video info input.mp4 --json"
    )]
    Info {
        /// Input video path.
        input: PathBuf,

        /// Output as machine-readable JSON.
        #[arg(long)]
        json: bool,
    },

    /// Cut a clip and encode it to a new file.
    #[command(
        about = "Write a clip to a video file",
        after_help = "Examples:\n  encoded-video clip input.mp4 --start 10 --end 12.5 --out clip.mp4\n  encoded-video clip input.mp4 --start 0:01:00 --out tail.mkv --codec libx264 --option crf=20"
    )]
    Clip {
        /// Input video path.
        input: PathBuf,
        /// Clip start (seconds, MM:SS or HH:MM:SS).
        #[arg(long, default_value = "0")]
        start: String,
        /// Clip end. Defaults to the end of the video.
        #[arg(long)]
        end: Option<String>,
        /// Output file; the extension picks the container.
        #[arg(long)]
        out: PathBuf,
        /// Output frame rate. Defaults to the source frame rate.
        #[arg(long)]
        fps: Option<f64>,
        /// Video encoder name.
        #[arg(long, default_value = "libx264")]
        codec: String,
        /// Video encoder option as KEY=VALUE (repeatable).
        #[arg(long = "option")]
        options: Vec<String>,
    },

    /// Save the frames of a clip as images.
    #[command(
        about = "Export clip frames as images",
        after_help = "Examples:\n  encoded-video frames input.mp4 --start 2 --end 3 --out frames\n  encoded-video frames input.mp4 --start 0:30 --end 0:31 --out frames --ext jpg"
    )]
    Frames {
        /// Input video path.
        input: PathBuf,
        /// Clip start (seconds, MM:SS or HH:MM:SS).
        #[arg(long, default_value = "0")]
        start: String,
        /// Clip end. Defaults to the end of the video.
        #[arg(long)]
        end: Option<String>,
        /// Output directory.
        #[arg(long)]
        out: PathBuf,
        /// Image extension (png, jpg, jpeg, bmp, tiff).
        #[arg(long, default_value = "png")]
        ext: String,
    },

    /// Generate shell completion scripts.
    #[command(about = "Generate shell completions")]
    Completions {
        #[arg(value_enum)]
        shell: Shell,
    },
}

/// Parse seconds, `MM:SS(.fff)` or `HH:MM:SS(.fff)` into seconds.
fn parse_timecode(value: &str) -> Result<f64, Box<dyn std::error::Error>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err("time value cannot be empty".into());
    }

    if let Ok(seconds) = trimmed.parse::<f64>() {
        if !seconds.is_finite() {
            return Err(format!("invalid time: {trimmed}").into());
        }
        return Ok(seconds.max(0.0));
    }

    let parts: Vec<&str> = trimmed.split(':').collect();
    let (hours, minutes, seconds) = match parts.as_slice() {
        [minutes, seconds] => (0_u64, minutes.parse::<u64>()?, seconds.parse::<f64>()?),
        [hours, minutes, seconds] => (
            hours.parse::<u64>()?,
            minutes.parse::<u64>()?,
            seconds.parse::<f64>()?,
        ),
        _ => return Err(format!("invalid time format: {trimmed}").into()),
    };

    Ok((hours as f64 * 3600.0 + minutes as f64 * 60.0 + seconds).max(0.0))
}

fn parse_range(
    start: &str,
    end: Option<&str>,
) -> Result<(f64, f64), Box<dyn std::error::Error>> {
    let start = parse_timecode(start)?;
    let end = match end {
        Some(end) => parse_timecode(end)?,
        None => f64::INFINITY,
    };
    if start > end {
        return Err("--start must be <= --end".into());
    }
    Ok((start, end))
}

fn parse_option(value: &str) -> Result<(String, String), Box<dyn std::error::Error>> {
    match value.split_once('=') {
        Some((key, option)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), option.trim().to_string()))
        }
        _ => Err(format!("invalid --option (expected KEY=VALUE): {value}").into()),
    }
}

fn ensure_writable_path(path: &Path, overwrite: bool) -> Result<(), Box<dyn std::error::Error>> {
    if path.exists() {
        if overwrite {
            eprintln!(
                "{} {}",
                "warning:".yellow().bold(),
                format!("overwriting {}", path.display()).yellow()
            );
        } else {
            return Err(format!(
                "output already exists: {} (use --overwrite to replace)",
                path.display()
            )
            .into());
        }
    }
    Ok(())
}

fn apply_global_options(global: &GlobalOptions) {
    if global.verbose {
        env_logger::Builder::new()
            .filter_level(log::LevelFilter::Debug)
            .parse_default_env()
            .init();
    }
}

fn open_input(
    input: &Path,
    global: &GlobalOptions,
) -> Result<EncodedVideo, Box<dyn std::error::Error>> {
    let options = ClipOptions::new().with_decode_audio(!global.no_audio);
    let video = EncodedVideo::open_with_options(input, options)?;
    // Opening resets FFmpeg's console level the first time round.
    if let Some(level) = global.log_level {
        encoded_video::set_ffmpeg_log_level(level);
    }
    Ok(video)
}

fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    apply_global_options(&cli.global);

    match cli.command {
        Commands::Info { input, json } => {
            let video = open_input(&input, &cli.global)?;
            let header = video.video_header();

            if json {
                let payload = json!({
                    "name": video.name(),
                    "duration_seconds": video.duration(),
                    "selective_decoding": video.is_selective(),
                    "video": {
                        "width": header.width,
                        "height": header.height,
                        "fps": header.frames_per_second,
                        "codec": header.stream.codec,
                        "time_base": header.stream.time_base.to_string(),
                        "start_pts": header.stream.start_pts,
                        "duration_ticks": header.stream.duration,
                    },
                    "audio": video.audio_header().map(|audio| json!({
                        "sample_rate": audio.sample_rate,
                        "channels": audio.channels,
                        "codec": audio.stream.codec,
                        "time_base": audio.stream.time_base.to_string(),
                        "start_pts": audio.stream.start_pts,
                        "duration_ticks": audio.stream.duration,
                    })),
                });
                println!("{}", serde_json::to_string_pretty(&payload)?);
            } else {
                println!("{} {}", "Name:".bold(), video.name().unwrap_or("-"));
                println!("{} {:.3}s", "Duration:".bold(), video.duration());
                println!(
                    "{} {}",
                    "Decoding:".bold(),
                    if video.is_selective() { "selective" } else { "cached" }
                );
                println!(
                    "{} {}x{} @ {:.3} fps ({})",
                    "Video:".bold(),
                    header.width,
                    header.height,
                    header.frames_per_second,
                    header.stream.codec,
                );
                match video.audio_header() {
                    Some(audio) => println!(
                        "{} {} Hz, {} ch ({})",
                        "Audio:".bold(),
                        audio.sample_rate,
                        audio.channels,
                        audio.stream.codec,
                    ),
                    None => println!("{} none", "Audio:".bold()),
                }
            }
        }
        Commands::Clip {
            input,
            start,
            end,
            out,
            fps,
            codec,
            options,
        } => {
            let (start, end) = parse_range(&start, end.as_deref())?;
            ensure_writable_path(&out, cli.global.overwrite)?;

            let mut video = open_input(&input, &cli.global)?;
            let clip = video.get_clip(start, end);
            let Some(frames) = &clip.video else {
                return Err(format!(
                    "no video between {start}s and {end}s (duration {:.3}s)",
                    video.duration()
                )
                .into());
            };

            let mut writer_options =
                WriterOptions::new(fps.unwrap_or(video.frames_per_second())).with_video_codec(codec);
            for option in &options {
                let (key, value) = parse_option(option)?;
                writer_options = writer_options.with_video_option(key, value);
            }

            VideoWriter::new(writer_options).write(&out, frames, clip.audio.as_ref())?;

            if cli.global.verbose {
                eprintln!(
                    "{} {} frames{} -> {}",
                    "wrote".green().bold(),
                    frames.len(),
                    clip.audio
                        .as_ref()
                        .map(|audio| format!(" + {:.2}s audio", audio.duration_seconds()))
                        .unwrap_or_default(),
                    out.display()
                );
            }
        }
        Commands::Frames {
            input,
            start,
            end,
            out,
            ext,
        } => {
            let (start, end) = parse_range(&start, end.as_deref())?;
            fs::create_dir_all(&out)?;

            let mut video = open_input(&input, &cli.global)?;
            let clip = video.get_clip(start, end);
            let Some(frames) = &clip.video else {
                return Err(format!("no video between {start}s and {end}s").into());
            };

            let ext_clean = ext.trim_start_matches('.').to_ascii_lowercase();
            let progress_bar = ProgressBar::new(frames.len() as u64);
            progress_bar.set_style(
                ProgressStyle::with_template("{spinner:.green} {bar:40.cyan/blue} {pos}/{len} {msg}")?
                    .progress_chars("##-"),
            );

            for (index, seconds) in frames.timestamps().iter().enumerate() {
                let output_path = out.join(format!("frame_{index:06}.{ext_clean}"));
                ensure_writable_path(&output_path, cli.global.overwrite)?;

                let image = frames
                    .frame_image(index)
                    .ok_or_else(|| format!("frame {index} is out of range"))?;
                image.save(&output_path)?;

                progress_bar.set_message(format!("{seconds:.3}s"));
                progress_bar.inc(1);
            }
            progress_bar.finish_with_message("done");

            println!(
                "{} {} frames to {}",
                "exported".green().bold(),
                frames.len(),
                out.display()
            );
        }
        Commands::Completions { shell } => {
            let mut command = Cli::command();
            clap_complete::generate(shell, &mut command, "encoded-video", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn main() {
    if let Err(error) = run() {
        eprintln!("{} {error}", "error:".red().bold());
        std::process::exit(1);
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_option, parse_range, parse_timecode};

    #[test]
    fn parse_timecode_formats() {
        assert_eq!(parse_timecode("75").unwrap(), 75.0);
        assert_eq!(parse_timecode("01:15").unwrap(), 75.0);
        assert_eq!(parse_timecode("00:01:15.5").unwrap(), 75.5);
        assert_eq!(parse_timecode("-3").unwrap(), 0.0);
        assert!(parse_timecode("").is_err());
        assert!(parse_timecode("1:2:3:4").is_err());
        assert!(parse_timecode("inf").is_err());
    }

    #[test]
    fn open_ended_range_runs_to_infinity() {
        let (start, end) = parse_range("2", None).unwrap();
        assert_eq!(start, 2.0);
        assert!(end.is_infinite());
        assert!(parse_range("5", Some("4")).is_err());
    }

    #[test]
    fn encoder_options_split_on_equals() {
        assert_eq!(
            parse_option("crf=18").unwrap(),
            ("crf".to_string(), "18".to_string())
        );
        assert!(parse_option("=18").is_err());
        assert!(parse_option("preset").is_err());
    }
}
