//! FFmpeg CLI wrapper and reframe geometry for clip rendering.
//!
//! This crate provides:
//! - The pure reframe geometry calculator (crop and fit policies)
//! - FFmpeg filter strings derived from that geometry
//! - Type-safe FFmpeg command building with timeout and cancellation
//! - Clip rendering with a stream-mapping fallback
//! - FFprobe frame size probing
//! - SRT subtitle sidecars
//! - Thin yt-dlp wrappers for source video and captions

pub mod clip;
pub mod command;
pub mod download;
pub mod error;
pub mod filters;
pub mod probe;
pub mod reframe;
pub mod subtitles;

pub use clip::{render_clip, ClipSpec, StreamMapping};
pub use command::{check_ffmpeg, check_ffprobe, check_ytdlp, FfmpegCommand, FfmpegRunner};
pub use download::{download_captions, download_video};
pub use error::{MediaError, MediaResult};
pub use filters::{
    reframe_filter, subtitles_filter, with_burned_subtitles, ORIGINAL_ASPECT_FILTER, SUBTITLE_STYLE,
};
pub use probe::{probe_frame_size, probe_video, VideoInfo};
pub use reframe::{compute_geometry, compute_reframe, make_even};
pub use subtitles::{cues_for_window, to_srt, write_srt, SubtitleCue};
