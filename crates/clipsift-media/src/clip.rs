//! Clip rendering.
//!
//! One selected span becomes one encoded file. The first attempt maps the
//! first video and audio streams explicitly; if FFmpeg rejects that (e.g. a
//! source without an audio track) the clip is retried once with FFmpeg's
//! default stream selection.

use std::path::Path;
use tracing::{info, warn};

use clipsift_models::EncodingConfig;

use crate::command::{FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};

/// Time range and filter chain for one clip.
#[derive(Debug, Clone, PartialEq)]
pub struct ClipSpec {
    /// Start offset in the source, seconds
    pub start: f64,
    /// Clip length, seconds
    pub duration: f64,
    /// `-vf` chain, if any
    pub filter: Option<String>,
}

impl ClipSpec {
    pub fn new(start: f64, duration: f64) -> Self {
        Self {
            start,
            duration,
            filter: None,
        }
    }

    pub fn with_filter(mut self, filter: impl Into<String>) -> Self {
        self.filter = Some(filter.into());
        self
    }
}

/// How streams were selected for a rendered clip.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StreamMapping {
    /// `-map 0:v:0 -map 0:a:0`
    Explicit,
    /// FFmpeg's default selection
    Automatic,
}

/// Build the encode command for one attempt.
pub fn build_clip_command(
    input: &Path,
    output: &Path,
    spec: &ClipSpec,
    encoding: &EncodingConfig,
    mapping: StreamMapping,
) -> FfmpegCommand {
    let mut cmd = FfmpegCommand::new(input, output)
        .seek(spec.start.max(0.0))
        .duration(spec.duration);

    if mapping == StreamMapping::Explicit {
        cmd = cmd.map("0:v:0").map("0:a:0");
    }

    if let Some(filter) = &spec.filter {
        cmd = cmd.video_filter(filter.clone());
    }

    cmd.output_args(encoding.to_ffmpeg_args())
}

/// Render one clip, retrying once without explicit stream mapping.
pub async fn render_clip(
    input: impl AsRef<Path>,
    output: impl AsRef<Path>,
    spec: &ClipSpec,
    encoding: &EncodingConfig,
    runner: &FfmpegRunner,
) -> MediaResult<StreamMapping> {
    let input = input.as_ref();
    let output = output.as_ref();

    if !input.exists() {
        return Err(MediaError::FileNotFound(input.to_path_buf()));
    }

    info!(
        "Rendering clip: {} -> {} (start: {:.2}s, duration: {:.2}s)",
        input.display(),
        output.display(),
        spec.start,
        spec.duration
    );

    let explicit = build_clip_command(input, output, spec, encoding, StreamMapping::Explicit);
    match runner.run(&explicit).await {
        Ok(()) => return Ok(StreamMapping::Explicit),
        Err(e @ (MediaError::Cancelled | MediaError::Timeout(_) | MediaError::FfmpegNotFound)) => {
            return Err(e)
        }
        Err(e) => {
            warn!(
                output = %output.display(),
                error = %e,
                stderr = e.stderr_tail().unwrap_or(""),
                "Encode with explicit stream mapping failed, retrying without mapping"
            );
        }
    }

    let automatic = build_clip_command(input, output, spec, encoding, StreamMapping::Automatic);
    runner.run(&automatic).await?;
    Ok(StreamMapping::Automatic)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_mapping_args() {
        let spec = ClipSpec::new(12.5, 30.0).with_filter("scale=1080:608");
        let cmd = build_clip_command(
            Path::new("in.mp4"),
            Path::new("clip_01.mp4"),
            &spec,
            &EncodingConfig::default(),
            StreamMapping::Explicit,
        );
        let joined = cmd.build_args().join(" ");
        assert!(joined.contains("-ss 12.500 -t 30.000 -i in.mp4"));
        assert!(joined.contains("-map 0:v:0 -map 0:a:0"));
        assert!(joined.contains("-vf scale=1080:608"));
        assert!(joined.contains("-crf 18"));
        assert!(joined.ends_with("clip_01.mp4"));
    }

    #[test]
    fn test_automatic_mapping_has_no_map() {
        let cmd = build_clip_command(
            Path::new("in.mp4"),
            Path::new("out.mp4"),
            &ClipSpec::new(0.0, 5.0),
            &EncodingConfig::default(),
            StreamMapping::Automatic,
        );
        let args = cmd.build_args();
        assert!(!args.contains(&"-map".to_string()));
        assert!(!args.contains(&"-vf".to_string()));
    }

    #[tokio::test]
    async fn test_missing_input_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = render_clip(
            dir.path().join("missing.mp4"),
            dir.path().join("out.mp4"),
            &ClipSpec::new(0.0, 5.0),
            &EncodingConfig::default(),
            &FfmpegRunner::new(),
        )
        .await;
        assert!(matches!(result, Err(MediaError::FileNotFound(_))));
    }
}
