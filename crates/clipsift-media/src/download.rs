//! Source video and caption download using yt-dlp.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::command::check_ytdlp;
use crate::error::{MediaError, MediaResult};

/// yt-dlp format selector: MP4 up to 1440p, then any MP4, then anything.
pub const SOURCE_FORMAT: &str = "best[height<=1440][ext=mp4]/best[ext=mp4]/best";

async fn run_ytdlp(args: &[&str]) -> MediaResult<()> {
    check_ytdlp()?;
    debug!("Running yt-dlp {}", args.join(" "));

    let output = Command::new("yt-dlp")
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .output()
        .await?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        debug!("yt-dlp stderr: {}", stderr);
        let error_msg = stderr
            .lines()
            .rev()
            .find(|l| !l.trim().is_empty())
            .unwrap_or("Unknown error");
        return Err(MediaError::download_failed(format!(
            "yt-dlp failed: {}",
            error_msg
        )));
    }

    Ok(())
}

/// Download a source video.
///
/// An existing non-empty file at `output_path` is reused.
pub async fn download_video(url: &str, output_path: impl AsRef<Path>) -> MediaResult<()> {
    let output_path = output_path.as_ref();

    if let Ok(metadata) = tokio::fs::metadata(output_path).await {
        if metadata.len() > 0 {
            info!("Using existing video file: {}", output_path.display());
            return Ok(());
        }
    }

    info!("Downloading video from {} to {}", url, output_path.display());

    let output_str = output_path.to_string_lossy();
    run_ytdlp(&[
        "--no-playlist",
        "-f",
        SOURCE_FORMAT,
        "--merge-output-format",
        "mp4",
        "-o",
        &output_str,
        url,
    ])
    .await?;

    if !output_path.exists() {
        return Err(MediaError::download_failed("Output file not created"));
    }

    let size = tokio::fs::metadata(output_path).await?.len();
    info!(
        output = %output_path.display(),
        size_mb = size as f64 / (1024.0 * 1024.0),
        "Downloaded video successfully"
    );
    Ok(())
}

/// Download WebVTT captions into `workdir`.
///
/// `languages` is tried in order; manual subtitles are preferred over
/// automatic captions by yt-dlp itself. Returns `None` when the source has
/// no captions in any of the requested languages.
pub async fn download_captions(
    url: &str,
    languages: &[String],
    workdir: impl AsRef<Path>,
) -> MediaResult<Option<PathBuf>> {
    let workdir = workdir.as_ref();
    tokio::fs::create_dir_all(workdir).await?;

    let template = workdir.join("captions.%(ext)s");
    let template_str = template.to_string_lossy();
    let langs = languages.join(",");

    run_ytdlp(&[
        "--no-playlist",
        "--skip-download",
        "--write-sub",
        "--write-auto-sub",
        "--sub-format",
        "vtt",
        "--sub-lang",
        &langs,
        "-o",
        &template_str,
        url,
    ])
    .await?;

    let mut vtt_files = Vec::new();
    let mut entries = tokio::fs::read_dir(workdir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().and_then(|s| s.to_str()) == Some("vtt") {
            vtt_files.push(path);
        }
    }

    Ok(pick_caption_file(vtt_files, languages))
}

/// Choose the caption file whose language appears earliest in `languages`.
fn pick_caption_file(mut files: Vec<PathBuf>, languages: &[String]) -> Option<PathBuf> {
    if files.is_empty() {
        warn!("No caption file downloaded");
        return None;
    }

    files.sort_by_key(|path| {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_default();
        languages
            .iter()
            .position(|lang| name.contains(&format!(".{}.", lang)))
            .unwrap_or(languages.len())
    });

    files.into_iter().next()
}
