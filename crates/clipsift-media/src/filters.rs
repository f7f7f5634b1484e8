//! FFmpeg video filter definitions.

use std::path::Path;

use clipsift_models::{ReframeGeometry, ReframePolicy};

/// Background color for fit-policy padding.
pub const PAD_COLOR: &str = "black";

/// Original-aspect rendering: 1080 px tall, width follows the source.
pub const ORIGINAL_ASPECT_FILTER: &str = "scale=-2:1080:flags=lanczos";

/// Build the `-vf` chain for a reframe geometry.
pub fn reframe_filter(geometry: &ReframeGeometry) -> String {
    let scale = format!(
        "scale={}:{}:flags=lanczos",
        geometry.scale_width, geometry.scale_height
    );

    match geometry.policy {
        ReframePolicy::Crop => format!(
            "{},crop={}:{}:{}:{},setsar=1",
            scale,
            geometry.target_width,
            geometry.target_height,
            geometry.crop_x,
            geometry.crop_y
        ),
        ReframePolicy::Fit => format!(
            "{},pad={}:{}:{}:{}:color={},setsar=1",
            scale,
            geometry.target_width,
            geometry.target_height,
            geometry.pad_x,
            geometry.pad_y,
            PAD_COLOR
        ),
    }
}

/// ASS style for burned-in captions: bold white text with a black outline,
/// bottom-centered above the lower edge.
pub const SUBTITLE_STYLE: &str =
    "FontSize=16,PrimaryColour=&Hffffff,OutlineColour=&H000000,Outline=1,Bold=1,Alignment=2,MarginV=60";

/// Escape a path for use as a filter option value.
fn escape_filter_path(path: &Path) -> String {
    let mut out = String::new();
    for c in path.to_string_lossy().replace('\\', "/").chars() {
        if matches!(c, ':' | '\'' | ',' | '[' | ']' | ';') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// `subtitles=` filter burning `srt` into the frame.
pub fn subtitles_filter(srt: &Path) -> String {
    format!(
        "subtitles={}:force_style='{}'",
        escape_filter_path(srt),
        SUBTITLE_STYLE
    )
}

/// Append subtitle burn-in to an existing `-vf` chain.
pub fn with_burned_subtitles(filter: &str, srt: &Path) -> String {
    format!("{},{}", filter, subtitles_filter(srt))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reframe::compute_geometry;
    use clipsift_models::FrameSize;

    #[test]
    fn test_fit_filter() {
        let g = compute_geometry(
            FrameSize::new(3840, 2160),
            FrameSize::new(1080, 1920),
            ReframePolicy::Fit,
        );
        assert_eq!(
            reframe_filter(&g),
            "scale=1080:608:flags=lanczos,pad=1080:1920:0:656:color=black,setsar=1"
        );
    }

    #[test]
    fn test_burned_subtitles_follow_reframe() {
        let g = compute_geometry(
            FrameSize::new(3840, 2160),
            FrameSize::new(1080, 1920),
            ReframePolicy::Fit,
        );
        let filter = with_burned_subtitles(&reframe_filter(&g), Path::new("/out/clip_01.srt"));
        assert!(filter.starts_with("scale=1080:608:flags=lanczos,pad=1080:1920:0:656"));
        assert!(filter.ends_with(&format!(
            ",subtitles=/out/clip_01.srt:force_style='{}'",
            SUBTITLE_STYLE
        )));
    }

    #[test]
    fn test_subtitle_path_is_escaped() {
        let filter = subtitles_filter(Path::new("/tmp/it's here:now/clip_01.srt"));
        assert!(filter.starts_with(r"subtitles=/tmp/it\'s here\:now/clip_01.srt:"));
    }

    #[test]
    fn test_crop_filter() {
        let g = compute_geometry(
            FrameSize::new(1920, 1080),
            FrameSize::new(1080, 1920),
            ReframePolicy::Crop,
        );
        let filter = reframe_filter(&g);
        assert!(filter.starts_with("scale=3414:1920"));
        assert!(filter.contains("crop=1080:1920:1167:0"));
    }
}
