//! SRT subtitle sidecars for rendered clips.

use std::path::Path;

use clipsift_models::timestamp::format_srt_time;
use clipsift_models::Transcript;

use crate::error::MediaResult;

/// One subtitle cue, timed relative to the clip start.
#[derive(Debug, Clone, PartialEq)]
pub struct SubtitleCue {
    pub start: f64,
    pub end: f64,
    pub text: String,
}

/// Cues for the segments overlapping `[clip_start, clip_end)`.
///
/// Cue times are clipped to the window and shifted so the clip starts at 0.
pub fn cues_for_window(transcript: &Transcript, clip_start: f64, clip_end: f64) -> Vec<SubtitleCue> {
    transcript
        .overlapping(clip_start, clip_end)
        .map(|s| SubtitleCue {
            start: (s.start - clip_start).max(0.0),
            end: s.end().min(clip_end) - clip_start,
            text: s.text.trim().to_string(),
        })
        .filter(|c| c.end > c.start && !c.text.is_empty())
        .collect()
}

/// Render cues as SRT text.
pub fn to_srt(cues: &[SubtitleCue]) -> String {
    let mut out = String::new();
    for (i, cue) in cues.iter().enumerate() {
        out.push_str(&format!(
            "{}\n{} --> {}\n{}\n\n",
            i + 1,
            format_srt_time(cue.start),
            format_srt_time(cue.end),
            cue.text
        ));
    }
    out
}

/// Write cues to an `.srt` file.
pub async fn write_srt(path: impl AsRef<Path>, cues: &[SubtitleCue]) -> MediaResult<()> {
    tokio::fs::write(path, to_srt(cues)).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use clipsift_models::TranscriptSegment;

    fn segments() -> Transcript {
        Transcript::new(vec![
            TranscriptSegment::new("Hello there.", 0.0, 2.0),
            TranscriptSegment::new("This is amazing.", 2.0, 3.0),
            TranscriptSegment::new("The end.", 5.0, 1.5),
        ])
        .unwrap()
    }

    #[test]
    fn test_cues_are_retimed() {
        let cues = cues_for_window(&segments(), 1.0, 6.0);
        assert_eq!(cues.len(), 3);
        assert_eq!(cues[0].start, 0.0);
        assert_eq!(cues[0].end, 1.0);
        assert_eq!(cues[1].start, 1.0);
        assert_eq!(cues[2].end, 5.0);
    }

    #[test]
    fn test_srt_format() {
        let srt = to_srt(&cues_for_window(&segments(), 2.0, 5.0));
        assert_eq!(srt, "1\n00:00:00,000 --> 00:00:03,000\nThis is amazing.\n\n");
    }

    #[test]
    fn test_write_srt() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("clip_01.srt");
        let cues = cues_for_window(&segments(), 0.0, 6.5);

        tokio_test::block_on(write_srt(&path, &cues)).unwrap();

        let written = std::fs::read_to_string(&path).unwrap();
        assert!(written.starts_with("1\n00:00:00,000 --> 00:00:02,000\nHello there."));
        assert!(written.contains("3\n00:00:05,000 --> 00:00:06,500\nThe end."));
    }
}
