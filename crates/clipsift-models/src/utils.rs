//! Source identifier helpers.

/// Length of a YouTube video ID.
pub const YOUTUBE_ID_LEN: usize = 11;

fn is_id_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '-' || c == '_'
}

fn take_id(candidate: &str) -> Option<String> {
    let id: String = candidate.chars().take_while(|c| is_id_char(*c)).collect();
    (id.len() == YOUTUBE_ID_LEN).then_some(id)
}

/// Extract the 11-character video ID from a YouTube URL or a bare ID.
///
/// Supports `watch?v=`, `youtu.be/`, `/embed/`, `/v/` and `/shorts/` forms,
/// with or without query parameters. Returns `None` for anything else.
pub fn extract_youtube_id(source: &str) -> Option<String> {
    let source = source.trim();

    if source.len() == YOUTUBE_ID_LEN && source.chars().all(is_id_char) {
        return Some(source.to_string());
    }

    let lower = source.to_ascii_lowercase();
    if !(lower.contains("youtube.com") || lower.contains("youtu.be")) {
        return None;
    }

    for marker in ["v=", "youtu.be/", "/embed/", "/v/", "/shorts/"] {
        if let Some(pos) = source.find(marker) {
            if let Some(id) = take_id(&source[pos + marker.len()..]) {
                return Some(id);
            }
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_youtube_id() {
        let id = Some("dQw4w9WgXcQ".to_string());
        assert_eq!(extract_youtube_id("https://www.youtube.com/watch?v=dQw4w9WgXcQ"), id);
        assert_eq!(extract_youtube_id("https://youtu.be/dQw4w9WgXcQ?t=42"), id);
        assert_eq!(extract_youtube_id("https://youtube.com/shorts/dQw4w9WgXcQ"), id);
        assert_eq!(
            extract_youtube_id("https://www.youtube.com/embed/dQw4w9WgXcQ"),
            id
        );
        assert_eq!(
            extract_youtube_id("https://youtube.com/watch?feature=share&v=dQw4w9WgXcQ"),
            id
        );
        assert_eq!(extract_youtube_id("dQw4w9WgXcQ"), id);
    }

    #[test]
    fn test_rejects_non_youtube() {
        assert_eq!(extract_youtube_id("https://vimeo.com/123456789"), None);
        assert_eq!(extract_youtube_id("https://youtube.com/watch?v=short"), None);
        assert_eq!(extract_youtube_id("/tmp/video.mp4"), None);
    }
}
