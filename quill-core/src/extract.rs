use std::sync::LazyLock;

use regex::Regex;

const VIDEO_ID_LEN: usize = 11;

// Same shape list the editor has always accepted: watch?v=, &v=, youtu.be/,
// /embed/, /v/ and /u/<n>/.
static VIDEO_URL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^.*(youtu.be/|v/|u/\w/|embed/|watch\?v=|&v=)([^#&?]*).*")
        .expect("video url pattern is valid")
});

/// Pull the 11-character video identifier out of a YouTube URL.
///
/// Returns `None` for unrecognised shapes, identifiers of any other length, and
/// identifiers containing characters outside `[A-Za-z0-9_-]`. Nothing is fetched.
pub fn extract_video_id(url: &str) -> Option<String> {
    let captures = VIDEO_URL.captures(url.trim())?;
    let id = captures.get(2)?.as_str();

    let valid = id.chars().count() == VIDEO_ID_LEN
        && id
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_');

    valid.then(|| id.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_url() {
        assert_eq!(
            extract_video_id("https://youtu.be/dQw4w9WgXcQ").as_deref(),
            Some("dQw4w9WgXcQ")
        );
    }

    #[test]
    fn test_supported_shapes() {
        let urls = [
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ",
            "https://www.youtube.com/watch?feature=share&v=dQw4w9WgXcQ",
            "https://www.youtube.com/embed/dQw4w9WgXcQ?rel=0",
            "https://www.youtube.com/v/dQw4w9WgXcQ",
            "https://www.youtube.com/u/1/dQw4w9WgXcQ",
            "https://youtu.be/dQw4w9WgXcQ?t=42",
            "https://www.youtube.com/watch?v=dQw4w9WgXcQ#comments",
        ];
        for url in urls {
            assert_eq!(extract_video_id(url).as_deref(), Some("dQw4w9WgXcQ"), "{url}");
        }
    }

    #[test]
    fn test_wrong_length_is_rejected() {
        assert_eq!(extract_video_id("https://youtu.be/dQw4w9WgXc"), None);
        assert_eq!(extract_video_id("https://youtu.be/dQw4w9WgXcQQ"), None);
        assert_eq!(extract_video_id("https://www.youtube.com/watch?v="), None);
    }

    #[test]
    fn test_unrecognised_shapes() {
        assert_eq!(extract_video_id(""), None);
        assert_eq!(extract_video_id("not a url"), None);
        assert_eq!(extract_video_id("https://vimeo.com/123456789"), None);
    }

    #[test]
    fn test_markup_characters_are_rejected() {
        assert_eq!(extract_video_id("https://youtu.be/dQw4\"><b>XQ"), None);
    }
}
