//! Supported-page detection for the control panel.

/// URL fragments identifying pages with a controllable player.
pub const DEFAULT_WATCH_PATTERNS: [&str; 2] = ["youtube.com/watch", "www.youtube.com/watch"];

/// Whether a URL points at a page the panel can control.
pub fn is_watch_page(url: &str, patterns: &[String]) -> bool {
    if url.is_empty() {
        return false;
    }
    patterns.iter().any(|pattern| url.contains(pattern.as_str()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn patterns() -> Vec<String> {
        DEFAULT_WATCH_PATTERNS
            .iter()
            .map(|p| (*p).to_string())
            .collect()
    }

    #[test]
    fn test_watch_urls_match() {
        assert!(is_watch_page(
            "https://www.youtube.com/watch?v=abc123",
            &patterns()
        ));
        assert!(is_watch_page("https://youtube.com/watch?v=abc123", &patterns()));
    }

    #[test]
    fn test_other_urls_rejected() {
        assert!(!is_watch_page("https://www.youtube.com/feed/library", &patterns()));
        assert!(!is_watch_page("https://example.com/watch", &patterns()));
        assert!(!is_watch_page("", &patterns()));
    }
}
