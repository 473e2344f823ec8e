//! Model output cleanup and stream URL validation
//!
//! Language models wrap answers in quotes, backticks or a `URL:` label and
//! sometimes echo JSON-escaped slashes. These helpers undo that before the
//! answer is accepted.

use regex::Regex;

/// Marker every accepted stream URL must contain
pub const MANIFEST_MARKER: &str = ".m3u8";

const WRAPPING_CHARS: &[char] = &['"', '\'', '`'];

/// Strips whitespace, wrapping quotes/backticks and a leading `URL:` label
///
/// # Example
/// ```
/// use zxy_core::extractor::clean_model_output;
/// assert_eq!(clean_model_output("  `https://a.b/x.m3u8`\n"), "https://a.b/x.m3u8");
/// assert_eq!(clean_model_output("url: /x.m3u8"), "/x.m3u8");
/// ```
pub fn clean_model_output(raw: &str) -> String {
    let unquoted = raw.trim().trim_matches(WRAPPING_CHARS);
    let unlabelled = strip_url_label(unquoted);
    unlabelled.trim().to_string()
}

/// Removes a case-insensitive `URL:` prefix and the whitespace after it
fn strip_url_label(text: &str) -> &str {
    if let Ok(re) = Regex::new(r"(?i)^URL:\s*")
        && let Some(m) = re.find(text)
    {
        return &text[m.end()..];
    }
    text
}

/// Checks a cleaned candidate against the stream URL rule
///
/// Accepted values are non-empty, start with `http` or `/`, and contain
/// the `.m3u8` manifest marker.
///
/// # Example
/// ```
/// use zxy_core::extractor::is_valid_stream_url;
/// assert!(is_valid_stream_url("https://cdn.example.com/v/abc.m3u8"));
/// assert!(is_valid_stream_url("/path/video.m3u8"));
/// assert!(!is_valid_stream_url("https://cdn.example.com/v/abc.mp4"));
/// assert!(!is_valid_stream_url("cdn.example.com/abc.m3u8"));
/// ```
pub fn is_valid_stream_url(candidate: &str) -> bool {
    let candidate = candidate.trim();
    !candidate.is_empty()
        && (candidate.starts_with("http") || candidate.starts_with('/'))
        && candidate.contains(MANIFEST_MARKER)
}

/// Replaces JSON-escaped slashes (`\/`) with plain ones
///
/// # Example
/// ```
/// use zxy_core::extractor::unescape_slashes;
/// assert_eq!(unescape_slashes(r"https:\/\/x.com\/a.m3u8"), "https://x.com/a.m3u8");
/// ```
pub fn unescape_slashes(url: &str) -> String {
    url.replace("\\/", "/")
}

/// Truncates to at most `max_chars` characters without splitting a code point
pub fn truncate_chars(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((byte_index, _)) => &text[..byte_index],
        None => text,
    }
}
