// src/announcement.rs
use serde::{Deserialize, Serialize};

/// Titles are cut to this many characters before escaping.
pub const TITLE_MAX_CHARS: usize = 100;
/// Escaped content is cut to this many characters.
pub const CONTENT_MAX_CHARS: usize = 2000;

/// One announcement as collected from the portal and stored in history.
///
/// `href` is the deduplication key. Records without one are re-sent on
/// every run.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct AnnouncementRecord {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub href: Option<String>,
    #[serde(default)]
    pub timestamp: String,
}

impl AnnouncementRecord {
    /// Build a record from raw (unescaped) text, stamping the current local time.
    pub fn compose(title: &str, content: &str, href: Option<String>) -> Self {
        let title: String = title.chars().take(TITLE_MAX_CHARS).collect();
        Self {
            title: escape_html(&title),
            content: truncate_escaped(&escape_html(content), CONTENT_MAX_CHARS),
            href,
            timestamp: now_iso(),
        }
    }
}

/// Escape `&`, `<` and `>` for Telegram's HTML parse mode.
pub fn escape_html(s: &str) -> String {
    html_escape::encode_text(s).into_owned()
}

/// Cut escaped text to `max` chars without leaving half an entity at the end.
pub fn truncate_escaped(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        return s.to_string();
    }
    let mut out: String = s.chars().take(max).collect();
    if let Some(amp) = out.rfind('&') {
        if !out[amp..].contains(';') {
            out.truncate(amp);
        }
    }
    out
}

/// Local time, ISO-8601 with microseconds and no offset.
pub fn now_iso() -> String {
    chrono::Local::now()
        .format("%Y-%m-%dT%H:%M:%S%.6f")
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_ampersand_once() {
        assert_eq!(escape_html("a < b & c > d"), "a &lt; b &amp; c &gt; d");
        assert_eq!(escape_html("&lt;"), "&amp;lt;");
    }

    #[test]
    fn truncation_drops_partial_entity() {
        let s = escape_html("abc&def");
        assert_eq!(s, "abc&amp;def");
        assert_eq!(truncate_escaped(&s, 6), "abc");
        assert_eq!(truncate_escaped(&s, 8), "abc&amp;");
        assert_eq!(truncate_escaped(&s, 100), s);
    }

    #[test]
    fn compose_bounds_title_and_content() {
        let long_title = "ş".repeat(150);
        let long_body = "<".repeat(1000);
        let rec = AnnouncementRecord::compose(&long_title, &long_body, Some("u".into()));
        assert_eq!(rec.title.chars().count(), TITLE_MAX_CHARS);
        assert!(rec.content.chars().count() <= CONTENT_MAX_CHARS);
        assert!(rec.content.ends_with("&lt;"));
        assert_eq!(rec.href.as_deref(), Some("u"));
    }

    #[test]
    fn timestamp_is_iso_like() {
        let ts = now_iso();
        assert_eq!(ts.len(), "2025-01-01T00:00:00.000000".len());
        assert_eq!(&ts[10..11], "T");
    }

    #[test]
    fn missing_fields_deserialize_as_defaults() {
        let rec: AnnouncementRecord =
            serde_json::from_str(r#"{"title":"x","content":"y","timestamp":"t"}"#).unwrap();
        assert_eq!(rec.href, None);
    }
}
