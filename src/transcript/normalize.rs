//! Caption text normalization.

use regex::Regex;
use std::sync::OnceLock;

fn tag_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"<[^>]*>").expect("valid regex"))
}

/// Join caption snippets into plain text: trim each, drop empties, single-space join.
pub fn normalize_segments<I, S>(segments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    segments
        .into_iter()
        .filter_map(|s| {
            let trimmed = collapse_whitespace(s.as_ref());
            (!trimmed.is_empty()).then_some(trimmed)
        })
        .collect::<Vec<_>>()
        .join(" ")
}

/// Extract the spoken text from an SRT or WebVTT subtitle file.
///
/// Drops cue numbers, timing lines, blank lines and the WebVTT header block.
/// Auto-generated captions repeat the previous line as they scroll, so
/// consecutive duplicates are collapsed.
pub fn srt_to_text(srt: &str) -> String {
    let mut lines: Vec<String> = Vec::new();

    for raw in srt.lines() {
        let line = raw.trim().trim_start_matches('\u{feff}');
        if line.is_empty()
            || line.chars().all(|c| c.is_ascii_digit())
            || line.contains("-->")
            || line == "WEBVTT"
            || line.starts_with("Kind:")
            || line.starts_with("Language:")
        {
            continue;
        }

        let text = collapse_whitespace(&decode_entities(&strip_tags(line)));
        if text.is_empty() || lines.last().is_some_and(|prev| *prev == text) {
            continue;
        }
        lines.push(text);
    }

    lines.join(" ")
}

/// Decode the character references left in subtitle text. Text with a
/// malformed or unknown reference is returned as is.
pub fn decode_entities(text: &str) -> String {
    quick_xml::escape::unescape_with(text, |entity| match entity {
        "nbsp" => Some(" "),
        _ => None,
    })
    .map(|decoded| decoded.into_owned())
    .unwrap_or_else(|_| text.to_string())
}

/// Remove inline markup such as `<font>`, `<i>` or WebVTT timing tags.
pub fn strip_tags(text: &str) -> String {
    tag_regex().replace_all(text, "").into_owned()
}

fn collapse_whitespace(value: &str) -> String {
    value.split_whitespace().collect::<Vec<_>>().join(" ")
}
