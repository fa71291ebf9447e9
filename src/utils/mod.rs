//! Utility functions and helpers.

pub mod http;

use unicode_segmentation::UnicodeSegmentation;
use url::Url;

/// Resolve a potentially relative URL against a base URL.
pub fn resolve_url(base: &Url, href: &str) -> String {
    base.join(href)
        .map(|u| u.to_string())
        .unwrap_or_else(|_| href.to_string())
}

/// Truncate text to at most `max` characters, marking the cut with `…`.
///
/// The cut always falls on a grapheme cluster boundary, so a combined
/// character is dropped whole rather than split.
pub fn truncate_graphemes(text: &str, max: usize) -> String {
    if text.chars().count() <= max {
        return text.to_string();
    }
    let budget = max.saturating_sub(1);
    let mut used = 0;
    let mut out = String::new();
    for grapheme in text.graphemes(true) {
        let len = grapheme.chars().count();
        if used + len > budget {
            break;
        }
        used += len;
        out.push_str(grapheme);
    }
    out.push('…');
    out
}
