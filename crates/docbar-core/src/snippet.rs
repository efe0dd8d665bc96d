//! Extract text cleanup for display in the launcher.

use std::sync::OnceLock;

use regex::Regex;

const ELLIPSIS: char = '…';

fn tag_pattern() -> Option<&'static Regex> {
    static TAGS: OnceLock<Option<Regex>> = OnceLock::new();
    TAGS.get_or_init(|| Regex::new(r"<[^>]*>").ok()).as_ref()
}

/// Turn a raw daemon extract into markup-safe snippet text.
///
/// Tags are removed outright, so highlighting inside a word keeps the word
/// whole, and whitespace runs collapse to one space before the text is cut to `max_chars` characters, so escaping never splits an entity.
/// Returns `None` when nothing printable is left.
#[must_use]
pub fn render(extract: &str, max_chars: usize) -> Option<String> {
    let stripped = match tag_pattern() {
        Some(tags) => tags.replace_all(extract, ""),
        None => extract.into(),
    };

    let collapsed = stripped.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.is_empty() || max_chars == 0 {
        return None;
    }

    Some(escape(&truncate(&collapsed, max_chars)))
}

/// Cut to at most `max_chars` characters, ending in an ellipsis when cut.
fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }

    let mut cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    cut.truncate(cut.trim_end().len());
    cut.push(ELLIPSIS);
    cut
}

/// Escape characters that are significant in Pango/HTML markup.
#[must_use]
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
