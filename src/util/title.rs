/// Shortest title (in chars) a candidate may carry and still be selected.
pub const MIN_TITLE_CHARS: usize = 2;

/// A title is selectable when it is non-empty and at least [`MIN_TITLE_CHARS`] long.
pub fn is_selectable_title(title: &str) -> bool {
    !title.is_empty() && title.chars().count() >= MIN_TITLE_CHARS
}

/// First `max_chars` characters of `text`, never splitting a code point.
pub fn char_prefix(text: &str, max_chars: usize) -> &str {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => &text[..idx],
        None => text,
    }
}

/// Truncate long bodies to `max_chars`, marking the cut with `...`.
pub fn truncate_with_ellipsis(text: &str, max_chars: usize) -> String {
    let prefix = char_prefix(text, max_chars);
    if prefix.len() == text.len() {
        text.to_string()
    } else {
        format!("{prefix}...")
    }
}
