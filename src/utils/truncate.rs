//! Truncation helpers for log lines. Prompts and search answers are long;
//! logs only need a recognizable slice. Cuts respect UTF-8 boundaries.

/// Last `max_chars` characters of `text`.
pub fn tail(text: &str, max_chars: usize) -> &str {
    let count = text.chars().count();
    if count <= max_chars {
        return text;
    }
    let skip = count - max_chars;
    match text.char_indices().nth(skip) {
        Some((idx, _)) => &text[idx..],
        None => "",
    }
}

/// First `max_chars` characters of `text` on a single line, with an
/// ellipsis when something was cut.
pub fn clip(text: &str, max_chars: usize) -> String {
    let flat = text.replace('\n', " ");
    if flat.chars().count() <= max_chars {
        return flat;
    }
    let keep: String = flat.chars().take(max_chars.saturating_sub(3)).collect();
    format!("{}...", keep)
}
