//! Small helpers for embedding catalogue descriptions and task names in
//! chat sentences.

/// Trim `s`, lowercase its first character and drop a trailing period so it
/// can be spliced into the middle of a sentence.
pub fn desentence(s: &str) -> String {
    let s = s.trim();
    let s = s.strip_suffix('.').unwrap_or(s);
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Trim `s`, capitalise its first character and append `suffix`.
///
/// An empty input stays empty (no suffix is added).
pub fn sentence(s: &str, suffix: &str) -> String {
    let s = s.trim();
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => {
            let mut out: String = first.to_uppercase().chain(chars).collect();
            out.push_str(suffix);
            out
        }
        None => String::new(),
    }
}

/// Pick the singular or plural form of `word` for `count`.
pub fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        singular.to_string()
    } else {
        plural.to_string()
    }
}

/// Truncate `s` to at most `max` bytes on a char boundary, marking the cut
/// with an ellipsis.
pub fn truncate(s: &str, max: usize) -> String {
    if s.len() <= max {
        return s.to_string();
    }
    const ELLIPSIS: &str = "…";
    let budget = max.saturating_sub(ELLIPSIS.len());
    let mut end = budget;
    while end > 0 && !s.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}{ELLIPSIS}", &s[..end])
}
