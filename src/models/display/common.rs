//! Common display utilities and helpers

/// Truncate string to at most `max_len` characters, ending in an ellipsis
pub fn truncate_string(s: &str, max_len: usize) -> String {
    if s.chars().count() <= max_len {
        s.to_string()
    } else {
        let kept: String = s.chars().take(max_len.saturating_sub(3)).collect();
        format!("{}...", kept)
    }
}

/// `--` for empty cells
pub fn or_dash(s: &str) -> String {
    if s.is_empty() {
        "--".to_string()
    } else {
        s.to_string()
    }
}
