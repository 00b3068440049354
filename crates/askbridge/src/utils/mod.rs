//! crates/askbridge/src/utils/mod.rs
//! Shared utility functions used across the codebase

pub mod json;

/// Largest char boundary at or below `max_len`.
fn floor_char_boundary(s: &str, max_len: usize) -> usize {
    if max_len >= s.len() {
        return s.len();
    }
    let mut idx = max_len;
    while idx > 0 && !s.is_char_boundary(idx) {
        idx -= 1;
    }
    idx
}

/// Truncate a string to at most `max_len` bytes with ellipsis.
///
/// Cuts on a char boundary, so multi-byte text (Japanese prompts, search
/// snippets) never panics. The result may be up to `max_len + 3` bytes.
pub fn truncate(s: &str, max_len: usize) -> String {
    if s.len() <= max_len {
        s.to_string()
    } else {
        format!("{}...", &s[..floor_char_boundary(s, max_len)])
    }
}

/// Prefix of `s` of at most `max_len` bytes, without ellipsis.
pub fn prefix(s: &str, max_len: usize) -> &str {
    &s[..floor_char_boundary(s, max_len)]
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_short_string() {
        assert_eq!(truncate("hello", 10), "hello");
    }

    #[test]
    fn test_truncate_exact_length() {
        assert_eq!(truncate("hello", 5), "hello");
    }

    #[test]
    fn test_truncate_long_string() {
        assert_eq!(truncate("hello world", 5), "hello...");
    }

    #[test]
    fn test_truncate_multibyte() {
        // Each kana is 3 bytes; cutting at 4 must back off to 3
        assert_eq!(truncate("アークエンジェル", 4), "ア...");
    }

    #[test]
    fn test_prefix_multibyte() {
        assert_eq!(prefix("曲名", 5), "曲");
        assert_eq!(prefix("曲名", 100), "曲名");
        assert_eq!(prefix("abc", 0), "");
    }
}
