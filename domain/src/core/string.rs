//! String utilities for the domain layer.

/// Keep the first `max_chars` characters of `s`, appending `...` when cut.
///
/// Counts characters rather than bytes so multi-byte text is never split.
pub fn ellipsize(s: &str, max_chars: usize) -> String {
    match s.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &s[..end]),
        None => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ellipsize_ascii() {
        assert_eq!(ellipsize("hello", 10), "hello");
        assert_eq!(ellipsize("hello", 5), "hello");
        assert_eq!(ellipsize("hello world", 5), "hello...");
    }

    #[test]
    fn test_ellipsize_multibyte() {
        assert_eq!(ellipsize("척추유합술 상담", 5), "척추유합술...");
        assert_eq!(ellipsize("日本語", 3), "日本語");
    }
}
