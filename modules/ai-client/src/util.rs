use std::borrow::Cow;

/// Keep the first `max_chars` characters, appending `...` only when something was cut.
pub fn truncate_chars(s: &str, max_chars: usize) -> Cow<'_, str> {
    match s.char_indices().nth(max_chars) {
        Some((end, _)) => Cow::Owned(format!("{}...", &s[..end])),
        None => Cow::Borrowed(s),
    }
}

/// Strip every markdown code fence marker from a response.
///
/// Models sometimes open a fence mid-reply after some prose, so markers are
/// removed wherever they occur rather than only at the edges.
pub fn strip_code_blocks(response: &str) -> String {
    response
        .replace("```json", "")
        .replace("```JSON", "")
        .replace("```", "")
        .trim()
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars_adds_ellipsis_only_when_cut() {
        assert_eq!(truncate_chars("abcdef", 3), "abc...");
        assert_eq!(truncate_chars("abc", 3), "abc");
        assert_eq!(truncate_chars("", 3), "");
    }

    #[test]
    fn test_truncate_chars_counts_characters_not_bytes() {
        assert_eq!(truncate_chars("日本語テキスト", 3), "日本語...");
    }

    #[test]
    fn test_strip_code_blocks() {
        assert_eq!(strip_code_blocks("```json\n{}\n```"), "{}");
        assert_eq!(strip_code_blocks("```\n{}\n```"), "{}");
        assert_eq!(strip_code_blocks("{}"), "{}");
    }

    #[test]
    fn test_strip_code_blocks_mid_response() {
        assert_eq!(
            strip_code_blocks("Here you go:\n```json\n{\"a\":1}\n```"),
            "Here you go:\n\n{\"a\":1}"
        );
    }
}
