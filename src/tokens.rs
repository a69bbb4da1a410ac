//! Word-break tokenization
//!
//! Diffs and annotation relocation work on words rather than characters.
//! Tokens follow the Unicode word-break rules (UAX #29), so scripts written
//! without spaces (Han, Thai, ...) break per character or cluster.

use unicode_segmentation::UnicodeSegmentation;

/// Trim the text and collapse every internal whitespace run to a single space
pub fn normalize_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Break text into word-break separated tokens, with whitespace normalized
///
/// If the text already had normalized whitespace, `get_tokens(text).concat() == text`.
///
/// # Example
///
/// ```ignore
/// assert_eq!(get_tokens("foo bar"), vec!["foo", " ", "bar"]);
/// ```
pub fn get_tokens(text: &str) -> Vec<String> {
    normalize_whitespace(text)
        .split_word_bounds()
        .map(str::to_string)
        .collect()
}

/// Token boundaries of a string as character ranges (not byte ranges)
///
/// Whitespace is not normalized, so the ranges cover the input exactly.
pub fn word_char_ranges(text: &str) -> Vec<std::ops::Range<usize>> {
    let mut ranges = Vec::new();
    let mut cursor = 0;
    for word in text.split_word_bounds() {
        let len = word.chars().count();
        ranges.push(cursor..cursor + len);
        cursor += len;
    }
    ranges
}

/// Count the matching items at the start and end of two sequences
///
/// The suffix count never overlaps the prefix count. Returns `None` when the
/// sequences are identical.
///
/// # Returns
///
/// `Some((start, end))` where `start` items match at the front and `end`
/// items match at the back.
pub fn count_edge_matches<T: PartialEq>(before: &[T], after: &[T]) -> Option<(usize, usize)> {
    let len = before.len().min(after.len());
    let start = before
        .iter()
        .zip(after.iter())
        .take_while(|(b, a)| b == a)
        .count();
    if start == len && before.len() == after.len() {
        return None;
    }
    let end = before
        .iter()
        .rev()
        .zip(after.iter().rev())
        .take(len - start)
        .take_while(|(b, a)| b == a)
        .count();
    Some((start, end))
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_tokens_basic_latin() {
        assert_eq!(get_tokens("foo bar baz"), vec!["foo", " ", "bar", " ", "baz"]);
    }

    #[test]
    fn test_tokens_non_canonical_spaces() {
        assert_eq!(
            get_tokens("\n  \"foo, \t bar\" - baz? "),
            vec!["\"", "foo", ",", " ", "bar", "\"", " ", "-", " ", "baz", "?"]
        );
    }

    #[test]
    fn test_tokens_han() {
        assert_eq!(
            get_tokens("有17個學生，知道嗎？"),
            vec!["有", "17", "個", "學", "生", "，", "知", "道", "嗎", "？"]
        );
    }

    #[test]
    fn test_tokens_empty() {
        assert!(get_tokens("").is_empty());
        assert!(get_tokens(" \t\n").is_empty());
    }

    #[test]
    fn test_word_char_ranges_count_chars() {
        assert_eq!(word_char_ranges("ningún x"), vec![0..6, 6..7, 7..8]);
    }

    #[test]
    fn test_edge_matches() {
        let before = ["a", "b", "c", "d"];
        assert_eq!(count_edge_matches(&before, &before), None);
        assert_eq!(count_edge_matches(&before, &["a", "x", "c", "d"]), Some((1, 2)));
        assert_eq!(count_edge_matches(&before, &["a", "b"]), Some((2, 0)));
        // Suffix stops where the prefix ends
        assert_eq!(count_edge_matches(&["a", "a"], &["a", "a", "a"]), Some((2, 0)));
    }

    proptest! {
        #[test]
        fn prop_tokens_join_to_normalized(text in "\\PC{0,40}") {
            prop_assert_eq!(get_tokens(&text).concat(), normalize_whitespace(&text));
        }
    }
}
