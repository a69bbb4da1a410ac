//! Plaintext variants of annotated text
//!
//! A plaintext-only backend cannot carry annotations. Instead, each
//! annotated chunk gets its own variant of the text with that chunk
//! upper-cased; after translation, the span that differs from the plain
//! translation is where the chunk landed.
//!
//! # Example
//!
//! For chunked text corresponding to `foo <b>bar</b> baz <b>qux</b> quux`:
//!
//! ```text
//! foo BAR baz qux quux
//! foo bar baz QUX quux
//! foo bar baz qux quux
//! ```

use crate::chunked::{ChunkedText, char_slice};

/// One variant per chunk with that chunk upper-cased, then the plain text last
pub fn plex_group(chunked: &ChunkedText) -> Vec<String> {
    let len = chunked.len();
    let mut variants: Vec<String> = chunked
        .chunks
        .iter()
        .map(|chunk| {
            format!(
                "{}{}{}",
                char_slice(&chunked.all_text, 0, chunk.start),
                chunk.text.to_uppercase(),
                char_slice(&chunked.all_text, chunk.end(), len)
            )
        })
        .collect();
    variants.push(chunked.all_text.clone());
    variants
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunked::Chunk;

    #[test]
    fn test_plex_group() {
        let chunked = ChunkedText::new(
            "foo bar baz qux quux",
            vec![],
            vec![
                Chunk::new(4, "bar", vec!["b".to_string()]),
                Chunk::new(12, "qux", vec!["b".to_string()]),
            ],
        );
        assert_eq!(
            plex_group(&chunked),
            vec!["foo BAR baz qux quux", "foo bar baz QUX quux", "foo bar baz qux quux"]
        );
    }

    #[test]
    fn test_plex_group_unannotated() {
        assert_eq!(plex_group(&ChunkedText::plain("hola")), vec!["hola"]);
        assert_eq!(plex_group(&ChunkedText::default()), vec![""]);
    }

    #[test]
    fn test_plex_group_non_ascii() {
        let chunked = ChunkedText::new("el ñandú", vec![], vec![Chunk::new(3, "ñandú", vec!["x".to_string()])]);
        assert_eq!(plex_group(&chunked)[0], "el ÑANDÚ");
    }
}
