//! Correction adaptation
//!
//! Merges a new machine translation into a human-corrected target, using the
//! previous machine translation as the common ancestor.

use crate::annotation::{Annotation, AnnotationStore};
use crate::differ::Diff3Chunk;
use crate::linear::{LinearItem, annotate_data};

/// Options for [`adapt_corrections_with`]
#[derive(Debug, Clone, Copy, Default)]
pub struct AdaptOptions {
    /// Flag an update even when it is the only chunk of the diff
    pub annotate_sole_update: bool,
}

/// Build new target content from `diff3(newMt, oldMt, oldTarget)`
///
/// * MT unchanged: the human version (or the ancestor) is kept.
/// * MT changed, no correction: the new MT, annotated `ll/update` unless it
///   is the only chunk.
/// * MT changed and corrected differently: the new MT, annotated
///   `ll/conflict` with the chunk index.
/// * MT changed and corrected identically: the shared content, unannotated.
pub fn adapt_corrections(chunks: &[Diff3Chunk], store: &mut AnnotationStore) -> Vec<LinearItem> {
    adapt_corrections_with(chunks, store, AdaptOptions::default(), |_| true)
}

/// [`adapt_corrections`] with options and a significance predicate
///
/// A chunk whose MT change is not significant (e.g. jitter in a span whose
/// source did not change) is treated as if the MT had not changed.
pub fn adapt_corrections_with<F>(
    chunks: &[Diff3Chunk],
    store: &mut AnnotationStore,
    options: AdaptOptions,
    is_significant: F,
) -> Vec<LinearItem>
where
    F: Fn(&Diff3Chunk) -> bool,
{
    let sole = chunks.len() == 1;
    let mut data = Vec::new();
    for (index, chunk) in chunks.iter().enumerate() {
        let new = chunk.new.as_ref().filter(|_| is_significant(chunk));
        match (new, &chunk.human) {
            (None, Some(human)) => data.extend_from_slice(human),
            (None, None) => data.extend_from_slice(&chunk.old),
            (Some(new), None) if sole && !options.annotate_sole_update => {
                data.extend_from_slice(new)
            }
            (Some(new), None) => {
                let hash = store.hash(Annotation::update());
                data.extend(annotate_data(&hash, new));
            }
            (Some(new), Some(human)) if new == human => data.extend_from_slice(new),
            (Some(new), Some(_)) => {
                let hash = store.hash(Annotation::conflict(index));
                data.extend(annotate_data(&hash, new));
            }
        }
    }
    data
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chunked::{Chunk, ChunkedText};
    use crate::differ::diff3;
    use crate::linear::{data_text, plain_data};
    use pretty_assertions::assert_eq;
    use proptest::prelude::*;

    #[test]
    fn test_adapt_corrections_spanish() {
        let mut store = AnnotationStore::new();
        let old_mt = plain_data("No tengo ningún pantalón, Andy");
        let old_target = plain_data("No havo ningún pantalón, andy");
        let new_mt = plain_data("No tengo ninguna camisa, Peter");

        let chunks = diff3(&new_mt, &old_mt, &old_target);
        let adapted = adapt_corrections(&chunks, &mut store);

        let update = Annotation::update().hash_id();
        let conflict_index = chunks.len() - 1;
        let conflict = Annotation::conflict(conflict_index).hash_id();
        assert_eq!(
            ChunkedText::from_linear_data(&adapted),
            ChunkedText::new(
                "No havo ninguna camisa, Peter",
                vec![],
                vec![
                    Chunk::new(8, "ninguna camisa", vec![update]),
                    Chunk::new(24, "Peter", vec![conflict.clone()]),
                ]
            )
        );
        assert!(store.get(&conflict).is_some());
    }

    #[test]
    fn test_sole_update_is_unannotated() {
        let mut store = AnnotationStore::new();
        let chunks = diff3(&plain_data("dog"), &plain_data("cat"), &plain_data("cat"));
        assert_eq!(chunks.len(), 1);
        assert_eq!(adapt_corrections(&chunks, &mut store), plain_data("dog"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_sole_update_annotated_on_request() {
        let mut store = AnnotationStore::new();
        let chunks = diff3(&plain_data("dog"), &plain_data("cat"), &plain_data("cat"));
        let options = AdaptOptions { annotate_sole_update: true };
        let adapted = adapt_corrections_with(&chunks, &mut store, options, |_| true);
        assert_eq!(adapted, annotate_data(&Annotation::update().hash_id(), &plain_data("dog")));
    }

    #[test]
    fn test_identical_correction_is_not_a_conflict() {
        let mut store = AnnotationStore::new();
        let chunks = diff3(
            &plain_data("a big dog"),
            &plain_data("a big cat"),
            &plain_data("a big dog"),
        );
        assert_eq!(adapt_corrections(&chunks, &mut store), plain_data("a big dog"));
        assert!(store.is_empty());
    }

    #[test]
    fn test_insignificant_change_keeps_human() {
        let mut store = AnnotationStore::new();
        let chunks = diff3(
            &plain_data("the red house"),
            &plain_data("the red home"),
            &plain_data("THE red home"),
        );
        let adapted = adapt_corrections_with(&chunks, &mut store, AdaptOptions::default(), |_| false);
        assert_eq!(data_text(&adapted), "THE red home");
    }

    proptest! {
        #[test]
        fn prop_no_mt_change_keeps_target(x in "[a-c ]{0,16}", y in "[a-c ]{0,16}") {
            let mut store = AnnotationStore::new();
            let chunks = diff3(&plain_data(&x), &plain_data(&x), &plain_data(&y));
            prop_assert_eq!(adapt_corrections(&chunks, &mut store), plain_data(&y));
            prop_assert!(store.is_empty());
        }

        #[test]
        fn prop_uncorrected_target_takes_new_mt(
            old in "(cat|dog| |,|\\.){0,8}",
            new in "(cat|dog| |,|\\.){0,8}",
        ) {
            let mut store = AnnotationStore::new();
            let chunks = diff3(&plain_data(&new), &plain_data(&old), &plain_data(&old));
            prop_assert_eq!(data_text(&adapt_corrections(&chunks, &mut store)), new);
        }
    }
}
