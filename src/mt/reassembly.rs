//! Relocating annotations onto a plaintext translation
//!
//! Given the plain translation and the translations of the upper-cased
//! variants, each variant's differing token span is where the matching
//! source chunk landed. Chunks whose variant translated identically are
//! dropped.
//!
//! Suppose the annotated source is `<b>It</b> is a big <i>red</i> <a>Box</a>`
//! and the translations come back as:
//!
//! ```text
//! IT is a big red Box  ->  Es una gran Caja roja
//! It is a big RED Box  ->  Es una gran Caja ROJA
//! It is a big red BOX  ->  Es una gran CAJA roja
//! It is a big red Box  ->  Es una gran Caja roja
//! ```
//!
//! Then `It` maps nowhere, `red` maps to `roja` and `Box` to `Caja`, giving
//! `Es una gran <a>Caja</a> <i>roja</i>`.

use crate::chunked::{Chunk, ChunkedText};
use crate::tokens::{count_edge_matches, get_tokens, normalize_whitespace};

/// Build annotated target text from annotated source, plaintext target and
/// the translations of the modified variants (one per source chunk)
pub fn adapt_annotations_with_modified_targets(
    source: &ChunkedText,
    target: &str,
    modified_targets: &[String],
) -> ChunkedText {
    let target = normalize_whitespace(target);
    let tokens = get_tokens(&target);
    let mut chunks: Vec<Chunk> = source
        .chunks
        .iter()
        .zip(modified_targets)
        .filter_map(|(source_chunk, modified)| {
            let modified_tokens = get_tokens(modified);
            let (start, end) = count_edge_matches(&tokens, &modified_tokens)?;
            let text = tokens[start..tokens.len() - end].concat();
            if text.is_empty() {
                return None;
            }
            Some(Chunk {
                start: tokens[..start].iter().map(|t| t.chars().count()).sum(),
                text,
                ann_list: source_chunk.ann_list.clone(),
            })
        })
        .collect();
    chunks.sort_by_key(|chunk| chunk.start);
    // Overlapping relocations cannot both hold
    let mut kept: Vec<Chunk> = Vec::with_capacity(chunks.len());
    for chunk in chunks {
        if kept.last().is_none_or(|last| last.end() <= chunk.start) {
            kept.push(chunk);
        }
    }
    ChunkedText::new(&target, source.common_ann_list.clone(), kept)
}
