//! Linear data: flat sequences of possibly-annotated characters
//!
//! Each item is either a bare character or a character paired with an
//! ordered annotation list (topmost first). The JSON shape matches the
//! document model's content items: `"a"` or `["a", ["h123"]]`.

use serde::{Deserialize, Serialize};
use std::ops::Range;

/// Content-addressed annotation hash, e.g. `h851288c946e755a1`
pub type AnnotationId = String;

/// Ordered annotation list, topmost first
pub type AnnotationList = Vec<AnnotationId>;

/// One character of content with its annotations
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LinearItem {
    Plain(char),
    Annotated(char, AnnotationList),
}

impl LinearItem {
    /// Build an item, collapsing an empty annotation list to a plain character
    pub fn new(ch: char, annotations: AnnotationList) -> Self {
        if annotations.is_empty() {
            LinearItem::Plain(ch)
        } else {
            LinearItem::Annotated(ch, annotations)
        }
    }

    pub fn ch(&self) -> char {
        match self {
            LinearItem::Plain(ch) | LinearItem::Annotated(ch, _) => *ch,
        }
    }

    pub fn annotations(&self) -> &[AnnotationId] {
        match self {
            LinearItem::Plain(_) => &[],
            LinearItem::Annotated(_, list) => list,
        }
    }

    /// Copy of this item with `hash` in the topmost position
    pub fn with_annotation(&self, hash: &str) -> Self {
        let mut list = Vec::with_capacity(self.annotations().len() + 1);
        list.push(hash.to_string());
        list.extend(self.annotations().iter().cloned());
        LinearItem::Annotated(self.ch(), list)
    }

    /// Copy of this item with every occurrence of `hash` removed
    pub fn without_annotation(&self, hash: &str) -> Self {
        let list = self
            .annotations()
            .iter()
            .filter(|h| h.as_str() != hash)
            .cloned()
            .collect();
        LinearItem::new(self.ch(), list)
    }
}

/// Linear data for plain text
pub fn plain_data(text: &str) -> Vec<LinearItem> {
    text.chars().map(LinearItem::Plain).collect()
}

/// The characters of the data, without annotations
pub fn data_text(data: &[LinearItem]) -> String {
    data.iter().map(LinearItem::ch).collect()
}

/// Return a copy of data with an annotation added in the topmost position
pub fn annotate_data(hash: &str, data: &[LinearItem]) -> Vec<LinearItem> {
    data.iter().map(|item| item.with_annotation(hash)).collect()
}

/// Add an annotation in the topmost position over a range, in place
pub fn annotate_data_in_place(hash: &str, data: &mut [LinearItem], range: Range<usize>) {
    for item in &mut data[range] {
        *item = item.with_annotation(hash);
    }
}

/// Remove an annotation from the topmost position over a range, in place
///
/// Only a topmost occurrence is removed, so annotating and then
/// unannotating restores the original list order exactly.
pub fn unannotate_data_in_place(hash: &str, data: &mut [LinearItem], range: Range<usize>) {
    for item in &mut data[range] {
        if item.annotations().first().map(String::as_str) == Some(hash) {
            *item = LinearItem::new(item.ch(), item.annotations()[1..].to_vec());
        }
    }
}
