//! Compact representation of annotated text
//!
//! A `ChunkedText` is a plaintext string, a common annotation list, and a
//! sparse list of chunks: sub-ranges whose annotation list differs from the
//! common one. All offsets count characters, not bytes.

use crate::linear::{AnnotationList, LinearItem};
use serde::{Deserialize, Serialize};

/// A sub-range of text carrying its own annotation list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Chunk {
    pub start: usize,
    pub text: String,
    pub ann_list: AnnotationList,
}

impl Chunk {
    pub fn new(start: usize, text: &str, ann_list: AnnotationList) -> Self {
        Self {
            start,
            text: text.to_string(),
            ann_list,
        }
    }

    /// Character length of the chunk
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn end(&self) -> usize {
        self.start + self.len()
    }
}

/// Annotated text, chunked at annotation changes
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChunkedText {
    pub all_text: String,
    pub common_ann_list: AnnotationList,
    pub chunks: Vec<Chunk>,
}

/// Substring by character offsets
pub(crate) fn char_slice(text: &str, start: usize, end: usize) -> String {
    text.chars().skip(start).take(end.saturating_sub(start)).collect()
}

impl ChunkedText {
    pub fn new(all_text: &str, common_ann_list: AnnotationList, chunks: Vec<Chunk>) -> Self {
        Self {
            all_text: all_text.to_string(),
            common_ann_list,
            chunks,
        }
    }

    /// Unannotated text
    pub fn plain(text: &str) -> Self {
        Self::new(text, Vec::new(), Vec::new())
    }

    pub fn len(&self) -> usize {
        self.all_text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.all_text.is_empty()
    }

    /// Build chunked text from linear data
    ///
    /// The common annotation list is the ordered intersection of every
    /// item's list; each maximal run with a different list becomes a chunk.
    pub fn from_linear_data(data: &[LinearItem]) -> Self {
        let all_text: String = data.iter().map(LinearItem::ch).collect();
        let Some(first) = data.first() else {
            return Self::default();
        };
        let common_ann_list: AnnotationList = first
            .annotations()
            .iter()
            .filter(|hash| data.iter().all(|item| item.annotations().contains(hash)))
            .cloned()
            .collect();

        let mut chunks: Vec<Chunk> = Vec::new();
        for (offset, item) in data.iter().enumerate() {
            if item.annotations() == common_ann_list.as_slice() {
                continue;
            }
            match chunks.last_mut() {
                Some(chunk) if chunk.end() == offset && chunk.ann_list == item.annotations() => {
                    chunk.text.push(item.ch());
                }
                _ => chunks.push(Chunk {
                    start: offset,
                    text: item.ch().to_string(),
                    ann_list: item.annotations().to_vec(),
                }),
            }
        }
        Self {
            all_text,
            common_ann_list,
            chunks,
        }
    }

    /// Content as linear data
    pub fn to_linear_data(&self) -> Vec<LinearItem> {
        let chars: Vec<char> = self.all_text.chars().collect();
        let mut data = Vec::with_capacity(chars.len());
        let mut cursor = 0;
        let annotate = |data: &mut Vec<LinearItem>, text: &[char], list: &AnnotationList| {
            data.extend(text.iter().map(|&ch| LinearItem::new(ch, list.clone())));
        };
        for chunk in &self.chunks {
            let start = chunk.start.min(chars.len());
            annotate(&mut data, &chars[cursor.min(start)..start], &self.common_ann_list);
            let chunk_chars: Vec<char> = chunk.text.chars().collect();
            annotate(&mut data, &chunk_chars, &chunk.ann_list);
            cursor = chunk.end();
        }
        annotate(&mut data, &chars[cursor.min(chars.len())..], &self.common_ann_list);
        data
    }

    /// Slice of the chunked text over the character range `[start, end)`
    ///
    /// Chunks are clipped to the range; chunks falling outside it are dropped.
    pub fn slice(&self, start: usize, end: usize) -> Self {
        let len = self.len();
        let end = end.min(len);
        let start = start.min(end);
        let chunks = self
            .chunks
            .iter()
            .filter_map(|chunk| {
                let clip_start = chunk.start.max(start);
                let clip_end = chunk.end().min(end);
                if clip_start >= clip_end {
                    return None;
                }
                Some(Chunk {
                    start: clip_start - start,
                    text: char_slice(&chunk.text, clip_start - chunk.start, clip_end - chunk.start),
                    ann_list: chunk.ann_list.clone(),
                })
            })
            .collect();
        Self {
            all_text: char_slice(&self.all_text, start, end),
            common_ann_list: self.common_ann_list.clone(),
            chunks,
        }
    }

    pub fn to_json(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }

    pub fn from_json(value: serde_json::Value) -> serde_json::Result<Self> {
        serde_json::from_value(value)
    }
}
