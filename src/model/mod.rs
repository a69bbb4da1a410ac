//! Minimal rich-text document model
//!
//! Documents are flat sequences of opening elements, closing elements and
//! annotated characters. Content lives only in content branch nodes
//! (paragraphs, headings, preformatted blocks); lists, list items and
//! sections hold other elements.

pub mod data;
pub mod document;
pub mod transaction;

pub use data::{
    DIFF3_ATTRIBUTE, DIRTY_ATTRIBUTE, DataItem, Element, NodeType, content_items, strip_content,
};
pub use document::{Document, Node, NodeId, Position, PositionOffset};
pub use transaction::{Operation, Transaction};
