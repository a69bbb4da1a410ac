//! Parallel translation with human corrections
//!
//! Two rich-text documents in different languages are kept structurally
//! identical. Edits on either side are mirrored structurally onto the other,
//! the edited paragraphs are machine translated, and the new translation is
//! merged with whatever corrections a human already made to the previous
//! one. See [`prism::Prism`] for the engine and [`mt`] for the backends.

pub mod adapt;
pub mod annotation;
pub mod chunked;
pub mod config;
pub mod differ;
pub mod error;
pub mod history;
pub mod linear;
pub mod model;
pub mod mt;
pub mod prism;
pub mod tokens;

#[cfg(test)]
mod integration_tests;

pub use annotation::{Annotation, AnnotationStore};
pub use chunked::{Chunk, ChunkedText};
pub use config::PrismConfig;
pub use differ::{Diff3Chunk, DiffOp, Differ};
pub use error::{SyncError, SyncResult};
pub use history::JointHistory;
pub use linear::LinearItem;
pub use model::{Document, Transaction};
pub use prism::{Prism, Side};
