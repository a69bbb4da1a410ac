//! Content-addressed annotation store shared by both documents
//!
//! The store is append-only. Ids are derived from the annotation's content,
//! so hashing the same annotation twice yields the same id and never adds a
//! duplicate entry.

use crate::linear::AnnotationId;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};

/// Marks content that was automatically updated from a new machine translation
pub const UPDATE_ANNOTATION: &str = "ll/update";

/// Marks content where a new machine translation conflicts with a human correction
pub const CONFLICT_ANNOTATION: &str = "ll/conflict";

/// Identity of an annotation store, so documents can prove they share one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StoreId(u64);

impl StoreId {
    fn fresh() -> Self {
        static NEXT: AtomicU64 = AtomicU64::new(1);
        StoreId(NEXT.fetch_add(1, Ordering::Relaxed))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Annotation {
    pub name: String,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl Annotation {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            attributes: BTreeMap::new(),
        }
    }

    pub fn with_attribute(mut self, key: &str, value: serde_json::Value) -> Self {
        self.attributes.insert(key.to_string(), value);
        self
    }

    /// Annotation for a conflicting span, pointing at its diff3 chunk
    pub fn conflict(chunk: usize) -> Self {
        Self::new(CONFLICT_ANNOTATION).with_attribute("chunk", serde_json::json!(chunk))
    }

    pub fn update() -> Self {
        Self::new(UPDATE_ANNOTATION)
    }

    /// The content hash of this annotation
    ///
    /// `BTreeMap` keeps attribute order canonical, so equal annotations
    /// always serialize, and therefore hash, identically.
    pub fn hash_id(&self) -> AnnotationId {
        let canonical = serde_json::to_string(self).unwrap_or_else(|_| self.name.clone());
        let digest = Sha256::digest(canonical.as_bytes());
        let hex: String = digest.iter().take(8).map(|b| format!("{:02x}", b)).collect();
        format!("h{}", hex)
    }
}

/// Append-only annotation store keyed by content hash
#[derive(Debug)]
pub struct AnnotationStore {
    id: StoreId,
    values: HashMap<AnnotationId, Annotation>,
}

impl Default for AnnotationStore {
    fn default() -> Self {
        Self::new()
    }
}

impl AnnotationStore {
    pub fn new() -> Self {
        Self {
            id: StoreId::fresh(),
            values: HashMap::new(),
        }
    }

    pub fn id(&self) -> StoreId {
        self.id
    }

    /// Store an annotation (if not already present) and return its id
    pub fn hash(&mut self, annotation: Annotation) -> AnnotationId {
        let id = annotation.hash_id();
        self.values.entry(id.clone()).or_insert(annotation);
        id
    }

    pub fn get(&self, id: &str) -> Option<&Annotation> {
        self.values.get(id)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Whether the id names one of the synchronization markers (update or conflict)
    pub fn is_sync_marker(&self, id: &str) -> bool {
        self.get(id).is_some_and(|annotation| {
            annotation.name == UPDATE_ANNOTATION || annotation.name == CONFLICT_ANNOTATION
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_idempotent() {
        let mut store = AnnotationStore::new();
        let first = store.hash(Annotation::new("textStyle/bold"));
        let second = store.hash(Annotation::new("textStyle/bold"));
        assert_eq!(first, second);
        assert_eq!(store.len(), 1);
        assert!(first.starts_with('h'));
        assert_eq!(first.len(), 17);
    }

    #[test]
    fn test_attributes_change_the_hash() {
        let mut store = AnnotationStore::new();
        let zero = store.hash(Annotation::conflict(0));
        let one = store.hash(Annotation::conflict(1));
        assert_ne!(zero, one);
        assert_eq!(store.len(), 2);
    }

    #[test]
    fn test_sync_markers() {
        let mut store = AnnotationStore::new();
        let update = store.hash(Annotation::update());
        let conflict = store.hash(Annotation::conflict(3));
        let bold = store.hash(Annotation::new("textStyle/bold"));
        assert!(store.is_sync_marker(&update));
        assert!(store.is_sync_marker(&conflict));
        assert!(!store.is_sync_marker(&bold));
        assert!(!store.is_sync_marker("h0000000000000000"));
    }

    #[test]
    fn test_stores_have_distinct_ids() {
        assert_ne!(AnnotationStore::new().id(), AnnotationStore::new().id());
    }
}
