//! Distortion: mirroring the structure of an edit onto the sibling document
//!
//! Offsets are carried across through tree paths rather than raw offsets,
//! since the two documents hold different content. Inside a content branch
//! node, a retain runs greedily to the end of the node's content and a
//! replacement ends at the start of the corresponding node's content, so the
//! mirror edit never inserts content and only removes it together with
//! removed structure.

use crate::error::{SyncError, SyncResult};
use crate::model::{DIFF3_ATTRIBUTE, DIRTY_ATTRIBUTE, DataItem, Document, Node, Operation, PositionOffset, Transaction, strip_content};

/// Where a linear position inside a content branch node lands in the target
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Snap {
    ContentStart,
    ContentEnd,
}

/// Map an offset of `source` to the corresponding offset of `target`
fn map_offset(source: &Document, target: &Document, offset: usize, snap: Snap) -> SyncResult<usize> {
    let position = source.position_from_linear_offset(offset);
    let target_offset = match position.offset {
        PositionOffset::Linear(_) => {
            let node = target.node_at_path(&position.path).ok_or_else(|| {
                SyncError::structure(format!("No counterpart for node at path {:?}", position.path))
            })?;
            match snap {
                Snap::ContentStart => PositionOffset::Linear(0),
                Snap::ContentEnd => PositionOffset::Linear(node.inner().len()),
            }
        }
        tree @ PositionOffset::Tree(_) => tree,
    };
    let mapped = target.position_from_tree_path(&position.path, target_offset)?;
    target.offset_from_position(&mapped)
}

/// Adapt a transaction on `source` into a structure-only transaction on `target`
///
/// Both documents must be in their pre-commit state and have the same
/// structure. The result is flagged no-echo.
pub fn distort(tx: &Transaction, source: &Document, target: &Document) -> SyncResult<Transaction> {
    let mut distorted = Transaction::default();
    let mut source_offset = 0;
    let mut target_offset = 0;
    for op in &tx.operations {
        match op {
            Operation::Retain { length } => {
                let prior = target_offset;
                source_offset += length;
                target_offset = prior.max(map_offset(source, target, source_offset, Snap::ContentEnd)?);
                distorted.push_retain(target_offset - prior);
            }
            Operation::Replace { remove, insert } => {
                let prior = target_offset;
                source_offset += remove.len();
                // Greedy retains may already be past the mapped offset
                target_offset = prior.max(map_offset(source, target, source_offset, Snap::ContentStart)?);
                let removed = target
                    .data()
                    .get(prior..target_offset)
                    .ok_or_else(|| SyncError::structure("Distorted replacement beyond document end"))?;
                distorted.push_replace(removed.to_vec(), strip_content(insert));
            }
            Operation::Attribute { key, .. } if key == DIRTY_ATTRIBUTE || key == DIFF3_ATTRIBUTE => {}
            Operation::Attribute { key, to, .. } => {
                let from = match target.data().get(target_offset) {
                    Some(DataItem::Open(element)) => element.attributes.get(key).cloned(),
                    _ => None,
                };
                distorted.push_attribute(key, from, to.clone());
            }
        }
    }
    Ok(distorted.with_no_echo())
}

/// Content branch nodes of the committed `source` whose content `tx` touched
///
/// A node is touched when a replacement's inserted range meets its content
/// range, ends included, so insertions at a node's edges count.
pub fn touched_content_nodes(tx: &Transaction, source_after: &Document) -> Vec<Node> {
    let mut ranges = Vec::new();
    let mut offset = 0;
    for op in &tx.operations {
        match op {
            Operation::Retain { length } => offset += length,
            Operation::Replace { insert, .. } => {
                ranges.push((offset, offset + insert.len()));
                offset += insert.len();
            }
            Operation::Attribute { .. } => {}
        }
    }
    source_after
        .content_branch_nodes()
        .into_iter()
        .filter(|node| {
            ranges
                .iter()
                .any(|&(start, end)| node.open < end + 1 && start <= node.close)
        })
        .collect()
}
