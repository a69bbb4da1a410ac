//! A document: linear data plus stable node ids
//!
//! Every opening element gets an id when it enters the document; the id
//! follows the element until it is removed. The tree is rebuilt from the
//! linear data on demand.

use super::data::{DataItem, NodeType, content_items};
use super::transaction::{Operation, Transaction};
use crate::annotation::StoreId;
use crate::chunked::ChunkedText;
use crate::error::{SyncError, SyncResult};
use crate::linear::LinearItem;
use serde_json::Value;
use std::ops::Range;

pub type NodeId = u64;

/// An element node of the tree, with the offsets of its open and close items
#[derive(Debug, Clone, PartialEq)]
pub struct Node {
    pub id: NodeId,
    pub node_type: NodeType,
    pub open: usize,
    pub close: usize,
    pub children: Vec<Node>,
}

impl Node {
    /// Offsets strictly between the open and close items
    pub fn inner(&self) -> Range<usize> {
        self.open + 1..self.close
    }

    pub fn outer(&self) -> Range<usize> {
        self.open..self.close + 1
    }

    pub fn is_content_branch(&self) -> bool {
        self.node_type.is_content_branch()
    }
}

/// An offset inside a node: linear within a content branch node, otherwise
/// counted in children
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PositionOffset {
    Linear(usize),
    Tree(usize),
}

/// A document offset expressed through the tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Position {
    /// Child indexes from the root to the deepest containing node
    pub path: Vec<usize>,
    /// Id of the deepest containing node, `None` for the root
    pub node: Option<NodeId>,
    pub offset: PositionOffset,
}

impl Position {
    pub fn is_content_branch(&self) -> bool {
        matches!(self.offset, PositionOffset::Linear(_))
    }
}

#[derive(Debug, Clone)]
pub struct Document {
    lang: String,
    store_id: StoreId,
    data: Vec<DataItem>,
    ids: Vec<Option<NodeId>>,
    next_id: NodeId,
}

impl Document {
    /// Create a document over well-formed data, sharing the annotation store `store_id`
    pub fn new(lang: &str, store_id: StoreId, data: Vec<DataItem>) -> SyncResult<Self> {
        check_well_formed(&data)?;
        let mut doc = Self {
            lang: lang.to_string(),
            store_id,
            data: Vec::new(),
            ids: Vec::new(),
            next_id: 1,
        };
        for item in &data {
            let id = doc.id_for(item);
            doc.ids.push(id);
        }
        doc.data = data;
        Ok(doc)
    }

    pub fn from_json(lang: &str, store_id: StoreId, value: Value) -> SyncResult<Self> {
        let data: Vec<DataItem> = serde_json::from_value(value)?;
        Self::new(lang, store_id, data)
    }

    pub fn lang(&self) -> &str {
        &self.lang
    }

    pub fn store_id(&self) -> StoreId {
        self.store_id
    }

    pub fn data(&self) -> &[DataItem] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    fn id_for(&mut self, item: &DataItem) -> Option<NodeId> {
        if !matches!(item, DataItem::Open(_)) {
            return None;
        }
        let id = self.next_id;
        self.next_id += 1;
        Some(id)
    }

    /// Apply a transaction
    ///
    /// The transaction must span the whole document, each removal must match
    /// the data it removes, and the result must be a well-formed tree.
    /// Nothing changes when validation fails.
    pub fn commit(&mut self, tx: &Transaction) -> SyncResult<()> {
        if tx.length_before() != self.data.len() {
            return Err(SyncError::invalid(format!(
                "Transaction spans {} items, document has {}",
                tx.length_before(),
                self.data.len()
            )));
        }
        // Attribute changes apply in place, before retains copy the element
        let mut source = self.data.clone();
        let mut offset = 0;
        for op in &tx.operations {
            match op {
                Operation::Retain { length } => offset += length,
                Operation::Replace { remove, .. } => offset += remove.len(),
                Operation::Attribute { key, from, to } => {
                    let Some(DataItem::Open(element)) = source.get_mut(offset) else {
                        return Err(SyncError::invalid(format!(
                            "Attribute change at {} is not on an opening element",
                            offset
                        )));
                    };
                    if element.attributes.get(key) != from.as_ref() {
                        return Err(SyncError::invalid(format!(
                            "Attribute {} at {} does not have the expected value",
                            key, offset
                        )));
                    }
                    match to {
                        Some(value) => element.attributes.insert(key.clone(), value.clone()),
                        None => element.attributes.remove(key),
                    };
                }
            }
        }

        let mut data = Vec::with_capacity(tx.length_after());
        let mut ids = Vec::with_capacity(tx.length_after());
        let mut next_id = self.next_id;
        let mut offset = 0;
        for op in &tx.operations {
            match op {
                Operation::Retain { length } => {
                    data.extend_from_slice(&source[offset..offset + length]);
                    ids.extend_from_slice(&self.ids[offset..offset + length]);
                    offset += length;
                }
                Operation::Replace { remove, insert } => {
                    if source[offset..offset + remove.len()] != remove[..] {
                        return Err(SyncError::invalid(format!(
                            "Removal at {} does not match document data",
                            offset
                        )));
                    }
                    offset += remove.len();
                    for item in insert {
                        ids.push(match item {
                            DataItem::Open(_) => {
                                next_id += 1;
                                Some(next_id - 1)
                            }
                            _ => None,
                        });
                        data.push(item.clone());
                    }
                }
                Operation::Attribute { .. } => {}
            }
        }
        check_well_formed(&data)?;
        self.data = data;
        self.ids = ids;
        self.next_id = next_id;
        Ok(())
    }

    /// The tree of element nodes under the root
    pub fn tree(&self) -> Vec<Node> {
        let mut stack: Vec<Node> = Vec::new();
        let mut roots = Vec::new();
        for (offset, item) in self.data.iter().enumerate() {
            match item {
                DataItem::Open(element) => stack.push(Node {
                    id: self.ids[offset].unwrap_or_default(),
                    node_type: element.node_type,
                    open: offset,
                    close: offset,
                    children: Vec::new(),
                }),
                DataItem::Close(_) => {
                    if let Some(mut node) = stack.pop() {
                        node.close = offset;
                        match stack.last_mut() {
                            Some(parent) => parent.children.push(node),
                            None => roots.push(node),
                        }
                    }
                }
                DataItem::Content(_) => {}
            }
        }
        roots
    }

    /// Content branch nodes in document order
    pub fn content_branch_nodes(&self) -> Vec<Node> {
        fn collect(nodes: &[Node], out: &mut Vec<Node>) {
            for node in nodes {
                if node.is_content_branch() {
                    out.push(node.clone());
                }
                collect(&node.children, out);
            }
        }
        let mut out = Vec::new();
        collect(&self.tree(), &mut out);
        out
    }

    pub fn node(&self, id: NodeId) -> Option<Node> {
        let offset = self.ids.iter().position(|item_id| *item_id == Some(id))?;
        self.node_at_offset(offset)
    }

    fn node_at_offset(&self, open: usize) -> Option<Node> {
        fn find(nodes: &[Node], open: usize) -> Option<&Node> {
            nodes.iter().find_map(|node| {
                if node.open == open {
                    Some(node)
                } else if node.open < open && open < node.close {
                    find(&node.children, open)
                } else {
                    None
                }
            })
        }
        find(&self.tree(), open).cloned()
    }

    /// The node reached by following child indexes from the root
    pub fn node_at_path(&self, path: &[usize]) -> Option<Node> {
        let mut nodes = self.tree();
        let mut found = None;
        for &index in path {
            let node = nodes.get(index)?.clone();
            nodes = node.children.clone();
            found = Some(node);
        }
        found
    }

    /// Child indexes from the root to `id`
    pub fn path_of(&self, id: NodeId) -> Option<Vec<usize>> {
        let node = self.node(id)?;
        Some(self.position_from_linear_offset(node.open + 1).path)
    }

    /// Content of a content branch node as linear data
    pub fn node_data(&self, id: NodeId) -> Option<Vec<LinearItem>> {
        let node = self.node(id)?;
        Some(
            self.data[node.inner()]
                .iter()
                .filter_map(DataItem::as_content)
                .cloned()
                .collect(),
        )
    }

    pub fn chunked(&self, id: NodeId) -> Option<ChunkedText> {
        self.node_data(id).map(|data| ChunkedText::from_linear_data(&data))
    }

    pub fn attribute(&self, id: NodeId, key: &str) -> Option<&Value> {
        let offset = self.ids.iter().position(|item_id| *item_id == Some(id))?;
        match &self.data[offset] {
            DataItem::Open(element) => element.attributes.get(key),
            _ => None,
        }
    }

    /// Transaction setting (or with `None`, removing) an attribute of a node
    pub fn attribute_transaction(&self, id: NodeId, key: &str, value: Option<Value>) -> SyncResult<Transaction> {
        let node = self.require_node(id)?;
        Ok(Transaction::attribute_change(&self.data, node.open, key, value))
    }

    /// Transaction replacing the whole content of a content branch node
    pub fn content_transaction(&self, id: NodeId, content: &[LinearItem]) -> SyncResult<Transaction> {
        let node = self.require_node(id)?;
        if !node.is_content_branch() {
            return Err(SyncError::structure(format!("Node {} is not a content branch node", id)));
        }
        Ok(Transaction::replacement(&self.data, node.inner(), content_items(content)))
    }

    fn require_node(&self, id: NodeId) -> SyncResult<Node> {
        self.node(id)
            .ok_or_else(|| SyncError::structure(format!("No node {} in {} document", id, self.lang)))
    }

    /// Describe a linear offset through the tree
    ///
    /// Inside a content branch node (between its open and close items,
    /// inclusive of the end) the offset is linear within the node; elsewhere
    /// it counts the children of the deepest containing node that end before it.
    pub fn position_from_linear_offset(&self, offset: usize) -> Position {
        let mut path = Vec::new();
        let mut node_id = None;
        let mut nodes = self.tree();
        loop {
            let Some((index, node)) = nodes
                .iter()
                .enumerate()
                .find(|(_, node)| node.open < offset && offset <= node.close)
            else {
                let before = nodes.iter().filter(|node| node.close < offset).count();
                return Position {
                    path,
                    node: node_id,
                    offset: PositionOffset::Tree(before),
                };
            };
            path.push(index);
            node_id = Some(node.id);
            if node.is_content_branch() {
                return Position {
                    path,
                    node: node_id,
                    offset: PositionOffset::Linear(offset - node.open - 1),
                };
            }
            nodes = node.children.clone();
        }
    }

    /// Build a position from a tree path and an offset within that node
    pub fn position_from_tree_path(&self, path: &[usize], offset: PositionOffset) -> SyncResult<Position> {
        let node = if path.is_empty() {
            None
        } else {
            Some(self.node_at_path(path).ok_or_else(|| {
                SyncError::structure(format!("No node at path {:?} in {} document", path, self.lang))
            })?)
        };
        Ok(Position {
            path: path.to_vec(),
            node: node.map(|n| n.id),
            offset,
        })
    }

    /// The linear offset a position refers to
    pub fn offset_from_position(&self, position: &Position) -> SyncResult<usize> {
        let (children, inner) = if position.path.is_empty() {
            (self.tree(), 0..self.data.len())
        } else {
            let node = self.node_at_path(&position.path).ok_or_else(|| {
                SyncError::structure(format!("No node at path {:?} in {} document", position.path, self.lang))
            })?;
            (node.children.clone(), node.inner())
        };
        match position.offset {
            PositionOffset::Linear(n) if n <= inner.len() => Ok(inner.start + n),
            PositionOffset::Tree(k) if k < children.len() => Ok(children[k].open),
            PositionOffset::Tree(k) if k == children.len() => Ok(inner.end),
            _ => Err(SyncError::structure(format!(
                "Offset {:?} out of range at path {:?}",
                position.offset, position.path
            ))),
        }
    }

    /// Child indexes from the root to the deepest node containing `offset`
    pub fn tree_path(&self, offset: usize) -> Vec<usize> {
        self.position_from_linear_offset(offset).path
    }

    /// Structure without content or attributes, e.g. `["list", "listItem", "/listItem", "/list"]`
    pub fn shape(&self) -> Vec<String> {
        self.data
            .iter()
            .filter_map(|item| match item {
                DataItem::Open(element) => Some(element.node_type.name().to_string()),
                DataItem::Close(node_type) => Some(format!("/{}", node_type.name())),
                DataItem::Content(_) => None,
            })
            .collect()
    }

    /// Plain text of each content branch node
    pub fn texts(&self) -> Vec<String> {
        self.content_branch_nodes()
            .iter()
            .filter_map(|node| self.chunked(node.id))
            .map(|chunked| chunked.all_text)
            .collect()
    }
}

fn check_well_formed(data: &[DataItem]) -> SyncResult<()> {
    let mut stack: Vec<NodeType> = Vec::new();
    for (offset, item) in data.iter().enumerate() {
        let parent_is_cbn = stack.last().is_some_and(|t| t.is_content_branch());
        match item {
            DataItem::Open(element) => {
                if parent_is_cbn {
                    return Err(SyncError::structure(format!(
                        "Element {} at {} inside a content branch node",
                        element.node_type.name(),
                        offset
                    )));
                }
                stack.push(element.node_type);
            }
            DataItem::Close(node_type) => {
                if stack.pop() != Some(*node_type) {
                    return Err(SyncError::structure(format!(
                        "Unbalanced close {} at {}",
                        node_type.name(),
                        offset
                    )));
                }
            }
            DataItem::Content(_) => {
                if !parent_is_cbn {
                    return Err(SyncError::structure(format!(
                        "Content at {} outside a content branch node",
                        offset
                    )));
                }
            }
        }
    }
    if let Some(open) = stack.last() {
        return Err(SyncError::structure(format!("Unclosed {}", open.name())));
    }
    Ok(())
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::annotation::AnnotationStore;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    /// `<ul><li><p>first</p></li><li><p>second</p></li></ul>`
    pub(crate) fn list_json(first: &str, second: &str) -> Value {
        let mut items = vec![json!({"type": "list"}), json!({"type": "listItem"}), json!({"type": "paragraph"})];
        items.extend(first.chars().map(|c| json!(c.to_string())));
        items.extend([json!({"type": "/paragraph"}), json!({"type": "/listItem"})]);
        items.extend([json!({"type": "listItem"}), json!({"type": "paragraph"})]);
        items.extend(second.chars().map(|c| json!(c.to_string())));
        items.extend([json!({"type": "/paragraph"}), json!({"type": "/listItem"}), json!({"type": "/list"})]);
        Value::Array(items)
    }

    pub(crate) fn paragraphs_json(texts: &[&str]) -> Value {
        let mut items = Vec::new();
        for text in texts {
            items.push(json!({"type": "paragraph"}));
            items.extend(text.chars().map(|c| json!(c.to_string())));
            items.push(json!({"type": "/paragraph"}));
        }
        Value::Array(items)
    }

    fn list_doc() -> Document {
        let store = AnnotationStore::new();
        Document::from_json("en", store.id(), list_json("cat", "dog")).unwrap()
    }

    // ========== Tree Tests ==========

    #[test]
    fn test_tree_offsets() {
        let doc = list_doc();
        let tree = doc.tree();
        assert_eq!(tree.len(), 1);
        assert_eq!(tree[0].outer(), 0..16);
        assert_eq!(tree[0].children[1].children[0].inner(), 10..13);
        assert_eq!(doc.texts(), vec!["cat", "dog"]);
        assert_eq!(doc.content_branch_nodes().len(), 2);
    }

    #[test]
    fn test_rejects_malformed() {
        let store = AnnotationStore::new();
        let unbalanced = json!([{"type": "paragraph"}, "a"]);
        assert!(Document::from_json("en", store.id(), unbalanced).is_err());
        let loose_text = json!(["a"]);
        assert!(Document::from_json("en", store.id(), loose_text).is_err());
        let nested = json!([{"type": "paragraph"}, {"type": "list"}, {"type": "/list"}, {"type": "/paragraph"}]);
        assert!(Document::from_json("en", store.id(), nested).is_err());
    }

    // ========== Position Tests ==========

    #[test]
    fn test_position_inside_content() {
        let doc = list_doc();
        let pos = doc.position_from_linear_offset(4);
        assert_eq!(pos.path, vec![0, 0, 0]);
        assert_eq!(pos.offset, PositionOffset::Linear(1));
        assert!(pos.is_content_branch());
        assert_eq!(doc.offset_from_position(&pos).unwrap(), 4);
    }

    #[test]
    fn test_position_at_content_end() {
        let doc = list_doc();
        let pos = doc.position_from_linear_offset(6);
        assert_eq!(pos.offset, PositionOffset::Linear(3));
    }

    #[test]
    fn test_position_between_nodes() {
        let doc = list_doc();
        let pos = doc.position_from_linear_offset(8);
        assert_eq!(pos.path, vec![0]);
        assert_eq!(pos.offset, PositionOffset::Tree(1));
        assert_eq!(doc.offset_from_position(&pos).unwrap(), 8);

        let end = doc.position_from_linear_offset(16);
        assert_eq!(end.path, Vec::<usize>::new());
        assert_eq!(end.offset, PositionOffset::Tree(1));
        assert_eq!(doc.offset_from_position(&end).unwrap(), 16);
    }

    #[test]
    fn test_position_from_tree_path() {
        let doc = list_doc();
        let pos = doc.position_from_tree_path(&[0, 1, 0], PositionOffset::Linear(2)).unwrap();
        assert_eq!(doc.offset_from_position(&pos).unwrap(), 12);
        assert!(doc.position_from_tree_path(&[0, 2], PositionOffset::Tree(0)).is_err());
        assert_eq!(doc.tree_path(12), vec![0, 1, 0]);
    }

    // ========== Commit Tests ==========

    #[test]
    fn test_commit_keeps_ids() {
        let mut doc = list_doc();
        let first = doc.content_branch_nodes()[0].id;
        let tx = Transaction::insertion(doc.data(), 6, vec![DataItem::Content(LinearItem::Plain('s'))]);
        doc.commit(&tx).unwrap();
        assert_eq!(doc.texts(), vec!["cats", "dog"]);
        assert_eq!(doc.content_branch_nodes()[0].id, first);
        assert_eq!(doc.path_of(first), Some(vec![0, 0, 0]));
    }

    #[test]
    fn test_commit_new_nodes_get_fresh_ids() {
        let mut doc = list_doc();
        let before: Vec<NodeId> = doc.content_branch_nodes().iter().map(|n| n.id).collect();
        let split = vec![
            DataItem::Close(NodeType::Paragraph),
            DataItem::Close(NodeType::ListItem),
            DataItem::open(NodeType::ListItem),
            DataItem::open(NodeType::Paragraph),
        ];
        doc.commit(&Transaction::insertion(doc.data(), 4, split)).unwrap();
        assert_eq!(doc.texts(), vec!["c", "at", "dog"]);
        let after: Vec<NodeId> = doc.content_branch_nodes().iter().map(|n| n.id).collect();
        assert_eq!(after[0], before[0]);
        assert_eq!(after[2], before[1]);
        assert!(!before.contains(&after[1]));
    }

    #[test]
    fn test_commit_rejects_mismatched_removal() {
        let mut doc = list_doc();
        let mut tx = Transaction::removal(doc.data(), 3..4);
        if let Operation::Replace { remove, .. } = &mut tx.operations[1] {
            remove[0] = DataItem::Content(LinearItem::Plain('x'));
        }
        assert!(matches!(doc.commit(&tx), Err(SyncError::InvalidTransaction(_))));
        assert_eq!(doc.texts(), vec!["cat", "dog"]);
    }

    #[test]
    fn test_commit_rejects_unbalanced_result() {
        let mut doc = list_doc();
        let tx = Transaction::removal(doc.data(), 2..3);
        assert!(matches!(doc.commit(&tx), Err(SyncError::Structure(_))));
    }

    #[test]
    fn test_attribute_commit() {
        let mut doc = list_doc();
        let id = doc.content_branch_nodes()[1].id;
        let tx = doc.attribute_transaction(id, "ll-dirty", Some(json!("mt"))).unwrap();
        doc.commit(&tx).unwrap();
        assert_eq!(doc.attribute(id, "ll-dirty"), Some(&json!("mt")));
        doc.commit(&tx.reversed()).unwrap();
        assert_eq!(doc.attribute(id, "ll-dirty"), None);
    }

    #[test]
    fn test_content_transaction() {
        let mut doc = list_doc();
        let id = doc.content_branch_nodes()[1].id;
        let tx = doc.content_transaction(id, &crate::linear::plain_data("perro")).unwrap();
        doc.commit(&tx).unwrap();
        assert_eq!(doc.texts(), vec!["cat", "perro"]);
        assert_eq!(doc.shape(), vec!["list", "listItem", "paragraph", "/paragraph", "/listItem", "listItem", "paragraph", "/paragraph", "/listItem", "/list"]);
    }
}
