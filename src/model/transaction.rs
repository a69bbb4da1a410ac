//! Transactions over document data
//!
//! A transaction walks the whole document: `Retain` skips items, `Replace`
//! swaps a run of items, `Attribute` changes an attribute of the opening
//! element at the current offset without moving it.

use super::data::DataItem;
use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum Operation {
    Retain {
        length: usize,
    },
    Replace {
        remove: Vec<DataItem>,
        insert: Vec<DataItem>,
    },
    Attribute {
        key: String,
        from: Option<Value>,
        to: Option<Value>,
    },
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Transaction {
    pub operations: Vec<Operation>,
    /// Committed as a mirror or engine update; must not be distorted back
    #[serde(default)]
    pub no_echo: bool,
}

impl Transaction {
    pub fn new(operations: Vec<Operation>) -> Self {
        Self {
            operations,
            no_echo: false,
        }
    }

    pub fn with_no_echo(mut self) -> Self {
        self.no_echo = true;
        self
    }

    /// Append a retain, merging with a preceding retain
    pub fn push_retain(&mut self, length: usize) {
        if length == 0 {
            return;
        }
        if let Some(Operation::Retain { length: last }) = self.operations.last_mut() {
            *last += length;
        } else {
            self.operations.push(Operation::Retain { length });
        }
    }

    pub fn push_replace(&mut self, remove: Vec<DataItem>, insert: Vec<DataItem>) {
        if remove.is_empty() && insert.is_empty() {
            return;
        }
        self.operations.push(Operation::Replace { remove, insert });
    }

    pub fn push_attribute(&mut self, key: &str, from: Option<Value>, to: Option<Value>) {
        self.operations.push(Operation::Attribute {
            key: key.to_string(),
            from,
            to,
        });
    }

    /// Insert `data` at `offset` of a document holding `doc_data`
    pub fn insertion(doc_data: &[DataItem], offset: usize, data: Vec<DataItem>) -> Self {
        Self::replacement(doc_data, offset..offset, data)
    }

    /// Remove `range` of a document holding `doc_data`
    pub fn removal(doc_data: &[DataItem], range: std::ops::Range<usize>) -> Self {
        Self::replacement(doc_data, range, Vec::new())
    }

    pub fn replacement(doc_data: &[DataItem], range: std::ops::Range<usize>, data: Vec<DataItem>) -> Self {
        let mut tx = Self::default();
        tx.push_retain(range.start);
        tx.push_replace(doc_data[range.clone()].to_vec(), data);
        tx.push_retain(doc_data.len() - range.end);
        tx
    }

    /// Change the attribute of the opening element at `offset`
    pub fn attribute_change(doc_data: &[DataItem], offset: usize, key: &str, to: Option<Value>) -> Self {
        let from = match doc_data.get(offset) {
            Some(DataItem::Open(element)) => element.attributes.get(key).cloned(),
            _ => None,
        };
        let mut tx = Self::default();
        tx.push_retain(offset);
        tx.push_attribute(key, from, to);
        tx.push_retain(doc_data.len() - offset);
        tx
    }

    /// Length of the document this transaction applies to
    pub fn length_before(&self) -> usize {
        self.operations
            .iter()
            .map(|op| match op {
                Operation::Retain { length } => *length,
                Operation::Replace { remove, .. } => remove.len(),
                Operation::Attribute { .. } => 0,
            })
            .sum()
    }

    /// Length of the document after this transaction
    pub fn length_after(&self) -> usize {
        self.operations
            .iter()
            .map(|op| match op {
                Operation::Retain { length } => *length,
                Operation::Replace { insert, .. } => insert.len(),
                Operation::Attribute { .. } => 0,
            })
            .sum()
    }

    /// The transaction that undoes this one
    pub fn reversed(&self) -> Self {
        let operations = self
            .operations
            .iter()
            .map(|op| match op {
                Operation::Retain { length } => Operation::Retain { length: *length },
                Operation::Replace { remove, insert } => Operation::Replace {
                    remove: insert.clone(),
                    insert: remove.clone(),
                },
                Operation::Attribute { key, from, to } => Operation::Attribute {
                    key: key.clone(),
                    from: to.clone(),
                    to: from.clone(),
                },
            })
            .collect();
        Self {
            operations,
            no_echo: self.no_echo,
        }
    }

    /// Whether the transaction only touches attributes
    pub fn is_attribute_only(&self) -> bool {
        self.operations
            .iter()
            .all(|op| !matches!(op, Operation::Replace { .. }))
    }
}
