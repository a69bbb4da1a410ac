//! Last-approved snapshots of node pairs
//!
//! Both nodes of a pair point at one shared entry, so either side can read
//! the content the other side had when the pair was last agreed.

use super::{NodeKey, Side};
use crate::chunked::ChunkedText;
use crate::model::NodeId;
use std::collections::{HashMap, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PairId(u64);

/// Content of both nodes at the last approval
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LastApproved {
    pub first: ChunkedText,
    pub second: ChunkedText,
}

impl LastApproved {
    pub fn get(&self, side: Side) -> &ChunkedText {
        match side {
            Side::First => &self.first,
            Side::Second => &self.second,
        }
    }
}

#[derive(Debug, Default)]
pub struct ApprovalTable {
    pairs: HashMap<PairId, LastApproved>,
    by_node: HashMap<NodeKey, PairId>,
    next_id: u64,
}

impl ApprovalTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the current contents of a node pair as agreed
    pub fn store_pair(&mut self, first: NodeId, second: NodeId, snapshot: LastApproved) -> PairId {
        let first = NodeKey::new(Side::First, first);
        let second = NodeKey::new(Side::Second, second);
        for key in [first, second] {
            if let Some(old) = self.by_node.remove(&key) {
                self.release(old);
            }
        }
        let id = PairId(self.next_id);
        self.next_id += 1;
        self.pairs.insert(id, snapshot);
        self.by_node.insert(first, id);
        self.by_node.insert(second, id);
        id
    }

    /// Drop a pair entry once no node refers to it
    fn release(&mut self, id: PairId) {
        if !self.by_node.values().any(|pair| *pair == id) {
            self.pairs.remove(&id);
        }
    }

    /// Forget nodes for which `attached` is false and release entries no node
    /// refers to any more
    ///
    /// # Returns
    ///
    /// The number of released entries.
    pub fn retain_nodes<F: Fn(NodeKey) -> bool>(&mut self, attached: F) -> usize {
        self.by_node.retain(|key, _| attached(*key));
        let used: HashSet<PairId> = self.by_node.values().copied().collect();
        let before = self.pairs.len();
        self.pairs.retain(|id, _| used.contains(id));
        before - self.pairs.len()
    }

    pub fn pair_of(&self, key: NodeKey) -> Option<PairId> {
        self.by_node.get(&key).copied()
    }

    pub fn get(&self, id: PairId) -> Option<&LastApproved> {
        self.pairs.get(&id)
    }

    /// The node's side of its last approved pair; empty for nodes never approved
    pub fn last_approved(&self, key: NodeKey) -> ChunkedText {
        self.pair_of(key)
            .and_then(|id| self.pairs.get(&id))
            .map(|pair| pair.get(key.side).clone())
            .unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.pairs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }
}
