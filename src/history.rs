//! Joint edit history of a document pair
//!
//! Both documents are treated as one concatenated document, with one extra
//! item between them so that an insertion at the end of the first document
//! and one at the start of the second are distinguishable. Each transaction
//! on either document is recorded as a transaction over the concatenation.

use crate::annotation::StoreId;
use crate::error::{SyncError, SyncResult};
use crate::model::{Document, Operation, Transaction};
use tokio::sync::broadcast;

#[derive(Debug)]
pub struct JointHistory {
    store_id: StoreId,
    transactions: Vec<Transaction>,
    length1_at_index: Vec<usize>,
    length2_at_index: Vec<usize>,
    events: broadcast::Sender<Transaction>,
}

impl JointHistory {
    /// Start a history at the current state of both documents
    ///
    /// The documents must share one annotation store.
    pub fn new(doc1: &Document, doc2: &Document) -> SyncResult<Self> {
        if doc1.store_id() != doc2.store_id() {
            return Err(SyncError::structure("Documents must have the same store"));
        }
        let (events, _) = broadcast::channel(64);
        let mut initial = Transaction::default();
        initial.push_retain(doc1.len() + 1 + doc2.len());
        Ok(Self {
            store_id: doc1.store_id(),
            transactions: vec![initial],
            length1_at_index: vec![doc1.len()],
            length2_at_index: vec![doc2.len()],
            events,
        })
    }

    pub fn store_id(&self) -> StoreId {
        self.store_id
    }

    pub fn transactions(&self) -> &[Transaction] {
        &self.transactions
    }

    pub fn len(&self) -> usize {
        self.transactions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.transactions.is_empty()
    }

    /// Document lengths after the transaction at `index`
    pub fn lengths_at(&self, index: usize) -> Option<(usize, usize)> {
        Some((*self.length1_at_index.get(index)?, *self.length2_at_index.get(index)?))
    }

    fn current_lengths(&self) -> (usize, usize) {
        (
            self.length1_at_index.last().copied().unwrap_or_default(),
            self.length2_at_index.last().copied().unwrap_or_default(),
        )
    }

    /// New document lengths after applying a joint transaction
    pub fn length_diffs(tx: &Transaction, length1: usize, length2: usize) -> SyncResult<(usize, usize)> {
        let mut offset = 0;
        let mut diff1: isize = 0;
        let mut diff2: isize = 0;
        for op in &tx.operations {
            match op {
                Operation::Retain { length } => offset += length,
                Operation::Replace { remove, insert } => {
                    let delta = insert.len() as isize - remove.len() as isize;
                    if offset <= length1 {
                        if offset + remove.len() > length1 {
                            return Err(SyncError::structure("Replace over document boundary"));
                        }
                        diff1 += delta;
                    } else {
                        diff2 += delta;
                    }
                    offset += remove.len();
                }
                Operation::Attribute { .. } => {}
            }
        }
        Ok((
            (length1 as isize + diff1) as usize,
            (length2 as isize + diff2) as usize,
        ))
    }

    /// Record a joint transaction
    pub fn push_transaction(&mut self, tx: Transaction) -> SyncResult<()> {
        let (length1, length2) = self.current_lengths();
        let (length1, length2) = Self::length_diffs(&tx, length1, length2)?;
        self.length1_at_index.push(length1);
        self.length2_at_index.push(length2);
        self.append(tx);
        Ok(())
    }

    fn append(&mut self, tx: Transaction) {
        // Nobody listening is fine
        let _ = self.events.send(tx.clone());
        self.transactions.push(tx);
    }

    /// Record transactions already applied to the first and second document
    ///
    /// Each is padded with a retain over the other document and pushed on
    /// its own.
    pub fn push_transaction_pair(&mut self, tx1: Option<&Transaction>, tx2: Option<&Transaction>) -> SyncResult<()> {
        if let Some(tx1) = tx1 {
            let (_, length2) = self.current_lengths();
            let mut operations = tx1.operations.clone();
            operations.push(Operation::Retain { length: 1 + length2 });
            self.push_transaction(Transaction::new(operations))?;
        }
        if let Some(tx2) = tx2 {
            let (length1, _) = self.current_lengths();
            let mut operations = vec![Operation::Retain { length: 1 + length1 }];
            operations.extend(tx2.operations.iter().cloned());
            self.push_transaction(Transaction::new(operations))?;
        }
        Ok(())
    }

    /// Split the joint transaction at `index` back into its per-document pair
    ///
    /// At least one of the pair is a pure retain.
    pub fn pair_at(&self, index: usize) -> SyncResult<(Transaction, Transaction)> {
        let (length1, length2) = self
            .lengths_at(index)
            .ok_or_else(|| SyncError::structure(format!("No history entry {}", index)))?;
        let ops = &self.transactions[index].operations;
        let pure_retain = |length: usize| Transaction::new(vec![Operation::Retain { length }]);
        if index == 0 {
            return Ok((pure_retain(length1), pure_retain(length2)));
        }
        if let Some(Operation::Retain { length }) = ops.first() {
            if *length == length1 + 1 {
                return Ok((pure_retain(length1), Transaction::new(ops[1..].to_vec())));
            }
        }
        if let Some(Operation::Retain { length }) = ops.last() {
            if *length == length2 + 1 {
                return Ok((Transaction::new(ops[..ops.len() - 1].to_vec()), pure_retain(length2)));
            }
        }
        Err(SyncError::structure("Unexpected lack of retain"))
    }

    /// Receive every transaction appended from now on
    pub fn subscribe(&self) -> broadcast::Receiver<Transaction> {
        self.events.subscribe()
    }
}
