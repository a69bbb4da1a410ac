/// Two-way synchronization of a pair of parallel documents
///
/// A [`Prism`] owns two documents in different languages that share one
/// annotation store and always have the same structure. Every edit to one
/// side is applied, its structure is mirrored onto the other side, and the
/// edited node pairs are queued for machine translation. Translation rounds
/// are throttled and run one at a time; their results are merged with any
/// human corrections already made to the target.
///
/// # Example
///
/// ```ignore
/// use parallel_translate::prism::{Prism, Side};
///
/// let mut prism = Prism::new(english, french, store, Some(translator), PrismConfig::default())?;
/// prism.apply(Side::First, edit)?;
/// prism.run_until_idle().await?;
/// println!("{:?}", prism.document(Side::Second).texts());
/// ```
pub mod approval;
pub mod dirty;
pub mod distort;
pub mod round;
pub mod scheduler;

pub use approval::{ApprovalTable, LastApproved, PairId};
pub use dirty::DirtyState;
pub use distort::{distort, touched_content_nodes};
pub use round::{PairOutcome, PairRequest, TranslationRound, Translations};
pub use scheduler::Scheduler;

use crate::adapt::{AdaptOptions, adapt_corrections_with};
use crate::annotation::AnnotationStore;
use crate::chunked::ChunkedText;
use crate::config::PrismConfig;
use crate::differ::{Diff3Chunk, Differ};
use crate::error::{SyncError, SyncResult};
use crate::history::JointHistory;
use crate::linear::{LinearItem, data_text};
use crate::model::{DIFF3_ATTRIBUTE, DIRTY_ATTRIBUTE, Document, NodeId, Transaction};
use crate::mt::{MtError, Translator};
use indexmap::IndexMap;
use std::collections::HashSet;
use std::sync::Arc;
use tokio::time::Instant;
use tracing::{debug, info, warn};

/// Which of the two documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Side {
    First,
    Second,
}

impl Side {
    pub fn other(self) -> Self {
        match self {
            Side::First => Side::Second,
            Side::Second => Side::First,
        }
    }

    fn index(self) -> usize {
        match self {
            Side::First => 0,
            Side::Second => 1,
        }
    }
}

/// A node of one of the two documents
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeKey {
    pub side: Side,
    pub node: NodeId,
}

impl NodeKey {
    pub fn new(side: Side, node: NodeId) -> Self {
        Self { side, node }
    }
}

/// What a translation round did
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RoundReport {
    /// Pairs whose target received a new translation
    pub committed: usize,
    /// Pairs whose source changed while translating; still pending
    pub stale: usize,
    /// Pairs the translator failed on; still pending
    pub failed: usize,
}

impl RoundReport {
    fn absorb(&mut self, other: RoundReport) {
        self.committed += other.committed;
        self.stale += other.stale;
        self.failed += other.failed;
    }
}

/// The three versions behind a conflict annotation
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConflictView {
    pub old_mt: String,
    pub correction: String,
    pub new_mt: String,
}

pub struct Prism {
    docs: [Document; 2],
    store: AnnotationStore,
    history: JointHistory,
    approvals: ApprovalTable,
    /// Source node to target node, in the order they were first edited
    pending: IndexMap<NodeKey, NodeKey>,
    translator: Option<Arc<dyn Translator>>,
    scheduler: Scheduler,
    differ: Differ,
    config: PrismConfig,
}

impl std::fmt::Debug for Prism {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Prism")
            .field("langs", &[self.docs[0].lang(), self.docs[1].lang()])
            .field("translator", &self.translator.as_ref().map(|t| t.name().to_string()))
            .field("pending", &self.pending.len())
            .field("history", &self.history.len())
            .field("config", &self.config)
            .finish()
    }
}

impl Prism {
    /// Pair two documents
    ///
    /// # Arguments
    /// * `first`, `second` - Documents built on `store`, with the same structure
    /// * `store` - The shared annotation store
    /// * `translator` - Backend for translation rounds; `None` leaves edits pending
    /// * `config` - Throttling and annotation settings
    ///
    /// # Returns
    /// The prism, with every content node pair recorded as approved as-is
    pub fn new(
        first: Document,
        second: Document,
        store: AnnotationStore,
        translator: Option<Arc<dyn Translator>>,
        config: PrismConfig,
    ) -> SyncResult<Self> {
        if first.store_id() != store.id() || second.store_id() != store.id() {
            return Err(SyncError::structure("Documents must use the prism's annotation store"));
        }
        let history = JointHistory::new(&first, &second)?;
        if first.shape() != second.shape() {
            return Err(SyncError::structure("Documents must have the same structure"));
        }
        let mut prism = Self {
            docs: [first, second],
            store,
            history,
            approvals: ApprovalTable::new(),
            pending: IndexMap::new(),
            translator,
            scheduler: Scheduler::new(config.throttle()),
            differ: Differ::default(),
            config,
        };
        prism.store_approved_pairs();
        Ok(prism)
    }

    fn store_approved_pairs(&mut self) {
        let first_nodes = self.docs[0].content_branch_nodes();
        let second_nodes = self.docs[1].content_branch_nodes();
        for (first, second) in first_nodes.iter().zip(&second_nodes) {
            let snapshot = LastApproved {
                first: self.docs[0].chunked(first.id).unwrap_or_default(),
                second: self.docs[1].chunked(second.id).unwrap_or_default(),
            };
            self.approvals.store_pair(first.id, second.id, snapshot);
        }
    }

    pub fn document(&self, side: Side) -> &Document {
        &self.docs[side.index()]
    }

    pub fn store(&self) -> &AnnotationStore {
        &self.store
    }

    /// The store, for building annotated content to edit with
    pub fn store_mut(&mut self) -> &mut AnnotationStore {
        &mut self.store
    }

    pub fn history(&self) -> &JointHistory {
        &self.history
    }

    pub fn config(&self) -> &PrismConfig {
        &self.config
    }

    pub fn set_translator(&mut self, translator: Option<Arc<dyn Translator>>) {
        self.translator = translator;
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    /// Pending (source, target) pairs, oldest first
    pub fn pending_pairs(&self) -> Vec<(NodeKey, NodeKey)> {
        self.pending.iter().map(|(source, target)| (*source, *target)).collect()
    }

    pub fn dirty_state(&self, side: Side, node: NodeId) -> Option<DirtyState> {
        DirtyState::from_value(self.document(side).attribute(node, DIRTY_ATTRIBUTE))
    }

    /// Content of a node when its pair was last approved
    pub fn last_approved(&self, side: Side, node: NodeId) -> ChunkedText {
        self.approvals.last_approved(NodeKey::new(side, node))
    }

    /// Whether the node is waiting for a human to confirm it
    pub fn can_clear_dirty(&self, side: Side, node: NodeId) -> bool {
        self.document(side).node(node).is_some_and(|n| n.is_content_branch())
            && DirtyState::needs_review(self.dirty_state(side, node))
    }

    /// The node at the same tree path in the other document
    pub fn counterpart(&self, side: Side, node: NodeId) -> SyncResult<NodeId> {
        let path = self
            .document(side)
            .path_of(node)
            .ok_or_else(|| SyncError::structure(format!("No node {} in {} document", node, self.document(side).lang())))?;
        self.document(side.other())
            .node_at_path(&path)
            .map(|n| n.id)
            .ok_or_else(|| SyncError::structure(format!("No counterpart for node {} at path {:?}", node, path)))
    }

    // ========== Edits ==========

    /// Apply a transaction to one side
    ///
    /// A no-echo transaction only changes that side. Any other transaction is
    /// distorted onto the other side, both are committed and recorded, and the
    /// content nodes it touched are queued for translation.
    pub fn apply(&mut self, side: Side, tx: Transaction) -> SyncResult<()> {
        if tx.no_echo {
            return self.commit_quiet(side, &tx);
        }
        let other = side.other();
        let distorted = distort(&tx, self.document(side), self.document(other))?;

        let backup = self.docs[side.index()].clone();
        self.docs[side.index()].commit(&tx)?;
        if let Err(err) = self.docs[other.index()].commit(&distorted) {
            self.docs[side.index()] = backup;
            return Err(err);
        }
        self.record(side, &tx)?;
        self.record(other, &distorted)?;
        let attached: [HashSet<NodeId>; 2] = [Side::First, Side::Second].map(|side| {
            self.document(side)
                .content_branch_nodes()
                .into_iter()
                .map(|node| node.id)
                .collect()
        });
        let released = self
            .approvals
            .retain_nodes(|key| attached[key.side.index()].contains(&key.node));
        if released > 0 {
            debug!(released, "Released approvals of removed nodes");
        }

        let mut pairs = Vec::new();
        for touched in touched_content_nodes(&tx, self.document(side)) {
            pairs.push((touched.id, self.counterpart(side, touched.id)?));
        }
        debug!(side = ?side, touched = pairs.len(), "Applied edit");
        self.flag_dirty(side, &pairs)?;
        self.scheduler.trigger(Instant::now());
        Ok(())
    }

    fn commit_quiet(&mut self, side: Side, tx: &Transaction) -> SyncResult<()> {
        self.docs[side.index()].commit(tx)?;
        self.record(side, tx)
    }

    fn record(&mut self, side: Side, tx: &Transaction) -> SyncResult<()> {
        match side {
            Side::First => self.history.push_transaction_pair(Some(tx), None),
            Side::Second => self.history.push_transaction_pair(None, Some(tx)),
        }
    }

    fn set_dirty(&mut self, key: NodeKey, state: Option<DirtyState>) -> SyncResult<()> {
        if self.dirty_state(key.side, key.node) == state {
            return Ok(());
        }
        let tx = self
            .document(key.side)
            .attribute_transaction(key.node, DIRTY_ATTRIBUTE, state.map(DirtyState::to_value))?
            .with_no_echo();
        self.commit_quiet(key.side, &tx)
    }

    fn set_diff3(&mut self, key: NodeKey, chunks: Option<&[Diff3Chunk]>) -> SyncResult<()> {
        let value = chunks.map(serde_json::to_value).transpose()?;
        if self.document(key.side).attribute(key.node, DIFF3_ATTRIBUTE) == value.as_ref() {
            return Ok(());
        }
        let tx = self
            .document(key.side)
            .attribute_transaction(key.node, DIFF3_ATTRIBUTE, value)?
            .with_no_echo();
        self.commit_quiet(key.side, &tx)
    }

    /// Update dirty states for edited pairs and queue them
    fn flag_dirty(&mut self, side: Side, pairs: &[(NodeId, NodeId)]) -> SyncResult<()> {
        for &(source_node, target_node) in pairs {
            let source = NodeKey::new(side, source_node);
            let target = NodeKey::new(side.other(), target_node);
            let source_state = self.dirty_state(side, source_node);
            let target_state = self.dirty_state(side.other(), target_node);
            if source_state == Some(DirtyState::Mt) {
                // A human touched machine output
                self.set_dirty(source, Some(DirtyState::Edited))?;
            } else if source_state != Some(DirtyState::Edited) && target_state != Some(DirtyState::Edited) {
                let changed = self.document(side).chunked(source_node) != Some(self.approvals.last_approved(source));
                let state = if changed { DirtyState::Mt } else { DirtyState::Approved };
                self.set_dirty(target, Some(state))?;
            }
            self.pending.insert(source, target);
        }
        Ok(())
    }

    // ========== Translation Rounds ==========

    /// When the next round is due, if any
    pub fn next_due(&self) -> Option<Instant> {
        self.scheduler.next_due()
    }

    /// Ask for a round, e.g. to retry pairs whose translation failed
    pub fn retry(&mut self) {
        if !self.pending.is_empty() {
            self.scheduler.trigger(Instant::now());
        }
    }

    /// Start a round: drop pairs that no longer qualify and snapshot the rest
    ///
    /// The round must be handed back to [`Prism::complete_round`].
    pub fn begin_round(&mut self) -> TranslationRound {
        self.scheduler.start(Instant::now());
        let mut requests = Vec::new();
        for (source, target) in self.pending_pairs() {
            let new_source = self.document(source.side).chunked(source.node);
            let current_target = self.document(target.side).chunked(target.node);
            let (Some(new_source), Some(current_target)) = (new_source, current_target) else {
                debug!(node = source.node, "Dropping detached pair");
                self.pending.shift_remove(&source);
                continue;
            };
            let source_state = self.dirty_state(source.side, source.node);
            let target_state = self.dirty_state(target.side, target.node);
            if DirtyState::needs_review(source_state) || target_state == Some(DirtyState::Edited) {
                debug!(node = source.node, ?source_state, ?target_state, "Pair awaits review");
                self.pending.shift_remove(&source);
                continue;
            }
            requests.push(PairRequest {
                source,
                target,
                source_lang: self.document(source.side).lang().to_string(),
                target_lang: self.document(target.side).lang().to_string(),
                old_source: self.approvals.last_approved(source),
                new_source,
                old_target: self.approvals.last_approved(target),
                current_target,
            });
        }
        if self.translator.is_none() && !requests.is_empty() {
            debug!(pairs = requests.len(), "No translator; pairs stay pending");
        }
        TranslationRound::new(self.translator.clone(), requests)
    }

    /// Commit the outcomes of a round against the documents as they are now
    ///
    /// Every successful, still current translation is committed. A failed
    /// translation keeps its pair pending and the first failure is returned
    /// after the rest of the round is committed.
    pub fn complete_round(&mut self, outcomes: Vec<PairOutcome>) -> SyncResult<RoundReport> {
        self.scheduler.finish();
        let mut report = RoundReport::default();
        let mut first_error: Option<MtError> = None;
        for PairOutcome { request, result } in outcomes {
            let translations = match result {
                Ok(translations) => translations,
                Err(err) => {
                    warn!(node = request.source.node, error = %err, "Translation failed");
                    report.failed += 1;
                    first_error.get_or_insert(err);
                    continue;
                }
            };
            let current = self.document(request.source.side).chunked(request.source.node);
            if current.as_ref() != Some(&request.new_source) {
                debug!(node = request.source.node, "Source changed while translating");
                report.stale += 1;
                continue;
            }
            let target_state = self.dirty_state(request.target.side, request.target.node);
            let target_now = self.document(request.target.side).chunked(request.target.node);
            if target_state == Some(DirtyState::Edited)
                || target_now.is_some_and(|target| target != request.current_target)
            {
                // Left pending; the next round drops it if it now awaits review
                debug!(node = request.target.node, ?target_state, "Target changed while translating");
                report.stale += 1;
                continue;
            }
            self.pending.shift_remove(&request.source);
            if self.document(request.target.side).node(request.target.node).is_none() {
                continue;
            }
            self.commit_translation(&request, translations)?;
            report.committed += 1;
        }
        info!(
            committed = report.committed,
            stale = report.stale,
            failed = report.failed,
            "Translation round complete"
        );
        match first_error {
            Some(err) => Err(err.into()),
            None => Ok(report),
        }
    }

    fn commit_translation(&mut self, request: &PairRequest, translations: Translations) -> SyncResult<()> {
        let chunks = self.differ.diff3(
            &translations.new_mt.to_linear_data(),
            &translations.old_mt.to_linear_data(),
            &request.old_target.to_linear_data(),
        );
        let options = AdaptOptions {
            annotate_sole_update: self.config.annotate_sole_update,
        };
        let content = adapt_corrections_with(&chunks, &mut self.store, options, |_| true);
        let target = request.target;
        let tx = self
            .document(target.side)
            .content_transaction(target.node, &content)?
            .with_no_echo();
        self.commit_quiet(target.side, &tx)?;

        let conflicted = chunks.iter().any(|chunk| chunk.is_conflict() && chunk.new != chunk.human);
        self.set_diff3(target, conflicted.then_some(chunks.as_slice()))?;
        info!(
            source_lang = %request.source_lang,
            target_lang = %request.target_lang,
            node = target.node,
            conflicted,
            "Committed machine translation"
        );
        Ok(())
    }

    /// Begin, translate and complete one round
    pub async fn maybe_translate(&mut self) -> SyncResult<RoundReport> {
        let round = self.begin_round();
        let outcomes = round.run().await;
        self.complete_round(outcomes)
    }

    /// Wait for the next due round, if any, and run it
    pub async fn flush(&mut self) -> SyncResult<RoundReport> {
        let Some(due) = self.next_due() else {
            return Ok(RoundReport::default());
        };
        tokio::time::sleep_until(due).await;
        self.maybe_translate().await
    }

    /// Run rounds until none is due
    pub async fn run_until_idle(&mut self) -> SyncResult<RoundReport> {
        let mut report = RoundReport::default();
        while self.next_due().is_some() {
            report.absorb(self.flush().await?);
        }
        Ok(report)
    }

    // ========== Review ==========

    /// Confirm a node as correct
    ///
    /// Strips update and conflict annotations, sets the dirty state to
    /// approved, drops any stored conflict and records the pair's current
    /// contents as the new last-approved snapshot. None of this is mirrored.
    pub fn mark_approved(&mut self, side: Side, node: NodeId) -> SyncResult<()> {
        let key = NodeKey::new(side, node);
        let content = self
            .document(side)
            .node_data(node)
            .ok_or_else(|| SyncError::structure(format!("No content node {}", node)))?;
        let stripped: Vec<LinearItem> = content
            .iter()
            .map(|item| {
                let kept = item
                    .annotations()
                    .iter()
                    .filter(|id| !self.store.is_sync_marker(id))
                    .cloned()
                    .collect();
                LinearItem::new(item.ch(), kept)
            })
            .collect();
        if stripped != content {
            let tx = self.document(side).content_transaction(node, &stripped)?.with_no_echo();
            self.commit_quiet(side, &tx)?;
        }
        self.set_dirty(key, Some(DirtyState::Approved))?;
        self.set_diff3(key, None)?;

        let counterpart = self.counterpart(side, node)?;
        let (first, second) = match side {
            Side::First => (node, counterpart),
            Side::Second => (counterpart, node),
        };
        let snapshot = LastApproved {
            first: self.docs[0].chunked(first).unwrap_or_default(),
            second: self.docs[1].chunked(second).unwrap_or_default(),
        };
        self.approvals.store_pair(first, second, snapshot);
        info!(side = ?side, node, "Marked approved");
        Ok(())
    }

    /// The versions behind conflict chunk `chunk_index` of a node
    pub fn render_conflict(&self, side: Side, node: NodeId, chunk_index: usize) -> SyncResult<Option<ConflictView>> {
        let Some(value) = self.document(side).attribute(node, DIFF3_ATTRIBUTE) else {
            return Ok(None);
        };
        let chunks: Vec<Diff3Chunk> = serde_json::from_value(value.clone())?;
        Ok(chunks.get(chunk_index).map(|chunk| {
            let old_mt = data_text(&chunk.old);
            ConflictView {
                correction: chunk.human.as_deref().map_or_else(|| old_mt.clone(), data_text),
                new_mt: chunk.new.as_deref().map_or_else(|| old_mt.clone(), data_text),
                old_mt,
            }
        }))
    }
}
