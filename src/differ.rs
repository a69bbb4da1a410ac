//! Two-way and three-way diffs over linear data
//!
//! Diffs run on word tokens: token boundaries come from the plaintext, but
//! tokens compare as annotated data, so a change of formatting counts as a
//! change. Offsets are character offsets into the first sequence.

use crate::linear::{LinearItem, data_text};
use crate::tokens::word_char_ranges;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use similar::Algorithm;
use std::ops::Range;

/// One run of a two-way diff
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DiffOp {
    /// `data` is unchanged over `start..end`
    Retain {
        start: usize,
        end: usize,
        data: Vec<LinearItem>,
    },
    /// `remove` over `start..end` is replaced by `insert`
    Replace {
        start: usize,
        end: usize,
        remove: Vec<LinearItem>,
        insert: Vec<LinearItem>,
    },
}

impl DiffOp {
    pub fn start(&self) -> usize {
        match self {
            DiffOp::Retain { start, .. } | DiffOp::Replace { start, .. } => *start,
        }
    }

    pub fn end(&self) -> usize {
        match self {
            DiffOp::Retain { end, .. } | DiffOp::Replace { end, .. } => *end,
        }
    }

    pub fn is_replace(&self) -> bool {
        matches!(self, DiffOp::Replace { .. })
    }

    /// Net change in length this op causes
    fn delta(&self) -> isize {
        match self {
            DiffOp::Retain { .. } => 0,
            DiffOp::Replace { remove, insert, .. } => insert.len() as isize - remove.len() as isize,
        }
    }
}

/// One aligned span of a three-way diff
///
/// `old` is the ancestor's content. `new` and `human` are `None` when that
/// side left the span unchanged. Serializes as `[new, old, human]`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diff3Chunk {
    pub new: Option<Vec<LinearItem>>,
    pub old: Vec<LinearItem>,
    pub human: Option<Vec<LinearItem>>,
}

type RawDiff3Chunk = (Option<Vec<LinearItem>>, Vec<LinearItem>, Option<Vec<LinearItem>>);

impl Diff3Chunk {
    pub fn unchanged(old: Vec<LinearItem>) -> Self {
        Self {
            new: None,
            old,
            human: None,
        }
    }

    /// Whether both derived sides changed this span
    pub fn is_conflict(&self) -> bool {
        self.new.is_some() && self.human.is_some()
    }
}

impl Serialize for Diff3Chunk {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (&self.new, &self.old, &self.human).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for Diff3Chunk {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (new, old, human) = RawDiff3Chunk::deserialize(deserializer)?;
        Ok(Self { new, old, human })
    }
}

/// Which derived sequence a diff op came from
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
enum Origin {
    A,
    B,
}

/// A run of overlapping replacements in the ancestor
struct Cluster {
    start: usize,
    end: usize,
    /// `Some(origin)` while only one side touched the cluster, `None` once both have
    surface: Option<Origin>,
    a_delta: isize,
    b_delta: isize,
}

impl Cluster {
    fn new(op: &DiffOp, origin: Origin) -> Self {
        let mut cluster = Self {
            start: op.start(),
            end: op.end(),
            surface: Some(origin),
            a_delta: 0,
            b_delta: 0,
        };
        cluster.add_delta(op, origin);
        cluster
    }

    fn overlaps(&self, op: &DiffOp) -> bool {
        op.start() < self.end || op.start() == self.start
    }

    fn absorb(&mut self, op: &DiffOp, origin: Origin) {
        self.end = self.end.max(op.end());
        if self.surface != Some(origin) {
            self.surface = None;
        }
        self.add_delta(op, origin);
    }

    fn add_delta(&mut self, op: &DiffOp, origin: Origin) {
        match origin {
            Origin::A => self.a_delta += op.delta(),
            Origin::B => self.b_delta += op.delta(),
        }
    }

    fn touched_by(&self, origin: Origin) -> bool {
        self.surface.is_none() || self.surface == Some(origin)
    }
}

/// Token-level differ
#[derive(Debug, Clone, Copy)]
pub struct Differ {
    algorithm: Algorithm,
}

impl Default for Differ {
    fn default() -> Self {
        Self::new(Algorithm::Myers)
    }
}

impl Differ {
    pub fn new(algorithm: Algorithm) -> Self {
        Self { algorithm }
    }

    /// Diff two linear data sequences
    ///
    /// Returns alternating Retain/Replace runs; offsets refer to `a`.
    /// A whitespace-only Retain between two Replaces is folded into one
    /// Replace, so "big red" → "small blue" is one change, not two.
    pub fn diff(&self, a: &[LinearItem], b: &[LinearItem]) -> Vec<DiffOp> {
        let a_ranges = word_char_ranges(&data_text(a));
        let b_ranges = word_char_ranges(&data_text(b));
        let a_tokens: Vec<&[LinearItem]> = a_ranges.iter().map(|r| &a[r.clone()]).collect();
        let b_tokens: Vec<&[LinearItem]> = b_ranges.iter().map(|r| &b[r.clone()]).collect();

        let char_span = |ranges: &[Range<usize>], tokens: Range<usize>, len: usize| -> Range<usize> {
            let start = ranges.get(tokens.start).map_or(len, |r| r.start);
            let end = if tokens.end == 0 {
                start
            } else {
                ranges.get(tokens.end - 1).map_or(len, |r| r.end)
            };
            start..end.max(start)
        };

        // Positions come from running cursors: `similar` may report an
        // insertion's `old_index` ahead of the Equal run that precedes it.
        let mut ops: Vec<DiffOp> = Vec::new();
        let mut a_cursor = 0;
        let mut b_cursor = 0;
        for op in similar::capture_diff_slices(self.algorithm, &a_tokens, &b_tokens) {
            let (old_len, new_len, equal) = match op {
                similar::DiffOp::Equal { len, .. } => (len, len, true),
                similar::DiffOp::Delete { old_len, .. } => (old_len, 0, false),
                similar::DiffOp::Insert { new_len, .. } => (0, new_len, false),
                similar::DiffOp::Replace { old_len, new_len, .. } => (old_len, new_len, false),
            };
            let a_span = char_span(&a_ranges, a_cursor..a_cursor + old_len, a.len());
            let b_span = char_span(&b_ranges, b_cursor..b_cursor + new_len, b.len());
            a_cursor += old_len;
            b_cursor += new_len;
            push_coalesced(&mut ops, a, b, a_span, b_span, equal);
        }
        absorb_whitespace_retains(ops)
    }

    /// Three-way diff of `a` and `b` against their common ancestor `o`
    ///
    /// Replacements from both sides are merged into clusters of overlapping
    /// spans; a cluster touched by both sides is a conflict. Concatenating
    /// the `old` slots reproduces `o`.
    pub fn diff3(&self, a: &[LinearItem], o: &[LinearItem], b: &[LinearItem]) -> Vec<Diff3Chunk> {
        let mut tagged: Vec<(DiffOp, Origin)> = self
            .diff(o, a)
            .into_iter()
            .map(|op| (op, Origin::A))
            .chain(self.diff(o, b).into_iter().map(|op| (op, Origin::B)))
            .filter(|(op, _)| op.is_replace())
            .collect();
        tagged.sort_by_key(|(op, origin)| (op.start(), *origin));

        let mut clusters: Vec<Cluster> = Vec::new();
        for (op, origin) in &tagged {
            match clusters.last_mut() {
                Some(cluster) if cluster.overlaps(op) => cluster.absorb(op, *origin),
                _ => clusters.push(Cluster::new(op, *origin)),
            }
        }

        let mut chunks = Vec::new();
        let mut cursor = 0;
        let mut a_offset: isize = 0;
        let mut b_offset: isize = 0;
        for cluster in &clusters {
            if cursor < cluster.start {
                chunks.push(Diff3Chunk::unchanged(o[cursor..cluster.start].to_vec()));
            }
            let shifted = |offset: isize, delta: isize, data: &[LinearItem]| {
                let start = (cluster.start as isize + offset).max(0) as usize;
                let end = (cluster.end as isize + offset + delta).max(0) as usize;
                data[start.min(data.len())..end.clamp(start, data.len())].to_vec()
            };
            chunks.push(Diff3Chunk {
                new: cluster
                    .touched_by(Origin::A)
                    .then(|| shifted(a_offset, cluster.a_delta, a)),
                old: o[cluster.start..cluster.end].to_vec(),
                human: cluster
                    .touched_by(Origin::B)
                    .then(|| shifted(b_offset, cluster.b_delta, b)),
            });
            a_offset += cluster.a_delta;
            b_offset += cluster.b_delta;
            cursor = cluster.end;
        }
        if cursor < o.len() {
            chunks.push(Diff3Chunk::unchanged(o[cursor..].to_vec()));
        }
        chunks
    }
}

/// Append a span, merging it into the previous op when they have the same kind
fn push_coalesced(
    ops: &mut Vec<DiffOp>,
    a: &[LinearItem],
    b: &[LinearItem],
    a_span: Range<usize>,
    b_span: Range<usize>,
    equal: bool,
) {
    match (ops.last_mut(), equal) {
        (Some(DiffOp::Retain { end, data, .. }), true) => {
            data.extend_from_slice(&a[a_span.clone()]);
            *end = a_span.end;
        }
        (Some(DiffOp::Replace { end, remove, insert, .. }), false) => {
            remove.extend_from_slice(&a[a_span.clone()]);
            insert.extend_from_slice(&b[b_span]);
            *end = a_span.end;
        }
        (_, true) => ops.push(DiffOp::Retain {
            start: a_span.start,
            end: a_span.end,
            data: a[a_span].to_vec(),
        }),
        (_, false) => ops.push(DiffOp::Replace {
            start: a_span.start,
            end: a_span.end,
            remove: a[a_span].to_vec(),
            insert: b[b_span].to_vec(),
        }),
    }
}

/// Fold `Replace, whitespace Retain, Replace` into a single Replace
fn absorb_whitespace_retains(ops: Vec<DiffOp>) -> Vec<DiffOp> {
    let mut out: Vec<DiffOp> = Vec::with_capacity(ops.len());
    let mut iter = ops.into_iter().peekable();
    while let Some(op) = iter.next() {
        let is_gap = matches!(
            &op,
            DiffOp::Retain { data, .. } if !data.is_empty() && data.iter().all(|item| item.ch().is_whitespace())
        );
        let between_replaces = matches!(out.last(), Some(DiffOp::Replace { .. }))
            && matches!(iter.peek(), Some(DiffOp::Replace { .. }));
        if !(is_gap && between_replaces) {
            out.push(op);
            continue;
        }
        let DiffOp::Retain { data: gap, .. } = op else {
            continue;
        };
        let next = iter.next();
        if let (
            Some(DiffOp::Replace { end, remove, insert, .. }),
            Some(DiffOp::Replace { end: next_end, remove: next_remove, insert: next_insert, .. }),
        ) = (out.last_mut(), next)
        {
            remove.extend_from_slice(&gap);
            remove.extend(next_remove);
            insert.extend_from_slice(&gap);
            insert.extend(next_insert);
            *end = next_end;
        }
    }
    out
}

/// Diff with the default (Myers) differ
pub fn diff(a: &[LinearItem], b: &[LinearItem]) -> Vec<DiffOp> {
    Differ::default().diff(a, b)
}

/// Three-way diff with the default (Myers) differ
pub fn diff3(a: &[LinearItem], o: &[LinearItem], b: &[LinearItem]) -> Vec<Diff3Chunk> {
    Differ::default().diff3(a, o, b)
}
