// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Comparison pipeline — normalized lines in, two highlight sequences out.
//
// The line pass decides what is kept, dropped or added. Only `replace` runs
// get the character pass, pairing lines by position inside the run.

use keiyaku_core::{HighlightSegment, KeiyakuError, SegmentKind};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::diff::{MarkerStyle, OpTag, diff_line_pair, line_opcodes, verify_opcodes};
use crate::normalize::normalize;

/// Line counts for one comparison.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ComparisonSummary {
    /// Lines present unchanged on both sides.
    pub equal_lines: usize,
    /// Lines only in document A.
    pub deleted_lines: usize,
    /// Lines only in document B.
    pub inserted_lines: usize,
    /// `change` segments emitted on side A.
    pub changed_left: usize,
    /// `change` segments emitted on side B.
    pub changed_right: usize,
}

impl ComparisonSummary {
    fn record(&mut self, kind: SegmentKind, left: bool) {
        match (kind, left) {
            (SegmentKind::Normal, true) => self.equal_lines += 1,
            (SegmentKind::Normal, false) => {}
            (SegmentKind::Delete, _) => self.deleted_lines += 1,
            (SegmentKind::Insert, _) => self.inserted_lines += 1,
            (SegmentKind::Change, true) => self.changed_left += 1,
            (SegmentKind::Change, false) => self.changed_right += 1,
        }
    }
}

/// Both highlight sequences of a comparison, ready to render side by side.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Comparison {
    pub left: Vec<HighlightSegment>,
    pub right: Vec<HighlightSegment>,
    pub summary: ComparisonSummary,
}

impl Comparison {
    /// True when every line on both sides is `normal`.
    pub fn is_identical(&self) -> bool {
        self.left
            .iter()
            .chain(&self.right)
            .all(|segment| segment.kind == SegmentKind::Normal)
    }

    fn push_left(&mut self, kind: SegmentKind, content: impl Into<String>) {
        self.summary.record(kind, true);
        self.left.push(HighlightSegment::new(kind, content));
    }

    fn push_right(&mut self, kind: SegmentKind, content: impl Into<String>) {
        self.summary.record(kind, false);
        self.right.push(HighlightSegment::new(kind, content));
    }
}

/// Normalize two raw texts and compare the resulting lines.
pub fn compare_texts(a: &str, b: &str, style: MarkerStyle) -> Result<Comparison, KeiyakuError> {
    let lines_a = normalize(a);
    let lines_b = normalize(b);
    debug!(
        left_lines = lines_a.len(),
        right_lines = lines_b.len(),
        "normalized both texts"
    );
    compare_lines(&lines_a, &lines_b, style)
}

/// Compare two line sequences.
///
/// Fails with [`KeiyakuError::ComparisonFailed`] if the line opcodes do not
/// partition both inputs, which would otherwise drop or duplicate lines.
#[instrument(skip_all, fields(left = a.len(), right = b.len()))]
pub fn compare_lines<S: AsRef<str>>(
    a: &[S],
    b: &[S],
    style: MarkerStyle,
) -> Result<Comparison, KeiyakuError> {
    let ops = line_opcodes(a, b);
    let lines_a: Vec<&str> = a.iter().map(AsRef::as_ref).collect();
    let lines_b: Vec<&str> = b.iter().map(AsRef::as_ref).collect();
    verify_opcodes(&ops, &lines_a, &lines_b)?;

    let mut out = Comparison::default();
    for op in &ops {
        let old = &lines_a[op.source.clone()];
        let new = &lines_b[op.target.clone()];
        match op.tag {
            OpTag::Equal => {
                for (line_a, line_b) in old.iter().zip(new) {
                    out.push_left(SegmentKind::Normal, *line_a);
                    out.push_right(SegmentKind::Normal, *line_b);
                }
            }
            OpTag::Delete => {
                for line in old {
                    out.push_left(SegmentKind::Delete, *line);
                }
            }
            OpTag::Insert => {
                for line in new {
                    out.push_right(SegmentKind::Insert, *line);
                }
            }
            OpTag::Replace => {
                for k in 0..old.len().max(new.len()) {
                    let line_a = old.get(k).copied().unwrap_or_default();
                    let line_b = new.get(k).copied().unwrap_or_default();
                    let pair = diff_line_pair(line_a, line_b, style);
                    if !pair.old.is_empty() {
                        out.push_left(SegmentKind::Change, pair.old);
                    }
                    if !pair.new.is_empty() {
                        out.push_right(SegmentKind::Change, pair.new);
                    }
                }
            }
        }
    }

    info!(
        opcodes = ops.len(),
        equal = out.summary.equal_lines,
        deleted = out.summary.deleted_lines,
        inserted = out.summary.inserted_lines,
        changed_left = out.summary.changed_left,
        changed_right = out.summary.changed_right,
        "comparison complete"
    );
    Ok(out)
}
