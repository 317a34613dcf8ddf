// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Report types returned by the service layer, and their terminal rendering.

use chrono::{DateTime, Utc};
use keiyaku_compare::Comparison;
use keiyaku_core::{ExtractionResult, HighlightSegment, SegmentKind};
use serde::Serialize;
use uuid::Uuid;

/// Left column width used by the side-by-side view, in characters.
const COLUMN_WIDTH: usize = 48;

#[derive(Debug, Clone, Serialize)]
pub struct ExtractionReport {
    pub request_id: Uuid,
    pub processed_at: DateTime<Utc>,
    pub file: String,
    pub char_count: usize,
    #[serde(flatten)]
    pub result: ExtractionResult,
}

impl ExtractionReport {
    pub fn new(request_id: Uuid, file: impl Into<String>, result: ExtractionResult) -> Self {
        Self {
            request_id,
            processed_at: Utc::now(),
            file: file.into(),
            char_count: result.char_count(),
            result,
        }
    }

    /// Kind label, character count, then the text itself.
    pub fn render(&self) -> String {
        let mut out = format!(
            "File: {}\nKind: {}\nCharacters: {}\n",
            self.file, self.result.kind_label, self.char_count
        );
        if let Some(pages) = self.result.page_count {
            out.push_str(&format!("Pages: {pages}\n"));
        }
        out.push('\n');
        out.push_str(&self.result.raw_text);
        out
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ComparisonReport {
    pub request_id: Uuid,
    pub processed_at: DateTime<Utc>,
    pub file_a: String,
    pub file_b: String,
    pub kind_a: String,
    pub kind_b: String,
    #[serde(flatten)]
    pub comparison: Comparison,
}

impl ComparisonReport {
    /// Both highlight sequences side by side, one segment per row, with a
    /// one-character gutter: ` ` normal, `-` deleted, `+` inserted, `~` changed.
    pub fn render(&self) -> String {
        let summary = &self.comparison.summary;
        let mut out = format!(
            "A: {} ({})\nB: {} ({})\n{} equal, {} deleted, {} inserted, {}/{} changed\n\n",
            self.file_a,
            self.kind_a,
            self.file_b,
            self.kind_b,
            summary.equal_lines,
            summary.deleted_lines,
            summary.inserted_lines,
            summary.changed_left,
            summary.changed_right,
        );
        if self.comparison.is_identical() {
            out.push_str("No differences.\n");
        }

        let left = &self.comparison.left;
        let right = &self.comparison.right;
        for row in 0..left.len().max(right.len()) {
            let cell_a = left.get(row).map(cell).unwrap_or_default();
            let cell_b = right.get(row).map(cell).unwrap_or_default();
            let pad = COLUMN_WIDTH.saturating_sub(cell_a.chars().count());
            out.push_str(&format!("{cell_a}{} | {cell_b}\n", " ".repeat(pad)));
        }
        out
    }
}

fn gutter(kind: SegmentKind) -> char {
    match kind {
        SegmentKind::Normal => ' ',
        SegmentKind::Delete => '-',
        SegmentKind::Insert => '+',
        SegmentKind::Change => '~',
    }
}

fn cell(segment: &HighlightSegment) -> String {
    format!("{} {}", gutter(segment.kind), segment.content)
}
