// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// keiyaku-compare — Normalization and two-level diffing of extracted text.
//
// Raw text is canonicalized into one sentence or article heading per line,
// lines are aligned with LCS opcodes, and replaced lines get a nested
// character-level diff with inline markers.

pub mod compare;
pub mod diff;
pub mod normalize;

pub use compare::{Comparison, ComparisonSummary, compare_lines, compare_texts};
pub use diff::{
    DiffOpcode, LinePairDiff, MarkerStyle, OpTag, diff_line_pair, line_opcodes, opcodes,
    verify_opcodes,
};
pub use normalize::normalize;
