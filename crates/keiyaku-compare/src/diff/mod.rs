// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Diff module — line-level opcodes and the character-level pass run inside
// replaced line runs.

pub mod chars;
pub mod opcodes;

pub use chars::{LinePairDiff, MarkerStyle, diff_line_pair};
pub use opcodes::{DiffOpcode, OpTag, line_opcodes, opcodes, verify_opcodes};
