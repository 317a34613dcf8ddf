// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Character-level diff of one line pair, with inline change markers.

use serde::{Deserialize, Serialize};

use super::opcodes::{OpTag, opcodes};

/// How changed characters are marked inside a line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MarkerStyle {
    /// `<span class="char-delete|char-insert|char-change">`. Text is not
    /// escaped; that is up to whatever renders the HTML.
    #[default]
    Html,
    /// `[-deleted-]`, `{+inserted+}`, `[~changed~]` for terminals.
    Plain,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Delete,
    Insert,
    Change,
}

impl MarkerStyle {
    fn push_marked(self, mark: Mark, text: &str, out: &mut String) {
        let (open, close) = match (self, mark) {
            (Self::Html, Mark::Delete) => (r#"<span class="char-delete">"#, "</span>"),
            (Self::Html, Mark::Insert) => (r#"<span class="char-insert">"#, "</span>"),
            (Self::Html, Mark::Change) => (r#"<span class="char-change">"#, "</span>"),
            (Self::Plain, Mark::Delete) => ("[-", "-]"),
            (Self::Plain, Mark::Insert) => ("{+", "+}"),
            (Self::Plain, Mark::Change) => ("[~", "~]"),
        };
        out.push_str(open);
        out.push_str(text);
        out.push_str(close);
    }
}

/// Marked-up versions of both lines of a pair. Either side may be empty.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinePairDiff {
    pub old: String,
    pub new: String,
}

/// Diff two lines character by character.
///
/// Equal runs are copied unmarked to both sides. Deleted characters appear
/// only in `old`, inserted ones only in `new`, and replaced runs are marked
/// as changed on both sides.
pub fn diff_line_pair(old: &str, new: &str, style: MarkerStyle) -> LinePairDiff {
    let old_chars: Vec<char> = old.chars().collect();
    let new_chars: Vec<char> = new.chars().collect();
    let slice = |chars: &[char], range: std::ops::Range<usize>| -> String {
        chars[range].iter().collect()
    };

    let mut out = LinePairDiff::default();
    for op in opcodes(&old_chars, &new_chars) {
        let removed = slice(&old_chars, op.source);
        let added = slice(&new_chars, op.target);
        match op.tag {
            OpTag::Equal => {
                out.old.push_str(&removed);
                out.new.push_str(&added);
            }
            OpTag::Delete => style.push_marked(Mark::Delete, &removed, &mut out.old),
            OpTag::Insert => style.push_marked(Mark::Insert, &added, &mut out.new),
            OpTag::Replace => {
                style.push_marked(Mark::Change, &removed, &mut out.old);
                style.push_marked(Mark::Change, &added, &mut out.new);
            }
        }
    }
    out
}
