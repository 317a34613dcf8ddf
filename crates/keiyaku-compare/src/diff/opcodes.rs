// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Edit opcodes over two sequences, computed with the `similar` crate's LCS
// algorithm. Adjacent delete + insert runs come back merged as `Replace`.

use std::hash::Hash;
use std::ops::Range;

use keiyaku_core::KeiyakuError;
use serde::{Deserialize, Serialize};
use similar::{Algorithm, DiffTag, capture_diff_slices};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OpTag {
    Equal,
    Delete,
    Insert,
    Replace,
}

/// One run of an edit script: `source[..]` of the old sequence turns into
/// `target[..]` of the new one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiffOpcode {
    pub tag: OpTag,
    pub source: Range<usize>,
    pub target: Range<usize>,
}

impl DiffOpcode {
    pub fn new(tag: OpTag, source: Range<usize>, target: Range<usize>) -> Self {
        Self { tag, source, target }
    }
}

/// Opcodes turning `old` into `new`.
///
/// The result partitions both sequences: source ranges are contiguous and
/// cover `old` exactly, target ranges likewise cover `new`. Every run of
/// changes between two equal runs is a single opcode (`Replace` when both
/// sides are non-empty). Deterministic for equal inputs.
pub fn opcodes<T: Eq + Hash + Ord>(old: &[T], new: &[T]) -> Vec<DiffOpcode> {
    let mut out = Vec::new();
    let (mut i, mut j) = (0, 0);
    // Start of the pending change run, if any.
    let mut pending: Option<(usize, usize)> = None;

    for op in capture_diff_slices(Algorithm::Lcs, old, new) {
        // `similar` leaves the untouched side's index stale on delete and
        // insert ops; only the lengths are used.
        let (tag, source, target) = op.as_tag_tuple();
        let (old_len, new_len) = (source.len(), target.len());
        if old_len == 0 && new_len == 0 {
            continue;
        }

        if tag == DiffTag::Equal {
            flush_change(&mut out, pending.take(), i, j);
            out.push(DiffOpcode::new(OpTag::Equal, i..i + old_len, j..j + new_len));
        } else {
            pending.get_or_insert((i, j));
        }
        i += old_len;
        j += new_len;
    }
    flush_change(&mut out, pending, i, j);
    out
}

/// Emit the change run from `start` up to the cursors `(i, j)`.
fn flush_change(out: &mut Vec<DiffOpcode>, start: Option<(usize, usize)>, i: usize, j: usize) {
    let Some((i0, j0)) = start else {
        return;
    };
    let tag = match (i > i0, j > j0) {
        (true, true) => OpTag::Replace,
        (true, false) => OpTag::Delete,
        (false, true) => OpTag::Insert,
        (false, false) => return,
    };
    out.push(DiffOpcode::new(tag, i0..i, j0..j));
}

/// Line-level opcodes.
pub fn line_opcodes<S: AsRef<str>>(old: &[S], new: &[S]) -> Vec<DiffOpcode> {
    let old: Vec<&str> = old.iter().map(AsRef::as_ref).collect();
    let new: Vec<&str> = new.iter().map(AsRef::as_ref).collect();
    opcodes(&old, &new)
}

/// Check that `ops` is a well-formed edit script from `old` to `new`.
///
/// Ranges must be contiguous from zero to the end of each sequence, tags
/// must agree with which side is empty, and `Equal` runs must hold equal
/// items.
pub fn verify_opcodes<T: PartialEq>(
    ops: &[DiffOpcode],
    old: &[T],
    new: &[T],
) -> Result<(), KeiyakuError> {
    let mut i = 0;
    let mut j = 0;

    for (index, op) in ops.iter().enumerate() {
        let fail = |what: &str| {
            Err(KeiyakuError::ComparisonFailed(format!(
                "opcode {index} ({:?} {:?} -> {:?}): {what}",
                op.tag, op.source, op.target
            )))
        };

        if op.source.start != i || op.target.start != j {
            return fail("ranges are not contiguous");
        }
        if op.source.end < op.source.start
            || op.target.end < op.target.start
            || op.source.end > old.len()
            || op.target.end > new.len()
        {
            return fail("range out of bounds");
        }

        let (source_len, target_len) = (op.source.len(), op.target.len());
        let shape_ok = match op.tag {
            OpTag::Equal => source_len == target_len && source_len > 0,
            OpTag::Delete => source_len > 0 && target_len == 0,
            OpTag::Insert => source_len == 0 && target_len > 0,
            OpTag::Replace => source_len > 0 && target_len > 0,
        };
        if !shape_ok {
            return fail("range lengths don't match the tag");
        }
        if op.tag == OpTag::Equal && old[op.source.clone()] != new[op.target.clone()] {
            return fail("equal run holds different items");
        }

        i = op.source.end;
        j = op.target.end;
    }

    if i != old.len() || j != new.len() {
        return Err(KeiyakuError::ComparisonFailed(format!(
            "opcodes cover {i} of {} source and {j} of {} target items",
            old.len(),
            new.len()
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reconstruct<'a>(ops: &[DiffOpcode], old: &[&'a str], new: &[&'a str]) -> (Vec<&'a str>, Vec<&'a str>) {
        let mut a = Vec::new();
        let mut b = Vec::new();
        for op in ops {
            a.extend_from_slice(&old[op.source.clone()]);
            b.extend_from_slice(&new[op.target.clone()]);
        }
        (a, b)
    }

    #[test]
    fn ranges_reconstruct_both_sides() {
        let old = ["第1条(総則)", "本契約は以下の通り。", "第2条(定義)", "削除される行。"];
        let new = ["前文。", "第1条(総則)", "本契約は以下のとおり。", "第2条(定義)"];
        let ops = line_opcodes(&old, &new);
        let (a, b) = reconstruct(&ops, &old, &new);
        assert_eq!(a, old);
        assert_eq!(b, new);
        verify_opcodes(&ops, &old, &new).unwrap();
    }

    #[test]
    fn repeated_lines_keep_ranges_contiguous() {
        let old = ["第1条(目的)", "甲は乙に委託する。", "甲は乙に委託する。"];
        let new = ["前文。", "第1条(目的)", "乙は受託する。", "乙は受託する。", "第1条(目的)"];
        let ops = line_opcodes(&old, &new);
        verify_opcodes(&ops, &old, &new).unwrap();
        let (a, b) = reconstruct(&ops, &old, &new);
        assert_eq!(a, old);
        assert_eq!(b, new);
    }

    #[test]
    fn every_short_pair_is_a_valid_script() {
        // All strings over a three-letter alphabet up to length four.
        let mut words = vec![String::new()];
        for _ in 0..4 {
            let longer: Vec<String> = words
                .iter()
                .filter(|w| w.len() == words.last().map_or(0, String::len))
                .flat_map(|w| ['a', 'b', 'c'].map(|c| format!("{w}{c}")))
                .collect();
            words.extend(longer);
        }
        assert_eq!(words.len(), 121);

        for a in &words {
            let old: Vec<char> = a.chars().collect();
            for b in &words {
                let new: Vec<char> = b.chars().collect();
                let ops = opcodes(&old, &new);
                if let Err(err) = verify_opcodes(&ops, &old, &new) {
                    panic!("{a:?} -> {b:?}: {err}");
                }
                // Change runs are maximal: two non-equal opcodes never touch.
                assert!(
                    ops.windows(2)
                        .all(|w| w[0].tag == OpTag::Equal || w[1].tag == OpTag::Equal),
                    "{a:?} -> {b:?}: {ops:?}"
                );
            }
        }
    }

    #[test]
    fn identical_input_is_one_equal_run() {
        let lines = ["a", "b", "c"];
        let ops = line_opcodes(&lines, &lines);
        assert_eq!(ops, vec![DiffOpcode::new(OpTag::Equal, 0..3, 0..3)]);
    }

    #[test]
    fn empty_inputs() {
        let empty: [&str; 0] = [];
        assert!(line_opcodes(&empty, &empty).is_empty());
        assert_eq!(
            line_opcodes(&empty, &["x"]),
            vec![DiffOpcode::new(OpTag::Insert, 0..0, 0..1)]
        );
        assert_eq!(
            line_opcodes(&["x"], &empty),
            vec![DiffOpcode::new(OpTag::Delete, 0..1, 0..0)]
        );
    }

    #[test]
    fn adjacent_delete_and_insert_merge_into_replace() {
        let old = ["same", "old"];
        let new = ["same", "new"];
        let ops = line_opcodes(&old, &new);
        assert_eq!(
            ops,
            vec![
                DiffOpcode::new(OpTag::Equal, 0..1, 0..1),
                DiffOpcode::new(OpTag::Replace, 1..2, 1..2),
            ]
        );
    }

    #[test]
    fn verify_rejects_gaps_and_bad_tags() {
        let old = ["a", "b"];
        let new = ["a", "c"];
        let gap = vec![DiffOpcode::new(OpTag::Equal, 0..1, 0..1)];
        assert!(matches!(
            verify_opcodes(&gap, &old, &new),
            Err(KeiyakuError::ComparisonFailed(_))
        ));

        let wrong_equal = vec![DiffOpcode::new(OpTag::Equal, 0..2, 0..2)];
        assert!(verify_opcodes(&wrong_equal, &old, &new).is_err());

        let bad_delete = vec![
            DiffOpcode::new(OpTag::Equal, 0..1, 0..1),
            DiffOpcode::new(OpTag::Delete, 1..2, 1..2),
        ];
        assert!(verify_opcodes(&bad_delete, &old, &new).is_err());
    }
}
