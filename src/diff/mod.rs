//! Line-level text diffing.
//!
//! Lines are first mapped to integer tokens so the Myers search compares
//! cheap `usize` values instead of strings. The search itself is `similar`'s
//! linear-space Myers. A semantic cleanup pass afterwards folds short equal
//! runs that are sandwiched between edits into the surrounding change.

use crate::EditOp;
use similar::{Algorithm, DiffTag, capture_diff_slices};
use std::collections::HashMap;
use tracing::debug;

/// Split text into lines, keeping each line's terminating `\n`.
pub fn split_lines(text: &str) -> Vec<&str> {
    text.split_inclusive('\n').collect()
}

/// Compute a line-granular edit script turning `original` into `target`.
///
/// Identical inputs produce an empty script. The result is deterministic for
/// a given pair of texts.
pub fn diff_lines(original: &str, target: &str) -> Vec<EditOp> {
    if original == target {
        return Vec::new();
    }

    let old = split_lines(original);
    let new = split_lines(target);
    let (old_tokens, new_tokens) = tokenize(&old, &new);

    let mut runs = Runs::default();
    for op in capture_diff_slices(Algorithm::Myers, &old_tokens, &new_tokens) {
        let (tag, old_range, new_range) = op.as_tag_tuple();
        match tag {
            DiffTag::Equal => runs.extend(Kind::Equal, &old[old_range]),
            DiffTag::Delete => runs.extend(Kind::Delete, &old[old_range]),
            DiffTag::Insert => runs.extend(Kind::Insert, &new[new_range]),
            DiffTag::Replace => {
                runs.extend(Kind::Delete, &old[old_range]);
                runs.extend(Kind::Insert, &new[new_range]);
            }
        }
    }

    let runs = cleanup_semantic(merge(runs.0));
    debug!(
        old_lines = old.len(),
        new_lines = new.len(),
        runs = runs.len(),
        "computed line diff"
    );

    runs.into_iter().map(Run::into_op).collect()
}

/// Map every distinct line to a token, numbering in order of first appearance.
fn tokenize<'a>(old: &[&'a str], new: &[&'a str]) -> (Vec<usize>, Vec<usize>) {
    let mut table: HashMap<&'a str, usize> = HashMap::new();
    let mut intern = |line: &'a str| -> usize {
        let next = table.len();
        *table.entry(line).or_insert(next)
    };
    let old_tokens: Vec<usize> = old.iter().map(|&line| intern(line)).collect();
    let new_tokens: Vec<usize> = new.iter().map(|&line| intern(line)).collect();
    (old_tokens, new_tokens)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Kind {
    Equal,
    Insert,
    Delete,
}

#[derive(Debug, Clone)]
struct Run<'a> {
    kind: Kind,
    lines: Vec<&'a str>,
}

impl Run<'_> {
    fn into_op(self) -> EditOp {
        let lines = self.lines.into_iter().map(str::to_string).collect();
        match self.kind {
            Kind::Equal => EditOp::Equal(lines),
            Kind::Insert => EditOp::Insert(lines),
            Kind::Delete => EditOp::Delete(lines),
        }
    }
}

#[derive(Debug, Default)]
struct Runs<'a>(Vec<Run<'a>>);

impl<'a> Runs<'a> {
    fn extend(&mut self, kind: Kind, lines: &[&'a str]) {
        if lines.is_empty() {
            return;
        }
        match self.0.last_mut() {
            Some(last) if last.kind == kind => last.lines.extend_from_slice(lines),
            _ => self.0.push(Run {
                kind,
                lines: lines.to_vec(),
            }),
        }
    }
}

/// Collapse each stretch of edits between equalities into one Delete followed
/// by one Insert, and join neighbouring equalities.
fn merge(runs: Vec<Run<'_>>) -> Vec<Run<'_>> {
    let mut merged: Vec<Run<'_>> = Vec::with_capacity(runs.len());
    let mut deleted: Vec<&str> = Vec::new();
    let mut inserted: Vec<&str> = Vec::new();

    fn flush<'a>(
        merged: &mut Vec<Run<'a>>,
        deleted: &mut Vec<&'a str>,
        inserted: &mut Vec<&'a str>,
    ) {
        if !deleted.is_empty() {
            merged.push(Run {
                kind: Kind::Delete,
                lines: std::mem::take(deleted),
            });
        }
        if !inserted.is_empty() {
            merged.push(Run {
                kind: Kind::Insert,
                lines: std::mem::take(inserted),
            });
        }
    }

    for run in runs {
        if run.lines.is_empty() {
            continue;
        }
        match run.kind {
            Kind::Delete => deleted.extend(run.lines),
            Kind::Insert => inserted.extend(run.lines),
            Kind::Equal => {
                flush(&mut merged, &mut deleted, &mut inserted);
                match merged.last_mut() {
                    Some(last) if last.kind == Kind::Equal => last.lines.extend(run.lines),
                    _ => merged.push(run),
                }
            }
        }
    }
    flush(&mut merged, &mut deleted, &mut inserted);

    merged
}

/// Count deleted and inserted lines in the edit stretch yielded by `runs`,
/// stopping at the first equality.
fn edits_until_equal<'r, 'a: 'r>(runs: impl Iterator<Item = &'r Run<'a>>) -> (usize, usize) {
    let mut deleted = 0;
    let mut inserted = 0;
    for run in runs {
        match run.kind {
            Kind::Equal => break,
            Kind::Delete => deleted += run.lines.len(),
            Kind::Insert => inserted += run.lines.len(),
        }
    }
    (deleted, inserted)
}

/// Fold equalities that are no longer than the edits on both of their sides
/// into those edits. Repeats until nothing changes; every productive pass
/// removes at least one equality.
fn cleanup_semantic(mut runs: Vec<Run<'_>>) -> Vec<Run<'_>> {
    loop {
        let mut changed = false;
        let mut out: Vec<Run<'_>> = Vec::with_capacity(runs.len() + 1);

        for (i, run) in runs.iter().enumerate() {
            if run.kind == Kind::Equal && i > 0 && i + 1 < runs.len() {
                let (del_before, ins_before) = edits_until_equal(runs[..i].iter().rev());
                let (del_after, ins_after) = edits_until_equal(runs[i + 1..].iter());
                let len = run.lines.len();
                if len <= del_before.max(ins_before) && len <= del_after.max(ins_after) {
                    out.push(Run {
                        kind: Kind::Delete,
                        lines: run.lines.clone(),
                    });
                    out.push(Run {
                        kind: Kind::Insert,
                        lines: run.lines.clone(),
                    });
                    changed = true;
                    continue;
                }
            }
            out.push(run.clone());
        }

        runs = merge(out);
        if !changed {
            return runs;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{new_text, old_text};
    use proptest::prelude::*;

    fn lines(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn single_line_replacement() {
        let ops = diff_lines("a\nb\nc\n", "a\nx\nc\n");
        assert_eq!(
            ops,
            vec![
                EditOp::Equal(lines(&["a\n"])),
                EditOp::Delete(lines(&["b\n"])),
                EditOp::Insert(lines(&["x\n"])),
                EditOp::Equal(lines(&["c\n"])),
            ]
        );
    }

    #[test]
    fn identical_texts_give_empty_script() {
        assert!(diff_lines("same\ntext\n", "same\ntext\n").is_empty());
        assert!(diff_lines("", "").is_empty());
    }

    #[test]
    fn empty_original_is_insert_only() {
        let ops = diff_lines("", "a\nb\n");
        assert_eq!(ops, vec![EditOp::Insert(lines(&["a\n", "b\n"]))]);
    }

    #[test]
    fn empty_target_is_delete_only() {
        let ops = diff_lines("a\nb\n", "");
        assert_eq!(ops, vec![EditOp::Delete(lines(&["a\n", "b\n"]))]);
    }

    #[test]
    fn missing_trailing_newline_is_a_change() {
        let ops = diff_lines("a\nb\n", "a\nb");
        assert_eq!(
            ops,
            vec![
                EditOp::Equal(lines(&["a\n"])),
                EditOp::Delete(lines(&["b\n"])),
                EditOp::Insert(lines(&["b"])),
            ]
        );
    }

    #[test]
    fn pure_insertion_in_the_middle() {
        let ops = diff_lines("a\nc\n", "a\nb\nc\n");
        assert_eq!(
            ops,
            vec![
                EditOp::Equal(lines(&["a\n"])),
                EditOp::Insert(lines(&["b\n"])),
                EditOp::Equal(lines(&["c\n"])),
            ]
        );
    }

    #[test]
    fn short_equality_between_edits_is_folded() {
        let ops = diff_lines("a\nb\nc\nd\ne\n", "a\nB\nc\nD\ne\n");
        assert_eq!(
            ops,
            vec![
                EditOp::Equal(lines(&["a\n"])),
                EditOp::Delete(lines(&["b\n", "c\n", "d\n"])),
                EditOp::Insert(lines(&["B\n", "c\n", "D\n"])),
                EditOp::Equal(lines(&["e\n"])),
            ]
        );
    }

    #[test]
    fn long_equality_between_edits_is_kept() {
        let ops = diff_lines("a\n1\n2\n3\nb\n", "A\n1\n2\n3\nB\n");
        assert_eq!(ops.len(), 5);
        assert_eq!(ops[2], EditOp::Equal(lines(&["1\n", "2\n", "3\n"])));
    }

    #[test]
    fn deletions_come_before_insertions() {
        let ops = diff_lines("x\ny\n", "p\nq\n");
        assert_eq!(
            ops,
            vec![
                EditOp::Delete(lines(&["x\n", "y\n"])),
                EditOp::Insert(lines(&["p\n", "q\n"])),
            ]
        );
    }

    #[test]
    fn diff_is_deterministic() {
        let a = "one\ntwo\nthree\ntwo\none\n";
        let b = "two\none\nthree\none\ntwo\n";
        assert_eq!(diff_lines(a, b), diff_lines(a, b));
    }

    #[test]
    fn disjoint_rewrite_of_a_large_file() {
        let original: String = (0..5000).map(|i| format!("old {i}\n")).collect();
        let target: String = (0..5000).map(|i| format!("new {i}\n")).collect();

        let ops = diff_lines(&original, &target);
        assert_eq!(ops.len(), 2);
        assert!(matches!(&ops[0], EditOp::Delete(lines) if lines.len() == 5000));
        assert!(matches!(&ops[1], EditOp::Insert(lines) if lines.len() == 5000));
    }

    #[test]
    fn lone_carriage_return_stays_inside_its_line() {
        let ops = diff_lines("a\rb\nc\n", "a\rb\nd\n");
        assert_eq!(ops[0], EditOp::Equal(lines(&["a\rb\n"])));
    }

    proptest! {
        #[test]
        fn script_replays_both_sides(
            a in proptest::collection::vec("[abc]{0,2}\n?", 0..24),
            b in proptest::collection::vec("[abc]{0,2}\n?", 0..24),
        ) {
            let original: String = a.concat();
            let target: String = b.concat();
            let ops = diff_lines(&original, &target);
            prop_assert_eq!(old_text(&ops), original);
            prop_assert_eq!(new_text(&ops), target);
        }
    }
}
