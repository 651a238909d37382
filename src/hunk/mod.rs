use crate::{EditOp, Hunk, HunkLine};

/// Lines of unchanged context kept on each side of a change.
pub const DEFAULT_CONTEXT_LINES: usize = 3;

/// A line of the edit script together with its position on both sides.
struct Entry<'a> {
    op: &'a EditOp,
    line: &'a str,
    old_idx: usize,
    new_idx: usize,
}

/// Group an edit script into context-padded hunks.
///
/// Changes separated by at most `2 * context` unchanged lines share a hunk.
/// Context is clipped at the start and end of the text. Hunks come out in
/// ascending original-line order.
pub fn build_hunks(ops: &[EditOp], context: usize) -> Vec<Hunk> {
    let entries = flatten(ops);
    let changes: Vec<usize> = entries
        .iter()
        .enumerate()
        .filter(|(_, entry)| !entry.op.is_equal())
        .map(|(i, _)| i)
        .collect();

    let Some(&first) = changes.first() else {
        return Vec::new();
    };

    let mut clusters: Vec<(usize, usize)> = Vec::new();
    let (mut start, mut end) = (first, first);
    for &change in &changes[1..] {
        if change - end - 1 <= 2 * context {
            end = change;
        } else {
            clusters.push((start, end));
            start = change;
            end = change;
        }
    }
    clusters.push((start, end));

    clusters
        .into_iter()
        .map(|(first_change, last_change)| {
            let lo = first_change.saturating_sub(context);
            let hi = (last_change + context + 1).min(entries.len());
            let lines = entries[lo..hi]
                .iter()
                .map(|entry| {
                    let line = entry.line.to_string();
                    match entry.op {
                        EditOp::Equal(_) => HunkLine::Context(line),
                        EditOp::Delete(_) => HunkLine::Delete(line),
                        EditOp::Insert(_) => HunkLine::Insert(line),
                    }
                })
                .collect();
            Hunk {
                old_start: entries[lo].old_idx,
                new_start: entries[lo].new_idx,
                lines,
            }
        })
        .collect()
}

fn flatten(ops: &[EditOp]) -> Vec<Entry<'_>> {
    let mut entries = Vec::new();
    let (mut old_idx, mut new_idx) = (0, 0);
    for op in ops {
        for line in op.lines() {
            entries.push(Entry {
                op,
                line,
                old_idx,
                new_idx,
            });
            match op {
                EditOp::Equal(_) => {
                    old_idx += 1;
                    new_idx += 1;
                }
                EditOp::Delete(_) => old_idx += 1,
                EditOp::Insert(_) => new_idx += 1,
            }
        }
    }
    entries
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::diff::diff_lines;

    fn numbered(range: std::ops::Range<usize>) -> String {
        range.map(|i| format!("line{i}\n")).collect()
    }

    #[test]
    fn no_changes_no_hunks() {
        assert!(build_hunks(&[], DEFAULT_CONTEXT_LINES).is_empty());
    }

    #[test]
    fn single_change_gets_clipped_context() {
        let ops = diff_lines("a\nb\nc\n", "a\nx\nc\n");
        let hunks = build_hunks(&ops, DEFAULT_CONTEXT_LINES);
        assert_eq!(hunks.len(), 1);

        let hunk = &hunks[0];
        assert_eq!(hunk.old_start, 0);
        assert_eq!(hunk.old_lines(), vec!["a\n", "b\n", "c\n"]);
        assert_eq!(hunk.new_lines(), vec!["a\n", "x\n", "c\n"]);
    }

    #[test]
    fn context_is_limited_on_both_sides() {
        let original = numbered(0..20);
        let target = original.replace("line10\n", "changed\n");
        let hunks = build_hunks(&diff_lines(&original, &target), 3);

        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].old_start, 7);
        assert_eq!(hunks[0].old_count(), 7);
        assert_eq!(hunks[0].header(), "@@ -8,7 +8,7 @@");
    }

    #[test]
    fn nearby_changes_share_a_hunk() {
        let original = numbered(0..30);
        // Six unchanged lines between the edits: exactly 2 * context.
        let target = original
            .replace("line10\n", "ten\n")
            .replace("line17\n", "seventeen\n");
        let hunks = build_hunks(&diff_lines(&original, &target), 3);
        assert_eq!(hunks.len(), 1);
        assert_eq!(hunks[0].old_start, 7);
        assert_eq!(hunks[0].old_end(), 21);
    }

    #[test]
    fn distant_changes_get_separate_hunks() {
        let original = numbered(0..40);
        let target = original
            .replace("line5\n", "five\n")
            .replace("line30\n", "thirty\n");
        let hunks = build_hunks(&diff_lines(&original, &target), 3);

        assert_eq!(hunks.len(), 2);
        assert!(hunks[0].old_end() <= hunks[1].old_start);
        assert_eq!(hunks[1].old_start, 27);
    }

    #[test]
    fn zero_context_keeps_only_changed_lines() {
        let ops = diff_lines("a\nb\nc\n", "a\nx\nc\n");
        let hunks = build_hunks(&ops, 0);
        assert_eq!(hunks[0].old_start, 1);
        assert_eq!(
            hunks[0].lines,
            vec![
                HunkLine::Delete("b\n".to_string()),
                HunkLine::Insert("x\n".to_string())
            ]
        );
    }

    #[test]
    fn new_start_tracks_earlier_insertions() {
        let original = numbered(0..40);
        let target = format!("new0\nnew1\n{}", original.replace("line30\n", "thirty\n"));
        let hunks = build_hunks(&diff_lines(&original, &target), 3);

        assert_eq!(hunks.len(), 2);
        assert_eq!(hunks[1].old_start, 27);
        assert_eq!(hunks[1].new_start, 29);
    }
}
