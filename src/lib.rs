pub mod cli;
pub mod compare;
pub mod config;
pub mod diff;
pub mod hunk;
pub mod patch;
pub mod render;
pub mod review;
pub mod stats;
pub mod store;
pub mod tree;

use std::path::{Path, PathBuf};

/// One run of lines in an edit script.
///
/// Every line keeps its trailing `\n` (the last line of a file may not have one),
/// so concatenating lines reproduces the text byte for byte.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditOp {
    Equal(Vec<String>),
    Insert(Vec<String>),
    Delete(Vec<String>),
}

impl EditOp {
    pub fn lines(&self) -> &[String] {
        match self {
            EditOp::Equal(lines) | EditOp::Insert(lines) | EditOp::Delete(lines) => lines,
        }
    }

    pub fn is_equal(&self) -> bool {
        matches!(self, EditOp::Equal(_))
    }
}

/// Rebuild the original text from an edit script (Equal + Delete runs).
pub fn old_text(ops: &[EditOp]) -> String {
    ops.iter()
        .filter(|op| !matches!(op, EditOp::Insert(_)))
        .flat_map(|op| op.lines().iter().map(String::as_str))
        .collect()
}

/// Rebuild the target text from an edit script (Equal + Insert runs).
pub fn new_text(ops: &[EditOp]) -> String {
    ops.iter()
        .filter(|op| !matches!(op, EditOp::Delete(_)))
        .flat_map(|op| op.lines().iter().map(String::as_str))
        .collect()
}

/// A single line inside a hunk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HunkLine {
    Context(String),
    Delete(String),
    Insert(String),
}

/// A contiguous, context-padded unit of change.
///
/// `old_start` and `new_start` are 0-based line indices into the original and
/// target texts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hunk {
    pub old_start: usize,
    pub new_start: usize,
    pub lines: Vec<HunkLine>,
}

impl Hunk {
    /// The original-text slice this hunk replaces (context + deletions).
    pub fn old_lines(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter_map(|line| match line {
                HunkLine::Context(s) | HunkLine::Delete(s) => Some(s.as_str()),
                HunkLine::Insert(_) => None,
            })
            .collect()
    }

    /// The replacement slice (context + insertions).
    pub fn new_lines(&self) -> Vec<&str> {
        self.lines
            .iter()
            .filter_map(|line| match line {
                HunkLine::Context(s) | HunkLine::Insert(s) => Some(s.as_str()),
                HunkLine::Delete(_) => None,
            })
            .collect()
    }

    pub fn old_count(&self) -> usize {
        self.old_lines().len()
    }

    pub fn new_count(&self) -> usize {
        self.new_lines().len()
    }

    /// One past the last original line covered by this hunk.
    pub fn old_end(&self) -> usize {
        self.old_start + self.old_count()
    }

    /// Unified diff header, 1-based like `git diff`.
    pub fn header(&self) -> String {
        format!(
            "@@ -{} +{} @@",
            format_range(self.old_start, self.old_count()),
            format_range(self.new_start, self.new_count())
        )
    }
}

fn format_range(start: usize, count: usize) -> String {
    // An empty range points at the line before it, as in unified diffs.
    let first = if count == 0 { start } else { start + 1 };
    if count == 1 {
        format!("{first}")
    } else {
        format!("{first},{count}")
    }
}

/// Answer to a single review prompt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewDecision {
    Accept,
    Reject,
    Abort,
}

/// One side of a comparison.
///
/// Content is loaded on demand, only after a byte-level inequality is known.
#[derive(Debug, Clone)]
pub struct FileRef {
    pub path: PathBuf,
    pub content: Option<String>,
    pub auto_patch: bool,
}

impl FileRef {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            content: None,
            auto_patch: false,
        }
    }

    pub fn with_auto_patch(mut self, auto_patch: bool) -> Self {
        self.auto_patch = auto_patch;
        self
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

/// Two files that share a relative path (or the two CLI arguments).
#[derive(Debug, Clone)]
pub struct FilePair {
    /// Relative key in tree mode; the first path's display form otherwise.
    pub key: String,
    /// Destination: the file that gets rewritten.
    pub original: FileRef,
    /// Source of the desired changes.
    pub desired: FileRef,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn header_uses_one_based_ranges() {
        let hunk = Hunk {
            old_start: 0,
            new_start: 0,
            lines: vec![
                HunkLine::Context("a\n".to_string()),
                HunkLine::Delete("b\n".to_string()),
                HunkLine::Insert("x\n".to_string()),
                HunkLine::Context("c\n".to_string()),
            ],
        };
        assert_eq!(hunk.header(), "@@ -1,3 +1,3 @@");
        assert_eq!(hunk.old_end(), 3);
    }

    #[test]
    fn header_for_insertion_into_empty_text() {
        let hunk = Hunk {
            old_start: 0,
            new_start: 0,
            lines: vec![HunkLine::Insert("only\n".to_string())],
        };
        assert_eq!(hunk.header(), "@@ -0,0 +1 @@");
    }

    #[test]
    fn old_and_new_text_replay_script() {
        let ops = vec![
            EditOp::Equal(vec!["a\n".to_string()]),
            EditOp::Delete(vec!["b\n".to_string()]),
            EditOp::Insert(vec!["x\n".to_string()]),
        ];
        assert_eq!(old_text(&ops), "a\nb\n");
        assert_eq!(new_text(&ops), "a\nx\n");
    }
}
