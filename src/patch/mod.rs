//! Apply accepted hunks to the original text.
//!
//! Hunks were computed against the untouched original, but they are applied
//! one after another, so each placement first tries the recorded offset
//! (corrected by the net growth of hunks already applied) and then searches
//! outward from it within a bounded window. The outward search accepts an
//! exact match first and a whitespace-insensitive match second.

use crate::Hunk;
use crate::diff::split_lines;
use thiserror::Error;
use tracing::{debug, warn};

/// How many lines either side of the expected offset the fuzzy search visits.
pub const DEFAULT_FUZZ_WINDOW: usize = 32;

/// Errors raised before any hunk is applied.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatchError {
    #[error("hunk {index} starts at line {start}, before the previous hunk")]
    OutOfOrder { index: usize, start: usize },
    #[error("hunk {index} overlaps the previous hunk at line {start}")]
    Overlapping { index: usize, start: usize },
}

pub type Result<T> = std::result::Result<T, PatchError>;

/// Outcome of applying a list of hunks.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchResult {
    pub text: String,
    /// One flag per hunk, in the order they were given.
    pub applied: Vec<bool>,
}

impl PatchResult {
    pub fn attempted(&self) -> usize {
        self.applied.len()
    }

    pub fn failed(&self) -> usize {
        self.applied.iter().filter(|ok| !**ok).count()
    }

    pub fn succeeded(&self) -> usize {
        self.attempted() - self.failed()
    }
}

/// Places hunks onto text.
#[derive(Debug, Clone, Copy)]
pub struct PatchApplier {
    fuzz_window: usize,
}

impl Default for PatchApplier {
    fn default() -> Self {
        Self::new(DEFAULT_FUZZ_WINDOW)
    }
}

impl PatchApplier {
    pub fn new(fuzz_window: usize) -> Self {
        Self { fuzz_window }
    }

    /// Apply `hunks` to `original`.
    ///
    /// Hunks must be in ascending original order and must not overlap; the
    /// list is rejected as a whole otherwise. A hunk that cannot be placed is
    /// reported as failed and its region is left unchanged.
    pub fn apply(&self, original: &str, hunks: &[Hunk]) -> Result<PatchResult> {
        validate_order(hunks)?;

        let mut lines: Vec<String> = split_lines(original)
            .into_iter()
            .map(str::to_string)
            .collect();
        let mut applied = Vec::with_capacity(hunks.len());
        // Net line shift introduced by hunks placed so far.
        let mut delta: isize = 0;
        // Lines before the cursor were produced by earlier hunks and are never re-matched.
        let mut cursor = 0usize;

        for (index, hunk) in hunks.iter().enumerate() {
            let old = hunk.old_lines();
            let new = hunk.new_lines();
            let expected = (hunk.old_start as isize + delta).max(0) as usize;

            match self.locate(&lines, &old, expected, cursor) {
                Some(position) => {
                    lines.splice(
                        position..position + old.len(),
                        new.iter().map(|line| line.to_string()),
                    );
                    cursor = position + new.len();
                    delta = position as isize - hunk.old_start as isize + new.len() as isize
                        - old.len() as isize;
                    debug!(
                        hunk = index,
                        expected,
                        position,
                        header = %hunk.header(),
                        "applied hunk"
                    );
                    applied.push(true);
                }
                None => {
                    warn!(hunk = index, expected, header = %hunk.header(), "hunk did not match");
                    applied.push(false);
                }
            }
        }

        Ok(PatchResult {
            text: lines.concat(),
            applied,
        })
    }

    /// Find where `old` sits in `lines`, at or after `cursor`.
    fn locate(
        &self,
        lines: &[String],
        old: &[&str],
        expected: usize,
        cursor: usize,
    ) -> Option<usize> {
        let fits = |position: usize| position >= cursor && position + old.len() <= lines.len();
        let matches_at = |position: usize, eq: fn(&str, &str) -> bool| {
            fits(position)
                && lines[position..position + old.len()]
                    .iter()
                    .zip(old)
                    .all(|(have, want)| eq(have, want))
        };

        if matches_at(expected, exact) {
            return Some(expected);
        }

        let candidates: Vec<usize> = (1..=self.fuzz_window)
            .flat_map(|distance| [expected.checked_sub(distance), expected.checked_add(distance)])
            .flatten()
            .collect();

        if let Some(&position) = candidates.iter().find(|&&p| matches_at(p, exact)) {
            return Some(position);
        }
        std::iter::once(expected)
            .chain(candidates)
            .find(|&p| matches_at(p, loose))
    }
}

/// Apply hunks with the default fuzz window.
pub fn apply_hunks(original: &str, hunks: &[Hunk]) -> Result<PatchResult> {
    PatchApplier::default().apply(original, hunks)
}

fn validate_order(hunks: &[Hunk]) -> Result<()> {
    for (index, pair) in hunks.windows(2).enumerate() {
        let (prev, next) = (&pair[0], &pair[1]);
        if next.old_start < prev.old_start {
            return Err(PatchError::OutOfOrder {
                index: index + 1,
                start: next.old_start,
            });
        }
        if next.old_start < prev.old_end() {
            return Err(PatchError::Overlapping {
                index: index + 1,
                start: next.old_start,
            });
        }
    }
    Ok(())
}

fn exact(have: &str, want: &str) -> bool {
    have == want
}

/// Compare lines ignoring the amount and kind of whitespace inside the line.
/// Line terminators must still agree.
fn loose(have: &str, want: &str) -> bool {
    let (have_body, have_end) = split_terminator(have);
    let (want_body, want_end) = split_terminator(want);
    have_end == want_end && have_body.split_whitespace().eq(want_body.split_whitespace())
}

fn split_terminator(line: &str) -> (&str, &str) {
    if let Some(body) = line.strip_suffix("\r\n") {
        (body, "\r\n")
    } else if let Some(body) = line.strip_suffix('\n') {
        (body, "\n")
    } else {
        (line, "")
    }
}
