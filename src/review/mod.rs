//! Operator review of a file's diff and its hunks.
//!
//! A session moves through `Start → ReviewingDiff → (Declined | ReviewingHunks) → Done`.
//! The whole diff is shown once; accepting it either accepts every hunk
//! ([`ReviewMode::File`]) or walks the hunks one at a time
//! ([`ReviewMode::Hunks`]). Quitting at any prompt cancels the session.

use crate::ReviewDecision;
use serde::Deserialize;
use std::io::{self, BufRead, Write};
use std::path::Path;
use thiserror::Error;
use tracing::debug;

pub const DIFF_PROMPT: &str = "Review patches and apply them [y,n,q]? ";
pub const HUNK_PROMPT: &str = "Apply patch [y,n,q]? ";
pub const USAGE: &str = "y - patch this hunk
n - do not patch this hunk
q - quit; do not patch this hunk or any of the remaining ones
";

#[derive(Debug, Error)]
pub enum ReviewError {
    #[error("failed to read review decision: {0}")]
    Io(#[from] io::Error),
    #[error("input closed before a review decision was given")]
    InputClosed,
    #[error("canceled by user")]
    Cancelled,
}

pub type Result<T> = std::result::Result<T, ReviewError>;

/// Parse one answer. Case-insensitive; surrounding whitespace is ignored.
pub fn parse_decision(answer: &str) -> Option<ReviewDecision> {
    match answer.trim().to_lowercase().as_str() {
        "y" | "yes" => Some(ReviewDecision::Accept),
        "n" | "no" => Some(ReviewDecision::Reject),
        "q" | "quit" => Some(ReviewDecision::Abort),
        _ => None,
    }
}

/// Prompt I/O for a run: answers come from `input`, everything the operator
/// sees goes to `output`.
pub struct Console<R, W> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    pub fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    pub fn output(&mut self) -> &mut W {
        &mut self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Ask until a valid answer arrives.
    ///
    /// Invalid answers print the usage reminder and ask again. A closed input
    /// stream is an error since no decision can ever arrive.
    pub fn ask(&mut self, prompt: &str) -> Result<ReviewDecision> {
        let mut answer = String::new();
        loop {
            write!(self.output, "{prompt}")?;
            self.output.flush()?;

            answer.clear();
            if self.input.read_line(&mut answer)? == 0 {
                writeln!(self.output)?;
                return Err(ReviewError::InputClosed);
            }
            if let Some(decision) = parse_decision(&answer) {
                return Ok(decision);
            }
            debug!(answer = %answer.trim(), "invalid review answer");
            write!(self.output, "{USAGE}")?;
        }
    }
}

/// Granularity of acceptance once the whole diff is accepted.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ReviewMode {
    /// Accepting the diff leads to a prompt per hunk.
    #[default]
    Hunks,
    /// Accepting the diff accepts every hunk.
    #[serde(alias = "whole-file")]
    File,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReviewStage {
    Start,
    ReviewingDiff,
    Declined,
    ReviewingHunks,
    Done,
}

/// What a finished session decided.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ReviewOutcome {
    /// The file was skipped at the diff prompt.
    Declined,
    /// Indices (ascending) of the accepted hunks.
    Accepted(Vec<usize>),
}

/// Review of one file pair.
pub struct ReviewSession<'a> {
    original: &'a Path,
    desired: &'a Path,
    diff: &'a str,
    hunks: &'a [String],
    auto_patch: bool,
    mode: ReviewMode,
    stage: ReviewStage,
    decisions: Vec<ReviewDecision>,
}

impl<'a> ReviewSession<'a> {
    /// `diff` and `hunks` are already rendered for display.
    pub fn new(
        original: &'a Path,
        desired: &'a Path,
        diff: &'a str,
        hunks: &'a [String],
    ) -> Self {
        Self {
            original,
            desired,
            diff,
            hunks,
            auto_patch: false,
            mode: ReviewMode::default(),
            stage: ReviewStage::Start,
            decisions: Vec::with_capacity(hunks.len()),
        }
    }

    pub fn auto_patch(mut self, auto_patch: bool) -> Self {
        self.auto_patch = auto_patch;
        self
    }

    pub fn mode(mut self, mode: ReviewMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn stage(&self) -> ReviewStage {
        self.stage
    }

    /// Decisions given so far, one per reviewed hunk.
    pub fn decisions(&self) -> &[ReviewDecision] {
        &self.decisions
    }

    /// Drive the session to completion.
    ///
    /// Returns [`ReviewError::Cancelled`] when the operator quits; hunks not
    /// yet answered count as rejected.
    pub fn run<R: BufRead, W: Write>(
        &mut self,
        console: &mut Console<R, W>,
    ) -> Result<ReviewOutcome> {
        loop {
            self.stage = match self.stage {
                ReviewStage::Start => ReviewStage::ReviewingDiff,
                ReviewStage::ReviewingDiff => self.review_diff(console)?,
                ReviewStage::ReviewingHunks => self.review_hunks(console)?,
                ReviewStage::Declined => return Ok(ReviewOutcome::Declined),
                ReviewStage::Done => {
                    let accepted = self
                        .decisions
                        .iter()
                        .enumerate()
                        .filter(|(_, decision)| **decision == ReviewDecision::Accept)
                        .map(|(i, _)| i)
                        .collect();
                    return Ok(ReviewOutcome::Accepted(accepted));
                }
            };
        }
    }

    fn review_diff<R: BufRead, W: Write>(
        &mut self,
        console: &mut Console<R, W>,
    ) -> Result<ReviewStage> {
        let out = console.output();
        writeln!(
            out,
            "Applying diff to: {}, from: {}",
            self.original.display(),
            self.desired.display()
        )?;
        writeln!(out, "{}", self.diff)?;

        let decision = self.decide(console, DIFF_PROMPT)?;
        debug!(?decision, path = %self.original.display(), "diff decision");
        match decision {
            ReviewDecision::Accept => match self.mode {
                ReviewMode::Hunks => Ok(ReviewStage::ReviewingHunks),
                ReviewMode::File => {
                    self.decisions = vec![ReviewDecision::Accept; self.hunks.len()];
                    Ok(ReviewStage::Done)
                }
            },
            ReviewDecision::Reject => Ok(ReviewStage::Declined),
            ReviewDecision::Abort => Err(ReviewError::Cancelled),
        }
    }

    fn review_hunks<R: BufRead, W: Write>(
        &mut self,
        console: &mut Console<R, W>,
    ) -> Result<ReviewStage> {
        let hunks = self.hunks;
        let total = hunks.len();
        for (index, hunk) in hunks.iter().enumerate().skip(self.decisions.len()) {
            let out = console.output();
            writeln!(
                out,
                "Applying patch {}/{} to: {}",
                index + 1,
                total,
                self.original.display()
            )?;
            writeln!(out, "{hunk}")?;

            let decision = self.decide(console, HUNK_PROMPT)?;
            debug!(?decision, hunk = index, "hunk decision");
            if decision == ReviewDecision::Abort {
                return Err(ReviewError::Cancelled);
            }
            self.decisions.push(decision);
        }
        Ok(ReviewStage::Done)
    }

    fn decide<R: BufRead, W: Write>(
        &self,
        console: &mut Console<R, W>,
        prompt: &str,
    ) -> Result<ReviewDecision> {
        if self.auto_patch {
            writeln!(console.output(), "{prompt}AutoApplying")?;
            return Ok(ReviewDecision::Accept);
        }
        console.ask(prompt)
    }
}
