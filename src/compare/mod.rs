//! Per-pair comparison pipeline and the run loop around it.
//!
//! Each pair goes through: byte-level equality check, load, diff, hunks,
//! review, apply, write. Pairs are handled strictly one after another.

use crate::config::Config;
use crate::diff::diff_lines;
use crate::hunk::{DEFAULT_CONTEXT_LINES, build_hunks};
use crate::patch::{DEFAULT_FUZZ_WINDOW, PatchApplier, PatchError};
use crate::render::Renderer;
use crate::review::{Console, ReviewError, ReviewMode, ReviewOutcome, ReviewSession};
use crate::stats::RunStats;
use crate::store::{FileStore, StoreError};
use crate::{FilePair, FileRef, Hunk};
use std::io::{self, BufRead, Write};
use thiserror::Error;
use tracing::{debug, error, info, warn};

#[derive(Debug, Error)]
pub enum CompareError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error(transparent)]
    Review(#[from] ReviewError),
    #[error(transparent)]
    Patch(#[from] PatchError),
}

impl CompareError {
    /// The operator asked to stop. Not a failure.
    pub fn is_cancelled(&self) -> bool {
        matches!(self, CompareError::Review(ReviewError::Cancelled))
    }

    /// No further pair can be reviewed after this error.
    fn ends_run(&self) -> bool {
        matches!(
            self,
            CompareError::Review(ReviewError::Cancelled | ReviewError::InputClosed)
        )
    }
}

impl From<io::Error> for CompareError {
    fn from(err: io::Error) -> Self {
        CompareError::Review(ReviewError::Io(err))
    }
}

pub type Result<T> = std::result::Result<T, CompareError>;

/// Switches for one run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompareOptions {
    pub context_lines: usize,
    pub fuzz_window: usize,
    pub review: ReviewMode,
    /// Apply in memory but never write.
    pub dry_run: bool,
    /// Only report which pairs differ.
    pub report_only: bool,
    /// Continue with the next pair after an I/O failure.
    pub keep_going: bool,
}

impl Default for CompareOptions {
    fn default() -> Self {
        Self {
            context_lines: DEFAULT_CONTEXT_LINES,
            fuzz_window: DEFAULT_FUZZ_WINDOW,
            review: ReviewMode::default(),
            dry_run: false,
            report_only: false,
            keep_going: false,
        }
    }
}

impl CompareOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            context_lines: config.context_lines,
            fuzz_window: config.fuzz_window,
            review: config.review,
            ..Self::default()
        }
    }
}

/// How a single pair ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PairOutcome {
    Identical,
    /// Report-only mode saw a difference.
    Differs,
    /// The operator skipped the file at the diff prompt.
    Declined,
    /// The diff was reviewed but no hunk was accepted.
    NothingAccepted,
    Patched { applied: usize },
    /// Every accepted hunk applied; the write was skipped.
    DryRun { applied: usize },
    /// Some accepted hunks did not match; the file was left untouched.
    PatchFailed { failed: usize, attempted: usize },
}

/// How the whole run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    Completed,
    /// At least one pair hit an I/O error or a partial patch failure.
    Failed { pairs: usize },
    Cancelled,
}

impl RunOutcome {
    pub fn exit_code(self) -> u8 {
        match self {
            RunOutcome::Completed => 0,
            RunOutcome::Failed { .. } => 1,
            RunOutcome::Cancelled => 130,
        }
    }
}

/// Drives file pairs through diff, review and patch.
pub struct Comparator<S, R, W> {
    store: S,
    console: Console<R, W>,
    renderer: Box<dyn Renderer>,
    options: CompareOptions,
}

impl<S: FileStore, R: BufRead, W: Write> Comparator<S, R, W> {
    pub fn new(
        store: S,
        console: Console<R, W>,
        renderer: Box<dyn Renderer>,
        options: CompareOptions,
    ) -> Self {
        Self {
            store,
            console,
            renderer,
            options,
        }
    }

    pub fn into_console(self) -> Console<R, W> {
        self.console
    }

    /// Process pairs in order until they run out, the operator quits, or an
    /// error stops the run.
    pub fn run(&mut self, pairs: Vec<FilePair>, stats: &mut RunStats) -> RunOutcome {
        let mut failed = 0;

        for mut pair in pairs {
            match self.compare_pair(&mut pair, stats) {
                Ok(PairOutcome::PatchFailed { failed: hunks, attempted }) => {
                    warn!(key = %pair.key, hunks, attempted, "patch not written");
                    stats.files_failed += 1;
                    failed += 1;
                }
                Ok(outcome) => debug!(key = %pair.key, ?outcome, "pair done"),
                Err(err) if err.is_cancelled() => {
                    info!(key = %pair.key, "run cancelled, no further files reviewed");
                    return RunOutcome::Cancelled;
                }
                Err(err) => {
                    error!(key = %pair.key, "{err}");
                    stats.files_failed += 1;
                    failed += 1;
                    if err.ends_run() || !self.options.keep_going {
                        return RunOutcome::Failed { pairs: failed };
                    }
                }
            }
        }

        if failed > 0 {
            RunOutcome::Failed { pairs: failed }
        } else {
            RunOutcome::Completed
        }
    }

    /// Compare one pair and, once reviewed, patch the original file.
    pub fn compare_pair(
        &mut self,
        pair: &mut FilePair,
        stats: &mut RunStats,
    ) -> Result<PairOutcome> {
        if self.store.is_equal(pair.original.path(), pair.desired.path())? {
            debug!(key = %pair.key, "files are identical");
            return Ok(PairOutcome::Identical);
        }
        stats.files_with_diff += 1;

        if self.options.report_only {
            writeln!(
                self.console.output(),
                "Files {} and {} differ",
                pair.original.path().display(),
                pair.desired.path().display()
            )?;
            return Ok(PairOutcome::Differs);
        }

        load(&self.store, &mut pair.original)?;
        load(&self.store, &mut pair.desired)?;
        let original = pair.original.content.as_deref().unwrap_or_default();
        let desired = pair.desired.content.as_deref().unwrap_or_default();

        let ops = diff_lines(original, desired);
        let hunks = build_hunks(&ops, self.options.context_lines);
        if hunks.is_empty() {
            return Ok(PairOutcome::Identical);
        }
        debug!(key = %pair.key, ops = ops.len(), hunks = hunks.len(), "computed diff");

        let shown_diff = self.renderer.render(&ops);
        let shown_hunks: Vec<String> = hunks
            .iter()
            .map(|hunk| self.renderer.render_hunk(hunk))
            .collect();

        let mut session = ReviewSession::new(
            pair.original.path(),
            pair.desired.path(),
            &shown_diff,
            &shown_hunks,
        )
        .auto_patch(pair.original.auto_patch)
        .mode(self.options.review);

        let accepted = match session.run(&mut self.console) {
            Ok(ReviewOutcome::Accepted(accepted)) => accepted,
            Ok(ReviewOutcome::Declined) => {
                stats.patches_skipped += hunks.len();
                return Ok(PairOutcome::Declined);
            }
            Err(err) => {
                stats.patches_skipped += hunks.len();
                return Err(err.into());
            }
        };
        stats.patches_skipped += hunks.len() - accepted.len();
        if accepted.is_empty() {
            return Ok(PairOutcome::NothingAccepted);
        }

        // The destination may have been edited while the operator was reviewing.
        let current = self.store.read_text(pair.original.path())?;
        if current != original {
            debug!(key = %pair.key, "destination changed during review");
        }

        let selected: Vec<Hunk> = accepted.iter().map(|&i| hunks[i].clone()).collect();
        let result = PatchApplier::new(self.options.fuzz_window).apply(&current, &selected)?;
        stats.patches_errored += result.failed();

        writeln!(
            self.console.output(),
            "Diffs: {}, Patches: {}, Applied: {}, Failed: {}",
            ops.len(),
            hunks.len(),
            result.succeeded(),
            result.failed()
        )?;

        if result.failed() > 0 {
            return Ok(PairOutcome::PatchFailed {
                failed: result.failed(),
                attempted: result.attempted(),
            });
        }

        if self.options.dry_run {
            writeln!(
                self.console.output(),
                "Dry-run enabled, skipping file writes: {}",
                pair.original.path().display()
            )?;
            stats.patches_applied += result.succeeded();
            return Ok(PairOutcome::DryRun {
                applied: result.succeeded(),
            });
        }

        self.store
            .write_all(pair.original.path(), result.text.as_bytes())?;
        stats.patches_applied += result.succeeded();
        info!(path = %pair.original.path().display(), hunks = result.succeeded(), "patched file");
        Ok(PairOutcome::Patched {
            applied: result.succeeded(),
        })
    }
}

/// Load a file's text once and keep it on the ref.
fn load(store: &impl FileStore, file: &mut FileRef) -> Result<()> {
    if file.content.is_none() {
        file.content = Some(store.read_text(&file.path)?);
    }
    Ok(())
}
