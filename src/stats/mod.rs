use std::fmt;
use std::time::{Duration, Instant};

/// Counters for one run, accumulated pair by pair.
#[derive(Debug, Clone)]
pub struct RunStats {
    pub files_scanned: usize,
    pub files_with_diff: usize,
    pub dirs_visited: usize,
    pub patches_applied: usize,
    pub patches_skipped: usize,
    pub patches_errored: usize,
    /// Pairs that ended in an I/O or patch failure.
    pub files_failed: usize,
    pub started: Instant,
}

impl Default for RunStats {
    fn default() -> Self {
        Self::new()
    }
}

impl RunStats {
    pub fn new() -> Self {
        Self {
            files_scanned: 0,
            files_with_diff: 0,
            dirs_visited: 0,
            patches_applied: 0,
            patches_skipped: 0,
            patches_errored: 0,
            files_failed: 0,
            started: Instant::now(),
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.started.elapsed()
    }

    /// Snapshot for printing, with the runtime frozen at call time.
    pub fn summary(&self) -> Summary<'_> {
        Summary {
            stats: self,
            runtime: self.elapsed(),
        }
    }
}

/// One-line run summary.
pub struct Summary<'a> {
    stats: &'a RunStats,
    runtime: Duration,
}

impl fmt::Display for Summary<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = self.stats;
        write!(
            f,
            "Scanned:    Files: {:<6} Directories: {:<6} Diffs: {:<6} Patched: {:<6} \
             Skipped: {:<6} Errors: {:<6} Failed: {:<6} Runtime: {:?}",
            s.files_scanned,
            s.dirs_visited,
            s.files_with_diff,
            s.patches_applied,
            s.patches_skipped,
            s.patches_errored,
            s.files_failed,
            self.runtime
        )
    }
}
