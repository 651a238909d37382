use crate::config::Config;
use crate::render::RenderStyle;
use crate::review::ReviewMode;
use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "dap",
    version,
    about = "Diff two files or directory trees and apply the reviewed changes"
)]
pub struct Cli {
    /// File or directory that receives the changes.
    pub original: PathBuf,

    /// File or directory holding the desired content.
    pub desired: PathBuf,

    /// Review and apply in memory, but never write files.
    #[arg(long)]
    pub dry_run: bool,

    /// Only report which files differ.
    #[arg(short = 'q', long)]
    pub report_only: bool,

    /// Path substring to skip while walking directories (repeatable; replaces the defaults).
    #[arg(long = "ignore-paths", value_name = "SUBSTRING")]
    pub ignore_paths: Vec<String>,

    /// Walk hidden files and directories.
    #[arg(long)]
    pub include_hidden: bool,

    /// Follow symbolic links while walking directories.
    #[arg(long = "follow-sym-links")]
    pub follow_symlinks: bool,

    /// Unchanged lines shown around each patch.
    #[arg(short = 'U', long = "context", value_name = "LINES")]
    pub context_lines: Option<usize>,

    /// Accept every diff and patch without prompting.
    #[arg(short = 'y', long)]
    pub auto_patch: bool,

    /// Accepting a diff accepts all of its patches.
    #[arg(long)]
    pub whole_file: bool,

    /// Continue with the remaining files after a read or write error.
    #[arg(long)]
    pub keep_going: bool,

    /// How diffs are displayed.
    #[arg(long, value_enum)]
    pub style: Option<RenderStyle>,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,

    /// Config file to use instead of ./.dap.toml.
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,
}

impl Cli {
    /// Overlay flags that were given onto file settings.
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(lines) = self.context_lines {
            config.context_lines = lines;
        }
        if !self.ignore_paths.is_empty() {
            config.ignore_paths = self.ignore_paths.clone();
        }
        config.include_hidden |= self.include_hidden;
        config.follow_symlinks |= self.follow_symlinks;
        if self.whole_file {
            config.review = ReviewMode::File;
        }
        if let Some(style) = self.style {
            config.style = style;
        }
    }
}

/// Parse CLI arguments.
pub fn parse_args() -> Cli {
    Cli::parse()
}
