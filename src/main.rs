use anyhow::{Context, Result};
use std::io::{self, IsTerminal};
use std::process::ExitCode;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

use dap::cli::{self, Cli};
use dap::compare::{CompareOptions, Comparator, RunOutcome};
use dap::config::Config;
use dap::review::Console;
use dap::stats::RunStats;
use dap::store::FsStore;
use dap::tree::match_trees;
use dap::{FilePair, FileRef};

const EXIT_USAGE: u8 = 2;
const EXIT_NOT_FOUND: u8 = 127;

fn main() -> ExitCode {
    let args = cli::parse_args();
    init_logging(args.debug);

    match run(&args) {
        Ok(code) => ExitCode::from(code),
        Err(err) => {
            eprintln!("Error: {err:#}");
            ExitCode::FAILURE
        }
    }
}

/// `RUST_LOG` wins; otherwise warnings only, or debug output for this crate with `--debug`.
fn init_logging(debug: bool) {
    let fallback = if debug { "dap=debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(io::stderr)
        .init();
}

fn run(args: &Cli) -> Result<u8> {
    for path in [&args.original, &args.desired] {
        if !path.exists() {
            eprintln!("{}: no such file or directory", path.display());
            return Ok(EXIT_NOT_FOUND);
        }
    }

    let mut config =
        Config::load(args.config.as_deref()).context("Failed to load configuration")?;
    args.apply_to(&mut config);
    debug!(?config, "loaded configuration");

    let mut stats = RunStats::new();
    let pairs = match (args.original.is_dir(), args.desired.is_dir()) {
        (true, true) => {
            println!(
                "Loading files from: {} and {}",
                args.original.display(),
                args.desired.display()
            );
            let matched = match_trees(
                &args.original,
                &args.desired,
                &config.walk_policy(),
                args.auto_patch,
            );
            info!(
                pairs = matched.pairs.len(),
                only_in_original = matched.only_in_original.len(),
                only_in_desired = matched.only_in_desired.len(),
                "matched trees"
            );
            stats.files_scanned = matched.files_scanned;
            stats.dirs_visited = matched.dirs_visited;
            matched.pairs
        }
        (false, false) => {
            stats.files_scanned = 2;
            vec![FilePair {
                key: args.original.display().to_string(),
                original: FileRef::new(args.original.clone()).with_auto_patch(args.auto_patch),
                desired: FileRef::new(args.desired.clone()),
            }]
        }
        _ => {
            eprintln!("Both arguments must be files, or both must be directories");
            return Ok(EXIT_USAGE);
        }
    };

    let options = CompareOptions {
        dry_run: args.dry_run,
        report_only: args.report_only,
        keep_going: args.keep_going,
        ..CompareOptions::from_config(&config)
    };

    let outcome = {
        let stdout = io::stdout();
        let renderer = config.style.renderer(stdout.is_terminal());
        let console = Console::new(io::stdin().lock(), stdout.lock());
        let mut comparator = Comparator::new(FsStore, console, renderer, options);
        comparator.run(pairs, &mut stats)
    };

    match outcome {
        RunOutcome::Cancelled => println!("Canceled by user, no further files reviewed"),
        RunOutcome::Failed { pairs } => eprintln!("{pairs} file(s) could not be patched"),
        RunOutcome::Completed => {}
    }
    println!("{}", stats.summary());

    Ok(outcome.exit_code())
}
