//! File watcher: runs an extraction on startup, then re-runs it whenever a
//! source file under the roots changes. Events under the report directory
//! are ignored, otherwise each run's report writes would retrigger the
//! watcher forever.

use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{RecursiveMode, Watcher as _};

use crate::commands::{self, ExtractRequest};
use crate::config::Config;
use crate::diagnostics;
use crate::error::Error;

/// Debounce delay between filesystem events and re-extraction.
const DEBOUNCE_MS: u64 = 100;

/// Create a filesystem watcher that signals the channel on create, modify,
/// and remove events whose paths lie outside `ignore`.
///
/// # Errors
///
/// Returns `Error::Watch` if the watcher cannot be created.
fn create_watcher(
    tx: crossbeam_channel::Sender<()>,
    ignore: PathBuf,
) -> Result<notify::RecommendedWatcher, Error> {
    let watcher = notify::recommended_watcher(
        move |res: Result<notify::Event, notify::Error>| {
            let Ok(event) = res else {
                return;
            };
            let relevant = matches!(
                event.kind,
                notify::EventKind::Create(_)
                    | notify::EventKind::Modify(_)
                    | notify::EventKind::Remove(_)
            );
            if !relevant {
                return;
            }
            let outside_reports = event.paths.iter().any(|path| return !path.starts_with(&ignore));
            if outside_reports {
                let _ = tx.send(());
            }
            return;
        },
    )?;
    return Ok(watcher);
}

/// Entry point for the watch command. Extracts once, then watches the
/// configured roots and re-extracts on changes until interrupted.
///
/// # Errors
///
/// Returns errors from config loading and watcher setup. Per-run
/// extraction failures are rendered and do not stop the loop.
pub fn run(request: &ExtractRequest) -> Result<(), Error> {
    let root = Path::new(".");
    let config = Config::load(root)?;
    let out_dir = request
        .out
        .clone()
        .unwrap_or_else(|| return config.output_dir.clone());

    eprintln!("watch: initial extraction");
    run_extract(request);

    // The report directory is compared against event paths, which arrive
    // absolute; canonicalize so a relative `output_dir` still matches.
    std::fs::create_dir_all(&out_dir)?;
    let ignore = std::fs::canonicalize(&out_dir)?;

    let (tx, rx) = crossbeam_channel::unbounded();
    let mut watcher = create_watcher(tx, ignore)?;
    let mut watched = 0_usize;
    for dir in &config.roots {
        if dir.exists() {
            watcher.watch(dir, RecursiveMode::Recursive)?;
            watched = watched.saturating_add(1);
        }
    }
    eprintln!("watch: monitoring {watched} root(s), press Ctrl+C to stop");

    while rx.recv().is_ok() {
        let debounce = Duration::from_millis(DEBOUNCE_MS);
        while rx.recv_timeout(debounce).is_ok() {}
        eprintln!("watch: change detected, re-extracting...");
        run_extract(request);
    }
    return Ok(());
}

/// Run one extraction, rendering any failure without ending the loop.
fn run_extract(request: &ExtractRequest) {
    if let Err(e) = commands::extract(request) {
        diagnostics::print_error(&e);
    }
    return;
}
