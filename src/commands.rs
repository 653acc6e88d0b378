//! CLI command bodies: extract, init, and list. The watch loop and the
//! blacklist editor live in their own modules.

use std::path::{Path, PathBuf};
use std::thread;
use std::time::Instant;

use crossbeam_channel::Receiver;
use indicatif::{ProgressBar, ProgressStyle};

use crate::config::{self, Config};
use crate::discovery;
use crate::error::Error;
use crate::matcher::SymbolMatcher;
use crate::report::{self, ReportPaths, SymbolReport};
use crate::session::ScanSession;
use crate::types::{Dialect, Progress, ScanResult};

/// Everything `extract` needs from the command line. Watch mode reuses it
/// unchanged for each re-run.
#[derive(Debug, Clone)]
pub struct ExtractRequest {
    /// Extract every registry symbol minus the blacklist.
    pub all: bool,
    /// Dialect override; None falls back to the config.
    pub dialect: Option<Dialect>,
    /// Output rendering on stdout.
    pub format: OutputFormat,
    /// Report directory override; None falls back to the config.
    pub out: Option<PathBuf>,
    /// Symbols named on the command line; empty with `--all`.
    pub symbols: Vec<String>,
    /// Worker count override; None falls back to the config.
    pub threads: Option<usize>,
}

/// How extraction results are rendered on stdout.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// One JSON document covering every extracted symbol.
    Json,
    /// Per-symbol count lines.
    #[default]
    Text,
}

/// Run the engine for each requested symbol over one shared session and
/// write a pair of reports per symbol.
///
/// # Errors
///
/// Returns errors from config loading, symbol validation, registry
/// discovery with `--all`, scanning, and report writing.
pub fn extract(request: &ExtractRequest) -> Result<(), Error> {
    let root = Path::new(".");
    let config = Config::load(root)?;
    let dialect = request.dialect.unwrap_or(config.dialect);
    let out_dir = request
        .out
        .clone()
        .unwrap_or_else(|| return config.output_dir.clone());
    let symbols = resolve_symbols(request, &config)?;

    let extensions = config.effective_extensions(dialect);
    let files = discovery::find_source_files(&config.roots, &extensions, &out_dir);
    if files.is_empty() {
        return Err(Error::NoSourceFiles { extensions });
    }
    let session = ScanSession::new(files, request.threads.unwrap_or(config.threads));
    eprintln!(
        "Scanning {} files with {} workers ({} dialect)",
        session.file_count(),
        session.workers(),
        dialect.name()
    );

    let mut outcomes: Vec<(String, ScanResult, ReportPaths)> = Vec::new();
    for symbol in &symbols {
        let started = Instant::now();
        let (result, paths) = run_symbol(&session, dialect, symbol, &out_dir, &config.prefix)?;
        let elapsed = started.elapsed().as_millis();
        let line = format!(
            "{symbol}: {} define blocks, {} function blocks ({elapsed} ms)",
            result.conditional_blocks.len(),
            result.function_blocks.len()
        );
        match request.format {
            OutputFormat::Json => eprintln!("{line}"),
            OutputFormat::Text => println!("{line}"),
        }
        eprintln!(
            "Wrote {} and {}",
            paths.conditional.display(),
            paths.function.display()
        );
        outcomes.push((symbol.clone(), result, paths));
    }

    if request.format == OutputFormat::Json {
        print_json(dialect, &outcomes)?;
    }
    return Ok(());
}

/// Write a starter `.defref.toml` in the current directory.
///
/// # Errors
///
/// Returns `Error::ConfigEdit` if the file already exists, `Error::Io` on
/// write failure.
pub fn init() -> Result<(), Error> {
    let path = PathBuf::from(config::CONFIG_FILE);
    if path.exists() {
        return Err(Error::ConfigEdit {
            path,
            reason: "file already exists".to_string(),
        });
    }
    std::fs::write(&path, Config::starter()?)?;
    eprintln!("Wrote {}", path.display());
    return Ok(());
}

/// Print the symbols defined by the registry, minus the blacklist.
///
/// # Errors
///
/// Returns errors from config loading, registry lookup, and parsing.
pub fn list(from: Option<&Path>) -> Result<(), Error> {
    let root = Path::new(".");
    let config = Config::load(root)?;
    let registry = locate_registry(&config, from)?;
    let discovered = discovery::read_symbols(&registry)?;
    let symbols: Vec<String> = discovered
        .into_iter()
        .filter(|symbol| return !config.blacklist.contains(symbol))
        .collect();
    if symbols.is_empty() {
        return Err(Error::NoSymbols { registry });
    }
    for symbol in &symbols {
        println!("{symbol}");
    }
    return Ok(());
}

/// The registry file to parse: the explicit `--from` path when given, the
/// first configured registry filename found under the roots otherwise.
fn locate_registry(config: &Config, from: Option<&Path>) -> Result<PathBuf, Error> {
    if let Some(path) = from {
        return Ok(path.to_path_buf());
    }
    return discovery::find_symbol_registry(&config.roots, &config.headers).ok_or_else(|| {
        return Error::HeaderNotFound {
            searched: config.headers.clone(),
        };
    });
}

/// Render every outcome as one JSON document on stdout.
fn print_json(
    dialect: Dialect,
    outcomes: &[(String, ScanResult, ReportPaths)],
) -> Result<(), Error> {
    let reports: Vec<SymbolReport<'_>> = outcomes
        .iter()
        .map(|(symbol, result, paths)| {
            return SymbolReport {
                conditional_blocks: &result.conditional_blocks,
                conditional_count: result.conditional_blocks.len(),
                conditional_report: paths.conditional.clone(),
                dialect: dialect.name(),
                function_blocks: &result.function_blocks,
                function_count: result.function_blocks.len(),
                function_report: paths.function.clone(),
                symbol: symbol.as_str(),
            };
        })
        .collect();
    println!("{}", serde_json::to_string_pretty(&reports)?);
    return Ok(());
}

/// The symbols one extract run covers: the explicit list validated, or the
/// registry contents minus the blacklist with `--all`. Blacklist filtering
/// applies only to discovery; a symbol named explicitly is always scanned.
fn resolve_symbols(request: &ExtractRequest, config: &Config) -> Result<Vec<String>, Error> {
    if request.all {
        let registry = locate_registry(config, None)?;
        let discovered = discovery::read_symbols(&registry)?;
        let symbols: Vec<String> = discovered
            .into_iter()
            .filter(|symbol| return !config.blacklist.contains(symbol))
            .collect();
        if symbols.is_empty() {
            return Err(Error::NoSymbols { registry });
        }
        return Ok(symbols);
    }
    for symbol in &request.symbols {
        validate_symbol(symbol)?;
    }
    return Ok(request.symbols.clone());
}

/// Scan the session for one symbol with a progress bar on stderr, then
/// write its reports.
fn run_symbol(
    session: &ScanSession,
    dialect: Dialect,
    symbol: &str,
    out_dir: &Path,
    prefix: &str,
) -> Result<(ScanResult, ReportPaths), Error> {
    let matcher = SymbolMatcher::new(dialect, symbol)?;
    let (tx, rx) = crossbeam_channel::unbounded();
    let bar = spawn_progress_bar(session.total_lines(), rx);
    let scanned = session.scan(&matcher, Some(&tx));
    // Close the channel so the bar thread drains and exits before the
    // result is inspected; otherwise a scan error would leave it running.
    drop(tx);
    let _ = bar.join();
    let result = scanned?;
    let paths = report::write_reports(out_dir, prefix, symbol, &result)?;
    return Ok((result, paths));
}

/// Drain progress updates into a 50-column bar on stderr. Indicatif hides
/// the bar when stderr is not a terminal and throttles redraws itself.
fn spawn_progress_bar(total: u64, rx: Receiver<Progress>) -> thread::JoinHandle<()> {
    return thread::spawn(move || {
        let style = ProgressStyle::with_template("[{bar:50}] {percent:>3}%")
            .unwrap_or_else(|_err| return ProgressStyle::default_bar())
            .progress_chars("##-");
        let bar = ProgressBar::new(total).with_style(style);
        for update in rx {
            bar.set_position(update.processed);
        }
        bar.finish_and_clear();
        return;
    });
}

/// Reject symbols that are not plain identifiers. The matcher escapes its
/// symbol anyway; this keeps report filenames sane.
fn validate_symbol(symbol: &str) -> Result<(), Error> {
    let well_formed = !symbol.is_empty()
        && symbol
            .chars()
            .all(|c| return c.is_ascii_alphanumeric() || c == '_');
    if well_formed {
        return Ok(());
    }
    return Err(Error::InvalidSymbol {
        symbol: symbol.to_string(),
    });
}
