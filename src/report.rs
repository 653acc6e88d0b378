//! Report rendering: the per-symbol block report files and the JSON
//! document printed by `extract --format json`.
//!
//! Each block is stamped with its source file so a reader paging through a
//! report can tell where a block came from; the stamp is prepended here,
//! never stored in the block itself.

use std::fmt::Write as _;
use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::types::{CodeBlock, ScanResult};

/// Where one symbol's reports were written.
#[derive(Debug)]
pub struct ReportPaths {
    /// Report holding the conditional blocks.
    pub conditional: PathBuf,
    /// Report holding the function blocks.
    pub function: PathBuf,
}

/// Marker line framing each block's source-file stamp.
const STAMP: &str = "##########";

/// Machine-readable per-symbol extraction summary for `--format json`.
#[derive(Debug, serde::Serialize)]
pub struct SymbolReport<'a> {
    /// Blocks opened by a test of the symbol.
    pub conditional_blocks: &'a [CodeBlock],
    /// How many conditional blocks were found.
    pub conditional_count: usize,
    /// Path of the written conditional report.
    pub conditional_report: PathBuf,
    /// Dialect the scan ran under.
    pub dialect: &'a str,
    /// Function bodies containing a test of the symbol.
    pub function_blocks: &'a [CodeBlock],
    /// How many function blocks were found.
    pub function_count: usize,
    /// Path of the written function report.
    pub function_report: PathBuf,
    /// The extracted symbol.
    pub symbol: &'a str,
}

/// Render one report: stamped blocks in arrival order, then a summary
/// trailer listing the contributing files sorted and deduplicated.
fn render(blocks: &[CodeBlock], noun: &str) -> String {
    let mut out = String::new();
    for block in blocks {
        let _ = writeln!(out, "{STAMP}");
        let _ = writeln!(out, "{}", block.source_file.display());
        let _ = writeln!(out, "{STAMP}");
        out.push_str(&block.text);
        out.push('\n');
    }

    let mut files: Vec<String> = blocks
        .iter()
        .map(|block| return block.source_file.display().to_string())
        .collect();
    files.sort();
    files.dedup();

    let count = blocks.len();
    let _ = writeln!(out, "\n--- SUMMARY ({count} {noun} blocks) in files: ---");
    for file in &files {
        let _ = writeln!(out, "{file}");
    }
    return out;
}

/// Write both reports for one symbol under `out_dir`, creating the
/// directory if needed. Filenames follow `<prefix><SYMBOL>_DEFINE.txt`
/// and `<prefix><SYMBOL>_FUNC.txt`.
///
/// # Errors
///
/// Returns `Error::Io` if the directory or either file cannot be written.
pub fn write_reports(
    out_dir: &Path,
    prefix: &str,
    symbol: &str,
    result: &ScanResult,
) -> Result<ReportPaths, Error> {
    std::fs::create_dir_all(out_dir)?;
    let conditional = out_dir.join(format!("{prefix}{symbol}_DEFINE.txt"));
    let function = out_dir.join(format!("{prefix}{symbol}_FUNC.txt"));
    std::fs::write(&conditional, render(&result.conditional_blocks, "define"))?;
    std::fs::write(&function, render(&result.function_blocks, "function"))?;
    return Ok(ReportPaths {
        conditional,
        function,
    });
}
