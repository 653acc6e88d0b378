/// Core domain types for defref scans: blocks, dialects, progress.
use std::path::PathBuf;

/// One extracted region: a conditional-test block or a function body.
///
/// The text holds the verbatim source lines, newline-terminated, starting
/// at the opening line. The report stamp is not part of the text; the
/// report layer prepends it.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct CodeBlock {
    /// Source file the block was extracted from.
    pub source_file: PathBuf,
    /// Verbatim block text.
    pub text: String,
}

/// Source dialect selecting the block-delimitation rules for a scan.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    clap::ValueEnum,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "lowercase")]
pub enum Dialect {
    /// C-preprocessor conditionals and curly-brace function bodies.
    #[default]
    Brace,
    /// `if`/`elif app.SYMBOL` tests and `def`-delimited bodies.
    Indent,
}

impl Dialect {
    /// Source file extensions scanned when the config does not override them.
    pub fn default_extensions(self) -> &'static [&'static str] {
        return match self {
            Dialect::Brace => &["cpp", "h"],
            Dialect::Indent => &["py"],
        };
    }

    /// Stable lowercase name, matching the CLI and config spelling.
    pub fn name(self) -> &'static str {
        return match self {
            Dialect::Brace => "brace",
            Dialect::Indent => "indent",
        };
    }
}

/// A progress notification: lines processed so far out of the scan total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    /// Lines processed across all workers.
    pub processed: u64,
    /// Total line count across all files in the scan.
    pub total: u64,
}

/// The two block collections produced by a scan. One instance per file
/// while scanning, one aggregate instance per scan for the caller.
#[derive(Debug, Default, Clone, PartialEq, Eq, serde::Serialize)]
pub struct ScanResult {
    /// Blocks opened by a symbol test and closed by dialect rules.
    pub conditional_blocks: Vec<CodeBlock>,
    /// Function bodies containing at least one symbol test.
    pub function_blocks: Vec<CodeBlock>,
}

impl ScanResult {
    /// Move every block from `other` into this result, preserving
    /// arrival order.
    pub fn absorb(&mut self, other: ScanResult) {
        let ScanResult {
            conditional_blocks,
            function_blocks,
        } = other;
        self.conditional_blocks.extend(conditional_blocks);
        self.function_blocks.extend(function_blocks);
        return;
    }

    /// True when no blocks of either kind were found.
    pub fn is_empty(&self) -> bool {
        return self.conditional_blocks.is_empty() && self.function_blocks.is_empty();
    }
}
