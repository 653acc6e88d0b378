/// Crate-level error types for defref diagnostics.
use std::path::PathBuf;

/// All errors in defref carry enough context to produce a useful diagnostic
/// without a debugger. Each variant names the file, symbol, or reason for failure.
#[allow(clippy::error_impl_error, reason = "crate-internal error type in binary")]
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// An in-place edit of `.defref.toml` could not be applied.
    #[error("could not edit {}: {reason}", path.display())]
    ConfigEdit {
        /// Config file that was being edited.
        path: PathBuf,
        /// Description of what the edit ran into.
        reason: String,
    },

    /// No symbol registry file exists under the configured roots.
    #[error("no symbol registry found (searched for: {})", searched.join(", "))]
    HeaderNotFound {
        /// Registry filenames that were searched for.
        searched: Vec<String>,
    },

    /// A symbol given on the command line is not a plain identifier.
    #[error("invalid symbol name: `{symbol}`")]
    InvalidSymbol {
        /// The offending name as typed.
        symbol: String,
    },

    /// Underlying I/O error from the filesystem.
    #[error("io: {0}")]
    Io(
        /// The wrapped I/O error.
        #[from]
        std::io::Error,
    ),

    /// JSON output failed to serialize.
    #[error("json serialize: {0}")]
    Json(
        /// The wrapped JSON error.
        #[from]
        serde_json::Error,
    ),

    /// Discovery walked every root and found nothing to scan.
    #[error("no source files found (extensions: {})", extensions.join(", "))]
    NoSourceFiles {
        /// Extensions the discovery walk was matching.
        extensions: Vec<String>,
    },

    /// The symbol registry was located but defines no symbols.
    #[error("no symbols found in {}", registry.display())]
    NoSymbols {
        /// Registry file that was parsed.
        registry: PathBuf,
    },

    /// A symbol test pattern failed to compile.
    #[error("regex: {0}")]
    Regex(
        /// The wrapped regex compilation error.
        #[from]
        regex::Error,
    ),

    /// TOML deserialization failed.
    #[error("toml deserialize: {0}")]
    TomlDe(
        /// The wrapped TOML deserialization error.
        #[from]
        toml::de::Error,
    ),

    /// TOML serialization failed.
    #[error("toml serialize: {0}")]
    TomlSer(
        /// The wrapped TOML serialization error.
        #[from]
        toml::ser::Error,
    ),

    /// The filesystem watcher could not be created or attached.
    #[error("watch: {0}")]
    Watch(
        /// The wrapped watcher error.
        #[from]
        notify::Error,
    ),

    /// One or more scan workers panicked; the aggregate is incomplete.
    #[error("{count} scan worker(s) panicked")]
    WorkerPanicked {
        /// How many workers died before finishing their files.
        count: usize,
    },
}
