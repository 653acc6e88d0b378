//! Error rendering: structured markdown diagnostics on stderr, with bold
//! headings and a `## Fix` section naming the exact command or config key
//! to change.

use crate::config;
use crate::error::Error;

/// ANSI bold.
const BOLD: &str = "\x1b[1m";

/// ANSI reset.
const RESET: &str = "\x1b[0m";

/// Render an error as markdown with bold headings and print to stderr.
pub fn print_error(e: &Error) {
    let md = render_error(e);
    for line in md.lines() {
        if line.starts_with('#') {
            eprintln!("{BOLD}{line}{RESET}");
        } else {
            eprintln!("{line}");
        }
    }
    return;
}

/// Render a failed config edit.
fn render_config_edit(path: &std::path::Path, reason: &str) -> String {
    return format!(
        "\
# Error: Config Edit Failed

Could not edit `{}`: {reason}
",
        path.display()
    );
}

/// Render an error as a structured markdown diagnostic.
///
/// Each variant produces a block with what happened and, where a concrete
/// next step exists, how to fix it.
pub fn render_error(e: &Error) -> String {
    return match e {
        Error::ConfigEdit { path, reason } => render_config_edit(path, reason),
        Error::HeaderNotFound { searched } => render_header_not_found(searched),
        Error::InvalidSymbol { symbol } => render_invalid_symbol(symbol),
        Error::NoSourceFiles { extensions } => render_no_source_files(extensions),
        Error::NoSymbols { registry } => render_no_symbols(registry),
        Error::WorkerPanicked { count } => render_worker_panicked(*count),
        _ => render_generic(e),
    };
}

/// Render the wrapped-error variants that carry no fix of their own.
fn render_generic(e: &Error) -> String {
    return match e {
        Error::Io(e) => format!(
            "\
# Error: I/O

{e}
"
        ),
        Error::Json(e) => format!(
            "\
# Error: JSON Serialization

{e}
"
        ),
        Error::Regex(e) => format!(
            "\
# Error: Pattern Compilation

{e}
"
        ),
        Error::TomlDe(e) => format!(
            "\
# Error: Invalid TOML

{e}

## Fix

Correct `{}`; every key in it is optional.
",
            config::CONFIG_FILE
        ),
        Error::TomlSer(e) => format!(
            "\
# Error: TOML Serialization

{e}
"
        ),
        Error::Watch(e) => format!(
            "\
# Error: Watcher

{e}
"
        ),
        // Already handled in render_error, but need exhaustive match.
        _ => format!(
            "\
# Error

{e}
"
        ),
    };
}

/// Render a failed registry lookup.
fn render_header_not_found(searched: &[String]) -> String {
    let listed = if searched.is_empty() {
        "(none configured)".to_string()
    } else {
        searched.join(", ")
    };
    return format!(
        "\
# Error: Registry Not Found

No symbol registry file was found under the configured roots.

Searched filenames: {listed}

## Fix

Name the registry explicitly:

    defref list --from path/to/defines.h

Or configure it in `{}`:

    headers = [\"defines.h\"]
",
        config::CONFIG_FILE
    );
}

/// Render a rejected symbol name.
fn render_invalid_symbol(symbol: &str) -> String {
    return format!(
        "\
# Error: Invalid Symbol

`{symbol}` is not a plain identifier.

## Fix

Symbol names may only contain letters, digits, and underscores.
"
    );
}

/// Render an empty discovery walk.
fn render_no_source_files(extensions: &[String]) -> String {
    return format!(
        "\
# Error: No Source Files

No files with extensions {} were found under the configured roots.

## Fix

Point `roots` at the source tree, or widen `extensions`, in `{}`:

    roots = [\"src\"]
    extensions = [{}]
",
        extensions.join(", "),
        config::CONFIG_FILE,
        extensions
            .iter()
            .map(|ext| return format!("\"{ext}\""))
            .collect::<Vec<_>>()
            .join(", ")
    );
}

/// Render a registry that defines nothing extractable.
fn render_no_symbols(registry: &std::path::Path) -> String {
    return format!(
        "\
# Error: No Symbols

`{}` defines no symbols (or every symbol is blacklisted).

## Fix

The registry is parsed for `#define NAME` lines. Check the file, or
review the blacklist:

    defref blacklist show
",
        registry.display()
    );
}

/// Render a scan cut short by worker panics.
fn render_worker_panicked(count: usize) -> String {
    return format!(
        "\
# Error: Scan Incomplete

{count} scan worker(s) panicked; the reports for this run are unreliable.

## Fix

Re-run the extraction. If it fails again, please file a bug with the
source file that triggers it.
"
    );
}
