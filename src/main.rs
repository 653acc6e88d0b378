//! defref finds every place a configuration symbol is tested: the
//! conditional blocks that test it and the functions whose behavior
//! depends on it, across a whole source tree.

mod blacklist;
mod brace;
mod commands;
mod config;
mod diagnostics;
mod discovery;
mod error;
mod indent;
mod linecount;
mod matcher;
mod report;
mod session;
mod types;
mod watch;

use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Args, Parser, Subcommand};

use crate::commands::{ExtractRequest, OutputFormat};
use crate::types::Dialect;

/// Blacklist subcommands.
#[derive(Subcommand)]
enum BlacklistAction {
    /// Hide symbols from registry discovery
    Add {
        /// Symbols to add.
        #[arg(required = true)]
        symbols: Vec<String>,
    },
    /// Stop hiding symbols from registry discovery
    Remove {
        /// Symbols to remove.
        #[arg(required = true)]
        symbols: Vec<String>,
    },
    /// Print the blacklist
    Show,
}

/// Top-level argument parser.
#[derive(Parser)]
#[command(
    name = "defref",
    about = "Find every conditional block and function gated on a configuration symbol"
)]
struct Cli {
    /// Selected subcommand.
    #[command(subcommand)]
    command: Commands,
}

/// The defref subcommands.
#[derive(Subcommand)]
enum Commands {
    /// Edit the discovery blacklist in .defref.toml
    Blacklist {
        /// What to do with the blacklist.
        #[command(subcommand)]
        action: BlacklistAction,
    },
    /// Extract conditional and function blocks for symbols
    Extract(ExtractArgs),
    /// Write a starter .defref.toml
    Init,
    /// List the symbols defined by the registry
    List {
        /// Registry file to parse instead of searching the roots.
        #[arg(long)]
        from: Option<PathBuf>,
    },
    /// Extract, then re-run whenever a source file changes
    Watch(ExtractArgs),
}

/// Arguments shared by `extract` and `watch`.
#[derive(Args)]
struct ExtractArgs {
    /// Extract every registry symbol minus the blacklist
    #[arg(long, conflicts_with = "symbols")]
    all: bool,
    /// Dialect override (defaults to the config)
    #[arg(long, value_enum)]
    dialect: Option<Dialect>,
    /// Output rendering on stdout
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Report directory override (defaults to the config)
    #[arg(long)]
    out: Option<PathBuf>,
    /// Symbols to extract
    #[arg(required_unless_present = "all")]
    symbols: Vec<String>,
    /// Worker thread count override (0 means one per core)
    #[arg(long)]
    threads: Option<usize>,
}

impl ExtractArgs {
    /// Convert parsed arguments into the request `extract` runs on.
    fn into_request(self) -> ExtractRequest {
        return ExtractRequest {
            all: self.all,
            dialect: self.dialect,
            format: self.format,
            out: self.out,
            symbols: self.symbols,
            threads: self.threads,
        };
    }
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    let outcome = match cli.command {
        Commands::Blacklist { action } => run_blacklist(&action),
        Commands::Extract(args) => commands::extract(&args.into_request()),
        Commands::Init => commands::init(),
        Commands::List { from } => commands::list(from.as_deref()),
        Commands::Watch(args) => watch::run(&args.into_request()),
    };
    return match outcome {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            diagnostics::print_error(&e);
            ExitCode::FAILURE
        },
    };
}

/// Dispatch a blacklist action against the config in the current directory.
fn run_blacklist(action: &BlacklistAction) -> Result<(), error::Error> {
    let root = Path::new(".");
    return match action {
        BlacklistAction::Add { symbols } => blacklist::add(root, symbols),
        BlacklistAction::Remove { symbols } => blacklist::remove(root, symbols),
        BlacklistAction::Show => blacklist::show(root),
    };
}
