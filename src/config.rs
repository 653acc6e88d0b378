//! Project configuration loaded from `.defref.toml`.

use std::path::{Path, PathBuf};

use crate::error::Error;
use crate::types::Dialect;

/// Name of the config file, looked up in the invocation root.
pub const CONFIG_FILE: &str = ".defref.toml";

/// Configuration for one invocation. Every key is optional in the file;
/// command-line flags override the corresponding keys.
#[derive(Debug, serde::Deserialize, serde::Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    /// Symbols hidden from registry discovery (`list` and `--all`).
    pub blacklist: Vec<String>,
    /// Block-delimitation dialect for the scan.
    pub dialect: Dialect,
    /// Source extension override; empty means the dialect's defaults.
    pub extensions: Vec<String>,
    /// Registry filenames searched for `#define` symbol lists.
    pub headers: Vec<String>,
    /// Directory the block reports are written into.
    pub output_dir: PathBuf,
    /// Report filename prefix, e.g. `CLIENT_`.
    pub prefix: String,
    /// Directories the scan walks for source files.
    pub roots: Vec<PathBuf>,
    /// Worker thread count; zero means one per available core.
    pub threads: usize,
}

impl Config {
    /// Source extensions for `dialect`: the configured override when one
    /// is set, the dialect's defaults otherwise.
    pub fn effective_extensions(&self, dialect: Dialect) -> Vec<String> {
        if !self.extensions.is_empty() {
            return self.extensions.clone();
        }
        return dialect
            .default_extensions()
            .iter()
            .map(|ext| return (*ext).to_string())
            .collect();
    }

    /// Load config from `.defref.toml` in the given root directory.
    /// Returns the defaults if the file doesn't exist. Returns an error if
    /// the file exists but is malformed, never a silent fallback to
    /// defaults when the user wrote a config file.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if reading fails (other than not-found),
    /// or `Error::TomlDe` if the TOML is malformed.
    pub fn load(root: &Path) -> Result<Self, Error> {
        let path = root.join(CONFIG_FILE);
        let content = match std::fs::read_to_string(&path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::default()),
            Err(e) => return Err(Error::Io(e)),
        };
        let config: Self = toml::from_str(&content)?;
        return Ok(config);
    }

    /// Serialize the defaults as starter config content for `init`.
    ///
    /// # Errors
    ///
    /// Returns `Error::TomlSer` if serialization fails.
    pub fn starter() -> Result<String, Error> {
        let rendered = toml::to_string_pretty(&Self::default())?;
        return Ok(rendered);
    }
}

impl Default for Config {
    fn default() -> Self {
        return Self {
            blacklist: Vec::new(),
            dialect: Dialect::Brace,
            extensions: Vec::new(),
            headers: Vec::new(),
            output_dir: PathBuf::from("defref-out"),
            prefix: String::new(),
            roots: vec![PathBuf::from(".")],
            threads: 0,
        };
    }
}
