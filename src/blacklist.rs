//! Blacklist editing: the `blacklist` array in `.defref.toml`, edited in
//! place with formatting preserved. The blacklist only hides symbols from
//! discovery; explicitly named symbols are always extracted.

use std::path::{Path, PathBuf};

use crate::config::{self, Config};
use crate::error::Error;

/// Add symbols to the blacklist. Already-listed symbols are left alone.
///
/// # Errors
///
/// Returns `Error::ConfigEdit` if the config cannot be parsed or the
/// `blacklist` key holds something other than an array, `Error::Io` on
/// read/write failure.
pub fn add(root: &Path, symbols: &[String]) -> Result<(), Error> {
    let (path, mut doc) = read_doc(root)?;
    let array = blacklist_array(&path, &mut doc)?;
    for symbol in symbols {
        let present = array
            .iter()
            .any(|item| return item.as_str() == Some(symbol.as_str()));
        if present {
            eprintln!("Already blacklisted: {symbol}");
        } else {
            array.push(symbol.as_str());
            println!("Blacklisted: {symbol}");
        }
    }
    std::fs::write(&path, doc.to_string())?;
    return Ok(());
}

/// The `blacklist` array of the document, created empty when absent.
fn blacklist_array<'a>(
    path: &Path,
    doc: &'a mut toml_edit::DocumentMut,
) -> Result<&'a mut toml_edit::Array, Error> {
    if !doc.contains_key("blacklist") {
        doc.insert("blacklist", toml_edit::value(toml_edit::Array::new()));
    }
    return doc
        .get_mut("blacklist")
        .and_then(toml_edit::Item::as_array_mut)
        .ok_or_else(|| {
            return Error::ConfigEdit {
                path: path.to_path_buf(),
                reason: "`blacklist` is not an array".to_string(),
            };
        });
}

/// Parse `.defref.toml` into a format-preserving document. A missing file
/// becomes an empty document, so `blacklist add` works before `init`.
fn read_doc(root: &Path) -> Result<(PathBuf, toml_edit::DocumentMut), Error> {
    let path = root.join(config::CONFIG_FILE);
    let content = match std::fs::read_to_string(&path) {
        Ok(c) => c,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => String::new(),
        Err(e) => return Err(Error::Io(e)),
    };
    let doc: toml_edit::DocumentMut = content.parse().map_err(|e: toml_edit::TomlError| {
        return Error::ConfigEdit {
            path: path.clone(),
            reason: e.to_string(),
        };
    })?;
    return Ok((path, doc));
}

/// Remove symbols from the blacklist.
///
/// # Errors
///
/// Returns `Error::ConfigEdit` if a named symbol is not blacklisted, the
/// config cannot be parsed, or the `blacklist` key is not an array.
pub fn remove(root: &Path, symbols: &[String]) -> Result<(), Error> {
    let (path, mut doc) = read_doc(root)?;
    let array = blacklist_array(&path, &mut doc)?;
    for symbol in symbols {
        let position = array
            .iter()
            .position(|item| return item.as_str() == Some(symbol.as_str()));
        let Some(index) = position else {
            return Err(Error::ConfigEdit {
                path,
                reason: format!("`{symbol}` is not blacklisted"),
            });
        };
        array.remove(index);
        println!("Unblacklisted: {symbol}");
    }
    std::fs::write(&path, doc.to_string())?;
    return Ok(());
}

/// Print the blacklist, sorted alphabetically.
///
/// # Errors
///
/// Returns errors from config loading.
pub fn show(root: &Path) -> Result<(), Error> {
    let config = Config::load(root)?;
    if config.blacklist.is_empty() {
        println!("Blacklist is empty.");
        return Ok(());
    }
    let mut sorted = config.blacklist;
    sorted.sort();
    for symbol in &sorted {
        println!("{symbol}");
    }
    return Ok(());
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    fn blacklist_of(root: &Path) -> Vec<String> {
        return Config::load(root).unwrap().blacklist;
    }

    #[test]
    fn add_creates_the_config_and_the_array() {
        let dir = tempfile::tempdir().unwrap();
        add(dir.path(), &["FEATURE_X".to_string()]).unwrap();
        assert_eq!(blacklist_of(dir.path()), vec!["FEATURE_X"]);
    }

    #[test]
    fn add_is_idempotent_per_symbol() {
        let dir = tempfile::tempdir().unwrap();
        add(dir.path(), &["A".to_string()]).unwrap();
        add(dir.path(), &["A".to_string(), "B".to_string()]).unwrap();
        assert_eq!(blacklist_of(dir.path()), vec!["A", "B"]);
    }

    #[test]
    fn remove_drops_only_the_named_symbol() {
        let dir = tempfile::tempdir().unwrap();
        add(dir.path(), &["A".to_string(), "B".to_string()]).unwrap();
        remove(dir.path(), &["A".to_string()]).unwrap();
        assert_eq!(blacklist_of(dir.path()), vec!["B"]);
    }

    #[test]
    fn remove_of_an_unlisted_symbol_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        add(dir.path(), &["A".to_string()]).unwrap();
        assert!(remove(dir.path(), &["MISSING".to_string()]).is_err());
    }

    #[test]
    fn editing_preserves_unrelated_keys_and_comments() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join(config::CONFIG_FILE),
            "# scan setup\ndialect = \"indent\"\n",
        )
        .unwrap();
        add(dir.path(), &["A".to_string()]).unwrap();
        let content = std::fs::read_to_string(dir.path().join(config::CONFIG_FILE)).unwrap();
        assert!(content.contains("# scan setup"));
        assert!(content.contains("dialect = \"indent\""));
    }
}
