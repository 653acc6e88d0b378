//! Filesystem discovery: which files a session scans, where the symbol
//! registry lives, and which symbols it defines.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;
use walkdir::WalkDir;

use crate::error::Error;
use crate::matcher;

/// Recognizes `#define NAME` lines, tolerating whitespace after the `#`.
static DEFINE_LINE: LazyLock<Regex> =
    LazyLock::new(|| return matcher::compiled(r"^\s*#\s*define\s+(\w+)"));

/// Recursively collect the source files under the roots whose extension is
/// in `extensions`, skipping everything under the report output directory.
/// The list is sorted and deduplicated so overlapping roots cannot yield
/// the same file twice and a single-worker scan is reproducible end to end.
pub fn find_source_files(roots: &[PathBuf], extensions: &[String], skip_dir: &Path) -> Vec<PathBuf> {
    let mut files: Vec<PathBuf> = Vec::new();
    for root in roots {
        let walk = WalkDir::new(root)
            .into_iter()
            .filter_entry(|entry| return !under_dir(entry.path(), skip_dir))
            .filter_map(Result::ok)
            .filter(|entry| return entry.file_type().is_file());
        for entry in walk {
            let matches_extension = entry
                .path()
                .extension()
                .and_then(|ext| return ext.to_str())
                .is_some_and(|ext| return extensions.iter().any(|want| return want == ext));
            if matches_extension {
                files.push(entry.path().to_path_buf());
            }
        }
    }
    files.sort();
    files.dedup();
    return files;
}

/// Locate the symbol registry: the first file under the roots whose name
/// equals one of the configured registry filenames, case-insensitively.
pub fn find_symbol_registry(roots: &[PathBuf], names: &[String]) -> Option<PathBuf> {
    for root in roots {
        let walk = WalkDir::new(root)
            .into_iter()
            .filter_map(Result::ok)
            .filter(|entry| return entry.file_type().is_file());
        for entry in walk {
            let name_matches = entry
                .path()
                .file_name()
                .and_then(|name| return name.to_str())
                .is_some_and(|name| {
                    return names.iter().any(|want| return want.eq_ignore_ascii_case(name));
                });
            if name_matches {
                return Some(entry.path().to_path_buf());
            }
        }
    }
    return None;
}

/// Parse symbol names out of the registry's `#define` lines. Duplicates
/// keep their first occurrence; order otherwise follows the file.
///
/// # Errors
///
/// Returns `Error::Io` if the registry cannot be read.
pub fn read_symbols(registry: &Path) -> Result<Vec<String>, Error> {
    let content = std::fs::read_to_string(registry)?;
    let mut seen: HashSet<String> = HashSet::new();
    let mut symbols = Vec::new();
    for line in content.lines() {
        let Some(captures) = DEFINE_LINE.captures(line) else {
            continue;
        };
        let Some(name) = captures.get(1) else {
            continue;
        };
        let name = name.as_str().to_string();
        if seen.insert(name.clone()) {
            symbols.push(name);
        }
    }
    return Ok(symbols);
}

/// True when `path` lies inside `dir`, after stripping any leading `./`
/// from both so configured relative paths compare against walk entries.
fn under_dir(path: &Path, dir: &Path) -> bool {
    let path = path.strip_prefix(".").unwrap_or(path);
    let dir = dir.strip_prefix(".").unwrap_or(dir);
    if dir.as_os_str().is_empty() {
        return false;
    }
    return path.starts_with(dir);
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    fn touch(path: &Path, content: &str) {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent).unwrap();
        }
        std::fs::write(path, content).unwrap();
    }

    #[test]
    fn discovery_is_sorted_filtered_and_skips_the_output_dir() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("src/z.cpp"), "int z;\n");
        touch(&dir.path().join("src/a.cpp"), "int a;\n");
        touch(&dir.path().join("src/lib.h"), "int h;\n");
        touch(&dir.path().join("src/notes.txt"), "ignore\n");
        touch(&dir.path().join("defref-out/stale.cpp"), "int stale;\n");

        let roots = vec![dir.path().to_path_buf()];
        let extensions = vec!["cpp".to_string(), "h".to_string()];
        let files = find_source_files(&roots, &extensions, &dir.path().join("defref-out"));

        let names: Vec<String> = files
            .iter()
            .filter_map(|f| return f.file_name())
            .map(|n| return n.to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["a.cpp", "lib.h", "z.cpp"]);
    }

    #[test]
    fn overlapping_roots_do_not_duplicate_files() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("src/a.cpp"), "int a;\n");

        let roots = vec![dir.path().to_path_buf(), dir.path().join("src")];
        let extensions = vec!["cpp".to_string()];
        let files = find_source_files(&roots, &extensions, Path::new("defref-out"));
        assert_eq!(files.len(), 1);
    }

    #[test]
    fn registry_lookup_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        touch(&dir.path().join("inc/Defines.H"), "#define A\n");

        let roots = vec![dir.path().to_path_buf()];
        let names = vec!["defines.h".to_string()];
        let found = find_symbol_registry(&roots, &names).unwrap();
        assert!(found.ends_with("Defines.H"));
    }

    #[test]
    fn symbols_parse_in_order_with_first_occurrence_winning() {
        let dir = tempfile::tempdir().unwrap();
        let registry = dir.path().join("defines.h");
        touch(
            &registry,
            "#define FEATURE_X 1\n# define FEATURE_Y\nint x;\n#define FEATURE_X 2\n#undef OTHER\n",
        );

        let symbols = read_symbols(&registry).unwrap();
        assert_eq!(symbols, vec!["FEATURE_X", "FEATURE_Y"]);
    }

    #[test]
    fn missing_registry_is_an_io_error() {
        let missing = Path::new("/does/not/exist/defines.h");
        assert!(read_symbols(missing).is_err());
    }
}
