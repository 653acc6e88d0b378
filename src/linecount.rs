//! Memoized per-file line counts, shared by every scan in a session so the
//! progress denominator is computed from disk once per file.

use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Thread-safe read-through cache of line counts. Entries are never
/// invalidated; a file that changes mid-session keeps its first count.
#[derive(Debug, Default)]
pub struct LineCountCache {
    /// Memoized counts keyed by path.
    counts: Mutex<HashMap<PathBuf, u64>>,
}

impl LineCountCache {
    /// Line count for `path`, computed on first access and memoized.
    /// Unreadable files count as zero lines and are cached as such.
    pub fn lines(&self, path: &Path) -> u64 {
        if let Some(cached) = self.lock().get(path).copied() {
            return cached;
        }
        // Counting happens outside the lock so one slow file does not
        // stall every other reader.
        let counted = count_lines(path);
        self.lock().entry(path.to_path_buf()).or_insert(counted);
        return counted;
    }

    /// Lock the table, recovering from poisoning. A panicked worker
    /// cannot leave a count map in a broken state.
    fn lock(&self) -> MutexGuard<'_, HashMap<PathBuf, u64>> {
        return self
            .counts
            .lock()
            .unwrap_or_else(PoisonError::into_inner);
    }
}

/// Count lines the way a line-by-line reader would: one per newline byte,
/// plus one for a final line without a terminator.
fn count_lines(path: &Path) -> u64 {
    let Ok(bytes) = std::fs::read(path) else {
        return 0;
    };
    let newlines = bytes.iter().filter(|&&b| return b == b'\n').count();
    let mut total = u64::try_from(newlines).unwrap_or(u64::MAX);
    if bytes.last().is_some_and(|&b| return b != b'\n') {
        total = total.saturating_add(1);
    }
    return total;
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;
    use std::io::Write as _;

    #[test]
    fn counts_match_line_iteration() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("three.txt");
        std::fs::write(&path, "a\nb\nc\n").unwrap();
        let cache = LineCountCache::default();
        assert_eq!(cache.lines(&path), 3);
    }

    #[test]
    fn final_line_without_newline_is_counted() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.txt");
        std::fs::write(&path, "a\nb\nc").unwrap();
        let cache = LineCountCache::default();
        assert_eq!(cache.lines(&path), 3);
    }

    #[test]
    fn unreadable_file_counts_zero() {
        let cache = LineCountCache::default();
        assert_eq!(cache.lines(Path::new("/does/not/exist.cpp")), 0);
    }

    #[test]
    fn counts_are_memoized_across_file_changes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("grow.txt");
        std::fs::write(&path, "one\n").unwrap();
        let cache = LineCountCache::default();
        assert_eq!(cache.lines(&path), 1);

        let mut file = std::fs::OpenOptions::new()
            .append(true)
            .open(&path)
            .unwrap();
        writeln!(file, "two").unwrap();
        drop(file);

        assert_eq!(cache.lines(&path), 1);
    }

    #[test]
    fn empty_file_counts_zero() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("empty.txt");
        std::fs::write(&path, "").unwrap();
        let cache = LineCountCache::default();
        assert_eq!(cache.lines(&path), 0);
    }
}
