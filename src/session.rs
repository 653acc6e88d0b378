//! Scan scheduling. A session owns the file list, the line-count cache,
//! and the resolved worker count; each scan fans the files out to workers
//! that claim indices from a shared cursor, so a worker stuck on a large
//! file never blocks the others from draining the rest of the list.

use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};
use std::thread;

use crossbeam_channel::Sender;

use crate::brace::BraceScanner;
use crate::error::Error;
use crate::indent::IndentScanner;
use crate::linecount::LineCountCache;
use crate::matcher::SymbolMatcher;
use crate::types::{Dialect, Progress, ScanResult};

/// Minimum lines processed between two progress emissions.
const EMIT_STRIDE: u64 = 200;

/// Shared progress accounting for one scan.
///
/// Workers bump the processed counter once per line; an update goes out
/// only when a full stride has accumulated since the last emission, so the
/// channel sees a few hundred messages per million lines instead of one
/// per line.
struct ProgressMeter<'a> {
    /// Processed count at the moment of the last emission.
    last_emit: AtomicU64,
    /// Lines processed so far across all workers.
    processed: AtomicU64,
    /// Where updates go; None disables emission entirely.
    sink: Option<&'a Sender<Progress>>,
    /// Line total across every file in the session.
    total: u64,
}

impl<'a> ProgressMeter<'a> {
    /// Record one processed line, emitting if a stride has accumulated.
    fn add_line(&self) {
        let processed = self.processed.fetch_add(1, Ordering::Relaxed).saturating_add(1);
        self.emit_if_due(processed);
        return;
    }

    /// Send an update when at least a stride of lines has passed since the
    /// last one. The compare-exchange makes racing workers elect a single
    /// emitter instead of flooding the channel.
    fn emit_if_due(&self, processed: u64) {
        let Some(sink) = self.sink else {
            return;
        };
        let last = self.last_emit.load(Ordering::Relaxed);
        if processed.saturating_sub(last) < EMIT_STRIDE {
            return;
        }
        if self
            .last_emit
            .compare_exchange(last, processed, Ordering::Relaxed, Ordering::Relaxed)
            .is_ok()
        {
            let _ = sink.send(Progress {
                processed,
                total: self.total,
            });
        }
        return;
    }

    /// Emit the final update. Always sent, stride or not, so listeners
    /// can rely on seeing the scan reach its total.
    fn finish(&self) {
        if let Some(sink) = self.sink {
            let _ = sink.send(Progress {
                processed: self.total,
                total: self.total,
            });
        }
        return;
    }

    /// Meter for a scan of `total` lines reporting into `sink`.
    fn new(total: u64, sink: Option<&'a Sender<Progress>>) -> Self {
        return Self {
            last_emit: AtomicU64::new(0),
            processed: AtomicU64::new(0),
            sink,
            total,
        };
    }
}

/// One extraction run's worth of scanning state: the discovered files and
/// everything needed to scan them repeatedly, once per symbol.
pub struct ScanSession {
    /// Files to scan, fixed for the session's lifetime.
    files: Vec<PathBuf>,
    /// Line counts, computed once and reused by every scan.
    line_counts: LineCountCache,
    /// Resolved worker count, at least one and at most the file count.
    workers: usize,
}

impl ScanSession {
    /// Number of files the session will scan.
    pub fn file_count(&self) -> usize {
        return self.files.len();
    }

    /// Session over `files` with `requested_workers` threads. Zero means
    /// one worker per available core (two when parallelism cannot be
    /// determined); the count is clamped so no worker sits idle from the
    /// start.
    pub fn new(files: Vec<PathBuf>, requested_workers: usize) -> Self {
        let available = thread::available_parallelism().map_or(2, NonZeroUsize::get);
        let requested = if requested_workers == 0 {
            available
        } else {
            requested_workers
        };
        let workers = requested.min(files.len()).max(1);
        return Self {
            files,
            line_counts: LineCountCache::default(),
            workers,
        };
    }

    /// Scan every file for one symbol, aggregating blocks in worker
    /// arrival order. Progress updates go to `progress` when given.
    ///
    /// # Errors
    ///
    /// Returns `Error::Io` if a worker thread cannot be spawned and
    /// `Error::WorkerPanicked` if any worker died mid-scan. Per-file read
    /// failures are contained and do not surface here.
    pub fn scan(
        &self,
        matcher: &SymbolMatcher,
        progress: Option<&Sender<Progress>>,
    ) -> Result<ScanResult, Error> {
        let meter = ProgressMeter::new(self.total_lines(), progress);
        let cursor = AtomicUsize::new(0);
        let aggregate = Mutex::new(ScanResult::default());
        let mut panicked = 0_usize;

        thread::scope(|scope| {
            let mut handles = Vec::with_capacity(self.workers);
            let mut spawn_failure = None;
            for _ in 0..self.workers {
                let spawned = thread::Builder::new().spawn_scoped(scope, || {
                    return worker_loop(&self.files, &cursor, matcher, &meter, &aggregate);
                });
                match spawned {
                    Ok(handle) => handles.push(handle),
                    Err(e) => {
                        spawn_failure = Some(Error::Io(e));
                        break;
                    },
                }
            }
            for handle in handles {
                if handle.join().is_err() {
                    panicked = panicked.saturating_add(1);
                }
            }
            return spawn_failure.map_or(Ok(()), Err);
        })?;

        if panicked > 0 {
            return Err(Error::WorkerPanicked { count: panicked });
        }
        meter.finish();
        return Ok(aggregate
            .into_inner()
            .unwrap_or_else(PoisonError::into_inner));
    }

    /// Total line count across the session's files, from the cache.
    pub fn total_lines(&self) -> u64 {
        return self
            .files
            .iter()
            .fold(0_u64, |acc, file| {
                return acc.saturating_add(self.line_counts.lines(file));
            });
    }

    /// Resolved worker count.
    pub fn workers(&self) -> usize {
        return self.workers;
    }
}

/// Scan a single file, feeding the progress meter once per line.
///
/// Unreadable files contribute nothing; a scan over thousands of files
/// never aborts because one of them disappeared mid-run. Invalid UTF-8
/// is replaced, not rejected.
fn scan_file(file: &Path, matcher: &SymbolMatcher, meter: &ProgressMeter<'_>) -> ScanResult {
    let Ok(bytes) = std::fs::read(file) else {
        return ScanResult::default();
    };
    let text = String::from_utf8_lossy(&bytes);
    return match matcher.dialect() {
        Dialect::Brace => {
            let mut scanner = BraceScanner::new(file, matcher);
            for line in text.lines() {
                scanner.push_line(line);
                meter.add_line();
            }
            scanner.finish()
        },
        Dialect::Indent => {
            let mut scanner = IndentScanner::new(file, matcher);
            for line in text.lines() {
                scanner.push_line(line);
                meter.add_line();
            }
            scanner.finish()
        },
    };
}

/// Claim one file at a time off the shared cursor until every index is
/// taken, then fold the local result into the aggregate under a single
/// lock acquisition.
fn worker_loop(
    files: &[PathBuf],
    cursor: &AtomicUsize,
    matcher: &SymbolMatcher,
    meter: &ProgressMeter<'_>,
    aggregate: &Mutex<ScanResult>,
) {
    let mut local = ScanResult::default();
    loop {
        let claim = cursor.fetch_add(1, Ordering::Relaxed);
        let Some(file) = files.get(claim) else {
            break;
        };
        local.absorb(scan_file(file, matcher, meter));
    }
    aggregate
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .absorb(local);
    return;
}

#[cfg(test)]
#[allow(clippy::missing_panics_doc)]
mod tests {
    use super::*;

    fn write_fixture(dir: &std::path::Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        std::fs::write(&path, content).unwrap();
        return path;
    }

    fn gated_source(marker: &str) -> String {
        return format!("#ifdef FEATURE_X\n{marker}\n#endif\n");
    }

    #[test]
    fn single_worker_preserves_file_order() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            write_fixture(dir.path(), "a.cpp", &gated_source("a")),
            write_fixture(dir.path(), "b.cpp", &gated_source("b")),
            write_fixture(dir.path(), "c.cpp", &gated_source("c")),
        ];
        let matcher = SymbolMatcher::new(Dialect::Brace, "FEATURE_X").unwrap();
        let session = ScanSession::new(files.clone(), 1);
        let result = session.scan(&matcher, None).unwrap();

        assert_eq!(result.conditional_blocks.len(), 3);
        let order: Vec<&PathBuf> = result
            .conditional_blocks
            .iter()
            .map(|b| return &b.source_file)
            .collect();
        assert_eq!(order, files.iter().collect::<Vec<_>>());
    }

    #[test]
    fn worker_count_does_not_change_the_block_set() {
        let dir = tempfile::tempdir().unwrap();
        let mut files = Vec::new();
        for i in 0..8_u32 {
            let name = format!("f{i}.cpp");
            files.push(write_fixture(dir.path(), &name, &gated_source(&name)));
        }
        let matcher = SymbolMatcher::new(Dialect::Brace, "FEATURE_X").unwrap();

        let single = ScanSession::new(files.clone(), 1)
            .scan(&matcher, None)
            .unwrap();
        let parallel = ScanSession::new(files, 4).scan(&matcher, None).unwrap();

        let mut single_blocks = single.conditional_blocks;
        let mut parallel_blocks = parallel.conditional_blocks;
        single_blocks.sort_by(|a, b| return a.source_file.cmp(&b.source_file));
        parallel_blocks.sort_by(|a, b| return a.source_file.cmp(&b.source_file));
        assert_eq!(single_blocks, parallel_blocks);
    }

    #[test]
    fn progress_emits_per_stride_and_a_final_total() {
        let dir = tempfile::tempdir().unwrap();
        let body = "int line;\n".repeat(450);
        let files = vec![write_fixture(dir.path(), "big.cpp", &body)];
        let matcher = SymbolMatcher::new(Dialect::Brace, "FEATURE_X").unwrap();
        let session = ScanSession::new(files, 1);
        assert_eq!(session.total_lines(), 450);

        let (tx, rx) = crossbeam_channel::unbounded();
        session.scan(&matcher, Some(&tx)).unwrap();
        drop(tx);

        let updates: Vec<Progress> = rx.iter().collect();
        let positions: Vec<u64> = updates.iter().map(|p| return p.processed).collect();
        assert_eq!(positions, vec![200, 400, 450]);
        assert!(updates.iter().all(|p| return p.total == 450));
    }

    #[test]
    fn unreadable_files_are_skipped_not_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            write_fixture(dir.path(), "ok.cpp", &gated_source("ok")),
            dir.path().join("missing.cpp"),
        ];
        let matcher = SymbolMatcher::new(Dialect::Brace, "FEATURE_X").unwrap();
        let session = ScanSession::new(files, 2);
        let result = session.scan(&matcher, None).unwrap();
        assert_eq!(result.conditional_blocks.len(), 1);
    }

    #[test]
    fn worker_resolution_clamps_to_file_count() {
        let dir = tempfile::tempdir().unwrap();
        let files = vec![
            write_fixture(dir.path(), "a.cpp", "int a;\n"),
            write_fixture(dir.path(), "b.cpp", "int b;\n"),
            write_fixture(dir.path(), "c.cpp", "int c;\n"),
        ];
        assert_eq!(ScanSession::new(files.clone(), 8).workers(), 3);
        assert_eq!(ScanSession::new(files.clone(), 2).workers(), 2);
        let auto = ScanSession::new(files, 0).workers();
        assert!(auto >= 1);
        assert!(auto <= 3);
    }
}
