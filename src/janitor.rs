//! Cleanup of working files.
//!
//! Three entry points, from narrowest to broadest:
//!
//! - [`purge`] removes the regular files directly inside the given
//!   directories. Subdirectories are skipped; purge them with their own call.
//! - [`clean_workspace`] is the user-facing "delete temp files" operation:
//!   it purges the shared upload and resized areas, then empties and removes
//!   every request-scoped batch directory.
//! - [`sweep_expired`] is the retention policy: it removes archives and batch
//!   directories older than a maximum age, leaving recent work alone.
//!
//! ## Failure policy
//!
//! All three are best effort. A directory that cannot be read or an entry that
//! cannot be removed is recorded and the sweep continues with the next one.
//! If anything failed, the call returns a [`PurgeError`] listing every failure
//! together with the number of files that *were* removed; nothing is restored.
//! A directory that does not exist counts as already clean.

use crate::activity::{ActivitySink, BatchEvent};
use crate::naming::is_archive_name;
use crate::workspace::{BATCHES_DIR, RESIZED_DIR};
use std::fmt;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use walkdir::WalkDir;

/// One entry that could not be read or removed.
#[derive(Debug)]
pub struct PurgeFailure {
    pub path: PathBuf,
    pub error: std::io::Error,
}

/// Aggregated failures of a best-effort cleanup.
#[derive(Debug)]
pub struct PurgeError {
    /// Entries removed before and after the failures.
    pub removed: usize,
    pub failures: Vec<PurgeFailure>,
}

impl fmt::Display for PurgeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cleanup incomplete ({} removed, {} failed)",
            self.removed,
            self.failures.len()
        )?;
        for failure in &self.failures {
            write!(f, "; {}: {}", failure.path.display(), failure.error)?;
        }
        Ok(())
    }
}

impl std::error::Error for PurgeError {}

/// Outcome of a retention sweep.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SweepReport {
    pub archives: usize,
    pub batches: usize,
}

/// Collects removals and failures across one cleanup call.
#[derive(Default)]
struct Tally {
    removed: usize,
    failures: Vec<PurgeFailure>,
}

impl Tally {
    fn fail(&mut self, path: &Path, error: std::io::Error) {
        tracing::warn!(path = %path.display(), error = %error, "cleanup failure");
        self.failures.push(PurgeFailure {
            path: path.to_path_buf(),
            error,
        });
    }

    fn finish<T>(self, value: T) -> Result<T, PurgeError> {
        if self.failures.is_empty() {
            Ok(value)
        } else {
            Err(PurgeError {
                removed: self.removed,
                failures: self.failures,
            })
        }
    }
}

fn walk_error(dir: &Path, err: walkdir::Error) -> (PathBuf, std::io::Error) {
    let path = err.path().map(Path::to_path_buf).unwrap_or_else(|| dir.to_path_buf());
    let io = err
        .into_io_error()
        .unwrap_or_else(|| std::io::Error::other("filesystem loop"));
    (path, io)
}

/// Immediate children of `dir`, following symlinks. A missing `dir` has none.
fn children(dir: &Path, tally: &mut Tally) -> Vec<walkdir::DirEntry> {
    let mut entries = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).follow_links(true) {
        match entry {
            Ok(entry) => entries.push(entry),
            Err(err) => {
                let (path, io) = walk_error(dir, err);
                if path == dir && io.kind() == ErrorKind::NotFound {
                    break;
                }
                tally.fail(&path, io);
            }
        }
    }
    entries
}

fn purge_into(dir: &Path, tally: &mut Tally, sink: &dyn ActivitySink) {
    let mut removed = 0;
    for entry in children(dir, tally) {
        if !entry.file_type().is_file() {
            continue;
        }
        match std::fs::remove_file(entry.path()) {
            Ok(()) => {
                removed += 1;
                sink.record(&BatchEvent::FileRemoved {
                    path: entry.path().to_path_buf(),
                });
            }
            Err(e) => tally.fail(entry.path(), e),
        }
    }
    tally.removed += removed;
    sink.record(&BatchEvent::DirectoryPurged {
        dir: dir.to_path_buf(),
        removed,
    });
}

/// Remove every regular file directly inside each of `dirs`.
///
/// Returns the number of files removed. Purging an empty or missing
/// directory removes nothing and succeeds.
pub fn purge(dirs: &[&Path], sink: &dyn ActivitySink) -> Result<usize, PurgeError> {
    let mut tally = Tally::default();
    for dir in dirs {
        purge_into(dir, &mut tally, sink);
    }
    let removed = tally.removed;
    tally.finish(removed)
}

/// Request-scoped batch directories under `root`.
fn batch_dirs(root: &Path, tally: &mut Tally) -> Vec<PathBuf> {
    children(&root.join(BATCHES_DIR), tally)
        .into_iter()
        .filter(|e| e.file_type().is_dir())
        .map(walkdir::DirEntry::into_path)
        .collect()
}

fn remove_empty_dir(dir: &Path, tally: &mut Tally) {
    match std::fs::remove_dir(dir) {
        Err(e) if e.kind() != ErrorKind::NotFound => tally.fail(dir, e),
        _ => {}
    }
}

/// Purge all working files under `root`.
///
/// Empties `<root>` and `<root>/resized`, then every batch directory and its
/// `resized/` area, removing the emptied batch directories. Returns the
/// number of files removed.
pub fn clean_workspace(root: &Path, sink: &dyn ActivitySink) -> Result<usize, PurgeError> {
    let mut tally = Tally::default();

    purge_into(root, &mut tally, sink);
    purge_into(&root.join(RESIZED_DIR), &mut tally, sink);

    for batch in batch_dirs(root, &mut tally) {
        let resized = batch.join(RESIZED_DIR);
        purge_into(&batch, &mut tally, sink);
        purge_into(&resized, &mut tally, sink);
        remove_empty_dir(&resized, &mut tally);
        remove_empty_dir(&batch, &mut tally);
    }

    let removed = tally.removed;
    tally.finish(removed)
}

fn is_expired(entry: &walkdir::DirEntry, max_age: Duration, now: SystemTime) -> bool {
    entry
        .metadata()
        .ok()
        .and_then(|m| m.modified().ok())
        .and_then(|modified| now.duration_since(modified).ok())
        .is_some_and(|age| age > max_age)
}

/// Remove archives and batch directories last modified more than `max_age`
/// before `now`.
pub fn sweep_expired(
    root: &Path,
    max_age: Duration,
    now: SystemTime,
    sink: &dyn ActivitySink,
) -> Result<SweepReport, PurgeError> {
    let mut tally = Tally::default();
    let mut report = SweepReport::default();

    for entry in children(root, &mut tally) {
        let is_archive = entry.file_type().is_file()
            && is_archive_name(&entry.file_name().to_string_lossy());
        if !is_archive || !is_expired(&entry, max_age, now) {
            continue;
        }
        match std::fs::remove_file(entry.path()) {
            Ok(()) => {
                report.archives += 1;
                tally.removed += 1;
                sink.record(&BatchEvent::Expired {
                    path: entry.path().to_path_buf(),
                });
            }
            Err(e) => tally.fail(entry.path(), e),
        }
    }

    for entry in children(&root.join(BATCHES_DIR), &mut tally) {
        if !entry.file_type().is_dir() || !is_expired(&entry, max_age, now) {
            continue;
        }
        match std::fs::remove_dir_all(entry.path()) {
            Ok(()) => {
                report.batches += 1;
                tally.removed += 1;
                sink.record(&BatchEvent::Expired {
                    path: entry.path().to_path_buf(),
                });
            }
            Err(e) => tally.fail(entry.path(), e),
        }
    }

    tally.finish(report)
}
