//! Activity log: structured batch events and the sinks that receive them.
//!
//! The pipeline and the janitor never write log files directly. They report
//! [`BatchEvent`]s to an injected [`ActivitySink`], and the caller decides
//! where events go:
//!
//! | Sink | Use |
//! |---|---|
//! | [`FileActivityLog`] | Append-only `log.txt`, one timestamped line per event |
//! | `mpsc::Sender<BatchEvent>` | Stream events to a printer thread (CLI) |
//! | [`Tee`] | Fan one event out to several sinks |
//! | [`NullSink`] | Discard |
//!
//! Log lines look like:
//!
//! ```text
//! [2026-10-18T09:14:03.512Z] batch started: 5 files, midpoint 003, width 500
//! [2026-10-18T09:14:03.530Z] #002 dusk.png: distance 1/2, original 300 → 400
//! ```
//!
//! Event indices are 0-based sequence indices; every rendering shows them as
//! 1-based positions through [`position`].

use chrono::{SecondsFormat, Utc};
use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Sender;

/// Something that happened during a batch or a cleanup.
#[derive(Debug, Clone, PartialEq)]
pub enum BatchEvent {
    /// The requested width was rejected before any work started.
    InvalidWidth { raw: String },
    BatchStarted {
        count: usize,
        midpoint: usize,
        target_width: u32,
    },
    /// A width was resolved for one item. `original_width` is `None` when
    /// no identify was needed (midpoint or single item).
    WidthResolved {
        index: usize,
        file: String,
        original_width: Option<u32>,
        distance: usize,
        max_distance: usize,
        resolved_width: u32,
    },
    ItemWritten { index: usize, output: PathBuf },
    ArchiveBuilt { path: PathBuf, entries: usize },
    FileRemoved { path: PathBuf },
    DirectoryPurged { dir: PathBuf, removed: usize },
    Expired { path: PathBuf },
    Failed { message: String },
}

/// Receiver of batch events.
///
/// Sinks are write-only and infallible from the caller's point of view: a
/// sink that cannot persist an event reports it through `tracing` and moves on.
pub trait ActivitySink {
    fn record(&self, event: &BatchEvent);
}

/// 1-based, 3-digit zero-padded display position of a 0-based index.
pub fn position(sequence_index: usize) -> String {
    format!("{:0>3}", sequence_index + 1)
}

/// Render an event as a single log line (without timestamp).
pub fn log_line(event: &BatchEvent) -> String {
    match event {
        BatchEvent::InvalidWidth { raw } => format!("invalid width: {:?}", raw),
        BatchEvent::BatchStarted {
            count,
            midpoint,
            target_width,
        } => format!(
            "batch started: {} files, midpoint {}, width {}",
            count,
            position(*midpoint),
            target_width
        ),
        BatchEvent::WidthResolved {
            index,
            file,
            original_width: Some(original),
            distance,
            max_distance,
            resolved_width,
        } => format!(
            "#{} {}: distance {}/{}, original {} \u{2192} {}",
            position(*index),
            file,
            distance,
            max_distance,
            original,
            resolved_width
        ),
        BatchEvent::WidthResolved {
            index,
            file,
            original_width: None,
            resolved_width,
            ..
        } => format!(
            "#{} {}: midpoint \u{2192} {}",
            position(*index),
            file,
            resolved_width
        ),
        BatchEvent::ItemWritten { index, output } => {
            format!("#{} saved {}", position(*index), output.display())
        }
        BatchEvent::ArchiveBuilt { path, entries } => {
            format!("archive created: {} ({} files)", path.display(), entries)
        }
        BatchEvent::FileRemoved { path } => format!("removed {}", path.display()),
        BatchEvent::DirectoryPurged { dir, removed } => {
            format!("purged {} ({} files)", dir.display(), removed)
        }
        BatchEvent::Expired { path } => format!("expired {}", path.display()),
        BatchEvent::Failed { message } => format!("error: {}", message),
    }
}

/// Current UTC time in the log's timestamp format.
pub fn timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
}

/// Append-only, line-oriented log file.
#[derive(Debug, Clone)]
pub struct FileActivityLog {
    path: PathBuf,
}

impl FileActivityLog {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn append(&self, line: &str) -> std::io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "[{}] {}", timestamp(), line)
    }
}

impl ActivitySink for FileActivityLog {
    fn record(&self, event: &BatchEvent) {
        if let Err(e) = self.append(&log_line(event)) {
            tracing::warn!(path = %self.path.display(), error = %e, "activity log write failed");
        }
    }
}

impl ActivitySink for Sender<BatchEvent> {
    fn record(&self, event: &BatchEvent) {
        // A dropped receiver only means nobody is watching anymore.
        let _ = self.send(event.clone());
    }
}

/// Fan-out to several sinks, in order.
pub struct Tee<'a>(pub Vec<&'a dyn ActivitySink>);

impl ActivitySink for Tee<'_> {
    fn record(&self, event: &BatchEvent) {
        for sink in &self.0 {
            sink.record(event);
        }
    }
}

/// Sink that drops every event.
pub struct NullSink;

impl ActivitySink for NullSink {
    fn record(&self, _event: &BatchEvent) {}
}
