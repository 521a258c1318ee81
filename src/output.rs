//! CLI output formatting.
//!
//! Output is **item-centric**: every line about an image leads with its
//! positional index and the file name the client sent, with the computed
//! width and output file as context. Paths are only shown where the user
//! needs them (the archive, purged directories).
//!
//! # Output Format
//!
//! ## Resize
//!
//! ```text
//! Batch: 5 images, target 500px, midpoint 003
//!     001 a.jpg → 100px (original 100px, distance 2/2)
//!         Saved: a--100.jpg
//!     003 c.jpg → 500px (midpoint)
//!         Saved: c--500.jpg
//! Archive: public/uploads/archive-1760778843512-9182736450.zip (5 files)
//! ```
//!
//! ## Clean / Sweep
//!
//! ```text
//! Purged public/uploads (3 files)
//! Purged public/uploads/resized (3 files)
//! Removed 6 files
//!
//! Expired public/uploads/archive-1760000000000-1.zip
//! Swept 1 archive, 2 batches
//! ```
//!
//! # Architecture
//!
//! Each output has a `format_*` function (returns `Vec<String>`) for
//! testability and a `print_*` wrapper that writes to stdout. Format
//! functions are pure: no I/O, no side effects.

use crate::activity::{self, BatchEvent};
use crate::janitor::SweepReport;
use crate::process::BatchOutcome;
use std::path::Path;

// ============================================================================
// Shared display helpers
// ============================================================================

/// Format a 0-based sequence index as a 1-based 3-digit zero-padded position.
///
/// Shared with the activity log so both number items the same way.
fn format_index(sequence_index: usize) -> String {
    activity::position(sequence_index)
}

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|f| f.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string())
}

/// `1 file`, `2 files`.
fn plural(count: usize, singular: &str, plural: &str) -> String {
    if count == 1 {
        format!("{} {}", count, singular)
    } else {
        format!("{} {}", count, plural)
    }
}

// ============================================================================
// Batch events
// ============================================================================

/// Format a single batch event as display lines.
///
/// Per-file removals are only interesting in the activity log; they format
/// to nothing here and the per-directory summary is shown instead. A rejected
/// width also formats to nothing: the failure line already carries it.
pub fn format_batch_event(event: &BatchEvent) -> Vec<String> {
    match event {
        BatchEvent::InvalidWidth { .. } => Vec::new(),
        BatchEvent::BatchStarted {
            count,
            midpoint,
            target_width,
        } => vec![format!(
            "Batch: {}, target {}px, midpoint {}",
            plural(*count, "image", "images"),
            target_width,
            format_index(*midpoint)
        )],
        BatchEvent::WidthResolved {
            index,
            file,
            original_width,
            distance,
            max_distance,
            resolved_width,
        } => {
            let detail = match original_width {
                Some(original) => format!(
                    "original {}px, distance {}/{}",
                    original, distance, max_distance
                ),
                None => "midpoint".to_string(),
            };
            vec![format!(
                "{}{} {} \u{2192} {}px ({})",
                indent(1),
                format_index(*index),
                file,
                resolved_width,
                detail
            )]
        }
        BatchEvent::ItemWritten { output, .. } => {
            vec![format!("{}Saved: {}", indent(2), file_name(output))]
        }
        BatchEvent::ArchiveBuilt { path, entries } => vec![format!(
            "Archive: {} ({})",
            path.display(),
            plural(*entries, "file", "files")
        )],
        BatchEvent::FileRemoved { .. } => Vec::new(),
        BatchEvent::DirectoryPurged { dir, removed } => vec![format!(
            "Purged {} ({})",
            dir.display(),
            plural(*removed, "file", "files")
        )],
        BatchEvent::Expired { path } => vec![format!("Expired {}", path.display())],
        BatchEvent::Failed { message } => vec![format!("Error: {}", message)],
    }
}

pub fn print_batch_event(event: &BatchEvent) {
    for line in format_batch_event(event) {
        println!("{}", line);
    }
}

// ============================================================================
// Command summaries
// ============================================================================

/// Final summary of a successful resize.
pub fn format_outcome(outcome: &BatchOutcome) -> Vec<String> {
    vec![format!(
        "Resized {} into {}",
        plural(outcome.outputs.len(), "image", "images"),
        outcome.archive.file_name
    )]
}

pub fn print_outcome(outcome: &BatchOutcome) {
    for line in format_outcome(outcome) {
        println!("{}", line);
    }
}

pub fn format_clean_summary(removed: usize) -> Vec<String> {
    vec![format!("Removed {}", plural(removed, "file", "files"))]
}

pub fn print_clean_summary(removed: usize) {
    for line in format_clean_summary(removed) {
        println!("{}", line);
    }
}

pub fn format_sweep_summary(report: &SweepReport) -> Vec<String> {
    vec![format!(
        "Swept {}, {}",
        plural(report.archives, "archive", "archives"),
        plural(report.batches, "batch", "batches")
    )]
}

pub fn print_sweep_summary(report: &SweepReport) {
    for line in format_sweep_summary(report) {
        println!("{}", line);
    }
}
