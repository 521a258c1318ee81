//! Zip packaging of resized outputs.
//!
//! [`build_archive`] snapshots the regular files directly inside a source
//! directory and streams them into a single zip written next to the uploads.
//! Nested directories are ignored and entry names are flat file names.
//!
//! ## Naming
//!
//! Archives are named `archive-<epochMillis>-<random>.zip`. The random part
//! is a full `u64`, so names generated within the same millisecond collide
//! only with negligible probability. Uniqueness is best effort: a collision
//! would truncate the older archive.
//!
//! ## Failure
//!
//! The archive is only returned after the zip central directory has been
//! written and the file flushed. A failure part way leaves the partial file
//! on disk; the janitor removes it with the rest of the uploads.

use crate::naming::archive_file_name;
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use thiserror::Error;
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

/// Deflate level used when none is configured.
pub const MAX_COMPRESSION: u32 = 9;

#[derive(Error, Debug)]
pub enum ArchiveError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Cannot read {0}")]
    Walk(#[from] walkdir::Error),
    #[error("Zip error: {0}")]
    Zip(#[from] zip::result::ZipError),
}

/// A finalized archive on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BuiltArchive {
    pub path: PathBuf,
    pub file_name: String,
    /// Entry names in archive order.
    pub entries: Vec<String>,
}

/// Generate a fresh archive name from the current clock and a random `u64`.
pub fn generate_archive_name() -> String {
    let millis = chrono::Utc::now().timestamp_millis();
    archive_file_name(millis, rand::random::<u64>())
}

/// Regular files directly inside `dir`, sorted by file name.
fn list_regular_files(dir: &Path) -> Result<Vec<PathBuf>, ArchiveError> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).min_depth(1).max_depth(1).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() {
            files.push(entry.into_path());
        }
    }
    Ok(files)
}

/// Stream every regular file in `source_dir` into a new zip in `archive_dir`.
///
/// `compression_level` is the Deflate level (0–9).
pub fn build_archive(
    source_dir: &Path,
    archive_dir: &Path,
    compression_level: u32,
) -> Result<BuiltArchive, ArchiveError> {
    let files = list_regular_files(source_dir)?;

    let file_name = generate_archive_name();
    let path = archive_dir.join(&file_name);
    let mut zip = ZipWriter::new(BufWriter::new(File::create(&path)?));
    let options = SimpleFileOptions::default()
        .compression_method(CompressionMethod::Deflated)
        .compression_level(Some(compression_level.min(MAX_COMPRESSION) as i64));

    let mut entries = Vec::with_capacity(files.len());
    for file in &files {
        let Some(name) = file.file_name().map(|n| n.to_string_lossy().into_owned()) else {
            continue;
        };
        zip.start_file(name.as_str(), options)?;
        std::io::copy(&mut File::open(file)?, &mut zip)?;
        tracing::trace!(entry = %name, "archived");
        entries.push(name);
    }

    let mut writer = zip.finish()?;
    writer.flush()?;

    Ok(BuiltArchive {
        path,
        file_name,
        entries,
    })
}
