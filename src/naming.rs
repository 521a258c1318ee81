//! Centralized file naming for uploads, resized outputs and archives.
//!
//! Every name the pipeline writes is produced here so the on-disk contract
//! lives in one place:
//!
//! | Artifact | Pattern | Example |
//! |---|---|---|
//! | Stored upload | `NNN-<original name>` | `002-IMG_0042.PNG` |
//! | Resized output | `<base>--<width>.jpg` | `IMG_0042--640.jpg` |
//! | Archive | `archive-<epochMillis>-<random>.zip` | `archive-1760745600000-913…zip` |
//! | Batch directory | `<epochMillis>-<random>` | `1760745600000-48213…` |
//!
//! The base name is the client's file name with any directory part and the
//! last extension removed. Two uploads with the same base name resolve to
//! the same output name when their widths match; the later one overwrites.

/// Fallback base name for uploads that arrive without a usable name.
const UNNAMED: &str = "image";

/// Client file name without directory components.
///
/// Both separators are stripped regardless of platform because the name
/// comes from an arbitrary client.
pub fn client_file_name(original: &str) -> &str {
    original.rsplit(['/', '\\']).next().unwrap_or(original)
}

/// Base name used for outputs: file name with the last extension removed.
///
/// A leading dot is part of the name, not an extension marker:
/// - `"dawn.jpg"` → `"dawn"`
/// - `"archive.tar.gz"` → `"archive.tar"`
/// - `".hidden"` → `".hidden"`
/// - `"C:\\photos\\dusk.png"` → `"dusk"`
pub fn base_name(original: &str) -> &str {
    let name = client_file_name(original);
    let stem = match name.rfind('.') {
        None | Some(0) => name,
        Some(pos) => &name[..pos],
    };
    if stem.is_empty() { UNNAMED } else { stem }
}

/// Deterministic name of a resized output.
pub fn output_file_name(original: &str, width: u32) -> String {
    format!("{}--{}.jpg", base_name(original), width)
}

/// Name under which an inbound file is stored in the holding area.
///
/// The sequence prefix keeps uploads with identical client names apart.
pub fn stored_upload_name(sequence_index: usize, original: &str) -> String {
    let name = client_file_name(original);
    let name = if name.is_empty() { UNNAMED } else { name };
    format!("{:0>3}-{}", sequence_index, name)
}

/// Archive file name from a millisecond timestamp and a random component.
pub fn archive_file_name(epoch_millis: i64, random: u64) -> String {
    format!("archive-{}-{}.zip", epoch_millis, random)
}

/// Whether a file name follows the archive pattern.
pub fn is_archive_name(name: &str) -> bool {
    parse_archive_name(name).is_some()
}

/// Split an archive name back into `(epoch_millis, random)`.
pub fn parse_archive_name(name: &str) -> Option<(i64, u64)> {
    let inner = name.strip_prefix("archive-")?.strip_suffix(".zip")?;
    let (millis, random) = inner.split_once('-')?;
    Some((millis.parse().ok()?, random.parse().ok()?))
}

/// Name of a request-scoped batch directory.
pub fn batch_dir_name(epoch_millis: i64, random: u64) -> String {
    format!("{}-{}", epoch_millis, random)
}
