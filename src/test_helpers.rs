//! Shared test utilities for the taper test suite.
//!
//! Provides synthetic image writers, batch staging, and an archive reader so
//! pipeline tests can assert on what actually landed in the zip.
//!
//! # Usage
//!
//! ```rust
//! use crate::test_helpers::*;
//!
//! let tmp = TempDir::new().unwrap();
//! let ws = Workspace::for_batch(tmp.path());
//! let items = stage_items(&ws, &["a.jpg", "b.jpg", "c.jpg"]);
//!
//! let entries = read_zip_entries(&archive_path);
//! assert_eq!(entries[0].0, "a--100.jpg");
//! ```

use image::{ImageEncoder, ImageFormat, RgbImage};
use std::io::Read;
use std::path::Path;

use crate::naming::stored_upload_name;
use crate::workspace::{UploadedItem, Workspace};

// =========================================================================
// Synthetic images
// =========================================================================

fn gradient(width: u32, height: u32) -> RgbImage {
    RgbImage::from_fn(width, height, |x, y| {
        image::Rgb([(x % 256) as u8, (y % 256) as u8, 128])
    })
}

/// Create a small valid JPEG file with the given dimensions.
pub fn create_test_jpeg(path: &Path, width: u32, height: u32) {
    let img = gradient(width, height);
    let file = std::fs::File::create(path).unwrap();
    let writer = std::io::BufWriter::new(file);
    image::codecs::jpeg::JpegEncoder::new(writer)
        .write_image(img.as_raw(), width, height, image::ExtendedColorType::Rgb8)
        .unwrap();
}

/// Create a small valid PNG file with the given dimensions.
pub fn create_test_png(path: &Path, width: u32, height: u32) {
    gradient(width, height)
        .save_with_format(path, ImageFormat::Png)
        .unwrap();
}

// =========================================================================
// Batch staging
// =========================================================================

/// Store placeholder uploads for `names` in the workspace, as ingest would.
///
/// The bytes are not an image; use with `MockBackend`.
pub fn stage_items(workspace: &Workspace, names: &[&str]) -> Vec<UploadedItem> {
    std::fs::create_dir_all(workspace.uploads()).unwrap();
    names
        .iter()
        .enumerate()
        .map(|(sequence_index, name)| {
            let storage_path = workspace
                .uploads()
                .join(stored_upload_name(sequence_index, name));
            std::fs::write(&storage_path, name.as_bytes()).unwrap();
            UploadedItem {
                original_file_name: name.to_string(),
                storage_path,
                sequence_index,
            }
        })
        .collect()
}

// =========================================================================
// Archive inspection
// =========================================================================

/// Read every entry of a zip as `(name, bytes)`, in archive order.
pub fn read_zip_entries(path: &Path) -> Vec<(String, Vec<u8>)> {
    let file = std::fs::File::open(path).unwrap();
    let mut archive = zip::ZipArchive::new(file).unwrap();
    (0..archive.len())
        .map(|i| {
            let mut entry = archive.by_index(i).unwrap();
            let mut bytes = Vec::new();
            entry.read_to_end(&mut bytes).unwrap();
            (entry.name().to_string(), bytes)
        })
        .collect()
}
