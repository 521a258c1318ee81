//! High-level image operations.
//!
//! These functions combine naming and calculations with backend execution.
//! They take a batch item and a resolved width, compute parameters, and call
//! the backend.

use super::backend::{BackendError, ImageBackend};
use super::params::{Quality, ResizeParams};
use crate::naming::output_file_name;
use std::path::{Path, PathBuf};

/// Result type for image operations.
pub type Result<T> = std::result::Result<T, BackendError>;

/// Get the original width of an image using the backend.
pub fn get_width(backend: &impl ImageBackend, path: &Path) -> Result<u32> {
    Ok(backend.identify(path)?.width)
}

/// Plan a resize without executing it.
///
/// The output name is derived from the *original* file name the client sent,
/// not from the stored upload path.
pub fn plan_resize(
    source: &Path,
    original_file_name: &str,
    width: u32,
    output_dir: &Path,
    quality: Quality,
) -> ResizeParams {
    ResizeParams {
        source: source.to_path_buf(),
        output: output_dir.join(output_file_name(original_file_name, width)),
        width,
        quality,
    }
}

/// Resize one image to `width` and write it into `output_dir`.
///
/// Returns the path of the written JPEG.
pub fn resize_to_width(
    backend: &impl ImageBackend,
    source: &Path,
    original_file_name: &str,
    width: u32,
    output_dir: &Path,
    quality: Quality,
) -> Result<PathBuf> {
    let params = plan_resize(source, original_file_name, width, output_dir, quality);
    backend.resize(&params)?;
    Ok(params.output)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};

    #[test]
    fn get_width_calls_backend() {
        let backend = MockBackend::with_dimensions(&[("test.jpg", 1920, 1080)]);

        let width = get_width(&backend, Path::new("/uploads/test.jpg")).unwrap();
        assert_eq!(width, 1920);
    }

    #[test]
    fn plan_resize_names_output_after_original() {
        let params = plan_resize(
            Path::new("/uploads/003-IMG_0042.PNG"),
            "IMG_0042.PNG",
            640,
            Path::new("/uploads/resized"),
            Quality::default(),
        );

        assert_eq!(params.output, Path::new("/uploads/resized/IMG_0042--640.jpg"));
        assert_eq!(params.width, 640);
        assert_eq!(params.source, Path::new("/uploads/003-IMG_0042.PNG"));
    }

    #[test]
    fn resize_to_width_uses_backend() {
        let tmp = tempfile::TempDir::new().unwrap();
        let backend = MockBackend::new();

        let out = resize_to_width(
            &backend,
            Path::new("/uploads/000-dawn.jpg"),
            "dawn.jpg",
            500,
            tmp.path(),
            Quality::new(70),
        )
        .unwrap();

        assert_eq!(out, tmp.path().join("dawn--500.jpg"));
        let ops = backend.get_operations();
        assert_eq!(ops.len(), 1);
        assert!(matches!(
            &ops[0],
            RecordedOp::Resize { width: 500, quality: 70, output, .. } if output.ends_with("dawn--500.jpg")
        ));
    }
}
