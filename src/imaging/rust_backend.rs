//! Pure Rust image processing backend.
//!
//! ## Crate mapping
//!
//! | Operation | Crate / function |
//! |---|---|
//! | Read dimensions | `image::ImageReader::into_dimensions` (header only) |
//! | Decode (JPEG, PNG, TIFF, WebP, GIF, BMP) | `image` crate, format sniffed from content |
//! | Resize | `DynamicImage::resize_exact` with `Lanczos3` |
//! | Encode → JPEG | `image::codecs::jpeg::JpegEncoder` |
//!
//! Uploaded files keep whatever name the client sent, so the format is
//! guessed from the leading bytes rather than trusted from the extension.

use super::backend::{BackendError, Dimensions, ImageBackend};
use super::calculations::scaled_height;
use super::params::ResizeParams;
use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{DynamicImage, ImageError, ImageReader};
use std::io::{BufWriter, Write};
use std::path::Path;

/// Largest side a baseline JPEG can encode.
pub const MAX_JPEG_DIMENSION: u32 = 65_535;

/// Upper bound on output pixels (100 megapixels) so a huge requested width
/// is refused before the resize buffer is allocated.
pub const MAX_OUTPUT_PIXELS: u64 = 100_000_000;

/// Pure Rust backend using the `image` crate ecosystem.
///
/// See the [module docs](self) for the crate-to-operation mapping.
pub struct RustBackend;

impl RustBackend {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RustBackend {
    fn default() -> Self {
        Self::new()
    }
}

fn decode_error(path: &Path, err: ImageError) -> BackendError {
    match err {
        ImageError::IoError(e) => BackendError::Io(e),
        other => BackendError::Decode(format!("{}: {}", path.display(), other)),
    }
}

fn open_reader(path: &Path) -> Result<ImageReader<std::io::BufReader<std::fs::File>>, BackendError> {
    Ok(ImageReader::open(path)?.with_guessed_format()?)
}

/// Load and decode an image from disk.
fn load_image(path: &Path) -> Result<DynamicImage, BackendError> {
    open_reader(path)?
        .decode()
        .map_err(|e| decode_error(path, e))
}

/// Encode as baseline JPEG. Alpha is dropped; JPEG has no alpha channel.
fn save_jpeg(img: &DynamicImage, path: &Path, quality: u32) -> Result<(), BackendError> {
    let encode_err = |e: &dyn std::fmt::Display| {
        BackendError::Encode(format!("{}: {}", path.display(), e))
    };

    let file = std::fs::File::create(path).map_err(|e| encode_err(&e))?;
    let mut writer = BufWriter::new(file);
    let encoder = JpegEncoder::new_with_quality(&mut writer, quality as u8);
    DynamicImage::ImageRgb8(img.to_rgb8())
        .write_with_encoder(encoder)
        .map_err(|e| encode_err(&e))?;
    writer.flush().map_err(|e| encode_err(&e))
}

/// Refuse outputs JPEG cannot hold or that exceed the pixel budget.
fn check_output_size(output: &Path, width: u32, height: u32) -> Result<(), BackendError> {
    let pixels = width as u64 * height as u64;
    if width > MAX_JPEG_DIMENSION || height > MAX_JPEG_DIMENSION || pixels > MAX_OUTPUT_PIXELS {
        return Err(BackendError::Encode(format!(
            "{}: output {}x{} exceeds the {} pixel / {} px per side limit",
            output.display(),
            width,
            height,
            MAX_OUTPUT_PIXELS,
            MAX_JPEG_DIMENSION
        )));
    }
    Ok(())
}

impl ImageBackend for RustBackend {
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError> {
        let (width, height) = open_reader(path)?
            .into_dimensions()
            .map_err(|e| decode_error(path, e))?;
        Ok(Dimensions { width, height })
    }

    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError> {
        let source = self.identify(&params.source)?;
        let height = scaled_height((source.width, source.height), params.width);
        check_output_size(&params.output, params.width, height)?;

        let img = load_image(&params.source)?;
        let resized = img.resize_exact(params.width, height, FilterType::Lanczos3);
        save_jpeg(&resized, &params.output, params.quality.value())
    }
}
