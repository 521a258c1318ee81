//! Image processing backend trait and shared types.
//!
//! The [`ImageBackend`] trait defines the two operations the batch pipeline
//! needs: identify (header-only metadata read) and resize.
//!
//! The production implementation is
//! [`RustBackend`](super::rust_backend::RustBackend), pure Rust on the
//! `image` crate. Tests use the recording `MockBackend` below.

use super::params::ResizeParams;
use std::path::Path;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BackendError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Decode failed: {0}")]
    Decode(String),
    #[error("Encode failed: {0}")]
    Encode(String),
}

/// Result of an identify operation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Dimensions {
    pub width: u32,
    pub height: u32,
}

/// Trait for image processing backends.
pub trait ImageBackend {
    /// Get image dimensions without producing any output.
    fn identify(&self, path: &Path) -> Result<Dimensions, BackendError>;

    /// Decode the source, scale it to `params.width` keeping the aspect
    /// ratio, and write it as JPEG to `params.output`.
    fn resize(&self, params: &ResizeParams) -> Result<(), BackendError>;
}
