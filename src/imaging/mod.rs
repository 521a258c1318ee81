//! Image processing in pure Rust.
//!
//! | Operation | Crate / function |
//! |---|---|
//! | **Identify** | `image::ImageReader::into_dimensions` |
//! | **Resize → JPEG** | Lanczos3 + `JpegEncoder` |
//! | **Width taper** | [`resolve_width`] (no I/O) |
//!
//! The module is split into:
//! - **Calculations**: Pure functions for the width taper and aspect math (unit testable)
//! - **Parameters**: Data structures describing image operations
//! - **Backend**: [`ImageBackend`] trait + [`RustBackend`]
//! - **Operations**: High-level functions combining naming + backend

pub mod backend;
mod calculations;
pub mod operations;
mod params;
pub mod rust_backend;

pub use backend::{BackendError, Dimensions, ImageBackend};
pub use calculations::{
    max_distance, midpoint_index, needs_original_width, resolve_width, scaled_height,
};
pub use operations::{get_width, plan_resize, resize_to_width};
pub use params::{Quality, ResizeParams};
pub use rust_backend::RustBackend;
