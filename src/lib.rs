//! # Taper
//!
//! A batch image resizer. Give it a target width and a handful of images;
//! the image in the middle of the batch comes out at exactly the target
//! width and the others taper linearly toward their own original widths the
//! further they sit from the middle. Every result is re-encoded as JPEG and
//! the whole batch ships as one zip archive.
//!
//! # Architecture: One Pipeline, Sequential
//!
//! ```text
//! validate width → ingest → for each item: plan width → resize → archive
//! ```
//!
//! - **Validate**: [`process::TargetWidth::parse`] rejects bad widths before
//!   anything touches the disk.
//! - **Ingest**: [`workspace::ingest`] copies inbound files into a holding area
//!   in arrival order.
//! - **Plan + resize**: [`process::process_batch`] resolves each item's width
//!   with [`imaging::resolve_width`] and drives an [`imaging::ImageBackend`].
//! - **Archive**: [`archive::build_archive`] zips the resized-output directory.
//!
//! Items are processed strictly one after another. The first failure halts the
//! batch and leaves earlier outputs in place.
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`process`] | Batch pipeline: width validation, per-item planning, resize, archive |
//! | [`imaging`] | Width taper math, `ImageBackend` trait, pure-Rust backend |
//! | [`archive`] | Zip packaging of resized outputs |
//! | [`workspace`] | Upload holding area, resized area, ingest boundary |
//! | [`janitor`] | Cleanup of working files and the retention sweep |
//! | [`activity`] | Batch events and the sinks that record them (`log.txt`) |
//! | [`naming`] | Output, upload, archive and batch directory names |
//! | [`config`] | `taper.toml` loading, validation and merging |
//! | [`output`] | CLI output formatting |
//!
//! # Design Decisions
//!
//! ## Exact Integer Taper
//!
//! The width blend `target + distance / max_distance * (original - target)` is
//! evaluated as a single floor division in `i64`. No floating point is
//! involved, so a resolved width can never overshoot the segment between the
//! target and the original width.
//!
//! ## Request-Scoped Workspaces
//!
//! With `workspace.isolate_batches` (the default) every batch gets its own
//! directory under `<root>/batches/`. Two batches running at the same time can
//! then never sweep each other's outputs into their archives. A successful
//! batch removes its directory once the archive is written; a failed one keeps
//! it so the completed outputs can be inspected, until `taper clean` or
//! `taper sweep` removes it.
//!
//! ## Logging as a Capability
//!
//! Nothing in the library writes log files on its own. The pipeline and the
//! janitor report [`activity::BatchEvent`]s to whatever
//! [`activity::ActivitySink`] the caller passes in: the append-only
//! `log.txt`, a channel feeding the CLI printer, or both.

pub mod activity;
pub mod archive;
pub mod config;
pub mod imaging;
pub mod janitor;
pub mod naming;
pub mod output;
pub mod process;
pub mod workspace;

#[cfg(test)]
pub(crate) mod test_helpers;
