//! Batch pipeline: width taper, resize, archive.
//!
//! Takes the items stored by [`crate::workspace::ingest`] and a target width,
//! resizes every item so widths taper from the target at the midpoint toward
//! each image's original width at the edges, and packages the results into a
//! single zip.
//!
//! ## Stages
//!
//! ```text
//! Idle → Validating → Processing(0..n) → Archiving → Done
//!            │               │               │
//!            └───────────────┴───────────────┴──→ Failed
//! ```
//!
//! Validation happens in [`TargetWidth::parse`], before a [`BatchContext`]
//! can even be built, so an invalid width never reaches the filesystem.
//!
//! ## Failure
//!
//! The first failing item halts the batch. Outputs already written stay on
//! disk and no archive is built; [`BatchError::Item`] reports how many items
//! completed. A request-scoped workspace is only discarded after a
//! successful archive.
//!
//! ## Example
//!
//! ```text
//! target 500, originals [100, 300, *, 700, 900]
//!   #001 distance 2/2 → 100
//!   #002 distance 1/2 → 400
//!   #003 midpoint     → 500
//!   #004 distance 1/2 → 600
//!   #005 distance 2/2 → 900
//! ```

use crate::activity::{ActivitySink, BatchEvent};
use crate::archive::{ArchiveError, BuiltArchive, MAX_COMPRESSION, build_archive};
use crate::config::TaperConfig;
use crate::imaging::{
    BackendError, ImageBackend, Quality, get_width, max_distance, midpoint_index,
    needs_original_width, resize_to_width, resolve_width,
};
use crate::workspace::{IngestError, UploadedItem, Workspace, ingest};
use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum BatchError {
    #[error("Invalid width {0:?}: expected a positive integer")]
    InvalidWidth(String),
    #[error(
        "Item #{} ({file}) failed after {completed} completed: {source}",
        display_position(.index)
    )]
    Item {
        index: usize,
        file: String,
        completed: usize,
        #[source]
        source: BackendError,
    },
    #[error("{0}")]
    Ingest(#[from] IngestError),
    #[error("Archive failed: {0}")]
    Archive(#[from] ArchiveError),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

fn display_position(index: &usize) -> String {
    crate::activity::position(*index)
}

/// A validated, strictly positive target width.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TargetWidth(u32);

impl TargetWidth {
    /// Parse a user-supplied width.
    ///
    /// Leading whitespace and an optional sign are accepted, then the
    /// leading run of digits is taken and anything after it ignored, so
    /// `"600px"` is 600. Empty, zero, negative and non-numeric input is
    /// rejected, as is a value that does not fit in `u32`.
    pub fn parse(raw: &str) -> Result<Self, BatchError> {
        let invalid = || BatchError::InvalidWidth(raw.to_string());

        let trimmed = raw.trim_start();
        let (negative, rest) = match trimmed.as_bytes().first() {
            Some(b'-') => (true, &trimmed[1..]),
            Some(b'+') => (false, &trimmed[1..]),
            _ => (false, trimmed),
        };
        let digits_end = rest
            .find(|c: char| !c.is_ascii_digit())
            .unwrap_or(rest.len());
        let digits = &rest[..digits_end];
        if digits.is_empty() {
            return Err(invalid());
        }

        let value: u32 = digits.parse().map_err(|_| invalid())?;
        if negative || value == 0 {
            return Err(invalid());
        }
        Ok(Self(value))
    }

    pub fn get(self) -> u32 {
        self.0
    }
}

impl fmt::Display for TargetWidth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Everything the pipeline needs to know about one batch up front.
#[derive(Debug, Clone)]
pub struct BatchContext {
    pub items: Vec<UploadedItem>,
    pub target_width: TargetWidth,
    pub midpoint_index: usize,
}

impl BatchContext {
    pub fn new(items: Vec<UploadedItem>, target_width: TargetWidth) -> Self {
        let midpoint_index = midpoint_index(items.len());
        Self {
            items,
            target_width,
            midpoint_index,
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// The width chosen for one item.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResizePlan {
    pub sequence_index: usize,
    pub resolved_width: u32,
    /// Original width read from the image; `None` when it was not needed.
    pub original_width: Option<u32>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResizedOutput {
    pub sequence_index: usize,
    pub original_file_name: String,
    pub resolved_width: u32,
    pub output_path: PathBuf,
}

#[derive(Debug, Clone)]
pub struct BatchOutcome {
    pub archive: BuiltArchive,
    pub outputs: Vec<ResizedOutput>,
}

/// Encoding and packaging settings for a batch.
#[derive(Debug, Clone, Copy)]
pub struct BatchSettings {
    pub quality: Quality,
    pub compression_level: u32,
}

impl BatchSettings {
    pub fn from_config(config: &TaperConfig) -> Self {
        Self {
            quality: Quality::new(config.output.quality),
            compression_level: config.archive.compression_level,
        }
    }
}

impl Default for BatchSettings {
    fn default() -> Self {
        Self {
            quality: Quality::default(),
            compression_level: MAX_COMPRESSION,
        }
    }
}

/// Choose the output width for one item.
///
/// The original width is only read when the taper needs it.
pub fn plan_item(
    backend: &impl ImageBackend,
    context: &BatchContext,
    item: &UploadedItem,
) -> Result<ResizePlan, BackendError> {
    let index = item.sequence_index;
    let total = context.len();
    let target = context.target_width.get();

    if !needs_original_width(index, context.midpoint_index, total) {
        return Ok(ResizePlan {
            sequence_index: index,
            resolved_width: target,
            original_width: None,
        });
    }

    let original = get_width(backend, &item.storage_path)?;
    Ok(ResizePlan {
        sequence_index: index,
        resolved_width: resolve_width(index, context.midpoint_index, total, target, original),
        original_width: Some(original),
    })
}

/// Run a batch end to end.
///
/// Items are processed strictly in sequence order. Resized outputs go to the
/// workspace's resized area; the archive is written into `archive_dir`.
pub fn process_batch(
    backend: &impl ImageBackend,
    context: &BatchContext,
    workspace: &Workspace,
    archive_dir: &Path,
    settings: &BatchSettings,
    sink: &dyn ActivitySink,
) -> Result<BatchOutcome, BatchError> {
    let total = context.len();
    sink.record(&BatchEvent::BatchStarted {
        count: total,
        midpoint: context.midpoint_index,
        target_width: context.target_width.get(),
    });
    tracing::debug!(
        count = total,
        midpoint = context.midpoint_index,
        target = context.target_width.get(),
        "batch started"
    );

    workspace.ensure_resized()?;

    let mut outputs = Vec::with_capacity(total);
    for item in &context.items {
        let item_error = |source: BackendError| BatchError::Item {
            index: item.sequence_index,
            file: item.original_file_name.clone(),
            completed: outputs.len(),
            source,
        };

        let plan = plan_item(backend, context, item).map_err(item_error)?;
        sink.record(&BatchEvent::WidthResolved {
            index: item.sequence_index,
            file: item.original_file_name.clone(),
            original_width: plan.original_width,
            distance: item.sequence_index.abs_diff(context.midpoint_index),
            max_distance: max_distance(context.midpoint_index, total),
            resolved_width: plan.resolved_width,
        });

        let output_path = resize_to_width(
            backend,
            &item.storage_path,
            &item.original_file_name,
            plan.resolved_width,
            workspace.resized(),
            settings.quality,
        )
        .map_err(item_error)?;
        sink.record(&BatchEvent::ItemWritten {
            index: item.sequence_index,
            output: output_path.clone(),
        });

        outputs.push(ResizedOutput {
            sequence_index: item.sequence_index,
            original_file_name: item.original_file_name.clone(),
            resolved_width: plan.resolved_width,
            output_path,
        });
    }

    let archive = build_archive(workspace.resized(), archive_dir, settings.compression_level)?;
    sink.record(&BatchEvent::ArchiveBuilt {
        path: archive.path.clone(),
        entries: archive.entries.len(),
    });

    if let Err(e) = workspace.discard() {
        tracing::warn!(dir = %workspace.uploads().display(), error = %e, "could not remove batch workspace");
    }

    Ok(BatchOutcome { archive, outputs })
}

/// The `resize` operation: validate the width, store the files, run the batch.
///
/// The width is validated before anything is written; an invalid width
/// leaves `root` untouched. `config` picks the workspace layout, the batch
/// limit and the encoding settings.
pub fn run_resize(
    backend: &impl ImageBackend,
    raw_width: &str,
    files: &[PathBuf],
    root: &Path,
    config: &TaperConfig,
    sink: &dyn ActivitySink,
) -> Result<BatchOutcome, BatchError> {
    let target = TargetWidth::parse(raw_width).inspect_err(|_| {
        sink.record(&BatchEvent::InvalidWidth {
            raw: raw_width.to_string(),
        })
    })?;

    let workspace = if config.workspace.isolate_batches {
        Workspace::for_batch(root)
    } else {
        Workspace::shared(root)
    };
    let items = ingest(files, &workspace, config.limits.max_batch)?;
    let context = BatchContext::new(items, target);

    process_batch(
        backend,
        &context,
        &workspace,
        root,
        &BatchSettings::from_config(config),
        sink,
    )
}
