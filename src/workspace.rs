//! Working directories and the ingest boundary.
//!
//! A [`Workspace`] is the pair of directories a batch works in: the upload
//! holding area (originals) and the resized-output area nested inside it.
//!
//! ```text
//! <root>/                              # archives land here
//! ├── resized/                         # shared resized-output area
//! └── batches/<epochMillis>-<random>/  # request-scoped holding area
//!     ├── 000-dawn.jpg
//!     └── resized/dawn--640.jpg
//! ```
//!
//! [`Workspace::shared`] reproduces the single shared layout: every request
//! writes into `<root>` and `<root>/resized`, so concurrent requests can sweep
//! each other's outputs into their archives. [`Workspace::for_batch`] gives
//! each request its own directory instead; the pipeline code is identical
//! for both.

use crate::naming::{batch_dir_name, client_file_name, stored_upload_name};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Name of the resized-output directory inside an upload area.
pub const RESIZED_DIR: &str = "resized";
/// Name of the directory holding request-scoped batch workspaces.
pub const BATCHES_DIR: &str = "batches";
/// Upper bound on files per batch accepted at the boundary.
pub const DEFAULT_MAX_BATCH: usize = 200;

#[derive(Error, Debug)]
pub enum IngestError {
    #[error("Too many files: {count} (limit {max})")]
    TooMany { count: usize, max: usize },
    #[error("Cannot store {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// One inbound file after it has been stored in the holding area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedItem {
    /// File name as the client sent it (directory part stripped).
    pub original_file_name: String,
    /// Where the bytes live now.
    pub storage_path: PathBuf,
    /// 0-based arrival order.
    pub sequence_index: usize,
}

/// Upload holding area plus its resized-output area.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Workspace {
    uploads: PathBuf,
    resized: PathBuf,
    scoped: bool,
}

impl Workspace {
    /// The process-wide shared layout rooted at `root`.
    pub fn shared(root: &Path) -> Self {
        Self {
            uploads: root.to_path_buf(),
            resized: root.join(RESIZED_DIR),
            scoped: false,
        }
    }

    /// A fresh, uniquely named workspace under `<root>/batches/`.
    ///
    /// Nothing is created on disk until files are ingested.
    pub fn for_batch(root: &Path) -> Self {
        let name = batch_dir_name(chrono::Utc::now().timestamp_millis(), rand::random::<u64>());
        let uploads = root.join(BATCHES_DIR).join(name);
        Self {
            resized: uploads.join(RESIZED_DIR),
            uploads,
            scoped: true,
        }
    }

    pub fn uploads(&self) -> &Path {
        &self.uploads
    }

    pub fn resized(&self) -> &Path {
        &self.resized
    }

    pub fn is_scoped(&self) -> bool {
        self.scoped
    }

    /// Create the resized-output directory (and its parents) if absent.
    pub fn ensure_resized(&self) -> std::io::Result<()> {
        std::fs::create_dir_all(&self.resized)
    }

    /// Delete a request-scoped workspace with everything in it.
    ///
    /// A shared workspace is left alone; it belongs to every request.
    pub fn discard(&self) -> std::io::Result<()> {
        if !self.scoped {
            return Ok(());
        }
        match std::fs::remove_dir_all(&self.uploads) {
            Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e),
            _ => Ok(()),
        }
    }
}

/// Store inbound files in the workspace's holding area, in arrival order.
///
/// The batch-size limit is checked before anything is written.
pub fn ingest(
    files: &[PathBuf],
    workspace: &Workspace,
    max_batch: usize,
) -> Result<Vec<UploadedItem>, IngestError> {
    if files.len() > max_batch {
        return Err(IngestError::TooMany {
            count: files.len(),
            max: max_batch,
        });
    }

    let io_err = |path: &Path| {
        let path = path.to_path_buf();
        move |source: std::io::Error| IngestError::Io { path, source }
    };

    std::fs::create_dir_all(workspace.uploads()).map_err(io_err(workspace.uploads()))?;

    let mut items = Vec::with_capacity(files.len());
    for (sequence_index, source) in files.iter().enumerate() {
        let original = source.to_string_lossy();
        let original_file_name = client_file_name(&original).to_string();
        let storage_path = workspace
            .uploads()
            .join(stored_upload_name(sequence_index, &original_file_name));
        std::fs::copy(source, &storage_path).map_err(io_err(source))?;
        items.push(UploadedItem {
            original_file_name,
            storage_path,
            sequence_index,
        });
    }
    Ok(items)
}
