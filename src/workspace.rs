//! Per-request transient workspaces.
//!
//! pdfium opens documents from file-system paths, and rendered pages are
//! flushed to disk one at a time before being copied into the archive, so
//! every conversion needs scratch space. A [`Workspace`] is a uniquely named
//! directory owned by exactly one pipeline invocation. It is released when
//! the value is dropped, which covers success, error returns, panics and
//! cancelled requests alike. Release is best-effort: failures are logged and
//! never replace the pipeline's own result.

use crate::error::ConvertError;
use crate::sanitize;
use std::fs::OpenOptions;
use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use tempfile::TempDir;
use tracing::{debug, warn};

const WORKSPACE_PREFIX: &str = "pdfpng-";

/// A uniquely named scratch directory, removed on drop.
#[derive(Debug)]
pub struct Workspace {
    dir: Option<TempDir>,
    path: PathBuf,
}

impl Workspace {
    /// Create a fresh workspace under `root`, or the system temp dir.
    pub fn create(root: Option<&Path>) -> Result<Self, ConvertError> {
        let mut builder = tempfile::Builder::new();
        builder.prefix(WORKSPACE_PREFIX);
        let dir = match root {
            Some(root) => builder.tempdir_in(root),
            None => builder.tempdir(),
        }
        .map_err(|e| ConvertError::io(root.unwrap_or_else(|| Path::new("<tmp>")), e))?;

        let path = dir.path().to_path_buf();
        debug!(workspace = %path.display(), "Workspace created");
        Ok(Self {
            dir: Some(dir),
            path,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Write `bytes` to a file called `name` inside the workspace.
    ///
    /// `name` must already be sanitized. If an earlier upload in this
    /// workspace used the same name, a `-2`, `-3`, … suffix is added.
    /// Returns the stored file name and its full path.
    pub fn persist(&self, name: &str, bytes: &[u8]) -> Result<(String, PathBuf), ConvertError> {
        let mut candidate = name.to_string();
        let mut n = 1;
        loop {
            let path = self.path.join(&candidate);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(mut file) => {
                    file.write_all(bytes)
                        .map_err(|e| ConvertError::io(&path, e))?;
                    debug!(file = %candidate, bytes = bytes.len(), "Upload persisted");
                    return Ok((candidate, path));
                }
                Err(e) if e.kind() == ErrorKind::AlreadyExists => {
                    n += 1;
                    candidate = sanitize::disambiguate(name, n);
                }
                Err(e) => return Err(ConvertError::io(&path, e)),
            }
        }
    }

    /// Remove the directory now instead of at drop.
    pub fn release(mut self) {
        self.release_inner();
    }

    fn release_inner(&mut self) {
        if let Some(dir) = self.dir.take() {
            match dir.close() {
                Ok(()) => debug!(workspace = %self.path.display(), "Workspace removed"),
                Err(e) => warn!(
                    workspace = %self.path.display(),
                    error = %e,
                    "Failed to remove workspace"
                ),
            }
        }
    }
}

impl Drop for Workspace {
    fn drop(&mut self) {
        self.release_inner();
    }
}

/// Run `f` inside a fresh workspace that is removed however `f` exits.
pub fn with_workspace<T, F>(root: Option<&Path>, f: F) -> Result<T, ConvertError>
where
    F: FnOnce(&Workspace) -> Result<T, ConvertError>,
{
    let workspace = Workspace::create(root)?;
    let result = f(&workspace);
    workspace.release();
    result
}
