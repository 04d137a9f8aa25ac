//! Upload intake: validate extensions, sanitize names, persist into a workspace.
//!
//! Validation runs over the whole batch before anything touches the disk, so
//! a request with one bad filename fails fast and names that file.

use crate::error::ConvertError;
use crate::sanitize::sanitize;
use crate::workspace::Workspace;
use std::fmt;
use std::path::PathBuf;
use tracing::debug;

/// Extensions accepted by the PDF → PNG pipeline.
pub const PDF_EXTENSIONS: &[&str] = &[".pdf"];

/// Extensions accepted by the PNG → PDF pipeline.
pub const IMAGE_EXTENSIONS: &[&str] = &[".png", ".jpg", ".jpeg"];

/// One uploaded file: the name the client sent and its raw bytes.
#[derive(Clone)]
pub struct UploadedItem {
    pub original_name: String,
    pub bytes: Vec<u8>,
}

impl UploadedItem {
    pub fn new(original_name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            original_name: original_name.into(),
            bytes: bytes.into(),
        }
    }
}

impl fmt::Debug for UploadedItem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("UploadedItem")
            .field("original_name", &self.original_name)
            .field("bytes", &self.bytes.len())
            .finish()
    }
}

/// An upload after it has been written into the workspace.
#[derive(Debug, Clone)]
pub struct StoredItem {
    /// Name exactly as the client sent it, for error messages.
    pub original_name: String,
    /// Sanitized name, before any workspace disambiguation.
    pub sanitized_name: String,
    /// File name actually used in the workspace.
    pub stored_name: String,
    pub path: PathBuf,
}

/// Check that `name` ends in one of `allowed` (case-insensitive).
///
/// A bare `.pdf` counts: the suffix is matched, not a parsed extension.
pub fn has_extension(name: &str, allowed: &[&str]) -> bool {
    let lower = name.to_lowercase();
    allowed.iter().any(|a| lower.ends_with(a))
}

/// Reject empty batches and files the PDF → PNG pipeline cannot take.
pub fn validate_pdfs(items: &[UploadedItem]) -> Result<(), ConvertError> {
    validate(items, PDF_EXTENSIONS, |filename| ConvertError::NotAPdf { filename })
}

/// Reject empty batches and files the PNG → PDF pipeline cannot take.
pub fn validate_images(items: &[UploadedItem]) -> Result<(), ConvertError> {
    validate(items, IMAGE_EXTENSIONS, |filename| {
        ConvertError::UnsupportedType { filename }
    })
}

fn validate(
    items: &[UploadedItem],
    allowed: &[&str],
    reject: impl Fn(String) -> ConvertError,
) -> Result<(), ConvertError> {
    if items.is_empty() {
        return Err(ConvertError::NoFiles);
    }
    match items
        .iter()
        .find(|item| !has_extension(&item.original_name, allowed))
    {
        Some(bad) => Err(reject(bad.original_name.clone())),
        None => Ok(()),
    }
}

/// Sanitize every name and write every upload into `workspace`, in order.
///
/// Upload bytes are dropped as soon as they are on disk.
pub fn persist_all(
    workspace: &Workspace,
    items: Vec<UploadedItem>,
) -> Result<Vec<StoredItem>, ConvertError> {
    items
        .into_iter()
        .map(|item| {
            let sanitized_name = sanitize(&item.original_name);
            let (stored_name, path) = workspace.persist(&sanitized_name, &item.bytes)?;
            debug!(
                original = %item.original_name,
                stored = %stored_name,
                "Stored upload"
            );
            Ok(StoredItem {
                original_name: item.original_name,
                sanitized_name,
                stored_name,
                path,
            })
        })
        .collect()
}
